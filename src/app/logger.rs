//! Structured logging init (spec.md's ambient "debug tracing" plumbing,
//! §2). Mirrors the teacher's `app::logger`: an `EnvFilter` seeded from
//! the CLI level, overridable via `RUST_LOG`, with a selectable output
//! format.

use tracing_subscriber::EnvFilter;

use super::args::{Args, LogFormat};

pub fn init_logging(args: &Args) {
    let filter = EnvFilter::from_default_env().add_directive(args.log_level.into());

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(!args.no_color);

    match args.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Text => subscriber.init(),
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting logicd");
}
