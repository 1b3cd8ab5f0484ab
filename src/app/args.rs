//! Command-line arguments (spec.md §2 "Launch glue", §6 configuration table).

use std::fmt;

use clap::{Parser, ValueEnum};
use tracing::Level;

/// logicd: embeddable logic-programming query server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Optional TOML file layered under these flags (lowest precedence).
    #[arg(short = 'c', long, env)]
    pub config_file: Option<String>,

    #[arg(long, env)]
    pub port: Option<u16>,

    #[arg(long, env)]
    pub unix_domain_socket: Option<String>,

    /// Shared secret. If unset, a strong random password is generated.
    #[arg(long, env, hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, env)]
    pub query_timeout: Option<i64>,

    #[arg(long, env)]
    pub pending_connections: Option<u32>,

    #[arg(long, env)]
    pub run_server_on_thread: bool,

    #[arg(long, env)]
    pub server_thread: Option<String>,

    #[arg(long, env)]
    pub write_connection_values: bool,

    #[arg(long, env)]
    pub write_output_to_file: Option<String>,

    #[arg(long, env)]
    pub ignore_sig_int: bool,

    #[arg(long, env)]
    pub halt_on_connection_failure: bool,

    #[arg(short, long, default_value_t = tracing::Level::INFO, env)]
    pub log_level: Level,

    #[clap(short = 'F', long, value_enum, default_value_t = LogFormat::Text, env)]
    pub log_format: LogFormat,

    #[arg(
        short,
        long,
        default_value_t = false,
        env,
        help = "disable colors in the log output"
    )]
    pub no_color: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}
