//! Launch glue (spec.md §2 "Launch glue"): wires parsed args through
//! configuration, logging, the signal/output-redirection policy, and the
//! supervisor. Deliberately minimal — no daemonization, no binary
//! upgrade on SIGHUP, no core-affinity pinning: those are teacher-only
//! operational features with no counterpart in spec.md.

use std::sync::Arc;

use tracing::error;

use crate::app::args::Args;
use crate::app::{config, logger};
use crate::engine::mock::MockEngine;
use crate::errors::Error;
use crate::supervisor;

pub fn run(args: Args) -> Result<(), Error> {
    let config = config::load(&args)?;
    logger::init_logging(&args);

    #[cfg(unix)]
    if args.ignore_sig_int {
        supervisor::ignore_sig_int()?;
    }

    #[cfg(unix)]
    if let Some(path) = &config.write_output_to_file {
        supervisor::write_output_to_file(path)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("logicd-worker")
        .build()?;

    let engine = Arc::new(MockEngine);

    if config.run_server_on_thread {
        let thread_name = config.server_thread.clone().unwrap_or_else(|| "logicd".to_string());
        std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                if let Err(err) = runtime.block_on(supervisor::run(engine, config)) {
                    error!(%err, "server thread exited with an error");
                }
            })?;
        Ok(())
    } else {
        runtime.block_on(supervisor::run(engine, config))
    }
}
