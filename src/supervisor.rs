//! Server lifecycle (spec.md §4.5, §6): binds the endpoint, emits the
//! optional startup output, installs the signal/output-redirection
//! policy, and runs the accept loop.

use std::io::Write;
use std::sync::Arc;

use tracing::info;

use crate::app::config::Config;
use crate::engine::Engine;
use crate::errors::Error;
use crate::listener::{self, Endpoint};

/// Bind, optionally announce, and accept forever. Returns only on a bind
/// failure — normal termination (`quit`, halt-on-failure) runs the
/// registered-pair abort and local-socket cleanup inside
/// [`crate::listener::serve`] before exiting the process.
pub async fn run<E>(engine: Arc<E>, config: Config) -> Result<(), Error>
where
    E: Engine + 'static,
{
    let endpoint = listener::bind(&config).await?;
    let password: Arc<[u8]> = Arc::from(config.password.clone().into_boxed_slice());

    match &endpoint {
        Endpoint::Tcp { port, .. } => info!(port, "listening"),
        Endpoint::Unix { path, .. } => info!(path = %path.display(), "listening"),
    }

    if config.write_connection_values {
        write_connection_values(&endpoint, &password)?;
    }

    listener::serve(endpoint, engine, password, config.halt_on_connection_failure).await;
    Ok(())
}

/// `<endpoint>\n<password>\n` to standard output (spec.md §6 "Startup
/// output"; port-then-password ordering per spec.md §9 open question b).
fn write_connection_values(endpoint: &Endpoint, password: &[u8]) -> Result<(), Error> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", endpoint.startup_line())?;
    handle.write_all(password)?;
    writeln!(handle)?;
    handle.flush()?;
    Ok(())
}

/// Ignore `SIGINT` so a client-side debugger attaching to the embedding
/// host does not suspend the server (spec.md §6 `ignore_sig_int`).
#[cfg(unix)]
pub fn ignore_sig_int() -> Result<(), Error> {
    use nix::sys::signal::{self, SigHandler, Signal};
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::SigIgn)
            .map_err(|errno| Error::BadConfig(format!("could not install SIGINT policy: {errno}")))?;
    }
    Ok(())
}

/// Redirect the process's stdout/stderr to `path` (spec.md §6
/// `write_output_to_file`), in the style of the teacher's direct fd
/// manipulation during binary upgrade, but via the safer `nix` wrapper.
#[cfg(unix)]
pub fn write_output_to_file(path: &std::path::Path) -> Result<(), Error> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    nix::unistd::dup2_stdout(&file)
        .map_err(|errno| Error::BadConfig(format!("dup2 onto stdout failed: {errno}")))?;
    nix::unistd::dup2_stderr(&file)
        .map_err(|errno| Error::BadConfig(format!("dup2 onto stderr failed: {errno}")))?;
    std::mem::forget(file);
    Ok(())
}
