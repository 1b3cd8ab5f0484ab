//! Binds the endpoint and runs the accept loop (spec.md §4.5): one
//! {communication, goal} pair is spawned per accepted connection. Tracks
//! every live pair in a [`Registry`] so a `quit`/halt-triggered stop can
//! signal the rest of them to abort before the process exits.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use parking_lot::Mutex;
use socket2::{Domain, SockAddr, Socket, Type};
use tokio::net::{TcpListener, UnixListener};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::app::config::Config;
use crate::engine::Engine;
use crate::errors::Error;
use crate::session::{self, comm_worker::DisconnectReason};

/// The bound endpoint, ready to accept. `unix_domain_socket` wins over
/// `port` when both are configured (spec.md §6 table).
pub enum Endpoint {
    Tcp { listener: TcpListener, port: u16 },
    Unix { listener: UnixListener, path: PathBuf },
}

impl Endpoint {
    /// First line of the optional startup output (spec.md §6 "Startup
    /// output"): decimal port, or the absolute socket path.
    pub fn startup_line(&self) -> String {
        match self {
            Endpoint::Tcp { port, .. } => port.to_string(),
            Endpoint::Unix { path, .. } => path.display().to_string(),
        }
    }

    fn unix_path(&self) -> Option<PathBuf> {
        match self {
            Endpoint::Tcp { .. } => None,
            Endpoint::Unix { path, .. } => Some(path.clone()),
        }
    }
}

/// Tracks every spawned connection-pair task so a stop path (spec.md §4.5
/// "signals every registered connection pair to abort") can reach them
/// from the task that happens to receive `quit`. Grounded on the
/// teacher's per-connection bookkeeping maps (`pool::connection`
/// registries keyed by an opaque connection id).
pub struct Registry {
    next_id: AtomicU64,
    pairs: Mutex<HashMap<u64, AbortHandle>>,
}

impl Registry {
    pub fn new() -> Arc<Registry> {
        Arc::new(Registry {
            next_id: AtomicU64::new(0),
            pairs: Mutex::new(HashMap::new()),
        })
    }

    fn reserve_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn attach(&self, id: u64, handle: AbortHandle) {
        self.pairs.lock().insert(id, handle);
    }

    fn deregister(&self, id: u64) {
        self.pairs.lock().remove(&id);
    }

    /// Abort every other registered pair. `except` is the caller's own
    /// id, already mid-teardown on its own.
    fn abort_others(&self, except: u64) {
        for (id, handle) in self.pairs.lock().iter() {
            if *id != except {
                handle.abort();
            }
        }
    }
}

/// Bind the configured endpoint (spec.md I5: stale local-socket files are
/// removed before bind; the file is created with owner-only permissions)
/// with the configured accept backlog (spec.md §4.5 "runs the accept loop
/// with the configured backlog"), in the style of the teacher's
/// `TcpSocket`-then-`listen(backlog)` bind sequence.
pub async fn bind(config: &Config) -> Result<Endpoint, Error> {
    let backlog = config.pending_connections.min(i32::MAX as u32) as i32;
    if let Some(path) = &config.unix_domain_socket {
        let _ = fs::remove_file(path);
        let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
        socket.bind(&SockAddr::unix(path)?)?;
        socket.listen(backlog)?;
        #[cfg(unix)]
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        let std_listener: std::os::unix::net::UnixListener = socket.into();
        std_listener.set_nonblocking(true)?;
        let listener = UnixListener::from_std(std_listener)?;
        Ok(Endpoint::Unix {
            listener,
            path: path.clone(),
        })
    } else {
        let port = config.port.unwrap_or(0);
        let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
        let socket = Socket::new(Domain::IPV4, Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.bind(&SockAddr::from(addr))?;
        socket.listen(backlog)?;
        let std_listener: std::net::TcpListener = socket.into();
        std_listener.set_nonblocking(true)?;
        let listener = TcpListener::from_std(std_listener)?;
        let bound_port = listener.local_addr()?.port();
        Ok(Endpoint::Tcp {
            listener,
            port: bound_port,
        })
    }
}

/// Accept connections until the process exits. `quit` and an unexpected
/// disconnect under `halt_on_connection_failure` both trigger a stop:
/// every other registered pair is aborted, the local-socket path (if
/// any) is unlinked, and only then does the process exit (spec.md §4.5
/// "Server stop").
pub async fn serve<E>(
    endpoint: Endpoint,
    engine: Arc<E>,
    password: Arc<[u8]>,
    halt_on_connection_failure: bool,
) where
    E: Engine + 'static,
{
    let registry = Registry::new();
    let unix_path = endpoint.unix_path();

    match endpoint {
        Endpoint::Tcp { listener, .. } => loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(%err, "accept failed");
                    continue;
                }
            };
            debug!(%peer, "accepted connection");
            let engine = engine.clone();
            let password = password.clone();
            let task_registry = registry.clone();
            let unix_path = unix_path.clone();
            let id = registry.reserve_id();
            let task = tokio::spawn(async move {
                let (reader, writer) = tokio::io::split(stream);
                handle_pair(
                    engine,
                    reader,
                    writer,
                    password,
                    halt_on_connection_failure,
                    &task_registry,
                    id,
                    unix_path.as_deref(),
                )
                .await;
                task_registry.deregister(id);
            });
            registry.attach(id, task.abort_handle());
        },
        Endpoint::Unix { listener, .. } => loop {
            let (stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(%err, "accept failed");
                    continue;
                }
            };
            debug!("accepted connection");
            let engine = engine.clone();
            let password = password.clone();
            let task_registry = registry.clone();
            let unix_path = unix_path.clone();
            let id = registry.reserve_id();
            let task = tokio::spawn(async move {
                let (reader, writer) = tokio::io::split(stream);
                handle_pair(
                    engine,
                    reader,
                    writer,
                    password,
                    halt_on_connection_failure,
                    &task_registry,
                    id,
                    unix_path.as_deref(),
                )
                .await;
                task_registry.deregister(id);
            });
            registry.attach(id, task.abort_handle());
        },
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_pair<E, R, W>(
    engine: Arc<E>,
    reader: R,
    writer: W,
    password: Arc<[u8]>,
    halt_on_connection_failure: bool,
    registry: &Registry,
    id: u64,
    unix_path: Option<&std::path::Path>,
) where
    E: Engine + 'static,
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let reason = session::run_pair(engine, reader, writer, password).await;
    match reason {
        DisconnectReason::Quit => {
            info!("quit received, stopping server");
            stop_and_exit(registry, id, unix_path, exitcode::OK);
        }
        DisconnectReason::Abnormal if halt_on_connection_failure => {
            warn!("abnormal disconnect with halt_on_connection_failure set, stopping server");
            stop_and_exit(registry, id, unix_path, exitcode::SOFTWARE);
        }
        DisconnectReason::Abnormal => {
            warn!("abnormal disconnect");
        }
        DisconnectReason::CleanClose | DisconnectReason::PasswordMismatch => {
            debug!(?reason, "connection ended");
        }
    }
}

/// Signal every other registered pair to abort, remove the local-socket
/// file if this endpoint is a `unix_domain_socket` (spec.md I5: "on clean
/// shutdown the file is removed"), then exit.
fn stop_and_exit(registry: &Registry, id: u64, unix_path: Option<&std::path::Path>, code: i32) -> ! {
    registry.abort_others(id);
    if let Some(path) = unix_path {
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), %err, "failed to remove local-socket file on shutdown");
        }
    }
    std::process::exit(code);
}
