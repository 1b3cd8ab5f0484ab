//! Per-connection session: the protocol state machine (communication
//! worker) and the serial logic-engine loop (goal worker), joined by two
//! queues and a shared cancellation gate (spec.md §4, §5).

pub mod comm_worker;
pub mod command;
pub mod goal_worker;
pub mod pair;

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::engine::Engine;
use crate::utils::generate_id;
use comm_worker::{CommWorker, DisconnectReason, GreetOutcome};
use pair::PairState;

/// Goal inbox is bounded to 1: spec.md I1 guarantees at most one
/// outstanding query per connection, so there is never a reason to
/// queue more than the one in flight.
const GOAL_INBOX_CAPACITY: usize = 1;

/// Build and run one connection pair end to end: handshake, then serve
/// commands until the connection ends. Spawns the goal worker as its own
/// task so the communication worker stays responsive to the socket while
/// a query is running (spec.md §9 "Two-worker-per-connection").
pub async fn run_pair<E, R, W>(
    engine: Arc<E>,
    reader: R,
    writer: W,
    password: Arc<[u8]>,
) -> DisconnectReason
where
    E: Engine + 'static,
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let comm_id = format!("comm-{}", generate_id());
    let goal_id = format!("goal-{}", generate_id());
    let pair = Arc::new(PairState::new(comm_id, goal_id));

    let session = match engine.new_session().await {
        Ok(session) => session,
        Err(_) => return DisconnectReason::Abnormal,
    };

    let (inbox_tx, inbox_rx) = mpsc::channel(GOAL_INBOX_CAPACITY);
    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();

    let goal_pair = pair.clone();
    let goal_handle = tokio::task::spawn(goal_worker::run(session, goal_pair, inbox_rx, outbox_tx));

    let mut worker = CommWorker::new(reader, writer, pair, inbox_tx, outbox_rx, goal_handle);

    match worker.greet(&password).await {
        GreetOutcome::Ok => worker.serve().await,
        GreetOutcome::Mismatch => {
            worker.abort_goal();
            DisconnectReason::PasswordMismatch
        }
        GreetOutcome::Abnormal => {
            worker.abort_goal();
            DisconnectReason::Abnormal
        }
    }
}
