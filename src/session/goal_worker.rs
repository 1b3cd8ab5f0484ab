//! The goal worker (spec.md §4.4): a serial loop that owns one logic-engine
//! session, receives goal requests on its inbox, and produces result
//! messages on its outbox.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use crate::engine::{Answer, EngineOutcome, Session};
use crate::session::pair::PairState;
use crate::wire::Reply;

/// `goal(Goal, BindingNames, Timeout, FindAll)` (spec.md §4.4).
pub struct GoalRequest {
    pub goal_text: String,
    /// Seconds; `-1` means unbounded (spec.md §3).
    pub timeout: i64,
    pub find_all: bool,
}

/// One message on the goal outbox. `terminal` mirrors spec.md I2: the
/// consumer clears `query_in_progress` only after draining a terminal
/// message.
pub struct OutboxMessage {
    pub reply: Reply,
    pub terminal: bool,
}

/// Runs until the inbox is dropped (connection pair torn down) or a hard
/// abort is requested. One goal worker per connection pair, spec.md §5.
pub async fn run<S: Session>(
    mut session: S,
    pair: Arc<PairState>,
    mut inbox: mpsc::Receiver<GoalRequest>,
    outbox: mpsc::UnboundedSender<OutboxMessage>,
) {
    while let Some(request) = inbox.recv().await {
        process_one(&mut session, &pair, request, &outbox).await;
    }
}

async fn process_one<S: Session>(
    session: &mut S,
    pair: &Arc<PairState>,
    request: GoalRequest,
    outbox: &mpsc::UnboundedSender<OutboxMessage>,
) {
    let goal = match session.parse(&request.goal_text).await {
        Ok(goal) => goal,
        Err(err) => {
            let _ = outbox.send(OutboxMessage {
                reply: Reply::Exception(serde_json::Value::String(err.0)),
                terminal: true,
            });
            return;
        }
    };

    let cancel = pair.enter_safe_to_cancel();

    let timeout_duration = (request.timeout > 0)
        .then(|| Duration::from_secs(request.timeout as u64));

    if request.find_all {
        let outcome = run_with_timeout(timeout_duration, session.solve_all(goal, &cancel)).await;
        pair.leave_safe_to_cancel();
        let reply = match outcome {
            Ok(answers) if !answers.is_empty() => Reply::Success(answers),
            Ok(_) => Reply::Failure,
            Err(outcome) => {
                warn!(goal_id = %pair.goal_id, ?outcome, "find-all goal ended in an exception");
                Reply::from_engine_outcome(outcome)
            }
        };
        let _ = outbox.send(OutboxMessage {
            reply,
            terminal: true,
        });
    } else {
        // Each answer is forwarded to the outbox the moment the engine
        // produces it — `async_result`'s `Timeout=0`/bounded-timeout
        // polling (spec.md §4.3) is only meaningful if answers become
        // visible incrementally, not after `solve_stream` as a whole
        // returns.
        let mut any = false;
        let mut sink = |answer: Answer| {
            any = true;
            let _ = outbox.send(OutboxMessage {
                reply: Reply::Success(vec![answer]),
                terminal: false,
            });
        };
        let outcome = run_with_timeout(
            timeout_duration,
            session.solve_stream(goal, &cancel, &mut sink),
        )
        .await;
        pair.leave_safe_to_cancel();

        let terminal_reply = match outcome {
            Ok(()) if any => Reply::exception_tag("no_more_results"),
            Ok(()) => Reply::Failure,
            Err(outcome) => {
                warn!(goal_id = %pair.goal_id, ?outcome, "streamed goal ended in an exception");
                Reply::from_engine_outcome(outcome)
            }
        };
        let _ = outbox.send(OutboxMessage {
            reply: terminal_reply,
            terminal: true,
        });
    }
}

/// Wraps an engine call in the wall-clock timeout of spec.md §4.4 step 3.
/// `None` duration means unbounded (`Timeout <= 0`).
async fn run_with_timeout<T>(
    duration: Option<Duration>,
    fut: impl std::future::Future<Output = Result<T, EngineOutcome>>,
) -> Result<T, EngineOutcome> {
    match duration {
        None => fut.await,
        Some(duration) => match tokio::time::timeout(duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(EngineOutcome::TimeLimitExceeded),
        },
    }
}
