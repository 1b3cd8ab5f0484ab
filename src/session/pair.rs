//! Connection pair bookkeeping (spec.md §3).
//!
//! `query_in_progress` and the safe-to-cancel region are the two facts
//! shared between the communication worker and the goal worker. Both are
//! scoped to one connection pair; spec.md §5 keeps them behind "the
//! cancellation mutex [that] protects the 'is the worker inside the
//! cancellable region?' decision and the accompanying signal injection."
//! Here that mutex and the safe-to-cancel flag are the same value: a
//! `Mutex<Option<Arc<CancelFlag>>>`. `Some(flag)` means the goal worker
//! is inside the bracketed engine call and `flag` is what a concurrent
//! `cancel_async` should set; `None` means it is not safe to inject a
//! cancellation right now.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::CancelFlag;

pub struct PairState {
    pub comm_id: String,
    pub goal_id: String,
    query_in_progress: AtomicBool,
    cancel_gate: Mutex<Option<Arc<CancelFlag>>>,
}

impl PairState {
    pub fn new(comm_id: String, goal_id: String) -> Self {
        PairState {
            comm_id,
            goal_id,
            query_in_progress: AtomicBool::new(false),
            cancel_gate: Mutex::new(None),
        }
    }

    /// Asserted when a goal is dispatched (spec.md I2); cleared only
    /// after the terminal result for that goal has been consumed.
    pub fn set_query_in_progress(&self, value: bool) {
        self.query_in_progress.store(value, Ordering::SeqCst);
    }

    pub fn query_in_progress(&self) -> bool {
        self.query_in_progress.load(Ordering::SeqCst)
    }

    /// Called by the goal worker just before entering the bracketed
    /// engine-call region (spec.md §4.4 step 1).
    pub fn enter_safe_to_cancel(&self) -> Arc<CancelFlag> {
        let flag = Arc::new(CancelFlag::default());
        *self.cancel_gate.lock() = Some(flag.clone());
        flag
    }

    /// Called by the goal worker on returning from the engine call
    /// (spec.md §4.4 step 4), whether it succeeded, failed, or was
    /// cancelled.
    pub fn leave_safe_to_cancel(&self) {
        *self.cancel_gate.lock() = None;
    }

    /// `cancel_async` semantics (spec.md §4.3): inject cancellation if
    /// safe, otherwise report whether there's anything to drain.
    pub fn try_cancel(&self) -> CancelOutcome {
        let guard = self.cancel_gate.lock();
        if let Some(flag) = guard.as_ref() {
            flag.request();
            CancelOutcome::Injected
        } else if self.query_in_progress() {
            CancelOutcome::PendingResultsOnly
        } else {
            CancelOutcome::NoQuery
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Injected,
    PendingResultsOnly,
    NoQuery,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_with_nothing_running_is_no_query() {
        let pair = PairState::new("c1".into(), "g1".into());
        assert_eq!(pair.try_cancel(), CancelOutcome::NoQuery);
    }

    #[test]
    fn cancel_while_safe_injects_and_sets_the_flag() {
        let pair = PairState::new("c1".into(), "g1".into());
        let flag = pair.enter_safe_to_cancel();
        assert_eq!(pair.try_cancel(), CancelOutcome::Injected);
        assert!(flag.is_requested());
    }

    #[test]
    fn cancel_with_results_pending_but_not_safe() {
        let pair = PairState::new("c1".into(), "g1".into());
        pair.set_query_in_progress(true);
        assert_eq!(pair.try_cancel(), CancelOutcome::PendingResultsOnly);
    }
}
