//! The trusted logic-engine boundary (spec.md §1, §6 "external capabilities").
//!
//! Everything in this module is a seam, not an implementation: the logic
//! engine that actually evaluates goals, the goal-term parser, and the
//! term-to-JSON serializer are explicitly out of scope for the session
//! engine. A host application plugs in its own [`Engine`]; this crate
//! ships only [`mock`], a small deterministic stand-in used by the
//! default binary configuration and the integration tests.

pub mod mock;

use async_trait::async_trait;
use serde_json::Value;

/// One binding: a client-supplied variable name paired with its bound
/// value. Unbound variables retain their name (spec.md §4.4).
pub type Binding = (String, Value);

/// One solution of a goal: an ordered list of bindings. A successful
/// goal with no free variables yields an empty list (spec.md §3).
pub type Answer = Vec<Binding>;

/// A goal that has already been parsed by the trusted goal-term parser,
/// plus the variable names captured from the client's source text, in
/// source order (spec.md §3 "Query request").
pub struct ParsedGoal {
    /// Opaque to the session engine; only the [`Engine`] implementation
    /// that produced it knows how to evaluate it.
    pub goal: Box<dyn std::any::Any + Send>,
    pub variable_names: Vec<String>,
}

impl ParsedGoal {
    pub fn new<G: Send + 'static>(goal: G, variable_names: Vec<String>) -> Self {
        ParsedGoal {
            goal: Box::new(goal),
            variable_names,
        }
    }

    /// Downcast back to the concrete goal type a particular [`Engine`]
    /// produces. Panics if called against a `ParsedGoal` produced by a
    /// different engine implementation, which cannot happen in normal
    /// operation since one connection uses exactly one engine.
    pub fn downcast<G: 'static>(self) -> G {
        *self
            .goal
            .downcast::<G>()
            .unwrap_or_else(|_| panic!("ParsedGoal produced by a different Engine implementation"))
    }
}

/// Why solving a goal stopped without a(nother) engine exception to
/// report verbatim (spec.md §4.4 step 5, §7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineOutcome {
    /// The engine raised `E`; carried through to the client unchanged.
    #[error("engine exception: {0}")]
    Exception(Value),
    /// Wall-clock timeout wrapper expired (spec.md §5 "Timeouts").
    #[error("time_limit_exceeded")]
    TimeLimitExceeded,
    /// `cancel_goal` was injected while inside the safe-to-cancel region.
    #[error("cancel_goal")]
    Cancelled,
}

/// Error surfaced while parsing a goal term (spec.md §6 "Payload term
/// parsing"); reported to the client as `exception(<tag>)`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(pub String);

/// Cooperative cancellation flag shared between the communication worker
/// and the goal worker, guarded by the same mutex that decides whether
/// the goal worker is inside the safe-to-cancel region (spec.md §3 I3,
/// §5 "Cancellation semantics").
#[derive(Default)]
pub struct CancelFlag {
    requested: std::sync::atomic::AtomicBool,
}

impl CancelFlag {
    pub fn request(&self) {
        self.requested.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// A sink the engine pushes answers into during stream-mode solving
/// (spec.md §4.4 step 2, `FindAll = false`). Each push corresponds to
/// one outbox `success([Binding])` message emitted immediately.
pub type AnswerSink<'a> = &'a mut (dyn FnMut(Answer) + Send + 'a);

/// One logic-engine session, owned exclusively by one goal worker for
/// the lifetime of a connection pair (spec.md §5 "Shared-resource
/// policy"). Holds whatever interpreter state the engine needs to
/// survive across queries on the same connection.
#[async_trait]
pub trait Session: Send {
    /// Parse a textual goal in the base module context (spec.md §6).
    /// Returns the opaque goal plus the captured variable-name list.
    async fn parse(&self, text: &str) -> Result<ParsedGoal, EngineError>;

    /// Find-all mode: collect every answer before returning.
    async fn solve_all(
        &mut self,
        goal: ParsedGoal,
        cancel: &CancelFlag,
    ) -> Result<Vec<Answer>, EngineOutcome>;

    /// Stream mode: push one answer into `sink` per solution as it is
    /// found. Returns once solving stops, successfully or not.
    async fn solve_stream(
        &mut self,
        goal: ParsedGoal,
        cancel: &CancelFlag,
        sink: AnswerSink<'_>,
    ) -> Result<(), EngineOutcome>;
}

/// Factory for engine sessions. One [`Engine`] is shared across all
/// connections; one [`Session`] is created per connection pair.
#[async_trait]
pub trait Engine: Send + Sync {
    type Session: Session;

    async fn new_session(&self) -> Result<Self::Session, EngineError>;
}
