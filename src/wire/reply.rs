//! Reply JSON shapes (spec.md §6).

use serde_json::{json, Value};

use crate::engine::{Answer, EngineOutcome};

/// One server reply. Serializes to exactly the JSON shapes spec.md §6
/// documents.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `true([B1, B2, ...])` — success with zero or more answer rows.
    Success(Vec<Answer>),
    /// `false` — failure.
    Failure,
    /// `exception(ErrorValueAsJSON)`.
    Exception(Value),
    /// A fully-formed reply document that doesn't fit the `Answer`/`=`
    /// binding shape, e.g. the handshake's `threads/2` compound.
    Raw(Value),
}

impl Reply {
    /// The handshake reply is `true([[threads(CommId, GoalId)]])` — a
    /// `threads/2` compound, not a variable binding, so it bypasses the
    /// usual `Answer`/`=` machinery entirely.
    pub fn handshake_ok(comm_id: &str, goal_id: &str) -> Reply {
        Reply::Raw(json!({
            "functor": "true",
            "args": [[[{"functor": "threads", "args": [comm_id, goal_id]}]]]
        }))
    }

    /// Reply for an exception identified only by a bare tag, e.g.
    /// `password_mismatch`, `no_query`, `unknown_command`.
    pub fn exception_tag(tag: &str) -> Reply {
        Reply::Exception(Value::String(tag.to_string()))
    }

    pub fn from_engine_outcome(outcome: EngineOutcome) -> Reply {
        match outcome {
            EngineOutcome::Exception(value) => Reply::Exception(value),
            EngineOutcome::TimeLimitExceeded => Reply::exception_tag("time_limit_exceeded"),
            EngineOutcome::Cancelled => Reply::exception_tag("cancel_goal"),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Reply::Success(answers) => {
                let rows: Vec<Value> = answers
                    .iter()
                    .map(|answer| {
                        let bindings: Vec<Value> = answer
                            .iter()
                            .map(|(name, value)| {
                                json!({"functor": "=", "args": [name, value]})
                            })
                            .collect();
                        Value::Array(bindings)
                    })
                    .collect();
                json!({"functor": "true", "args": [rows]})
            }
            Reply::Failure => json!({"functor": "false", "args": []}),
            Reply::Exception(value) => json!({"functor": "exception", "args": [value]}),
            Reply::Raw(value) => value.clone(),
        }
    }

    /// Serialize to the frame payload text (one JSON document, no
    /// trailing newline — [`crate::wire::frame::write_frame`] appends
    /// the frame terminator).
    pub fn to_payload(&self) -> String {
        self.to_json().to_string()
    }
}

#[cfg(test)]
mod reply_tests;
