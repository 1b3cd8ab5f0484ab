//! A small deterministic engine used by the default binary configuration
//! and the integration tests. Not a logic engine implementation to
//! spec — real deployments plug in their own [`super::Engine`].
//!
//! Understands a tiny goal language, enough to exercise every answer
//! shape the session engine has to handle:
//!
//! - `true` — one answer, no bindings.
//! - `fail` — no answers.
//! - `X = <value>` — binds `X` to a JSON-ish literal.
//! - `member(X, [<values>])` — one answer per list element.
//! - `sleep(<seconds>)` — succeeds once after sleeping, for timeout tests.
//! - `loop_until_cancelled` — never finishes on its own, for cancel tests.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{Answer, AnswerSink, CancelFlag, Engine, EngineError, EngineOutcome, ParsedGoal};

#[derive(Debug, Clone)]
pub enum Goal {
    True,
    Fail,
    Eq(String, Value),
    Member(String, Vec<Value>),
    Sleep(f64),
    LoopUntilCancelled,
}

fn parse_literal(text: &str) -> Value {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(n) = text.parse::<f64>() {
        return Value::from(n);
    }
    let unquoted = text.trim_matches('\'').trim_matches('"');
    Value::String(unquoted.to_string())
}

fn parse_list(text: &str) -> Vec<Value> {
    let inner = text.trim().trim_start_matches('[').trim_end_matches(']');
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner.split(',').map(parse_literal).collect()
}

/// Parse the tiny goal language described above. Stands in for the
/// trusted goal-term parser (spec.md §6); returns `unknown_command`-style
/// errors for anything it doesn't recognize.
pub fn parse_goal_text(text: &str) -> Result<Goal, EngineError> {
    let text = text.trim().trim_end_matches('.').trim();
    if text == "true" {
        return Ok(Goal::True);
    }
    if text == "fail" || text == "false" {
        return Ok(Goal::Fail);
    }
    if text == "loop_until_cancelled" {
        return Ok(Goal::LoopUntilCancelled);
    }
    if let Some(rest) = text.strip_prefix("sleep(").and_then(|s| s.strip_suffix(')')) {
        let secs: f64 = rest
            .trim()
            .parse()
            .map_err(|_| EngineError(format!("bad sleep/1 argument: {rest}")))?;
        return Ok(Goal::Sleep(secs));
    }
    if let Some(rest) = text.strip_prefix("member(").and_then(|s| s.strip_suffix(')')) {
        let comma = rest
            .find(',')
            .ok_or_else(|| EngineError(format!("bad member/2 syntax: {text}")))?;
        let var = rest[..comma].trim().to_string();
        let list = parse_list(&rest[comma + 1..]);
        return Ok(Goal::Member(var, list));
    }
    if let Some(eq) = text.find('=') {
        let lhs = text[..eq].trim();
        let rhs = text[eq + 1..].trim();
        if !lhs.is_empty() && lhs.chars().next().unwrap().is_uppercase() {
            return Ok(Goal::Eq(lhs.to_string(), parse_literal(rhs)));
        }
    }
    Err(EngineError(format!("could not parse goal: {text}")))
}

fn variable_names(goal: &Goal) -> Vec<String> {
    match goal {
        Goal::Eq(name, _) | Goal::Member(name, _) => vec![name.clone()],
        Goal::True | Goal::Fail | Goal::Sleep(_) | Goal::LoopUntilCancelled => Vec::new(),
    }
}

/// The engine itself holds no state; every session is independent.
#[derive(Default, Clone, Copy)]
pub struct MockEngine;

pub struct MockSession;

#[async_trait]
impl Engine for MockEngine {
    type Session = MockSession;

    async fn new_session(&self) -> Result<Self::Session, EngineError> {
        Ok(MockSession)
    }
}

#[async_trait]
impl super::Session for MockSession {
    async fn parse(&self, text: &str) -> Result<ParsedGoal, EngineError> {
        let goal = parse_goal_text(text)?;
        let names = variable_names(&goal);
        Ok(ParsedGoal::new(goal, names))
    }

    async fn solve_all(
        &mut self,
        goal: ParsedGoal,
        cancel: &CancelFlag,
    ) -> Result<Vec<Answer>, EngineOutcome> {
        let goal: Goal = goal.downcast();
        match goal {
            Goal::True => Ok(vec![Vec::new()]),
            Goal::Fail => Ok(Vec::new()),
            Goal::Eq(name, value) => Ok(vec![vec![(name, value)]]),
            Goal::Member(name, values) => {
                Ok(values.into_iter().map(|v| vec![(name.clone(), v)]).collect())
            }
            Goal::Sleep(secs) => {
                tokio::time::sleep(Duration::from_secs_f64(secs)).await;
                Ok(vec![Vec::new()])
            }
            Goal::LoopUntilCancelled => {
                loop {
                    if cancel.is_requested() {
                        return Err(EngineOutcome::Cancelled);
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            }
        }
    }

    async fn solve_stream(
        &mut self,
        goal: ParsedGoal,
        cancel: &CancelFlag,
        sink: AnswerSink<'_>,
    ) -> Result<(), EngineOutcome> {
        let goal: Goal = goal.downcast();
        match goal {
            Goal::True => {
                sink(Vec::new());
                Ok(())
            }
            Goal::Fail => Ok(()),
            Goal::Eq(name, value) => {
                sink(vec![(name, value)]);
                Ok(())
            }
            Goal::Member(name, values) => {
                for v in values {
                    if cancel.is_requested() {
                        return Err(EngineOutcome::Cancelled);
                    }
                    sink(vec![(name.clone(), v)]);
                }
                Ok(())
            }
            Goal::Sleep(secs) => {
                tokio::time::sleep(Duration::from_secs_f64(secs)).await;
                sink(Vec::new());
                Ok(())
            }
            Goal::LoopUntilCancelled => loop {
                if cancel.is_requested() {
                    return Err(EngineOutcome::Cancelled);
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_equality() {
        let g = parse_goal_text("X = 1.").unwrap();
        matches!(g, Goal::Eq(name, _) if name == "X");
    }

    #[test]
    fn parses_member() {
        let g = parse_goal_text("member(X,[a,b,c]).").unwrap();
        match g {
            Goal::Member(name, values) => {
                assert_eq!(name, "X");
                assert_eq!(values.len(), 3);
            }
            _ => panic!("expected Member"),
        }
    }

    #[test]
    fn rejects_unknown_goal() {
        assert!(parse_goal_text("frobnicate(42)").is_err());
    }
}
