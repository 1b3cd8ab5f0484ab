//! Top-level command parsing (spec.md §6 "Payload term parsing").
//!
//! This is a syntactic front end over the trusted goal-term parser: it
//! locates the command functor/arity and, for `run`/`run_async`, hands
//! the `Goal` argument's source text on to [`crate::engine::Session::parse`]
//! unparsed. Recognized forms: `run/2`, `run_async/3`, `async_result/1`
//! (or `async_result/0`, treated as `Timeout = -1`), `cancel_async`,
//! `close`, `quit`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run {
        goal_text: String,
        timeout: i64,
    },
    RunAsync {
        goal_text: String,
        timeout: i64,
        find_all: bool,
    },
    AsyncResult {
        timeout: i64,
    },
    CancelAsync,
    Close,
    Quit,
}

/// Split `s` on top-level commas, ignoring commas nested inside `()` or
/// `[]` — needed because a `Goal` argument like `member(X,[a,b,c])`
/// contains commas of its own.
fn split_top_level_args(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = s[start..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts
}

/// Extract `(functor, Some(args_text))` for `functor(args)`, or
/// `(functor, None)` for a bare zero-arity term like `close` or
/// `cancel_async`.
fn split_functor<'a>(text: &'a str) -> Option<(&'a str, Option<&'a str>)> {
    let text = text.trim();
    if let Some(open) = text.find('(') {
        if !text.ends_with(')') {
            return None;
        }
        let functor = text[..open].trim();
        let args = &text[open + 1..text.len() - 1];
        if functor.is_empty() {
            return None;
        }
        Some((functor, Some(args)))
    } else if !text.is_empty() {
        Some((text, None))
    } else {
        None
    }
}

fn parse_timeout(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse a client payload (already stripped of the frame's trailing
/// `.\n`) into a [`Command`]. Returns an exception tag on failure —
/// `could_not_parse_command` for syntactically malformed input,
/// `unknown_command` for a well-formed but unrecognized term (spec.md
/// §6).
pub fn parse_command(payload: &str) -> Result<Command, &'static str> {
    let text = payload.trim();
    let text = text.strip_suffix(".").unwrap_or(text).trim();

    let (functor, args) = split_functor(text).ok_or("could_not_parse_command")?;

    match (functor, args) {
        ("run", Some(args)) => {
            let parts = split_top_level_args(args);
            if parts.len() != 2 {
                return Err("could_not_parse_command");
            }
            let timeout = parse_timeout(parts[1]).ok_or("could_not_parse_command")?;
            Ok(Command::Run {
                goal_text: parts[0].to_string(),
                timeout,
            })
        }
        ("run_async", Some(args)) => {
            let parts = split_top_level_args(args);
            if parts.len() != 3 {
                return Err("could_not_parse_command");
            }
            let timeout = parse_timeout(parts[1]).ok_or("could_not_parse_command")?;
            let find_all = parse_bool(parts[2]).ok_or("could_not_parse_command")?;
            Ok(Command::RunAsync {
                goal_text: parts[0].to_string(),
                timeout,
                find_all,
            })
        }
        ("async_result", Some(args)) => {
            let args = args.trim();
            let timeout = if args.is_empty() {
                -1
            } else {
                parse_timeout(args).ok_or("could_not_parse_command")?
            };
            Ok(Command::AsyncResult { timeout })
        }
        ("async_result", None) => Ok(Command::AsyncResult { timeout: -1 }),
        ("cancel_async", None) => Ok(Command::CancelAsync),
        ("close", None) => Ok(Command::Close),
        ("quit", None) => Ok(Command::Quit),
        _ => Err("unknown_command"),
    }
}

#[cfg(test)]
mod command_tests;
