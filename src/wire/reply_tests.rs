use super::*;
use serde_json::json;

#[test]
fn handshake_reply_matches_spec_shape() {
    let reply = Reply::handshake_ok("comm-1", "goal-1");
    let expected = json!({
        "functor": "true",
        "args": [[[{"functor": "threads", "args": ["comm-1", "goal-1"]}]]]
    });
    assert_eq!(reply.to_json(), expected);
}

#[test]
fn zero_variable_success_has_one_empty_answer_row() {
    let reply = Reply::Success(vec![Vec::new()]);
    let expected = json!({"functor": "true", "args": [[[]]]});
    assert_eq!(reply.to_json(), expected);
}

#[test]
fn failure_reply_matches_spec_shape() {
    assert_eq!(Reply::Failure.to_json(), json!({"functor": "false", "args": []}));
}

#[test]
fn binding_list_reply_matches_spec_shape() {
    let reply = Reply::Success(vec![vec![("X".to_string(), json!("a"))]]);
    let expected = json!({
        "functor": "true",
        "args": [[[{"functor": "=", "args": ["X", "a"]}]]]
    });
    assert_eq!(reply.to_json(), expected);
}

#[test]
fn bare_atom_exception_is_a_json_string() {
    let reply = Reply::exception_tag("no_query");
    assert_eq!(
        reply.to_json(),
        json!({"functor": "exception", "args": ["no_query"]})
    );
}
