use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{split, AsyncRead, AsyncWrite};

use crate::engine::mock::MockEngine;
use crate::session::run_pair;
use crate::wire::frame;

const PASSWORD: &[u8] = b"s3cr3t";

async fn send(client: &mut (impl AsyncRead + AsyncWrite + Unpin), payload: &str) {
    frame::write_frame(client, payload).await.unwrap();
}

async fn recv(client: &mut (impl AsyncRead + AsyncWrite + Unpin)) -> Value {
    let payload = frame::read_frame(client).await.unwrap();
    serde_json::from_str(&payload).unwrap()
}

fn spawn_session() -> (tokio::io::DuplexStream, tokio::task::JoinHandle<()>) {
    let (client, server) = tokio::io::duplex(8192);
    let (server_read, server_write) = split(server);
    let engine = Arc::new(MockEngine);
    let password: Arc<[u8]> = Arc::from(PASSWORD.to_vec().into_boxed_slice());
    let handle = tokio::spawn(async move {
        run_pair(engine, server_read, server_write, password).await;
    });
    (client, handle)
}

#[tokio::test]
async fn handshake_succeeds_with_correct_password() {
    let (mut client, _handle) = spawn_session();
    send(&mut client, std::str::from_utf8(PASSWORD).unwrap()).await;
    let reply = recv(&mut client).await;
    assert_eq!(reply["functor"], "true");
    let threads = &reply["args"][0][0][0];
    assert_eq!(threads["functor"], "threads");
}

#[tokio::test]
async fn handshake_fails_with_wrong_password() {
    let (mut client, _handle) = spawn_session();
    send(&mut client, "wrong").await;
    let reply = recv(&mut client).await;
    assert_eq!(
        reply,
        json!({"functor": "exception", "args": ["password_mismatch"]})
    );
}

async fn handshake(client: &mut (impl AsyncRead + AsyncWrite + Unpin)) {
    send(client, std::str::from_utf8(PASSWORD).unwrap()).await;
    let _ = recv(client).await;
}

#[tokio::test]
async fn run_returns_all_answers_in_order() {
    let (mut client, _handle) = spawn_session();
    handshake(&mut client).await;

    send(&mut client, "run(member(X,[a,b,c]), -1).").await;
    let reply = recv(&mut client).await;
    let expected = json!({
        "functor": "true",
        "args": [[
            [{"functor": "=", "args": ["X", "a"]}],
            [{"functor": "=", "args": ["X", "b"]}],
            [{"functor": "=", "args": ["X", "c"]}]
        ]]
    });
    assert_eq!(reply, expected);
}

#[tokio::test]
async fn run_reports_failure_as_false() {
    let (mut client, _handle) = spawn_session();
    handshake(&mut client).await;

    send(&mut client, "run(fail, -1).").await;
    let reply = recv(&mut client).await;
    assert_eq!(reply, json!({"functor": "false", "args": []}));
}

#[tokio::test]
async fn zero_variable_goal_yields_one_empty_answer_row() {
    let (mut client, _handle) = spawn_session();
    handshake(&mut client).await;

    send(&mut client, "run(true, -1).").await;
    let reply = recv(&mut client).await;
    assert_eq!(reply, json!({"functor": "true", "args": [[[]]]}));
}

#[tokio::test]
async fn streamed_async_terminates_with_no_more_results() {
    let (mut client, _handle) = spawn_session();
    handshake(&mut client).await;

    send(&mut client, "run_async(member(X,[1,2]), -1, false).").await;
    let reply = recv(&mut client).await;
    assert_eq!(reply, json!({"functor": "true", "args": [[[]]]}));

    send(&mut client, "async_result(-1).").await;
    let reply = recv(&mut client).await;
    assert_eq!(
        reply,
        json!({"functor": "true", "args": [[[{"functor": "=", "args": ["X", 1]}]]]})
    );

    send(&mut client, "async_result(-1).").await;
    let reply = recv(&mut client).await;
    assert_eq!(
        reply,
        json!({"functor": "true", "args": [[[{"functor": "=", "args": ["X", 2]}]]]})
    );

    send(&mut client, "async_result(-1).").await;
    let reply = recv(&mut client).await;
    assert_eq!(
        reply,
        json!({"functor": "exception", "args": ["no_more_results"]})
    );
}

#[tokio::test]
async fn async_result_with_zero_timeout_does_not_block() {
    let (mut client, _handle) = spawn_session();
    handshake(&mut client).await;

    send(&mut client, "run_async(sleep(1), -1, true).").await;
    let _ = recv(&mut client).await;

    send(&mut client, "async_result(0).").await;
    let reply = recv(&mut client).await;
    assert_eq!(
        reply,
        json!({"functor": "exception", "args": ["result_not_available"]})
    );
}

#[tokio::test]
async fn cancel_async_with_nothing_running_is_no_query() {
    let (mut client, _handle) = spawn_session();
    handshake(&mut client).await;

    send(&mut client, "cancel_async.").await;
    let reply = recv(&mut client).await;
    assert_eq!(reply, json!({"functor": "exception", "args": ["no_query"]}));
}

#[tokio::test]
async fn cancel_async_stops_a_running_query() {
    let (mut client, _handle) = spawn_session();
    handshake(&mut client).await;

    send(&mut client, "run_async(loop_until_cancelled, -1, true).").await;
    let _ = recv(&mut client).await;

    // give the goal worker a moment to enter the safe-to-cancel region
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    send(&mut client, "cancel_async.").await;
    let reply = recv(&mut client).await;
    assert_eq!(reply, json!({"functor": "true", "args": [[[]]]}));

    send(&mut client, "async_result(-1).").await;
    let reply = recv(&mut client).await;
    assert_eq!(reply, json!({"functor": "exception", "args": ["cancel_goal"]}));
}

#[tokio::test]
async fn close_replies_and_ends_the_session() {
    let (mut client, handle) = spawn_session();
    handshake(&mut client).await;

    send(&mut client, "close.").await;
    let reply = recv(&mut client).await;
    assert_eq!(reply, json!({"functor": "true", "args": [[[]]]}));

    handle.await.unwrap();
}

#[tokio::test]
async fn unknown_command_does_not_end_the_session() {
    let (mut client, _handle) = spawn_session();
    handshake(&mut client).await;

    send(&mut client, "frobnicate(1,2).").await;
    let reply = recv(&mut client).await;
    assert_eq!(reply, json!({"functor": "exception", "args": ["unknown_command"]}));

    send(&mut client, "run(true, -1).").await;
    let reply = recv(&mut client).await;
    assert_eq!(reply, json!({"functor": "true", "args": [[[]]]}));
}
