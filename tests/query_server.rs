//! End-to-end tests driving a real bound TCP socket (spec.md §4.5, §8
//! concrete scenarios), in the teacher's `tests/` placement convention.

use std::sync::Arc;

use logicd::app::config::Config;
use logicd::engine::mock::MockEngine;
use logicd::listener::{self, Endpoint};
use logicd::wire::frame;
use serde_json::{json, Value};
use tokio::net::TcpStream;

const PASSWORD: &[u8] = b"integration-test-password";

fn test_config(port: u16) -> Config {
    Config {
        port: Some(port),
        unix_domain_socket: None,
        password: PASSWORD.to_vec(),
        query_timeout: -1,
        pending_connections: 16,
        run_server_on_thread: false,
        server_thread: None,
        write_connection_values: false,
        write_output_to_file: None,
        ignore_sig_int: false,
        halt_on_connection_failure: false,
    }
}

async fn start_server() -> u16 {
    let port = portpicker::pick_unused_port().expect("no free port");
    let config = test_config(port);
    let endpoint = listener::bind(&config).await.expect("bind failed");
    let bound_port = match &endpoint {
        Endpoint::Tcp { port, .. } => *port,
        Endpoint::Unix { .. } => unreachable!(),
    };
    let engine = Arc::new(MockEngine);
    let password: Arc<[u8]> = Arc::from(PASSWORD.to_vec().into_boxed_slice());
    tokio::spawn(async move {
        listener::serve(endpoint, engine, password, false).await;
    });
    bound_port
}

async fn connect_and_handshake(port: u16) -> TcpStream {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    frame::write_frame(&mut stream, std::str::from_utf8(PASSWORD).unwrap())
        .await
        .unwrap();
    let payload = frame::read_frame(&mut stream).await.unwrap();
    let reply: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(reply["functor"], "true");
    stream
}

async fn roundtrip(stream: &mut TcpStream, payload: &str) -> Value {
    frame::write_frame(stream, payload).await.unwrap();
    let reply = frame::read_frame(stream).await.unwrap();
    serde_json::from_str(&reply).unwrap()
}

#[tokio::test]
async fn full_session_over_a_real_socket() {
    let port = start_server().await;
    let mut stream = connect_and_handshake(port).await;

    let reply = roundtrip(&mut stream, "run(member(X,[a,b,c]), -1).").await;
    assert_eq!(
        reply,
        json!({
            "functor": "true",
            "args": [[
                [{"functor": "=", "args": ["X", "a"]}],
                [{"functor": "=", "args": ["X", "b"]}],
                [{"functor": "=", "args": ["X", "c"]}]
            ]]
        })
    );

    let reply = roundtrip(&mut stream, "close.").await;
    assert_eq!(reply, json!({"functor": "true", "args": [[[]]]}));
}

#[tokio::test]
async fn wrong_password_is_rejected_and_connection_closes() {
    let port = start_server().await;
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    frame::write_frame(&mut stream, "not-the-password").await.unwrap();
    let payload = frame::read_frame(&mut stream).await.unwrap();
    let reply: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(
        reply,
        json!({"functor": "exception", "args": ["password_mismatch"]})
    );
}

#[tokio::test]
async fn timeout_surfaces_as_time_limit_exceeded() {
    let port = start_server().await;
    let mut stream = connect_and_handshake(port).await;

    let reply = roundtrip(&mut stream, "run(sleep(5), 1).").await;
    assert_eq!(
        reply,
        json!({"functor": "exception", "args": ["time_limit_exceeded"]})
    );
}
