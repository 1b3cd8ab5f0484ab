use super::*;
use std::io::Cursor;

#[tokio::test]
async fn round_trips_a_simple_payload() {
    let encoded = encode("run(member(X,[a,b,c]), -1)");
    let mut cursor = Cursor::new(encoded);
    let decoded = read_frame(&mut cursor).await.unwrap();
    assert_eq!(decoded, "run(member(X,[a,b,c]), -1)");
}

#[tokio::test]
async fn declared_length_matches_encoded_bytes() {
    let encoded = encode("x");
    // "<len>.\n" prefix followed by "x.\n" (3 bytes): declared length is 3.
    assert_eq!(encoded, b"3.\nx.\n");
}

#[tokio::test]
async fn empty_payload_round_trips() {
    let encoded = encode("");
    let mut cursor = Cursor::new(encoded);
    let decoded = read_frame(&mut cursor).await.unwrap();
    assert_eq!(decoded, "");
}

#[tokio::test]
async fn non_numeric_length_is_a_frame_error() {
    let mut cursor = Cursor::new(b"abc.\nxyz.\n".to_vec());
    let err = read_frame(&mut cursor).await.unwrap_err();
    assert_eq!(err, FrameError::BadLength);
}

#[tokio::test]
async fn missing_length_newline_is_a_frame_error() {
    // Length digits parse fine ("3"), but the byte after the length's
    // terminating "." is not "\n".
    let mut cursor = Cursor::new(b"3.xyz.\n".to_vec());
    let err = read_frame(&mut cursor).await.unwrap_err();
    assert_eq!(err, FrameError::MissingLengthNewline);
}

#[tokio::test]
async fn premature_eof_is_connection_closed() {
    let mut cursor = Cursor::new(b"10.\nabc".to_vec());
    let err = read_frame(&mut cursor).await.unwrap_err();
    assert_eq!(err, FrameError::ConnectionClosed);
}

#[tokio::test]
async fn payload_without_terminator_is_a_frame_error() {
    // declared length 3, payload "abc" does not end with ".\n"
    let mut cursor = Cursor::new(b"3.\nabc".to_vec());
    let err = read_frame(&mut cursor).await.unwrap_err();
    assert_eq!(err, FrameError::MissingPayloadTerminator);
}
