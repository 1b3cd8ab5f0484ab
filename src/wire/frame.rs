//! Length-prefixed UTF-8 text frames (spec.md §4.1):
//!
//! ```text
//! <decimal-length>.\n<payload-bytes>.\n
//! ```
//!
//! `<decimal-length>` counts the payload bytes *including* the trailing
//! `.\n`. The codec is oblivious to payload content; it just moves bytes.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::FrameError;

/// Read one frame and return its payload with the trailing `.\n` already
/// stripped off.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, FrameError> {
    let mut digits = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        match reader.read_exact(&mut byte).await {
            Ok(_) => {}
            Err(_) => return Err(FrameError::ConnectionClosed),
        }
        if byte[0] == b'.' {
            break;
        }
        digits.push(byte[0]);
    }

    let mut newline = [0u8; 1];
    reader
        .read_exact(&mut newline)
        .await
        .map_err(|_| FrameError::ConnectionClosed)?;
    if newline[0] != b'\n' {
        return Err(FrameError::MissingLengthNewline);
    }

    let declared_len: usize = std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(FrameError::BadLength)?;

    let mut payload = vec![0u8; declared_len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|_| FrameError::ConnectionClosed)?;

    if !payload.ends_with(b".\n") {
        return Err(FrameError::MissingPayloadTerminator);
    }
    payload.truncate(payload.len() - 2);

    String::from_utf8(payload).map_err(|_| FrameError::MissingPayloadTerminator)
}

/// Encode `payload` (without a trailing `.\n` — this function adds it)
/// into a complete frame.
pub fn encode(payload: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(payload.len() + 2);
    body.extend_from_slice(payload.as_bytes());
    body.extend_from_slice(b".\n");

    let mut frame = Vec::with_capacity(body.len() + 16);
    frame.extend_from_slice(body.len().to_string().as_bytes());
    frame.push(b'.');
    frame.push(b'\n');
    frame.extend_from_slice(&body);
    frame
}

/// Write `payload` as one complete frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &str,
) -> std::io::Result<()> {
    writer.write_all(&encode(payload)).await?;
    writer.flush().await
}

/// Write the single raw `.` heartbeat byte (spec.md §4.2 Running-sync,
/// §9 "Heartbeat design"). Never framed — the client strips leading `.`
/// bytes before reading the next length prefix.
pub async fn write_heartbeat<W: AsyncWrite + Unpin>(writer: &mut W) -> std::io::Result<()> {
    writer.write_all(b".").await?;
    writer.flush().await
}

#[cfg(test)]
mod frame_tests;
