//! Length-prefix framing: a 4-byte big-endian length header followed by
//! a JSON payload. `encode`/`decode` handle the JSON half only;
//! `write_message`/`read_message` add/strip the length prefix over any
//! `AsyncWrite`/`AsyncRead` (a Unix socket, a TCP stream, an in-memory
//! buffer in tests).

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("json encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("message exceeds max frame size ({0} bytes)")]
    FrameTooLarge(usize),
}

/// Maximum accepted frame size: guards `read_message` against a
/// corrupted or hostile length prefix asking for an unbounded
/// allocation.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Serialize `value` to JSON. No length prefix — callers that need
/// framing use [`write_message`] on top of this.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize a JSON payload previously produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write `data` as one length-prefixed frame: a 4-byte big-endian length
/// followed by `data` itself.
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, data: &[u8]) -> Result<(), ProtocolError> {
    if data.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(data.len()));
    }
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame: a 4-byte big-endian length followed
/// by that many bytes of payload.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
