//! Wire codec: JSON payload rendered as lowercase hex.
//!
//! Quirks kept for compatibility with existing clients:
//! - a leading `0a00` is dropped from encoded output
//! - some clients insert `3120300a` at hex offset 62; it is removed before decoding
//! - trailing NUL bytes (zero-filled read buffers) are ignored
//!
//! Compact JSON never contains a raw newline, so the offset-62 pattern cannot
//! occur in a well-formed frame.

use std::borrow::Cow;

use bytes::Bytes;
use contracts::{RequestMessage, ResponseMessage};
use serde::{de::DeserializeOwned, Serialize};

use crate::{IpcError, Result};

const DROPPED_PREFIX: &str = "0a00";
const INSERTED_PATTERN: &[u8] = b"3120300a";
const INSERTED_OFFSET: usize = 62;

pub fn encode_request(message: &RequestMessage) -> Result<Bytes> {
    encode(message)
}

pub fn decode_request(frame: &[u8]) -> Result<RequestMessage> {
    decode(frame)
}

pub fn encode_response(message: &ResponseMessage) -> Result<Bytes> {
    encode(message)
}

pub fn decode_response(frame: &[u8]) -> Result<ResponseMessage> {
    decode(frame)
}

fn encode<T: Serialize>(message: &T) -> Result<Bytes> {
    let json = serde_json::to_vec(message)
        .map_err(|e| IpcError::codec(format!("serialize failed: {e}")))?;
    let mut text = hex::encode(json);
    if text.starts_with(DROPPED_PREFIX) {
        text.drain(..DROPPED_PREFIX.len());
    }
    Ok(Bytes::from(text))
}

fn decode<T: DeserializeOwned>(frame: &[u8]) -> Result<T> {
    let frame = strip_inserted(trim_nul(frame));
    let json = hex::decode(frame.as_ref()).map_err(|e| IpcError::codec(format!("invalid hex: {e}")))?;
    serde_json::from_slice(&json).map_err(|e| IpcError::codec(format!("invalid message: {e}")))
}

fn trim_nul(frame: &[u8]) -> &[u8] {
    let end = frame.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &frame[..end]
}

fn strip_inserted(frame: &[u8]) -> Cow<'_, [u8]> {
    let end = INSERTED_OFFSET + INSERTED_PATTERN.len();
    if frame.get(INSERTED_OFFSET..end) == Some(INSERTED_PATTERN) {
        let mut owned = Vec::with_capacity(frame.len() - INSERTED_PATTERN.len());
        owned.extend_from_slice(&frame[..INSERTED_OFFSET]);
        owned.extend_from_slice(&frame[end..]);
        Cow::Owned(owned)
    } else {
        Cow::Borrowed(frame)
    }
}
