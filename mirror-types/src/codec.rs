//! The project's one wire-framing convention: a big-endian `u32`
//! byte-length prefix followed by a JSON body. Used only for the
//! peer-client record, since every other external interface in this
//! core is a narrow trait method rather than a wire format.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("frame is shorter than its length prefix: have {have}, want {want}")]
    Truncated { have: usize, want: usize },
    #[error("frame is missing its 4-byte length prefix")]
    MissingPrefix,
    #[error("failed to decode message body")]
    BadMessage(#[source] serde_json::Error),
    #[error("failed to encode message body")]
    Encode(#[source] serde_json::Error),
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    let body = serde_json::to_vec(value).map_err(Error::Encode)?;
    let len = u32::try_from(body.len()).unwrap_or(u32::MAX);
    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(&body);
    Ok(framed)
}

pub fn decode<T: DeserializeOwned>(framed: &[u8]) -> Result<T, Error> {
    if framed.len() < 4 {
        return Err(Error::MissingPrefix);
    }
    let (prefix, body) = framed.split_at(4);
    let want = u32::from_be_bytes(prefix.try_into().expect("checked length")) as usize;
    if body.len() < want {
        return Err(Error::Truncated {
            have: body.len(),
            want,
        });
    }
    serde_json::from_slice(&body[..want]).map_err(Error::BadMessage)
}
