use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

use crate::storage::{Attribute, KeyMap};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("continuation token is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("continuation token is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("continuation token does not identify a file")]
    MissingFileId,
}

/// Encode a record key as an opaque, header-safe continuation token.
pub fn encode(key: &KeyMap) -> Result<String, TokenError> {
    let json = serde_json::to_vec(key)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a continuation token produced by [`encode`].
pub fn decode(token: &str) -> Result<KeyMap, TokenError> {
    let json = URL_SAFE_NO_PAD.decode(token.trim())?;
    let key: KeyMap = serde_json::from_slice(&json)?;
    if !key.contains_key(&Attribute::FileId) {
        return Err(TokenError::MissingFileId);
    }
    Ok(key)
}
