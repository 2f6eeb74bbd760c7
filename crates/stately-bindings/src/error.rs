#![forbid(unsafe_code)]

//! Errors raised while moving state between sessions.

use thiserror::Error;

/// Failure to encode or decode a [`DehydratedState`](crate::DehydratedState).
#[derive(Debug, Error)]
pub enum HydrateError {
    #[error("failed to encode dehydrated state: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode dehydrated state: {0}")]
    Decode(#[source] serde_json::Error),
}

pub type HydrateResult<T> = Result<T, HydrateError>;
