//! Parse-time errors for chain-domain primitives.

use thiserror::Error;

/// Errors raised while turning raw chain data into domain types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A `custom_json` operation carried a payload that did not match its
    /// declared id (e.g. `follow` id with a non-follow body).
    #[error("malformed {id} payload: {reason}")]
    MalformedPayload { id: String, reason: String },

    /// A content URL did not match the `@author/permlink` shape.
    #[error("not a valid content id: {0:?}")]
    InvalidContentId(String),
}
