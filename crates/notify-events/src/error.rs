//! Errors a miner can raise when an operation it recognizes carries
//! malformed data it cannot mine an event from.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed custom_json payload for id {id:?}: {source}")]
    MalformedCustomJson { id: String, source: serde_json::Error },
}
