//! Error types for the convenience boundary. Inside the interpreter errors
//! are plain data ([`ParseErrors`]); these types exist for callers that want
//! a `std::error::Error`.
use thiserror::Error;

use crate::parse_result::ParseErrors;

/// A failed parse, rendered with [`crate::format::format_errors`].
#[derive(Debug, Error)]
#[error("{errors}")]
pub struct ParseFailure {
    pub errors: ParseErrors,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseFailure),

    /// The decoded value did not fit the requested Rust type.
    #[error("at JSON path {path} → {source}")]
    Deserialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
