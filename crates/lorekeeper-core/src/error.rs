use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating untrusted tokens at the engine boundary.
///
/// Every variant is a client error: the caller supplied a node kind,
/// relationship type, direction, or property value the engine does not accept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid node type specified: {0}")]
    InvalidNodeType(String),

    #[error("Invalid relationship type: {0}")]
    InvalidRelationshipType(String),

    #[error("Invalid direction parameter: {0}")]
    InvalidDirection(String),

    #[error("Invalid value for property '{key}': {reason}")]
    InvalidPropertyValue { key: String, reason: String },
}

/// Coarse failure category reported to callers of the relationship engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Forbidden,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}
