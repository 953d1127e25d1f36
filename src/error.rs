//! Error types for the Hemmer provider bridge.

use thiserror::Error;

use crate::hash::HashError;

/// Errors that can occur while bridging a provider.
///
/// Every error is scoped to a single resource evaluation: a failure diffing
/// one resource never affects the evaluation of another.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A value does not have the shape its schema declares.
    #[error("Unexpected type at field {path}: expected {expected}, got {got}")]
    UnexpectedType {
        /// Dotted path of the offending field.
        path: String,
        /// The shape the schema declares.
        expected: &'static str,
        /// The shape that was found.
        got: &'static str,
    },

    /// A set element's identity could not be computed.
    #[error("Cannot identify set element at {path}: {source}")]
    SetHash {
        /// Dotted path of the set.
        path: String,
        /// Why hashing failed.
        #[source]
        source: HashError,
    },

    /// A value violates a structural constraint of its schema.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A validation error that must be surfaced to the user.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The upstream provider reported an error.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Invalid request from client.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Create an [`BridgeError::UnexpectedType`] error.
    pub fn unexpected_type(
        path: impl std::fmt::Display,
        expected: &'static str,
        got: &'static str,
    ) -> Self {
        Self::UnexpectedType {
            path: path.to_string(),
            expected,
            got,
        }
    }

    /// Get the error message as a string.
    pub fn message(&self) -> String {
        match self {
            Self::UnexpectedType { .. } | Self::SetHash { .. } => self.to_string(),
            Self::InvalidValue(msg) => msg.clone(),
            Self::Validation(msg) => msg.clone(),
            Self::UnknownResource(msg) => msg.clone(),
            Self::NotFound(msg) => msg.clone(),
            Self::Provider(msg) => msg.clone(),
            Self::InvalidRequest(msg) => msg.clone(),
            Self::Serialization(_err) => "serialization error (see Debug output)".to_string(),
        }
    }
}

impl From<BridgeError> for tonic::Status {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::UnexpectedType { .. } => tonic::Status::invalid_argument(err.to_string()),
            BridgeError::SetHash { .. } => tonic::Status::failed_precondition(err.to_string()),
            BridgeError::InvalidValue(msg) => tonic::Status::invalid_argument(msg),
            BridgeError::Validation(msg) => tonic::Status::invalid_argument(msg),
            BridgeError::UnknownResource(msg) => tonic::Status::not_found(msg),
            BridgeError::NotFound(msg) => tonic::Status::not_found(msg),
            BridgeError::Provider(msg) => tonic::Status::internal(msg),
            BridgeError::InvalidRequest(msg) => tonic::Status::invalid_argument(msg),
            BridgeError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
        }
    }
}
