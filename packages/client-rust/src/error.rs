use fieldgate_core::{ErrorCategory, ErrorDescriptor};

use crate::transport::TransportError;

/// Errors from parsing or reading an operation document.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("operation '{name}' is defined more than once")]
    DuplicateOperation { name: String },
    #[error("query or mutation with name {name} not found")]
    UnknownOperation { name: String },
    #[error("operation '{name}' has unbalanced delimiters")]
    Unbalanced { name: String },
}

/// Errors surfaced by [`GraphQLClient`](crate::GraphQLClient).
///
/// Every variant carries the correlation id of the call when one was given.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Setup problem. Never retried.
    #[error("client misconfigured: {source}")]
    Configuration {
        correlation_id: Option<String>,
        #[source]
        source: StoreError,
    },
    #[error("invalid client setting: {message}")]
    InvalidSetting { message: String },
    /// The transport failed on every attempt.
    #[error("connection to {uri} failed after {attempts} attempt(s): {source}")]
    Connection {
        correlation_id: Option<String>,
        uri: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },
    /// The server rejected the request.
    #[error("{0}")]
    Protocol(ErrorDescriptor),
    /// The response envelope did not have the expected shape.
    #[error("unexpected protocol format for '{operation}': {message}")]
    Format {
        correlation_id: Option<String>,
        operation: String,
        message: String,
    },
}

impl ClientError {
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            Self::Configuration { correlation_id, .. }
            | Self::Connection { correlation_id, .. }
            | Self::Format { correlation_id, .. } => correlation_id.as_deref(),
            Self::Protocol(descriptor) => descriptor.correlation_id.as_deref(),
            Self::InvalidSetting { .. } => None,
        }
    }

    /// Normalized description of this failure.
    #[must_use]
    pub fn descriptor(&self) -> ErrorDescriptor {
        let correlation_id = self.correlation_id().map(str::to_string);
        match self {
            Self::Protocol(descriptor) => descriptor.clone(),
            Self::Configuration { .. } | Self::InvalidSetting { .. } => {
                ErrorDescriptor::new(ErrorCategory::Misconfiguration, "MISCONFIGURATION", self.to_string())
                    .with_correlation_id(correlation_id)
            }
            Self::Connection { uri, .. } => ErrorDescriptor::new(
                ErrorCategory::NoResponse,
                "CONNECTION_FAILED",
                "Unknown communication problem on GraphQL client",
            )
            .with_detail("uri", uri.clone())
            .with_cause(self.to_string())
            .with_correlation_id(correlation_id),
            Self::Format { message, .. } => {
                ErrorDescriptor::bad_request("BAD_FORMAT", "Unexpected protocol format")
                    .with_cause(message.clone())
                    .with_correlation_id(correlation_id)
            }
        }
    }
}
