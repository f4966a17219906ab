//! Normalized, serializable error record shared by server and client.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad classification of an error, mapped to an HTTP-like status.
///
/// Serialized by name; unrecognized names deserialize as `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCategory {
    #[default]
    Unknown,
    Internal,
    Misconfiguration,
    InvalidState,
    NoResponse,
    FailedInvocation,
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    Unsupported,
}

const CATEGORY_NAMES: [(ErrorCategory, &str); 11] = [
    (ErrorCategory::Unknown, "Unknown"),
    (ErrorCategory::Internal, "Internal"),
    (ErrorCategory::Misconfiguration, "Misconfiguration"),
    (ErrorCategory::InvalidState, "InvalidState"),
    (ErrorCategory::NoResponse, "NoResponse"),
    (ErrorCategory::FailedInvocation, "FailedInvocation"),
    (ErrorCategory::BadRequest, "BadRequest"),
    (ErrorCategory::Unauthorized, "Unauthorized"),
    (ErrorCategory::NotFound, "NotFound"),
    (ErrorCategory::Conflict, "Conflict"),
    (ErrorCategory::Unsupported, "Unsupported"),
];

impl ErrorCategory {
    #[must_use]
    pub fn name(self) -> &'static str {
        CATEGORY_NAMES
            .iter()
            .find(|(c, _)| *c == self)
            .map_or("Unknown", |(_, n)| n)
    }

    /// Status code conventionally reported for this category.
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Unsupported => 501,
            Self::NoResponse => 503,
            Self::Unknown
            | Self::Internal
            | Self::Misconfiguration
            | Self::InvalidState
            | Self::FailedInvocation => 500,
        }
    }

    /// Name of the error kind conventionally paired with this category.
    #[must_use]
    pub fn kind_name(self) -> &'static str {
        match self {
            Self::Unknown => "UnknownException",
            Self::Internal => "InternalException",
            Self::Misconfiguration => "ConfigException",
            Self::InvalidState => "InvalidStateException",
            Self::NoResponse => "ConnectionException",
            Self::FailedInvocation => "InvocationException",
            Self::BadRequest => "BadRequestException",
            Self::Unauthorized => "UnauthorizedException",
            Self::NotFound => "NotFoundException",
            Self::Conflict => "ConflictException",
            Self::Unsupported => "UnsupportedException",
        }
    }
}

impl From<String> for ErrorCategory {
    fn from(value: String) -> Self {
        CATEGORY_NAMES
            .iter()
            .find(|(_, n)| *n == value)
            .map_or(Self::Unknown, |(c, _)| *c)
    }
}

impl From<ErrorCategory> for String {
    fn from(value: ErrorCategory) -> Self {
        value.name().to_string()
    }
}

/// Normalized error record.
///
/// Produced by the client from transport failures and protocol error arrays,
/// and by handlers that want to report a typed failure to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// Kind name of the error (e.g. `BadRequestException`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: ErrorCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ErrorDescriptor {
    /// Creates a descriptor with the category's default kind name and status.
    #[must_use]
    pub fn new(category: ErrorCategory, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: Some(category.kind_name().to_string()),
            category,
            status: Some(category.status()),
            code: code.into(),
            message: message.into(),
            details: BTreeMap::new(),
            correlation_id: None,
            cause: None,
        }
    }

    #[must_use]
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::BadRequest, code, message)
    }

    #[must_use]
    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotFound, code, message)
    }

    #[must_use]
    pub fn unknown(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Unknown, code, message)
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorDescriptor {}
