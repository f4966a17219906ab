//! Response envelope handling: error normalization and entity extraction.

use fieldgate_core::ErrorDescriptor;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;

/// Code of errors built from a response's `errors` array.
pub const QUERY_ERROR: &str = "QUERY_ERROR";

/// Builds a descriptor from the first entry of an `errors` array.
///
/// A `path` is joined with `.`, appended to the message in parentheses and
/// stored under the `path` detail. Every `extensions` key is copied into
/// the details as `extensions.<key>`.
#[must_use]
pub fn parse_query_error(envelope: &Value, correlation_id: Option<&str>) -> Option<ErrorDescriptor> {
    let first = envelope.get("errors")?.as_array()?.first()?;

    let mut message = first
        .get("message")
        .map(scalar_to_string)
        .unwrap_or_default();
    let mut descriptor = ErrorDescriptor::bad_request(QUERY_ERROR, "");

    if let Some(segments) = first.get("path").and_then(Value::as_array) {
        let path = segments
            .iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(".");
        if !path.is_empty() {
            message = format!("{message} ({path})");
            descriptor = descriptor.with_detail("path", path);
        }
    }

    if let Some(extensions) = first.get("extensions").and_then(Value::as_object) {
        for (key, value) in extensions {
            descriptor = descriptor.with_detail(format!("extensions.{key}"), scalar_to_string(value));
        }
    }

    descriptor.message = message;
    Some(descriptor.with_correlation_id(correlation_id.map(str::to_string)))
}

/// Normalizes a failure response body into a descriptor.
///
/// Tries, in order: the first entry of an `errors` array, the whole body as
/// an error description, and finally an unknown error carrying the status
/// and raw body.
#[must_use]
pub fn normalize_error(status: u16, body: &str, correlation_id: Option<&str>) -> ErrorDescriptor {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if let Some(descriptor) = parsed
        .as_ref()
        .and_then(|envelope| parse_query_error(envelope, correlation_id))
    {
        return descriptor;
    }

    if let Some(mut descriptor) = parsed.and_then(|v| serde_json::from_value::<ErrorDescriptor>(v).ok()) {
        if descriptor.correlation_id.is_none() {
            descriptor.correlation_id = correlation_id.map(str::to_string);
        }
        return descriptor;
    }

    ErrorDescriptor::unknown(
        "UNKNOWN_ERROR",
        format!("UNKNOWN_ERROR with result status: '{status}'"),
    )
    .with_status(status)
    .with_detail("body", body)
    .with_correlation_id(correlation_id.map(str::to_string))
}

/// Reads `data.<operation>` from a success envelope and decodes it.
///
/// # Errors
///
/// Returns [`ClientError::Format`] when the field is missing or does not
/// decode as `T`.
pub fn extract_entity<T: DeserializeOwned>(
    envelope: &Value,
    operation: &str,
    correlation_id: Option<&str>,
) -> Result<T, ClientError> {
    let format_error = |message: String| ClientError::Format {
        correlation_id: correlation_id.map(str::to_string),
        operation: operation.to_string(),
        message,
    };

    let value = envelope
        .get("data")
        .and_then(|data| data.get(operation))
        .ok_or_else(|| format_error(format!("missing data.{operation}")))?;

    T::deserialize(value).map_err(|e| format_error(e.to_string()))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
