/// Error handling for the client
///
/// This module provides the unified error type every store and transport
/// operation returns. Callers match on the variant to decide presentation;
/// nothing in this library retries, logs-and-swallows a mutation failure,
/// or terminates the process.
///
/// # Taxonomy
///
/// - [`ClientError::Network`]: timeout or connectivity failure, no response
/// - [`ClientError::Http`]: the server answered with a non-2xx status
/// - [`ClientError::Precondition`]: operation attempted without the session
///   state it requires (e.g. creating a task while logged out)
/// - [`ClientError::Validation`]: request body rejected before dispatch
/// - [`ClientError::Storage`]: credential storage failed
/// - [`ClientError::Serialization`]: a body could not be encoded or decoded
///
/// # Example
///
/// ```
/// use taskdeck_client::error::ClientError;
///
/// let err = ClientError::Precondition("No authenticated user".to_string());
/// assert_eq!(err.to_string(), "Precondition failed: No authenticated user");
/// ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::credentials::StorageError;

/// Client result type alias
pub type ClientResult<T> = Result<T, ClientError>;

/// Unified client error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Timeout or connectivity failure; the server never answered
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response, with the response body when one was readable
    #[error("HTTP {status}: {}", body_text(.body))]
    Http {
        /// HTTP status code
        status: u16,

        /// Decoded response body, or the raw text when it was not JSON
        body: Option<JsonValue>,
    },

    /// Operation attempted without its required session state
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Request body failed client-side validation; no request was sent
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<ValidationErrorDetail>),

    /// Credential storage failure
    #[error("Credential storage error: {0}")]
    Storage(#[from] StorageError),

    /// A request or response body could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ClientError {
    /// HTTP status of the failure, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convert validator output into the flat detail list
impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ClientError::Validation(details)
    }
}

/// Best human-readable rendering of an error response body
///
/// Servers answer with a bare string, a `{"message": ...}` / `{"error": ...}`
/// object, or arbitrary JSON; the literal payload is preserved either way so
/// callers can show exactly what the server said.
fn body_text(body: &Option<JsonValue>) -> String {
    match body {
        None => "no response body".to_string(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(value) => {
            if let Some(message) = value.get("message").and_then(JsonValue::as_str) {
                return message.to_string();
            }
            if let Some(message) = value.get("error").and_then(JsonValue::as_str) {
                return message.to_string();
            }
            value.to_string()
        }
    }
}
