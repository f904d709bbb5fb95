//! Wire protocol for host responses.

use psbridge_core::{BridgeError, CommandResult, CommandStatus, CorrelationId};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

/// Response body sent back by the host proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseBody {
    /// Echoed correlation id, when the proxy includes it.
    #[serde(default)]
    pub id: Option<String>,
    /// Outcome tag.
    pub status: CommandStatus,
    /// Payload, present on success.
    #[serde(default)]
    pub response: Option<Value>,
    /// Message (or `{message, code}` object), present on error.
    #[serde(default)]
    pub error: Option<Value>,
}

impl ResponseBody {
    /// Parse a raw response body.
    ///
    /// # Errors
    /// Returns `BridgeError::Protocol` if the body is not a response object.
    pub fn parse(body: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(body)
            .map_err(|e| BridgeError::Protocol(format!("Failed to parse response: {e}")))
    }

    /// Convert into a `CommandResult`, checking correlation.
    ///
    /// # Errors
    /// Returns `BridgeError::Protocol` if the echoed id belongs to another
    /// envelope or an ERROR response carries no message.
    pub fn into_result(self, expected: CorrelationId) -> Result<CommandResult, BridgeError> {
        if let Some(id) = self.id.as_deref() {
            if Uuid::parse_str(id).ok() != Some(expected) {
                return Err(BridgeError::Protocol(format!(
                    "Response id {id} does not match request {expected}"
                )));
            }
        }

        match self.status {
            CommandStatus::Success => Ok(CommandResult::Success(
                self.response.unwrap_or(Value::Null),
            )),
            CommandStatus::Error => self
                .error
                .and_then(error_message)
                .map(CommandResult::Error)
                .ok_or_else(|| {
                    BridgeError::Protocol("ERROR response without an error message".to_string())
                }),
        }
    }
}

/// Parse a raw body and convert it for the given envelope id.
///
/// # Errors
/// See [`ResponseBody::parse`] and [`ResponseBody::into_result`].
pub fn parse_result(body: &str, expected: CorrelationId) -> Result<CommandResult, BridgeError> {
    ResponseBody::parse(body)?.into_result(expected)
}

fn error_message(error: Value) -> Option<String> {
    match error {
        Value::Null => None,
        Value::String(message) => Some(message),
        Value::Object(ref fields) => match fields.get("message") {
            Some(Value::String(message)) => Some(message.clone()),
            _ => Some(error.to_string()),
        },
        other => Some(other.to_string()),
    }
}
