//! Host command outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::BridgeError;

/// Status tag carried by every host response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatus {
    /// The host executed the command.
    Success,
    /// The host rejected or failed the command.
    Error,
}

/// Outcome of one envelope.
///
/// An `Error` result is a successful round trip carrying an unsuccessful
/// application outcome; transport failures never produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Operation-specific payload returned by the host.
    Success(Value),
    /// Error message reported by the host.
    Error(String),
}

impl CommandResult {
    /// Status tag of this result.
    #[must_use]
    pub const fn status(&self) -> CommandStatus {
        match self {
            Self::Success(_) => CommandStatus::Success,
            Self::Error(_) => CommandStatus::Error,
        }
    }

    /// Whether the host reported success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The success payload, if any.
    #[must_use]
    pub const fn response(&self) -> Option<&Value> {
        match self {
            Self::Success(response) => Some(response),
            Self::Error(_) => None,
        }
    }

    /// The host error message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Error(message) => Some(message),
        }
    }

    /// Convert into the success payload.
    ///
    /// # Errors
    /// Returns `BridgeError::Application` carrying the host's message if the
    /// host reported an error.
    pub fn into_result(self) -> Result<Value, BridgeError> {
        match self {
            Self::Success(response) => Ok(response),
            Self::Error(message) => Err(BridgeError::Application { message }),
        }
    }
}

impl Serialize for CommandResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("CommandResult", 2)?;
        state.serialize_field("status", &self.status())?;
        match self {
            Self::Success(response) => state.serialize_field("response", response)?,
            Self::Error(message) => state.serialize_field("error", message)?,
        }
        state.end()
    }
}
