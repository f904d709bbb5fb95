//! Tool layer errors.

use psbridge_core::BridgeError;
use thiserror::Error;

use crate::image::ImageError;

/// Error from a named tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("Image payload error: {0}")]
    Image(#[from] ImageError),
    #[error("Invalid tool call: {0}")]
    InvalidCall(String),
}

impl ToolError {
    /// The bridge error, if this failure came from the bridge.
    #[must_use]
    pub const fn bridge(&self) -> Option<&BridgeError> {
        match self {
            Self::Bridge(e) => Some(e),
            _ => None,
        }
    }
}
