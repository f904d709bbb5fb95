//! Single-command dispatch.

use std::sync::Arc;

use psbridge_core::{BridgeError, CommandResult, EnvelopeBuilder, Transport};
use serde_json::Value;

/// Builds an envelope per call and sends it over the transport.
///
/// Holds no guard: single commands that do not depend on host targeting
/// state may run concurrently with anything.
pub struct Dispatcher<T: ?Sized> {
    builder: EnvelopeBuilder,
    transport: Arc<T>,
}

impl<T: ?Sized> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            builder: self.builder.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> Dispatcher<T>
where
    T: Transport + ?Sized,
{
    /// Create a dispatcher stamping envelopes with `builder`'s app tag.
    #[must_use]
    pub const fn new(builder: EnvelopeBuilder, transport: Arc<T>) -> Self {
        Self { builder, transport }
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Send one command and return the host's result.
    ///
    /// # Errors
    /// Returns `Validation` for invalid arguments (nothing is sent), or the
    /// transport's error for a failed round trip.
    pub async fn dispatch(
        &self,
        operation: &str,
        params: Value,
    ) -> Result<CommandResult, BridgeError> {
        let envelope = self.builder.build(operation, params)?;
        self.transport.send(&envelope).await
    }
}
