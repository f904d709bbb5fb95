//! Core traits for host transports.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{BridgeError, CommandEnvelope, CommandResult};

/// Trait for host transports.
///
/// Implementations perform exactly one round trip per call and never retry.
/// Transports are owned by spawned sequence tasks, hence `'static`.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send an envelope and wait for the host's result.
    ///
    /// A well-formed ERROR response is returned as `Ok(CommandResult::Error)`.
    ///
    /// # Errors
    /// Returns `Transport`, `Timeout` or `Protocol` errors for round-trip
    /// failures.
    async fn send(&self, envelope: &CommandEnvelope) -> Result<CommandResult, BridgeError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, envelope: &CommandEnvelope) -> Result<CommandResult, BridgeError> {
        (**self).send(envelope).await
    }
}
