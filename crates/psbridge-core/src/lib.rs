//! Core abstractions for the Photoshop command bridge.
//!
//! This crate provides the fundamental building blocks:
//! - `CommandEnvelope` / `EnvelopeBuilder` - Correlated request envelopes
//! - `CommandResult` - One host outcome per envelope
//! - `BridgeError` - Error taxonomy shared by every layer
//! - `Session` - Process-wide connection settings
//! - `Transport` trait

pub mod envelope;
pub mod error;
pub mod result;
pub mod session;
pub mod traits;

pub use envelope::{CommandEnvelope, CorrelationId, EnvelopeBuilder};
pub use error::{BridgeError, RestoreFailure, RestoreOutcome, SequenceAbort, SequenceFailure};
pub use result::{CommandResult, CommandStatus};
pub use session::Session;
pub use traits::Transport;
