//! Error taxonomy for the bridge.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::CommandResult;

/// Bridge error.
///
/// Every layer surfaces these unchanged; nothing is retried or swallowed.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The host (or its proxy) could not be reached.
    #[error("Host unreachable at {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
    /// No response arrived within the configured duration.
    #[error("No response from host within {0:?}")]
    Timeout(Duration),
    /// The response body did not have the expected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),
    /// The host answered with a well-formed ERROR response.
    #[error("Host error: {message}")]
    Application { message: String },
    /// Caller arguments violate a precondition; nothing was sent.
    #[error("Invalid arguments: {0}")]
    Validation(String),
    /// A sequence stopped at a step the host rejected.
    #[error("{0}")]
    SequenceAborted(Box<SequenceAbort>),
    /// A sequence step's round trip failed after which a restoration step
    /// was still issued.
    #[error("{0}")]
    SequenceFailed(Box<SequenceFailure>),
    /// Every primary step succeeded but the restoration step did not.
    #[error("{0}")]
    RestoreFailed(Box<RestoreFailure>),
    /// A guarded task ended without producing a result, e.g. because the
    /// runtime shut down.
    #[error("Guarded task interrupted: {0}")]
    Interrupted(String),
    /// Session settings are invalid or conflict with the configured ones.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Whether the failure happened below the application level
    /// (unreachable host, timeout, malformed response).
    #[must_use]
    pub fn is_transport_class(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout(_) | Self::Protocol(_) => true,
            Self::SequenceFailed(failure) => failure.error.is_transport_class(),
            _ => false,
        }
    }

    /// The restoration outcome carried by a sequence error, if any.
    #[must_use]
    pub fn restore_outcome(&self) -> Option<&RestoreOutcome> {
        match self {
            Self::SequenceAborted(abort) => Some(&abort.restore),
            Self::SequenceFailed(failure) => Some(&failure.restore),
            Self::RestoreFailed(failure) => Some(&failure.restore),
            _ => None,
        }
    }
}

/// What happened to a sequence's restoration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RestoreOutcome {
    /// The sequence declared no restoration step.
    NotApplicable,
    /// The restoration step succeeded.
    Succeeded,
    /// The host rejected the restoration step.
    Failed { message: String },
    /// The restoration step was issued but its round trip failed, so its
    /// effect on the host is unknown.
    Attempted { message: String },
}

impl fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => write!(f, "no restore step"),
            Self::Succeeded => write!(f, "restored"),
            Self::Failed { message } => write!(f, "restore failed: {message}"),
            Self::Attempted { message } => write!(f, "restore outcome unknown: {message}"),
        }
    }
}

/// Details of an aborted sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceAbort {
    /// Zero-based index of the failing primary step.
    pub step: usize,
    /// Operation name of the failing step.
    pub operation: String,
    /// Result the host returned for the failing step.
    pub result: CommandResult,
    /// Outcome of the restoration step.
    pub restore: RestoreOutcome,
}

impl fmt::Display for SequenceAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sequence aborted at step {} ({}): {} ({})",
            self.step,
            self.operation,
            self.result.error().unwrap_or("unknown host error"),
            self.restore
        )
    }
}

impl From<SequenceAbort> for BridgeError {
    fn from(abort: SequenceAbort) -> Self {
        Self::SequenceAborted(Box::new(abort))
    }
}

/// A sequence step whose round trip failed, with the restoration outcome.
#[derive(Debug)]
pub struct SequenceFailure {
    /// Zero-based index of the failing primary step.
    pub step: usize,
    /// Operation name of the failing step.
    pub operation: String,
    /// The round-trip error, unchanged.
    pub error: BridgeError,
    /// Outcome of the restoration step.
    pub restore: RestoreOutcome,
}

impl fmt::Display for SequenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sequence failed at step {} ({}): {} ({})",
            self.step, self.operation, self.error, self.restore
        )
    }
}

impl From<SequenceFailure> for BridgeError {
    fn from(failure: SequenceFailure) -> Self {
        Self::SequenceFailed(Box::new(failure))
    }
}

/// A completed sequence whose restoration step failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreFailure {
    /// Result of the final primary step, which did take effect.
    pub result: CommandResult,
    /// Outcome of the restoration step.
    pub restore: RestoreOutcome,
}

impl fmt::Display for RestoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence completed but host targeting is dirty: {}", self.restore)
    }
}

impl From<RestoreFailure> for BridgeError {
    fn from(failure: RestoreFailure) -> Self {
        Self::RestoreFailed(Box::new(failure))
    }
}
