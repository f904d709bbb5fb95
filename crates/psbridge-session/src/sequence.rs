//! Ordered command sequences.

use serde::Serialize;
use serde_json::Value;

use crate::target::{self, LayerId};

/// One step of a sequence, not yet wrapped in an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubCommand {
    pub operation: String,
    pub params: Value,
}

impl SubCommand {
    /// Create a sub-command.
    #[must_use]
    pub fn new(operation: impl Into<String>, params: Value) -> Self {
        Self {
            operation: operation.into(),
            params,
        }
    }
}

/// Primary steps plus an optional restoration step.
///
/// The restoration step runs after the primary steps whether or not they
/// succeeded, and puts the host's targeting state back into a neutral
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    steps: Vec<SubCommand>,
    restore: Option<SubCommand>,
}

impl Sequence {
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a sequence by selecting the layer with `id`.
    #[must_use]
    pub fn targeting(id: LayerId) -> Self {
        Self::new().then(target::select_layer(id))
    }

    /// Append a primary step.
    #[must_use]
    pub fn then(mut self, step: SubCommand) -> Self {
        self.steps.push(step);
        self
    }

    /// Declare the restoration step.
    #[must_use]
    pub fn restore_with(mut self, step: SubCommand) -> Self {
        self.restore = Some(step);
        self
    }

    /// Primary steps, in order.
    #[must_use]
    pub fn steps(&self) -> &[SubCommand] {
        &self.steps
    }

    /// Restoration step, if declared.
    #[must_use]
    pub const fn restore(&self) -> Option<&SubCommand> {
        self.restore.as_ref()
    }

    /// Whether the sequence has no primary steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of primary steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

impl FromIterator<SubCommand> for Sequence {
    fn from_iter<I: IntoIterator<Item = SubCommand>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
            restore: None,
        }
    }
}
