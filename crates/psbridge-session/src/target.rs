//! Target resolution.
//!
//! The host has no "act on layer N" primitive: most actions apply to the
//! currently selected layer or active channel. These helpers build the
//! selection steps that move that state before a targeted action runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::sequence::SubCommand;

/// Reserved operation that executes raw host descriptors.
pub const PASSTHROUGH_OPERATION: &str = "executeBatchPlayCommand";

/// Host identifier of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LayerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Addressable channel of the selected layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Composite colour channel.
    Rgb,
    /// Layer mask.
    Mask,
}

impl Channel {
    const fn host_name(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Mask => "mask",
        }
    }
}

/// Wrap raw descriptors as one passthrough sub-command.
#[must_use]
pub fn batch(descriptors: Vec<Value>) -> SubCommand {
    SubCommand::new(PASSTHROUGH_OPERATION, json!({ "commands": descriptors }))
}

fn select_layer_descriptor(id: LayerId) -> Value {
    json!({
        "_obj": "select",
        "_target": [{"_ref": "layer", "_id": id.0}],
        "makeVisible": false,
        "_isCommand": true
    })
}

/// Make `id` the sole selected layer.
#[must_use]
pub fn select_layer(id: LayerId) -> SubCommand {
    batch(vec![select_layer_descriptor(id)])
}

/// Add `id` to the current layer selection.
#[must_use]
pub fn add_layer_to_selection(id: LayerId) -> SubCommand {
    let mut descriptor = select_layer_descriptor(id);
    descriptor["selectionModifier"] = json!({
        "_enum": "selectionModifierType",
        "_value": "addToSelection"
    });
    batch(vec![descriptor])
}

/// Activate `channel` on the selected layer.
#[must_use]
pub fn select_channel(channel: Channel) -> SubCommand {
    batch(vec![json!({
        "_obj": "select",
        "_target": [{"_ref": "channel", "_enum": "channel", "_value": channel.host_name()}],
        "makeVisible": false,
        "_isCommand": true
    })])
}
