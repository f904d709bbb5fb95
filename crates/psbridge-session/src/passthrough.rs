//! Raw descriptor passthrough.

use psbridge_core::BridgeError;
use serde_json::Value;

use crate::sequence::Sequence;
use crate::target::{self, LayerId};

/// Build the sequence forwarding `descriptors` verbatim to the host.
///
/// Descriptor contents are not inspected. When `target` is given the layer
/// is selected first. No restoration step is added; descriptors that change
/// targeting are expected to restore it themselves.
///
/// # Errors
/// Returns `BridgeError::Validation` if `descriptors` is empty.
pub fn passthrough_sequence(
    descriptors: Vec<Value>,
    target: Option<LayerId>,
) -> Result<Sequence, BridgeError> {
    if descriptors.is_empty() {
        return Err(BridgeError::Validation(
            "descriptor list cannot be empty".to_string(),
        ));
    }

    let sequence = target.map_or_else(Sequence::new, Sequence::targeting);
    Ok(sequence.then(target::batch(descriptors)))
}
