//! Layer operations.
//!
//! Target-by-id operations run as guarded sequences that select the layer
//! first. The rest are single commands the host resolves by id itself; they
//! may still move the host's selection, so they hold the guard too.

use psbridge_core::{BridgeError, Transport};
use psbridge_session::{Bridge, Channel, LayerId, Sequence, target};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::descriptor::{Descriptor, enumeration, paint_point};

/// Initial content of a new layer mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskFill {
    /// White mask, layer fully visible.
    #[default]
    RevealAll,
    /// Black mask, layer fully hidden.
    HideAll,
}

impl MaskFill {
    const fn host_name(self) -> &'static str {
        match self {
            Self::RevealAll => "revealAll",
            Self::HideAll => "hideAll",
        }
    }
}

/// Gradient geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
    Angle,
    Reflected,
    Diamond,
}

impl GradientKind {
    const fn host_name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Radial => "radial",
            Self::Angle => "angular",
            Self::Reflected => "reflected",
            Self::Diamond => "diamond",
        }
    }
}

/// Black-to-white gradient drawn into a layer mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskGradient {
    pub start_x: i64,
    pub start_y: i64,
    pub end_x: i64,
    pub end_y: i64,
    #[serde(rename = "gradient_type")]
    pub kind: GradientKind,
}

impl Default for MaskGradient {
    fn default() -> Self {
        Self {
            start_x: 0,
            start_y: 0,
            end_x: 0,
            end_y: 100,
            kind: GradientKind::Linear,
        }
    }
}

impl MaskGradient {
    fn descriptor(&self) -> Value {
        let stop = |gray: u8, location: u32| {
            json!({
                "_obj": "colorStop",
                "color": {"_obj": "grayscale", "gray": gray},
                "type": enumeration("colorStopType", "userStop"),
                "location": location,
                "midpoint": 50
            })
        };
        let opaque = |location: u32| {
            json!({
                "_obj": "transferSpec",
                "opacity": {"_unit": "percentUnit", "_value": 100},
                "location": location,
                "midpoint": 50
            })
        };

        let gradient = Descriptor::new("gradientClassEvent")
            .field("name", "Foreground to Background")
            .enumerated("gradientForm", "gradientForm", "customStops")
            .field("interfaceIconFrameDimmed", 4096)
            .field("colors", json!([stop(0, 0), stop(100, 4096)]))
            .field("transparency", json!([opaque(0), opaque(4096)]))
            .build_raw();

        Descriptor::new("gradientClassEvent")
            .field("from", paint_point(self.start_x, self.start_y))
            .field("to", paint_point(self.end_x, self.end_y))
            .enumerated("type", "gradientType", self.kind.host_name())
            .field("gradient", gradient)
            .unit("opacity", "percentUnit", 100)
            .build()
    }
}

/// Blend-if slider positions, each 0-255.
///
/// Feather points split each slider: `*_black_feather` sits above
/// `*_black` and `*_white_feather` below `*_white` for a smooth ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendIf {
    pub this_layer_black: u8,
    pub this_layer_black_feather: u8,
    pub this_layer_white: u8,
    pub this_layer_white_feather: u8,
    pub underlying_black: u8,
    pub underlying_black_feather: u8,
    pub underlying_white: u8,
    pub underlying_white_feather: u8,
}

impl Default for BlendIf {
    fn default() -> Self {
        Self {
            this_layer_black: 0,
            this_layer_black_feather: 0,
            this_layer_white: 255,
            this_layer_white_feather: 255,
            underlying_black: 0,
            underlying_black_feather: 0,
            underlying_white: 255,
            underlying_white_feather: 255,
        }
    }
}

impl BlendIf {
    fn descriptor(&self) -> Value {
        let range = json!({
            "_obj": "blendRange",
            "channel": {"_ref": "channel", "_enum": "channel", "_value": "gray"},
            "srcBlackMin": self.this_layer_black,
            "srcBlackMax": self.this_layer_black_feather,
            "srcWhiteMin": self.this_layer_white_feather,
            "srcWhiteMax": self.this_layer_white,
            "destBlackMin": self.underlying_black,
            "destBlackMax": self.underlying_black_feather,
            "destWhiteMin": self.underlying_white_feather,
            "destWhiteMax": self.underlying_white
        });

        Descriptor::new("set")
            .target_selected_layer()
            .field("to", json!({"_obj": "layer", "blendRange": [range]}))
            .build()
    }
}

async fn run_for_payload<T>(bridge: &Bridge<T>, sequence: Sequence) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    bridge.run(sequence).await?.into_result()
}

/// Make `id` the active layer.
///
/// # Errors
/// Returns the bridge error if the host rejects the selection.
pub async fn select_layer<T>(bridge: &Bridge<T>, id: LayerId) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    run_for_payload(bridge, Sequence::targeting(id)).await
}

/// Select `id` and target its mask, so later edits apply to the mask.
///
/// # Errors
/// Returns `SequenceAborted` if the layer has no mask.
pub async fn select_layer_mask<T>(bridge: &Bridge<T>, id: LayerId) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    let sequence = Sequence::targeting(id).then(target::select_channel(Channel::Mask));
    run_for_payload(bridge, sequence).await
}

/// Select `id` and target its composite channel again.
///
/// # Errors
/// Returns the bridge error if either step fails.
pub async fn select_layer_rgb<T>(bridge: &Bridge<T>, id: LayerId) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    let sequence = Sequence::targeting(id).then(target::select_channel(Channel::Rgb));
    run_for_payload(bridge, sequence).await
}

/// Add a layer mask to `id`.
///
/// # Errors
/// Returns `SequenceAborted` if the host refuses, e.g. the layer already has
/// a mask.
pub async fn add_layer_mask<T>(
    bridge: &Bridge<T>,
    id: LayerId,
    fill: MaskFill,
) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    let make = Descriptor::new("make")
        .field("new", json!({"_class": "channel"}))
        .field(
            "at",
            json!({"_ref": "channel", "_enum": "channel", "_value": "mask"}),
        )
        .enumerated("using", "userMaskEnabled", fill.host_name())
        .build();

    let sequence = Sequence::targeting(id).then(target::batch(vec![make]));
    run_for_payload(bridge, sequence).await
}

/// Fill the mask of `id` with a black-to-white gradient.
///
/// The composite channel is re-selected afterwards even if drawing fails.
///
/// # Errors
/// Returns `SequenceAborted` if any step fails; the abort records whether
/// the channel was restored.
pub async fn fill_mask_with_gradient<T>(
    bridge: &Bridge<T>,
    id: LayerId,
    gradient: &MaskGradient,
) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    let sequence = Sequence::targeting(id)
        .then(target::select_channel(Channel::Mask))
        .then(target::batch(vec![gradient.descriptor()]))
        .restore_with(target::select_channel(Channel::Rgb));
    run_for_payload(bridge, sequence).await
}

/// Merge the given layers into one.
///
/// # Errors
/// Returns `Validation` (nothing sent) for fewer than two ids. A failure
/// part-way leaves whatever layers were already selected selected.
pub async fn merge_layers<T>(bridge: &Bridge<T>, ids: &[LayerId]) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    let Some((first, rest)) = ids.split_first().filter(|(_, rest)| !rest.is_empty()) else {
        return Err(BridgeError::Validation(
            "need at least 2 layer ids to merge".to_string(),
        ));
    };

    let sequence = rest
        .iter()
        .fold(Sequence::targeting(*first), |sequence, id| {
            sequence.then(target::add_layer_to_selection(*id))
        })
        .then(target::batch(vec![Descriptor::new("mergeLayersNew").build()]));
    run_for_payload(bridge, sequence).await
}

/// Set the blend-if sliders of `id`.
///
/// # Errors
/// Returns the bridge error if either step fails.
pub async fn set_layer_blend_if<T>(
    bridge: &Bridge<T>,
    id: LayerId,
    blend_if: &BlendIf,
) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    let sequence = Sequence::targeting(id).then(target::batch(vec![blend_if.descriptor()]));
    run_for_payload(bridge, sequence).await
}

/// Delete layer `id`.
///
/// # Errors
/// Returns `Application` if the host cannot find the layer.
pub async fn delete_layer<T>(bridge: &Bridge<T>, id: LayerId) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    bridge.call_exclusive("deleteLayer", json!({"layerId": id})).await
}

/// Show or hide layer `id`.
///
/// # Errors
/// Returns `Application` if the host cannot find the layer.
pub async fn set_layer_visibility<T>(
    bridge: &Bridge<T>,
    id: LayerId,
    visible: bool,
) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    bridge
        .call_exclusive("setLayerVisibility", json!({"layerId": id, "visible": visible}))
        .await
}

/// Merge all visible layers.
///
/// # Errors
/// Returns the bridge error on failure.
pub async fn merge_visible<T>(bridge: &Bridge<T>) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    bridge.call_exclusive("mergeVisible", json!({})).await
}

/// Merge layer `id` into the layer below it.
///
/// # Errors
/// Returns the bridge error on failure.
pub async fn merge_down<T>(bridge: &Bridge<T>, id: LayerId) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    bridge.call_exclusive("mergeDown", json!({"layerId": id})).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use psbridge_core::RestoreOutcome;
    use psbridge_session::PASSTHROUGH_OPERATION;
    use psbridge_transport::{MemoryTransport, Reply};

    use super::*;

    fn bridge(host: &Arc<MemoryTransport>) -> Bridge<MemoryTransport> {
        Bridge::new("photoshop", Arc::clone(host))
    }

    fn descriptor_obj(envelope: &psbridge_core::CommandEnvelope) -> Option<&str> {
        envelope.params()["commands"][0]["_obj"].as_str()
    }

    #[tokio::test]
    async fn test_merge_layers_selects_then_merges() {
        let host = Arc::new(MemoryTransport::new());
        merge_layers(&bridge(&host), &[LayerId(4), LayerId(9), LayerId(11)])
            .await
            .unwrap();

        let sent = host.requests();
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().all(|e| e.operation() == PASSTHROUGH_OPERATION));
        assert!(sent[0].params()["commands"][0].get("selectionModifier").is_none());
        assert_eq!(sent[1].params()["commands"][0]["_target"][0]["_id"], 9);
        assert_eq!(
            sent[2].params()["commands"][0]["selectionModifier"]["_value"],
            "addToSelection"
        );
        assert_eq!(descriptor_obj(&sent[3]), Some("mergeLayersNew"));
    }

    #[tokio::test]
    async fn test_merge_needs_two_ids() {
        let host = Arc::new(MemoryTransport::new());
        for ids in [&[][..], &[LayerId(1)][..]] {
            let err = merge_layers(&bridge(&host), ids).await.unwrap_err();
            assert!(matches!(err, BridgeError::Validation(_)));
        }
        assert!(host.requests().is_empty());
    }

    #[tokio::test]
    async fn test_gradient_failure_restores_rgb() {
        let host = Arc::new(MemoryTransport::new().when(
            |e| descriptor_obj(e) == Some("gradientClassEvent"),
            Reply::Error("The layer has no mask".to_string()),
        ));

        let err = fill_mask_with_gradient(&bridge(&host), LayerId(42), &MaskGradient::default())
            .await
            .unwrap_err();
        let BridgeError::SequenceAborted(abort) = err else {
            panic!("expected abort, got {err:?}");
        };
        assert_eq!(abort.step, 2);
        assert_eq!(abort.restore, RestoreOutcome::Succeeded);

        let sent = host.requests();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[3].params()["commands"][0]["_target"][0]["_value"], "RGB");
    }

    #[test]
    fn test_gradient_descriptor() {
        let gradient = MaskGradient {
            kind: GradientKind::Angle,
            ..MaskGradient::default()
        };
        let descriptor = gradient.descriptor();

        assert_eq!(descriptor["type"]["_value"], "angular");
        assert_eq!(descriptor["to"], json!({"_obj": "paint", "horizontal": 0, "vertical": 100}));
        assert_eq!(descriptor["gradient"]["colors"][1]["location"], 4096);
        assert_eq!(descriptor["_isCommand"], true);
    }

    #[test]
    fn test_blend_if_maps_feather_points() {
        let blend_if = BlendIf {
            this_layer_black: 10,
            this_layer_black_feather: 40,
            this_layer_white_feather: 200,
            ..BlendIf::default()
        };
        let range = &blend_if.descriptor()["to"]["blendRange"][0];

        assert_eq!(range["srcBlackMin"], 10);
        assert_eq!(range["srcBlackMax"], 40);
        assert_eq!(range["srcWhiteMin"], 200);
        assert_eq!(range["srcWhiteMax"], 255);
        assert_eq!(range["channel"]["_value"], "gray");
    }

    #[tokio::test]
    async fn test_add_mask_fill() {
        let host = Arc::new(MemoryTransport::new());
        add_layer_mask(&bridge(&host), LayerId(3), MaskFill::HideAll)
            .await
            .unwrap();

        let sent = host.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].params()["commands"][0]["using"]["_value"], "hideAll");
    }

    #[tokio::test]
    async fn test_merge_down_waits_for_sequence() {
        let host = Arc::new(MemoryTransport::new().when(
            |e| descriptor_obj(e) == Some("gradientClassEvent"),
            Reply::Slow(std::time::Duration::from_millis(50)),
        ));
        let bridge = bridge(&host);

        let fill = tokio::spawn({
            let bridge = bridge.clone();
            async move { fill_mask_with_gradient(&bridge, LayerId(42), &MaskGradient::default()).await }
        });
        while host.requests().is_empty() {
            tokio::task::yield_now().await;
        }
        merge_down(&bridge, LayerId(5)).await.unwrap();
        fill.await.unwrap().unwrap();

        let operations = host.operations();
        assert_eq!(operations.len(), 5);
        assert_eq!(operations[4], "mergeDown");
    }

    #[tokio::test]
    async fn test_single_step_ops_take_no_selection() {
        let host = Arc::new(
            MemoryTransport::new().on("deleteLayer", Reply::Error("Layer not found".to_string())),
        );
        let bridge = bridge(&host);

        set_layer_visibility(&bridge, LayerId(5), false).await.unwrap();
        merge_down(&bridge, LayerId(5)).await.unwrap();
        let err = delete_layer(&bridge, LayerId(99)).await.unwrap_err();
        assert!(matches!(err, BridgeError::Application { .. }));

        let sent = host.requests();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].params(), &json!({"layerId": 5, "visible": false}));
        assert_eq!(sent[1].operation(), "mergeDown");
    }
}
