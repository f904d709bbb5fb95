//! Named tool catalogue.
//!
//! Maps a tool name plus JSON arguments, as sent by an agent, onto one of
//! the operations in this crate.

use base64::{Engine, engine::general_purpose::STANDARD};
use psbridge_core::Transport;
use psbridge_session::{Bridge, LayerId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::document;
use crate::error::ToolError;
use crate::filters::{
    self, Chrome, Filter, Glass, OceanRipple, Pinch, PlasticWrap, PolarCoordinates, Ripple, Shear,
};
use crate::image::HostImage;
use crate::layers::{self, BlendIf, MaskFill, MaskGradient};

/// Catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

const TOOLS: &[ToolInfo] = &[
    tool("get_documents", "List the documents currently open."),
    tool("set_active_document", "Make the document with `document_id` active."),
    tool("get_document_info", "Size, colour mode, resolution and save state of the active document."),
    tool("get_layers", "Nested layer tree of the active document."),
    tool("delete_layer", "Delete the layer `layer_id`."),
    tool("set_layer_visibility", "Show or hide the layer `layer_id`."),
    tool("merge_visible", "Merge all visible layers into one."),
    tool("merge_down", "Merge the layer `layer_id` into the layer below it."),
    tool("get_document_image", "JPEG rendering of the visible document."),
    tool("get_layer_image", "JPEG rendering of the layer `layer_id`."),
    tool("select_layer", "Make the layer `layer_id` active."),
    tool("select_layer_mask", "Target the mask of `layer_id` so later edits apply to it."),
    tool("select_layer_rgb", "Target the composite channel of `layer_id` again."),
    tool("add_layer_mask_reveal_all", "Add a white (reveal all) mask to `layer_id`."),
    tool("add_layer_mask_hide_all", "Add a black (hide all) mask to `layer_id`."),
    tool("fill_mask_with_gradient", "Fill the mask of `layer_id` with a black-to-white gradient."),
    tool("merge_layers", "Merge the layers in `layer_ids` (at least two)."),
    tool("set_layer_blend_if", "Set the Blend If sliders of `layer_id`."),
    tool("apply_plastic_wrap", "Plastic Wrap filter on `layer_id`."),
    tool("apply_glass_distortion", "Glass distortion filter on `layer_id`."),
    tool("apply_ripple", "Ripple distortion filter on `layer_id`."),
    tool("apply_ocean_ripple", "Ocean Ripple distortion filter on `layer_id`."),
    tool("apply_chrome_filter", "Chrome filter on `layer_id`."),
    tool("apply_polar_coordinates", "Polar Coordinates distortion filter on `layer_id`."),
    tool("apply_shear", "Shear distortion filter on `layer_id`."),
    tool("apply_pinch", "Pinch distortion filter on `layer_id`."),
    tool("execute_batchplay", "Run raw batchPlay descriptors, optionally on `layer_id`."),
];

const fn tool(name: &'static str, description: &'static str) -> ToolInfo {
    ToolInfo { name, description }
}

/// Every tool this crate can execute.
#[must_use]
pub fn catalog() -> &'static [ToolInfo] {
    TOOLS
}

/// A parsed tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "args", rename_all = "snake_case")]
pub enum ToolCall {
    GetDocuments {},
    SetActiveDocument {
        document_id: u32,
    },
    GetDocumentInfo {},
    GetLayers {},
    DeleteLayer {
        layer_id: LayerId,
    },
    SetLayerVisibility {
        layer_id: LayerId,
        visible: bool,
    },
    MergeVisible {},
    MergeDown {
        layer_id: LayerId,
    },
    GetDocumentImage {},
    GetLayerImage {
        layer_id: LayerId,
    },
    SelectLayer {
        layer_id: LayerId,
    },
    SelectLayerMask {
        layer_id: LayerId,
    },
    SelectLayerRgb {
        layer_id: LayerId,
    },
    AddLayerMaskRevealAll {
        layer_id: LayerId,
    },
    AddLayerMaskHideAll {
        layer_id: LayerId,
    },
    FillMaskWithGradient {
        layer_id: LayerId,
        #[serde(flatten)]
        gradient: MaskGradient,
    },
    MergeLayers {
        layer_ids: Vec<LayerId>,
    },
    SetLayerBlendIf {
        layer_id: LayerId,
        #[serde(flatten)]
        blend_if: BlendIf,
    },
    ApplyPlasticWrap {
        layer_id: LayerId,
        #[serde(flatten)]
        settings: PlasticWrap,
    },
    ApplyGlassDistortion {
        layer_id: LayerId,
        #[serde(flatten)]
        settings: Glass,
    },
    ApplyRipple {
        layer_id: LayerId,
        #[serde(flatten)]
        settings: Ripple,
    },
    ApplyOceanRipple {
        layer_id: LayerId,
        #[serde(flatten)]
        settings: OceanRipple,
    },
    ApplyChromeFilter {
        layer_id: LayerId,
        #[serde(flatten)]
        settings: Chrome,
    },
    ApplyPolarCoordinates {
        layer_id: LayerId,
        #[serde(flatten)]
        settings: PolarCoordinates,
    },
    ApplyShear {
        layer_id: LayerId,
        #[serde(flatten)]
        settings: Shear,
    },
    ApplyPinch {
        layer_id: LayerId,
        #[serde(flatten)]
        settings: Pinch,
    },
    ExecuteBatchplay {
        commands: Vec<Value>,
        #[serde(default)]
        layer_id: Option<LayerId>,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    /// Host payload, unchanged.
    Json(Value),
    /// Decoded image.
    Image(HostImage),
}

impl ToolOutput {
    /// JSON rendering; image bytes are re-encoded as base64.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Image(HostImage::Encoded(payload)) => json!({
                "format": payload.format,
                "size_bytes": payload.bytes.len(),
                "data": STANDARD.encode(&payload.bytes),
            }),
            Self::Image(HostImage::Raw(raw)) => json!({
                "format": "raw",
                "width": raw.width,
                "height": raw.height,
                "components": raw.components,
                "size_bytes": raw.data.len(),
            }),
        }
    }
}

impl ToolCall {
    /// Parse a named call with its arguments.
    ///
    /// A `null` argument value is read as no arguments.
    ///
    /// # Errors
    /// Returns `ToolError::InvalidCall` for unknown names or bad arguments.
    pub fn from_tool_call(name: &str, args: &Value) -> Result<Self, ToolError> {
        if !TOOLS.iter().any(|tool| tool.name == name) {
            return Err(ToolError::InvalidCall(format!("Unknown tool: {name}")));
        }

        let args = if args.is_null() { json!({}) } else { args.clone() };
        let call = serde_json::from_value(json!({ "tool": name, "args": args }))
            .map_err(|e| ToolError::InvalidCall(format!("{name}: {e}")))?;
        tracing::debug!(tool = name, "Parsed tool call");
        Ok(call)
    }

    /// Execute the call against `bridge`.
    ///
    /// # Errors
    /// Returns the underlying operation's error.
    pub async fn execute<T>(self, bridge: &Bridge<T>) -> Result<ToolOutput, ToolError>
    where
        T: Transport + ?Sized,
    {
        let value = match self {
            Self::GetDocuments {} => document::get_documents(bridge).await?,
            Self::SetActiveDocument { document_id } => {
                document::set_active_document(bridge, document_id).await?
            }
            Self::GetDocumentInfo {} => document::get_document_info(bridge).await?,
            Self::GetLayers {} => document::get_layers(bridge).await?,
            Self::DeleteLayer { layer_id } => layers::delete_layer(bridge, layer_id).await?,
            Self::SetLayerVisibility { layer_id, visible } => {
                layers::set_layer_visibility(bridge, layer_id, visible).await?
            }
            Self::MergeVisible {} => layers::merge_visible(bridge).await?,
            Self::MergeDown { layer_id } => layers::merge_down(bridge, layer_id).await?,
            Self::GetDocumentImage {} => {
                return document::get_document_image(bridge)
                    .await
                    .map(ToolOutput::Image);
            }
            Self::GetLayerImage { layer_id } => {
                return document::get_layer_image(bridge, layer_id)
                    .await
                    .map(ToolOutput::Image);
            }
            Self::SelectLayer { layer_id } => layers::select_layer(bridge, layer_id).await?,
            Self::SelectLayerMask { layer_id } => {
                layers::select_layer_mask(bridge, layer_id).await?
            }
            Self::SelectLayerRgb { layer_id } => layers::select_layer_rgb(bridge, layer_id).await?,
            Self::AddLayerMaskRevealAll { layer_id } => {
                layers::add_layer_mask(bridge, layer_id, MaskFill::RevealAll).await?
            }
            Self::AddLayerMaskHideAll { layer_id } => {
                layers::add_layer_mask(bridge, layer_id, MaskFill::HideAll).await?
            }
            Self::FillMaskWithGradient { layer_id, gradient } => {
                layers::fill_mask_with_gradient(bridge, layer_id, &gradient).await?
            }
            Self::MergeLayers { layer_ids } => layers::merge_layers(bridge, &layer_ids).await?,
            Self::SetLayerBlendIf { layer_id, blend_if } => {
                layers::set_layer_blend_if(bridge, layer_id, &blend_if).await?
            }
            Self::ApplyPlasticWrap { layer_id, settings } => {
                filters::apply_filter(bridge, layer_id, &Filter::PlasticWrap(settings)).await?
            }
            Self::ApplyGlassDistortion { layer_id, settings } => {
                filters::apply_filter(bridge, layer_id, &Filter::Glass(settings)).await?
            }
            Self::ApplyRipple { layer_id, settings } => {
                filters::apply_filter(bridge, layer_id, &Filter::Ripple(settings)).await?
            }
            Self::ApplyOceanRipple { layer_id, settings } => {
                filters::apply_filter(bridge, layer_id, &Filter::OceanRipple(settings)).await?
            }
            Self::ApplyChromeFilter { layer_id, settings } => {
                filters::apply_filter(bridge, layer_id, &Filter::Chrome(settings)).await?
            }
            Self::ApplyPolarCoordinates { layer_id, settings } => {
                filters::apply_filter(bridge, layer_id, &Filter::PolarCoordinates(settings))
                    .await?
            }
            Self::ApplyShear { layer_id, settings } => {
                filters::apply_filter(bridge, layer_id, &Filter::Shear(settings)).await?
            }
            Self::ApplyPinch { layer_id, settings } => {
                filters::apply_filter(bridge, layer_id, &Filter::Pinch(settings)).await?
            }
            Self::ExecuteBatchplay { commands, layer_id } => {
                bridge.passthrough(commands, layer_id).await?.into_result()?
            }
        };

        Ok(ToolOutput::Json(value))
    }
}
