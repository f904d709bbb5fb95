//! Document operations.

use psbridge_core::{BridgeError, Transport};
use psbridge_session::{Bridge, LayerId};
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::image::{self, HostImage};

/// Open documents.
///
/// # Errors
/// Returns the bridge error on failure.
pub async fn get_documents<T>(bridge: &Bridge<T>) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    bridge.call("getDocuments", json!({})).await
}

/// Make document `id` the active one.
///
/// # Errors
/// Returns `Application` if no such document is open.
pub async fn set_active_document<T>(bridge: &Bridge<T>, id: u32) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    bridge
        .call_exclusive("setActiveDocument", json!({"documentId": id}))
        .await
}

/// Size, colour mode, resolution and save state of the active document.
///
/// # Errors
/// Returns `Application` if no document is open.
pub async fn get_document_info<T>(bridge: &Bridge<T>) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    bridge.call("getDocumentInfo", json!({})).await
}

/// Layer tree of the active document.
///
/// # Errors
/// Returns `Application` if no document is open.
pub async fn get_layers<T>(bridge: &Bridge<T>) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    bridge.call("getLayers", json!({})).await
}

/// Rendering of the visible document.
///
/// # Errors
/// Returns `Bridge` on failure, `Image` if the payload does not decode.
pub async fn get_document_image<T>(bridge: &Bridge<T>) -> Result<HostImage, ToolError>
where
    T: Transport + ?Sized,
{
    let response = bridge.call("getDocumentImage", json!({})).await?;
    Ok(image::decode_response(&response)?)
}

/// Rendering of one layer's content.
///
/// # Errors
/// Returns `Bridge` on failure, `Image` if the payload does not decode.
pub async fn get_layer_image<T>(bridge: &Bridge<T>, id: LayerId) -> Result<HostImage, ToolError>
where
    T: Transport + ?Sized,
{
    let response = bridge.call("getLayerImage", json!({"layerId": id})).await?;
    Ok(image::decode_response(&response)?)
}
