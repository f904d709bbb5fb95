//! Named Photoshop operations built on the command bridge.
//!
//! Provides:
//! - Descriptor building for host actions
//! - Layer, mask, merge and blend-if operations addressed by layer id
//! - Filters with their default settings
//! - Document queries and image payload decoding
//! - `ToolCall` - Name-plus-arguments catalogue for agents

pub mod catalog;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod filters;
pub mod image;
pub mod layers;

pub use catalog::{ToolCall, ToolInfo, ToolOutput, catalog};
pub use descriptor::Descriptor;
pub use error::ToolError;
pub use filters::{Filter, apply_filter};
pub use image::{HostImage, ImageError, ImagePayload, RawPixels};
pub use layers::{BlendIf, GradientKind, MaskFill, MaskGradient};
