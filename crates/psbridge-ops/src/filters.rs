//! Filters applied to a layer by id.

use psbridge_core::{BridgeError, Transport};
use psbridge_session::{Bridge, LayerId, Sequence, target};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::{Descriptor, paint_point};

/// Plastic Wrap, for a wet or liquid look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasticWrap {
    /// 0-20.
    pub highlight_strength: u8,
    /// 1-15.
    pub detail: u8,
    /// 1-15.
    pub smoothness: u8,
}

impl Default for PlasticWrap {
    fn default() -> Self {
        Self {
            highlight_strength: 15,
            detail: 9,
            smoothness: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GlassTexture {
    #[default]
    Frosted,
    Blocks,
    Canvas,
    TinyLens,
}

impl GlassTexture {
    const fn host_code(self) -> u8 {
        match self {
            Self::Frosted => 1,
            Self::Blocks => 2,
            Self::Canvas => 3,
            Self::TinyLens => 4,
        }
    }
}

/// Glass distortion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Glass {
    /// 0-20.
    pub distortion: u8,
    /// 1-15.
    pub smoothness: u8,
    pub texture: GlassTexture,
    /// Texture scale in percent, 50-200.
    pub scaling: u16,
}

impl Default for Glass {
    fn default() -> Self {
        Self {
            distortion: 5,
            smoothness: 3,
            texture: GlassTexture::Frosted,
            scaling: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RippleSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl RippleSize {
    const fn host_code(self) -> u8 {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
        }
    }
}

/// Ripple distortion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ripple {
    /// -999 to 999.
    pub amount: i16,
    pub size: RippleSize,
}

impl Default for Ripple {
    fn default() -> Self {
        Self {
            amount: 100,
            size: RippleSize::Medium,
        }
    }
}

/// Ocean Ripple distortion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanRipple {
    /// 1-15.
    pub ripple_size: u8,
    /// 1-20.
    pub ripple_magnitude: u8,
}

impl Default for OceanRipple {
    fn default() -> Self {
        Self {
            ripple_size: 9,
            ripple_magnitude: 9,
        }
    }
}

/// Chrome, for a metallic look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chrome {
    /// 0-10.
    pub detail: u8,
    /// 0-10.
    pub smoothness: u8,
}

impl Default for Chrome {
    fn default() -> Self {
        Self {
            detail: 4,
            smoothness: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolarConversion {
    #[default]
    RectangularToPolar,
    PolarToRectangular,
}

impl PolarConversion {
    const fn host_name(self) -> &'static str {
        match self {
            Self::RectangularToPolar => "rectangularToPolar",
            Self::PolarToRectangular => "polarToRectangular",
        }
    }
}

/// Polar Coordinates distortion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolarCoordinates {
    pub conversion: PolarConversion,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UndefinedArea {
    #[default]
    WrapAround,
    RepeatEdgePixels,
}

impl UndefinedArea {
    const fn host_name(self) -> &'static str {
        match self {
            Self::WrapAround => "wrapAround",
            Self::RepeatEdgePixels => "repeatEdgePixels",
        }
    }
}

/// Control point of the shear curve, both axes 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShearPoint {
    pub x: i64,
    pub y: i64,
}

/// Shear distortion along a curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shear {
    pub points: Vec<ShearPoint>,
    pub undefined_area: UndefinedArea,
}

impl Default for Shear {
    fn default() -> Self {
        Self {
            points: vec![ShearPoint { x: 0, y: 0 }, ShearPoint { x: 255, y: 255 }],
            undefined_area: UndefinedArea::WrapAround,
        }
    }
}

/// Pinch distortion. Positive squeezes inward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pinch {
    /// -100 to 100.
    pub amount: i8,
}

impl Default for Pinch {
    fn default() -> Self {
        Self { amount: 50 }
    }
}

/// A filter and its settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum Filter {
    PlasticWrap(PlasticWrap),
    Glass(Glass),
    Ripple(Ripple),
    OceanRipple(OceanRipple),
    Chrome(Chrome),
    PolarCoordinates(PolarCoordinates),
    Shear(Shear),
    Pinch(Pinch),
}

impl Filter {
    /// Host action descriptor for this filter.
    #[must_use]
    pub fn descriptor(&self) -> Value {
        match self {
            Self::PlasticWrap(f) => Descriptor::new("plasticWrap")
                .field("highlightStrength", f.highlight_strength)
                .field("detail", f.detail)
                .field("smoothness", f.smoothness),
            Self::Glass(f) => Descriptor::new("glass")
                .field("distortion", f.distortion)
                .field("smoothness", f.smoothness)
                .field("textureType", f.texture.host_code())
                .field("scaling", f.scaling)
                .field("invert", false),
            Self::Ripple(f) => Descriptor::new("ripple")
                .field("amount", f.amount)
                .field("rippleSize", f.size.host_code()),
            Self::OceanRipple(f) => Descriptor::new("oceanRipple")
                .field("rippleSize", f.ripple_size)
                .field("rippleMagnitude", f.ripple_magnitude),
            Self::Chrome(f) => Descriptor::new("chrome")
                .field("detail", f.detail)
                .field("smoothness", f.smoothness),
            Self::PolarCoordinates(f) => Descriptor::new("polarCoordinates").enumerated(
                "conversion",
                "polarConversionType",
                f.conversion.host_name(),
            ),
            Self::Shear(f) => Descriptor::new("shear")
                .field(
                    "shearPoints",
                    f.points
                        .iter()
                        .map(|p| paint_point(p.x, p.y))
                        .collect::<Vec<_>>(),
                )
                .enumerated("undefinedArea", "undefinedArea", f.undefined_area.host_name()),
            Self::Pinch(f) => Descriptor::new("pinch").field("amount", f.amount),
        }
        .build()
    }
}

/// Apply `filter` to layer `id`.
///
/// # Errors
/// Returns `SequenceAborted` if the host cannot apply the filter, e.g. to a
/// group or an empty layer.
pub async fn apply_filter<T>(
    bridge: &Bridge<T>,
    id: LayerId,
    filter: &Filter,
) -> Result<Value, BridgeError>
where
    T: Transport + ?Sized,
{
    let sequence = Sequence::targeting(id).then(target::batch(vec![filter.descriptor()]));
    bridge.run(sequence).await?.into_result()
}
