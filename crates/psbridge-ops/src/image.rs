//! Image payload decoding.
//!
//! The host returns images in one of two shapes:
//! - an encoded image as a data URL (`{"dataUrl": "data:image/jpeg;base64,..."}`)
//! - a raw canvas snapshot (`{"format": "raw", "rawDataBase64", "width", "height", "components"}`)
//!
//! The bridge passes both through untouched; decoding happens here.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Image decoding error.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Not a base64 image data URL")]
    NotDataUrl,
    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Raw pixel data has {actual} bytes, expected {expected}")]
    PixelLength { expected: usize, actual: usize },
    #[error("Response carries no image")]
    Missing,
    #[error("Malformed raw image: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// An encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Image format from the data URL media type (e.g. `jpeg`).
    pub format: String,
    pub bytes: Vec<u8>,
}

/// Raw interleaved 8-bit pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPixels {
    pub width: usize,
    pub height: usize,
    /// Channels per pixel (3 for RGB, 4 for RGBA).
    pub components: usize,
    pub data: Vec<u8>,
}

impl RawPixels {
    /// Whether the pixels carry an alpha channel.
    #[must_use]
    pub const fn has_alpha(&self) -> bool {
        self.components == 4
    }
}

/// Either image shape returned by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostImage {
    Encoded(ImagePayload),
    Raw(RawPixels),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    raw_data_base64: String,
    width: usize,
    height: usize,
    components: usize,
}

/// Decode a `data:image/<format>;base64,<data>` URL.
///
/// # Errors
/// Returns `NotDataUrl` for any other URL shape, `Base64` for bad data.
pub fn decode_data_url(url: &str) -> Result<ImagePayload, ImageError> {
    let rest = url.strip_prefix("data:image/").ok_or(ImageError::NotDataUrl)?;
    let (format, data) = rest.split_once(";base64,").ok_or(ImageError::NotDataUrl)?;
    if format.is_empty() {
        return Err(ImageError::NotDataUrl);
    }

    Ok(ImagePayload {
        format: format.to_string(),
        bytes: STANDARD.decode(data)?,
    })
}

/// Decode a raw canvas snapshot, checking its length against its dimensions.
///
/// # Errors
/// Returns `Malformed`, `Base64` or `PixelLength` on inconsistent input.
pub fn decode_raw(response: &Value) -> Result<RawPixels, ImageError> {
    let snapshot = RawSnapshot::deserialize(response)?;
    let data = STANDARD.decode(&snapshot.raw_data_base64)?;

    let expected = snapshot
        .width
        .saturating_mul(snapshot.height)
        .saturating_mul(snapshot.components);
    if data.len() != expected {
        return Err(ImageError::PixelLength {
            expected,
            actual: data.len(),
        });
    }

    Ok(RawPixels {
        width: snapshot.width,
        height: snapshot.height,
        components: snapshot.components,
        data,
    })
}

/// Decode whichever image shape a host response carries.
///
/// # Errors
/// Returns `Missing` if the response has neither shape.
pub fn decode_response(response: &Value) -> Result<HostImage, ImageError> {
    if response.get("format").and_then(Value::as_str) == Some("raw") {
        return decode_raw(response).map(HostImage::Raw);
    }

    response
        .get("dataUrl")
        .and_then(Value::as_str)
        .ok_or(ImageError::Missing)
        .and_then(decode_data_url)
        .map(HostImage::Encoded)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_data_url_roundtrip() {
        let jpeg = [0xFF_u8, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let url = format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg));

        let payload = decode_data_url(&url).unwrap();
        assert_eq!(payload.format, "jpeg");
        assert_eq!(payload.bytes, jpeg);
    }

    #[test]
    fn test_rejects_other_urls() {
        for url in ["http://example.com/a.jpg", "data:text/plain;base64,aGk=", "data:image/png,raw"] {
            assert!(matches!(decode_data_url(url), Err(ImageError::NotDataUrl)));
        }
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(ImageError::Base64(_))
        ));
    }

    #[test]
    fn test_raw_length_checked() {
        let pixels = vec![7_u8; 2 * 3 * 4];
        let ok = json!({
            "format": "raw",
            "rawDataBase64": STANDARD.encode(&pixels),
            "width": 2,
            "height": 3,
            "components": 4
        });
        let HostImage::Raw(raw) = decode_response(&ok).unwrap() else {
            panic!("expected raw pixels");
        };
        assert!(raw.has_alpha());
        assert_eq!(raw.data, pixels);

        let short = json!({
            "format": "raw",
            "rawDataBase64": STANDARD.encode(&pixels[..10]),
            "width": 2,
            "height": 3,
            "components": 4
        });
        assert!(matches!(
            decode_response(&short),
            Err(ImageError::PixelLength { expected: 24, actual: 10 })
        ));
    }

    #[test]
    fn test_missing_image() {
        let err = decode_response(&json!({"width": 800})).unwrap_err();
        assert!(matches!(err, ImageError::Missing));
    }
}
