//! Frame ↔ payload codec.
//!
//! [`FrameCodec`] is the seam; [`JpegCodec`] adapts the `image` crate's JPEG
//! encoder and decoder to it.  JPEG is lossy, so a round trip keeps the
//! dimensions exactly but not the pixel values.

use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use thiserror::Error;

use crate::domain::frame::Frame;

/// Default JPEG quality (1–100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Errors at the codec boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The frame could not be encoded (for example, it has a zero dimension).
    #[error("failed to encode frame: {0}")]
    Encode(String),

    /// The payload is not a valid image of the expected format.
    #[error("failed to decode payload: {0}")]
    Decode(String),
}

/// Converts frames to transport payloads and back.
///
/// Implementations must be pure: the same input always yields an equivalent
/// output and nothing is retained between calls.
pub trait FrameCodec: Send + Sync {
    /// Encodes `frame` into a payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if the frame cannot be represented.
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, CodecError>;

    /// Decodes a payload produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] for malformed input.
    fn decode(&self, payload: &[u8]) -> Result<Frame, CodecError>;
}

/// Baseline JPEG codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegCodec {
    quality: u8,
}

impl JpegCodec {
    /// Creates a codec with `quality` clamped to 1–100.
    pub fn new(quality: u8) -> Self {
        Self { quality: quality.clamp(1, 100) }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameCodec for JpegCodec {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, CodecError> {
        if frame.is_empty() {
            return Err(CodecError::Encode("frame has a zero dimension".to_string()));
        }
        let mut buf = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.quality);
            encoder
                .encode_image(frame.as_image())
                .map_err(|e| CodecError::Encode(e.to_string()))?;
        }
        Ok(buf)
    }

    fn decode(&self, payload: &[u8]) -> Result<Frame, CodecError> {
        let image = image::load_from_memory_with_format(payload, ImageFormat::Jpeg)
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        Ok(Frame::new(image.to_rgb8()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
