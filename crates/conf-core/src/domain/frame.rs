//! Immutable RGB pixel buffer.

use image::{Rgb, RgbImage};

/// Background used for blank canvases.
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// A captured or decoded picture.
///
/// Only the pixel data and its `(width, height)` are carried; there is no
/// timestamp or source tag at this layer.  Operations that change a frame
/// return a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: RgbImage,
}

impl Frame {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// Creates a frame of one colour.
    pub fn filled(width: u32, height: u32, colour: Rgb<u8>) -> Self {
        Self::new(RgbImage::from_pixel(width, height, colour))
    }

    /// Creates a frame filled with [`BACKGROUND`].
    pub fn blank(width: u32, height: u32) -> Self {
        Self::filled(width, height, BACKGROUND)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// `true` when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbImage {
        self.pixels
    }
}

impl From<RgbImage> for Frame {
    fn from(pixels: RgbImage) -> Self {
        Self::new(pixels)
    }
}
