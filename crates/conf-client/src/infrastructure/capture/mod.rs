//! Synthetic capture source.
//!
//! Real camera and screen grabbing is platform work that lives outside this
//! client.  [`SyntheticCapture`] stands in for it: it owns a screen size and a
//! camera size, chosen at construction, and produces deterministic test-card
//! frames of those sizes.  The frame content changes with every capture so a
//! preview visibly updates.
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` to make every capture return
//! [`CaptureError::Unavailable`], for exercising error paths.

use std::sync::atomic::{AtomicU32, Ordering};

use conf_core::{CanvasSize, Frame};
use image::{Rgb, RgbImage};

use crate::application::render_frame::{CaptureError, FrameCapture};

/// Deterministic frame source with explicitly owned device geometry.
#[derive(Debug)]
pub struct SyntheticCapture {
    screen: CanvasSize,
    camera: CanvasSize,
    tick: AtomicU32,
    /// When `true`, every capture fails.
    pub should_fail: bool,
}

impl SyntheticCapture {
    pub fn new(screen: CanvasSize, camera: CanvasSize) -> Self {
        Self {
            screen,
            camera,
            tick: AtomicU32::new(0),
            should_fail: false,
        }
    }

    /// A 1920×1080 screen and a 320×240 camera.
    pub fn default_devices() -> Self {
        Self::new(CanvasSize::new(1920, 1080), CanvasSize::new(320, 240))
    }

    pub fn camera_size(&self) -> CanvasSize {
        self.camera
    }

    fn check(&self, device: &'static str) -> Result<u32, CaptureError> {
        if self.should_fail {
            return Err(CaptureError::Unavailable {
                device,
                reason: "synthetic failure".to_string(),
            });
        }
        Ok(self.tick.fetch_add(1, Ordering::Relaxed))
    }
}

/// Horizontal colour bars shifted by `tick`.
fn test_card(size: CanvasSize, tick: u32) -> Frame {
    const BARS: [Rgb<u8>; 6] = [
        Rgb([192, 192, 192]),
        Rgb([192, 192, 0]),
        Rgb([0, 192, 192]),
        Rgb([0, 192, 0]),
        Rgb([192, 0, 192]),
        Rgb([0, 0, 192]),
    ];
    let bar_width = (size.width / BARS.len() as u32).max(1);
    let image = RgbImage::from_fn(size.width, size.height, |x, _| {
        let bar = (x / bar_width + tick) as usize % BARS.len();
        BARS[bar]
    });
    Frame::new(image)
}

impl FrameCapture for SyntheticCapture {
    fn capture_screen(&self) -> Result<Frame, CaptureError> {
        let tick = self.check("screen")?;
        Ok(test_card(self.screen, tick))
    }

    fn capture_camera(&self) -> Result<Frame, CaptureError> {
        let tick = self.check("camera")?;
        Ok(test_card(self.camera, tick))
    }

    fn screen_size(&self) -> CanvasSize {
        self.screen
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
