//! RenderFrameUseCase: capture → encode → decode → composite.
//!
//! Each display tick the binary asks this use case to:
//!
//! 1. Capture the media the user is currently sharing ([`capture_outbound`]):
//!    the screen if `screen` is on, the camera if `video` is on.  Each frame is
//!    encoded with the injected [`FrameCodec`], exactly as it would be before
//!    being handed to a media transport.
//! 2. Decode the payloads back into frames and composite them into one
//!    picture ([`render`]): the screen as the base, cameras as thumbnails.
//!
//! Capture devices are owned by the [`FrameCapture`] implementation passed
//! in by the caller; nothing here touches global state.
//!
//! [`capture_outbound`]: RenderFrameUseCase::capture_outbound
//! [`render`]: RenderFrameUseCase::render

use std::sync::Arc;

use conf_core::{
    CanvasSize, CodecError, CompositeError, Compositor, Frame, FrameCodec, MediaKind,
    SharingState,
};
use thiserror::Error;
use tracing::debug;

/// Error from a capture device.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// The device could not deliver a frame.
    #[error("{device} capture unavailable: {reason}")]
    Unavailable { device: &'static str, reason: String },
}

/// Source of raw frames.
///
/// Infrastructure implementations own their devices and screen geometry;
/// test implementations return fixed frames.
pub trait FrameCapture: Send + Sync {
    /// Grabs the current screen contents.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if the screen cannot be read.
    fn capture_screen(&self) -> Result<Frame, CaptureError>;

    /// Grabs one camera frame.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if the camera cannot be read.
    fn capture_camera(&self) -> Result<Frame, CaptureError>;

    /// Size of the screen this source captures.
    fn screen_size(&self) -> CanvasSize;
}

/// Error type for the render pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("codec failed: {0}")]
    Codec(#[from] CodecError),
    #[error("compositing failed: {0}")]
    Composite(#[from] CompositeError),
}

/// Encoded payloads captured in one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundFrames {
    pub screen: Option<Vec<u8>>,
    pub camera: Option<Vec<u8>>,
}

impl OutboundFrames {
    /// `true` when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.screen.is_none() && self.camera.is_none()
    }
}

pub struct RenderFrameUseCase {
    codec: Arc<dyn FrameCodec>,
    compositor: Compositor,
}

impl RenderFrameUseCase {
    pub fn new(codec: Arc<dyn FrameCodec>, compositor: Compositor) -> Self {
        Self { codec, compositor }
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Captures and encodes whatever `sharing` says is on.
    ///
    /// Audio has no frame and is ignored here.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Capture`] or [`RenderError::Codec`]; nothing is
    /// returned for the tick in that case.
    pub fn capture_outbound(
        &self,
        capture: &dyn FrameCapture,
        sharing: &SharingState,
    ) -> Result<OutboundFrames, RenderError> {
        let mut out = OutboundFrames::default();
        if sharing.is_sharing(MediaKind::Screen) {
            out.screen = Some(self.codec.encode(&capture.capture_screen()?)?);
        }
        if sharing.is_sharing(MediaKind::Video) {
            out.camera = Some(self.codec.encode(&capture.capture_camera()?)?);
        }
        Ok(out)
    }

    /// Decodes the payloads and composites them.
    ///
    /// `screen` becomes the base frame; each entry of `cameras` becomes a
    /// thumbnail, in order.
    ///
    /// # Errors
    ///
    /// - [`RenderError::Codec`] if any payload is malformed.
    /// - [`RenderError::Composite`] if there is nothing to composite.
    pub fn render(&self, screen: Option<&[u8]>, cameras: &[Vec<u8>]) -> Result<Frame, RenderError> {
        let base = screen.map(|payload| self.codec.decode(payload)).transpose()?;
        let thumbnails = cameras
            .iter()
            .map(|payload| self.codec.decode(payload))
            .collect::<Result<Vec<_>, _>>()?;

        let frame = self.compositor.composite(base.as_ref(), &thumbnails)?;
        debug!(
            width = frame.width(),
            height = frame.height(),
            thumbnails = thumbnails.len(),
            "composited frame"
        );
        Ok(frame)
    }

    /// One local-preview tick: capture what is shared, then render it.
    ///
    /// Returns `Ok(None)` when nothing visual is being shared.
    ///
    /// # Errors
    ///
    /// See [`capture_outbound`](Self::capture_outbound) and [`render`](Self::render).
    pub fn preview(
        &self,
        capture: &dyn FrameCapture,
        sharing: &SharingState,
    ) -> Result<Option<Frame>, RenderError> {
        let outbound = self.capture_outbound(capture, sharing)?;
        if outbound.is_empty() {
            return Ok(None);
        }
        let cameras: Vec<Vec<u8>> = outbound.camera.into_iter().collect();
        self.render(outbound.screen.as_deref(), &cameras).map(Some)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use conf_core::{JpegCodec, LayoutPolicy};

    /// Returns fixed-size frames, or fails every call when `should_fail` is set.
    struct FixedCapture {
        screen: CanvasSize,
        camera: (u32, u32),
        should_fail: bool,
    }

    impl FixedCapture {
        fn new() -> Self {
            Self {
                screen: CanvasSize::new(1280, 720),
                camera: (320, 240),
                should_fail: false,
            }
        }

        fn failing() -> Self {
            Self { should_fail: true, ..Self::new() }
        }
    }

    impl FrameCapture for FixedCapture {
        fn capture_screen(&self) -> Result<Frame, CaptureError> {
            if self.should_fail {
                return Err(CaptureError::Unavailable { device: "screen", reason: "test".into() });
            }
            Ok(Frame::blank(self.screen.width, self.screen.height))
        }

        fn capture_camera(&self) -> Result<Frame, CaptureError> {
            if self.should_fail {
                return Err(CaptureError::Unavailable { device: "camera", reason: "test".into() });
            }
            Ok(Frame::blank(self.camera.0, self.camera.1))
        }

        fn screen_size(&self) -> CanvasSize {
            self.screen
        }
    }

    fn use_case() -> RenderFrameUseCase {
        RenderFrameUseCase::new(
            Arc::new(JpegCodec::default()),
            Compositor::with_policy(CanvasSize::new(1280, 720), LayoutPolicy::SingleRowShrink),
        )
    }

    #[test]
    fn test_capture_outbound_nothing_shared_is_empty() {
        let out = use_case().capture_outbound(&FixedCapture::new(), &SharingState::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_capture_outbound_audio_only_captures_no_frames() {
        let sharing = SharingState::new();
        sharing.toggle(MediaKind::Audio);

        let out = use_case().capture_outbound(&FixedCapture::new(), &sharing).unwrap();

        assert!(out.is_empty());
    }

    #[test]
    fn test_capture_outbound_encodes_shared_kinds() {
        // Arrange
        let sharing = SharingState::new();
        sharing.toggle(MediaKind::Screen);
        sharing.toggle(MediaKind::Video);

        // Act
        let out = use_case().capture_outbound(&FixedCapture::new(), &sharing).unwrap();

        // Assert – both payloads are JPEG.
        assert_eq!(&out.screen.unwrap()[..2], &[0xFF, 0xD8]);
        assert_eq!(&out.camera.unwrap()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_capture_failure_is_reported() {
        let sharing = SharingState::new();
        sharing.toggle(MediaKind::Video);

        let err = use_case().capture_outbound(&FixedCapture::failing(), &sharing).unwrap_err();

        assert!(matches!(err, RenderError::Capture(CaptureError::Unavailable { device: "camera", .. })));
    }

    #[test]
    fn test_render_screen_and_cameras_keeps_canvas_size() {
        // Arrange
        let uc = use_case();
        let codec = JpegCodec::default();
        let screen = codec.encode(&Frame::blank(1280, 720)).unwrap();
        let cams: Vec<Vec<u8>> =
            (0..5).map(|_| codec.encode(&Frame::blank(320, 240)).unwrap()).collect();

        // Act
        let frame = uc.render(Some(screen.as_slice()), &cams).unwrap();

        // Assert
        assert_eq!(frame.size(), (1280, 720));
    }

    #[test]
    fn test_render_nothing_is_composite_error() {
        let err = use_case().render(None, &[]).unwrap_err();
        assert!(matches!(err, RenderError::Composite(CompositeError::EmptyInput)));
    }

    #[test]
    fn test_render_malformed_payload_is_codec_error() {
        let err = use_case().render(Some(&b"garbage"[..]), &[]).unwrap_err();
        assert!(matches!(err, RenderError::Codec(CodecError::Decode(_))));
    }

    #[test]
    fn test_preview_camera_only_is_single_thumbnail_column() {
        let sharing = SharingState::new();
        sharing.toggle(MediaKind::Video);

        let frame = use_case().preview(&FixedCapture::new(), &sharing).unwrap().unwrap();

        // No base: the canvas is one thumbnail wide and the full canvas high.
        assert_eq!(frame.size(), (320, 720));
    }

    #[test]
    fn test_preview_nothing_shared_is_none() {
        assert!(use_case().preview(&FixedCapture::new(), &SharingState::new()).unwrap().is_none());
    }
}
