//! Frame compositor: lays camera thumbnails over a scaled screen frame.
//!
//! The compositor is a pure function of its inputs.  It never keeps state
//! between calls, so the render loop may call it from any number of tasks.
//!
//! # Algorithm
//!
//! 1. A base frame (usually the shared screen) is scaled to fit the canvas
//!    while keeping its aspect ratio.  Nothing is cropped; one axis may end up
//!    shorter than the canvas.
//! 2. Thumbnails all take the size of the first one.  They are laid out left to
//!    right, top to bottom, in cells of that size, starting at the top-left
//!    corner of the base (or of a blank canvas when there is no base).
//! 3. When more thumbnails arrive than fit across at native size, the
//!    [`LayoutPolicy`] decides what happens:
//!
//! ```text
//! SingleRowShrink (default)            WrapGrid
//! ┌──┬──┬──┬──┬──┬────────────┐        ┌────┬────┬────┬────┐
//! │t0│t1│t2│t3│t4│            │        │ t0 │ t1 │ t2 │ t3 │
//! ├──┴──┴──┴──┴──┘            │        ├────┼────┴────┴────┘
//! │                           │        │ t4 │              │
//! └───────────────────────────┘        └────┘──────────────┘
//! ```
//!
//! Pastes are opaque (no blending) and clipped to the canvas.

use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::frame::Frame;

/// Resampling filter for every resize.
const FILTER: FilterType = FilterType::Lanczos3;

/// Target size of the composed picture (normally the local screen size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn of(frame: &Frame) -> Self {
        Self::new(frame.width(), frame.height())
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// What to do when thumbnails overflow one row at native size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPolicy {
    /// Shrink every thumbnail so all of them fit in a single row.
    #[default]
    SingleRowShrink,
    /// Keep native size and wrap onto further rows.  Thumbnails only shrink
    /// when one alone is wider than the canvas.
    ///
    /// Rows are never shrunk vertically: when the grid is taller than the
    /// canvas, rows starting at or below the canvas height are clipped away.
    WrapGrid,
}

/// Errors reported by the compositor.  No partial output is ever produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompositeError {
    /// Neither a base frame nor any thumbnail was supplied.
    #[error("nothing to composite: base frame and thumbnails are both absent")]
    EmptyInput,

    /// A frame or the canvas has a zero width or height.
    #[error("zero-sized frame or canvas")]
    ZeroSizedFrame,

    /// More thumbnails than canvas pixels across, so a shrunk cell would be
    /// zero pixels wide.
    #[error("{count} thumbnails cannot fit across a {canvas_width}px canvas")]
    CanvasTooNarrow { count: usize, canvas_width: u32 },
}

/// Cell geometry for a set of thumbnails.
///
/// Built only by [`plan_thumbnails`], so `per_row` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailLayout {
    cell_width: u32,
    cell_height: u32,
    per_row: u32,
    count: usize,
}

impl ThumbnailLayout {
    fn new(cell_width: u32, cell_height: u32, per_row: u32, count: usize) -> Self {
        Self { cell_width, cell_height, per_row: per_row.max(1), count }
    }

    /// Width every thumbnail is drawn at.
    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    /// Height every thumbnail is drawn at.
    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }

    /// Cells per row.
    pub fn per_row(&self) -> u32 {
        self.per_row
    }

    /// Number of thumbnails placed.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Top-left pixel of thumbnail `index`.
    pub fn origin(&self, index: usize) -> (u32, u32) {
        let per_row = self.per_row as usize;
        let col = (index % per_row) as u32;
        let row = u32::try_from(index / per_row).unwrap_or(u32::MAX);
        (
            col.saturating_mul(self.cell_width),
            row.saturating_mul(self.cell_height),
        )
    }

    /// Origins of every thumbnail, in input order.
    pub fn origins(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.count).map(|i| self.origin(i))
    }

    /// Number of rows used.
    pub fn rows(&self) -> usize {
        self.count.div_ceil(self.per_row as usize)
    }
}

/// Size of `(width, height)` after scaling to fit inside `canvas`, keeping the
/// aspect ratio.  Truncates toward zero and never returns a zero dimension.
///
/// The comparison `canvas.w / canvas.h > w / h` is cross-multiplied so equal
/// ratios fit to width exactly, with no floating-point drift.
pub fn fit_within(width: u32, height: u32, canvas: CanvasSize) -> (u32, u32) {
    let (w, h) = (u64::from(width), u64::from(height));
    let (cw, ch) = (u64::from(canvas.width), u64::from(canvas.height));

    let (new_w, new_h) = if cw * h > ch * w {
        // Canvas is wider than the frame: fit to height.
        (ch * w / h, ch)
    } else {
        (cw, cw * h / w)
    };
    (clamp_dimension(new_w), clamp_dimension(new_h))
}

fn clamp_dimension(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX).max(1)
}

/// Scales `frame` to fit `canvas` (see [`fit_within`]).
///
/// Returns an unchanged copy when the size already fits exactly.
///
/// # Errors
///
/// [`CompositeError::ZeroSizedFrame`] if `frame` or `canvas` has a zero dimension.
pub fn scale_to_fit(frame: &Frame, canvas: CanvasSize) -> Result<Frame, CompositeError> {
    if frame.is_empty() || canvas.is_empty() {
        return Err(CompositeError::ZeroSizedFrame);
    }
    let (w, h) = fit_within(frame.width(), frame.height(), canvas);
    if (w, h) == frame.size() {
        return Ok(frame.clone());
    }
    Ok(Frame::new(imageops::resize(frame.as_image(), w, h, FILTER)))
}

/// Works out cell size and per-row count for `count` thumbnails of native size
/// `thumbnail` on a canvas of `canvas`.
///
/// # Errors
///
/// - [`CompositeError::EmptyInput`] when `count` is zero.
/// - [`CompositeError::ZeroSizedFrame`] for zero-sized thumbnails or canvas.
/// - [`CompositeError::CanvasTooNarrow`] when the shrunk width would be zero.
pub fn plan_thumbnails(
    count: usize,
    thumbnail: (u32, u32),
    canvas: CanvasSize,
    policy: LayoutPolicy,
) -> Result<ThumbnailLayout, CompositeError> {
    if count == 0 {
        return Err(CompositeError::EmptyInput);
    }
    let (tw, th) = thumbnail;
    if tw == 0 || th == 0 || canvas.is_empty() {
        return Err(CompositeError::ZeroSizedFrame);
    }

    let native_per_row = canvas.width / tw;

    let layout = match policy {
        LayoutPolicy::SingleRowShrink if count as u64 > u64::from(native_per_row) => {
            let cell_width = u32::try_from(u64::from(canvas.width) / count as u64).unwrap_or(0);
            if cell_width == 0 {
                return Err(CompositeError::CanvasTooNarrow {
                    count,
                    canvas_width: canvas.width,
                });
            }
            let cell_height = clamp_dimension(u64::from(cell_width) * u64::from(th) / u64::from(tw));
            debug!(count, cell_width, cell_height, "thumbnails shrunk into a single row");
            ThumbnailLayout::new(
                cell_width,
                cell_height,
                u32::try_from(count).unwrap_or(u32::MAX),
                count,
            )
        }
        LayoutPolicy::WrapGrid if native_per_row == 0 => {
            let cell_width = canvas.width;
            let cell_height = clamp_dimension(u64::from(cell_width) * u64::from(th) / u64::from(tw));
            debug!(cell_width, cell_height, "thumbnail wider than canvas; shrunk to one per row");
            ThumbnailLayout::new(cell_width, cell_height, 1, count)
        }
        _ => ThumbnailLayout::new(tw, th, native_per_row, count),
    };
    if policy == LayoutPolicy::WrapGrid {
        let grid_height = (layout.rows() as u64).saturating_mul(u64::from(layout.cell_height));
        if grid_height > u64::from(canvas.height) {
            debug!(
                rows = layout.rows(),
                grid_height,
                canvas_height = canvas.height,
                "wrapped grid taller than canvas; lower rows will be clipped"
            );
        }
    }
    Ok(layout)
}

/// Composes frames onto a fixed canvas with a fixed layout policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compositor {
    canvas: CanvasSize,
    policy: LayoutPolicy,
}

impl Compositor {
    /// Creates a compositor with the default [`LayoutPolicy::SingleRowShrink`].
    pub fn new(canvas: CanvasSize) -> Self {
        Self { canvas, policy: LayoutPolicy::default() }
    }

    pub fn with_policy(canvas: CanvasSize, policy: LayoutPolicy) -> Self {
        Self { canvas, policy }
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn policy(&self) -> LayoutPolicy {
        self.policy
    }

    /// Combines an optional base frame with thumbnails into a new frame.
    ///
    /// An empty `thumbnails` slice counts as "no thumbnails".
    ///
    /// # Errors
    ///
    /// See [`CompositeError`].  Inputs are never modified.
    pub fn composite(
        &self,
        base: Option<&Frame>,
        thumbnails: &[Frame],
    ) -> Result<Frame, CompositeError> {
        if base.is_none() && thumbnails.is_empty() {
            return Err(CompositeError::EmptyInput);
        }
        if self.canvas.is_empty() || thumbnails.iter().any(Frame::is_empty) {
            return Err(CompositeError::ZeroSizedFrame);
        }

        let scaled_base = base.map(|b| scale_to_fit(b, self.canvas)).transpose()?;

        let Some(first) = thumbnails.first() else {
            return scaled_base.ok_or(CompositeError::EmptyInput);
        };

        let working = scaled_base.as_ref().map(CanvasSize::of).unwrap_or(self.canvas);
        let layout = plan_thumbnails(thumbnails.len(), first.size(), working, self.policy)?;

        let mut canvas = match scaled_base {
            Some(frame) => frame.into_image(),
            None => {
                let blank = match self.policy {
                    LayoutPolicy::SingleRowShrink => Frame::blank(layout.cell_width, working.height),
                    LayoutPolicy::WrapGrid => Frame::blank(working.width, working.height),
                };
                blank.into_image()
            }
        };

        let cell = (layout.cell_width, layout.cell_height);
        for (thumb, (x, y)) in thumbnails.iter().zip(layout.origins()) {
            let (x, y) = (i64::from(x), i64::from(y));
            if thumb.size() == cell {
                imageops::replace(&mut canvas, thumb.as_image(), x, y);
            } else {
                let resized = imageops::resize(thumb.as_image(), cell.0, cell.1, FILTER);
                imageops::replace(&mut canvas, &resized, x, y);
            }
        }

        Ok(Frame::new(canvas))
    }
}

/// Composes with the default layout policy.
///
/// # Errors
///
/// See [`Compositor::composite`].
pub fn composite(
    base: Option<&Frame>,
    thumbnails: &[Frame],
    canvas: CanvasSize,
) -> Result<Frame, CompositeError> {
    Compositor::new(canvas).composite(base, thumbnails)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
