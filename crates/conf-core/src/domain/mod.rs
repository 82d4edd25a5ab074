//! Domain entities for the conference client.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core business rules of the application.
//! - Has **no** imports from OS APIs, network libraries, or UI frameworks.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Here the rules are: which conference operations are legal in which state,
//! which media kinds are being shared, and how a screen frame and a set of
//! camera thumbnails are combined into one picture.

/// Conference membership state machine.
pub mod session;

/// Per-media-kind sharing toggles.
pub mod sharing;

/// Immutable pixel buffer.
pub mod frame;

/// Thumbnail layout and frame composition.
///
/// See [`compositor::composite`] for the main entry point.
pub mod compositor;
