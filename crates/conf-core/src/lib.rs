//! # conf-core
//!
//! Shared library for the conference client containing the session state
//! machine, the media sharing tracker, the frame compositor, the signaling
//! message types, and the frame codec boundary.
//!
//! It has zero dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! The conference client talks to a session server to create, join, quit, or
//! cancel a conference, and shows the user one composed picture made from a
//! shared screen plus a row of participant camera thumbnails.
//!
//! This crate (`conf-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure business logic.  The session state machine decides
//!   which signaling operations are legal right now; the sharing tracker
//!   remembers which media kinds the user is sending; the compositor lays out
//!   thumbnails over a base frame.
//!
//! - **`protocol`** – The request/response message types exchanged with the
//!   session server, and the small framing codec the TCP adapter uses to put
//!   them on a socket.
//!
//! - **`media`** – The codec boundary: turning a [`Frame`] into transport bytes
//!   and back.

pub mod domain;
pub mod media;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `conf_core::SessionState` instead of `conf_core::domain::session::SessionState`.
pub use domain::compositor::{
    composite, fit_within, plan_thumbnails, scale_to_fit, CanvasSize, CompositeError, Compositor,
    LayoutPolicy, ThumbnailLayout,
};
pub use domain::frame::Frame;
pub use domain::session::{
    CompletedOperation, ConferenceId, InvalidConferenceId, Operation, PreconditionViolation,
    Role, SessionState,
};
pub use domain::sharing::{MediaKind, SharingSnapshot, SharingState, UnsupportedMediaKind};
pub use media::codec::{CodecError, FrameCodec, JpegCodec};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Method, SignalingMessage, SignalingRequest, SignalingResponse};
