//! Codec boundary between raw [`Frame`](crate::Frame)s and transport payloads.
//!
//! Encoding happens before a captured frame leaves the client; decoding happens
//! before a received payload reaches the compositor.  The compositor itself
//! never sees encoded bytes.

pub mod codec;

pub use codec::{CodecError, FrameCodec, JpegCodec};
