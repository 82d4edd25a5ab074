//! conf-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does conf-client do? (for beginners)
//!
//! The client is what a conference participant runs.  It reads short text
//! commands from the terminal (`create`, `join 42`, `quit`, `cancel`,
//! `switch video`, ...) and turns the conference ones into signaling requests
//! for the session server.
//!
//! The client application:
//!
//! 1. Checks whether the command is legal right now (you cannot join a second
//!    conference without quitting the first, and only the creator of a
//!    conference may cancel it).
//! 2. Sends exactly one request to the session server and waits for the
//!    answer.
//! 3. Updates its local session state only when the server says yes.
//! 4. Keeps track of which media (audio, video, screen) the user is sharing.
//! 5. Periodically captures the shared media, runs it through the frame
//!    codec, and composites it into one preview picture.

/// Application layer: use cases for the client.
pub mod application;

/// Infrastructure layer: network adapter, capture source, and configuration.
pub mod infrastructure;
