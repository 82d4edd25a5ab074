//! Application layer use cases for the client application.
//!
//! # What use cases does the client have?
//!
//! - **`manage_session`** – The conference session controller.  Checks each
//!   create/join/quit/cancel against the session state machine, sends one
//!   request through an injected [`MessagingClient`](manage_session::MessagingClient),
//!   and applies the transition only on success.
//!
//! - **`session_actor`** – Runs the controller on its own task and feeds it
//!   operations one at a time through a channel, so two exchanges can never
//!   overlap.
//!
//! - **`dispatch_command`** – Parses a line typed by the user and routes it to
//!   the session actor or the sharing tracker.
//!
//! - **`render_frame`** – Captures the shared media, passes it through the
//!   frame codec, and composites the local preview.

pub mod dispatch_command;
pub mod manage_session;
pub mod render_frame;
pub mod session_actor;
