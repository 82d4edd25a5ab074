//! Infrastructure layer for the client application.
//!
//! Contains the adapters behind the application-layer traits: TCP signaling,
//! the capture source, and configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and `conf_core`,
//! but MUST NOT be imported by the `application` or domain layers.
//!
//! # Sub-modules
//!
//! - **`console`** – a reader thread that turns stdin into a line channel, and
//!   the interactive command loop that consumes it.
//!
//! - **`network`** – `TcpMessagingClient`, which frames signaling requests onto
//!   a TCP connection to the session server, plus `ScriptedMessagingClient`, a
//!   replay double for tests and offline runs.
//!
//! - **`capture`** – `SyntheticCapture`, a deterministic stand-in for camera
//!   and screen capture that owns its device sizes.
//!
//! - **`storage`** – TOML configuration file loading and saving.

pub mod capture;
pub mod console;
pub mod network;
pub mod storage;
