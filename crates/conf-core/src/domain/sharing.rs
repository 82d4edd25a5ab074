//! Media sharing tracker.
//!
//! Remembers, for each [`MediaKind`], whether the user is currently sending it.
//! The tracker lives for the whole client process: it starts all-off and is
//! only changed by explicit `switch <kind>` commands.  Joining, quitting, or
//! cancelling a conference does not touch it.
//!
//! # Why atomics?
//!
//! The command dispatcher flips toggles while the render loop reads them on
//! every tick.  One `AtomicBool` per kind lets both sides share the tracker
//! through an `Arc` without a lock, and each toggle is a single atomic
//! read-modify-write, so a reader never sees a half-applied switch.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of media kinds a client can share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
    Screen,
}

impl MediaKind {
    /// Every supported kind, in display order.
    pub const ALL: [MediaKind; 3] = [MediaKind::Audio, MediaKind::Video, MediaKind::Screen];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Screen => "screen",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media kind name outside the supported set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported media kind: {0}")]
pub struct UnsupportedMediaKind(pub String);

impl FromStr for MediaKind {
    type Err = UnsupportedMediaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(MediaKind::Audio),
            "video" => Ok(MediaKind::Video),
            "screen" => Ok(MediaKind::Screen),
            _ => Err(UnsupportedMediaKind(s.to_string())),
        }
    }
}

/// Point-in-time copy of all toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SharingSnapshot {
    pub audio: bool,
    pub video: bool,
    pub screen: bool,
}

impl SharingSnapshot {
    pub fn is_sharing(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
            MediaKind::Screen => self.screen,
        }
    }
}

/// Shared per-kind sharing flags.
#[derive(Debug, Default)]
pub struct SharingState {
    audio: AtomicBool,
    video: AtomicBool,
    screen: AtomicBool,
}

impl SharingState {
    /// Creates a tracker with every kind switched off.
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, kind: MediaKind) -> &AtomicBool {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
            MediaKind::Screen => &self.screen,
        }
    }

    /// Flips `kind` and returns its new value.
    pub fn toggle(&self, kind: MediaKind) -> bool {
        // fetch_xor returns the previous value.
        !self.flag(kind).fetch_xor(true, Ordering::AcqRel)
    }

    /// Returns whether `kind` is currently shared.
    pub fn is_sharing(&self, kind: MediaKind) -> bool {
        self.flag(kind).load(Ordering::Acquire)
    }

    /// Returns a copy of all toggles.
    ///
    /// Each field is read independently; a toggle racing with the snapshot
    /// shows up either before or after, never torn.
    pub fn snapshot(&self) -> SharingSnapshot {
        SharingSnapshot {
            audio: self.is_sharing(MediaKind::Audio),
            video: self.is_sharing(MediaKind::Video),
            screen: self.is_sharing(MediaKind::Screen),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_tracker_is_all_off() {
        let state = SharingState::new();
        assert_eq!(state.snapshot(), SharingSnapshot::default());
    }

    #[test]
    fn test_toggle_flips_and_returns_new_value() {
        // Arrange
        let state = SharingState::new();

        // Act / Assert
        assert!(state.toggle(MediaKind::Screen));
        assert!(state.is_sharing(MediaKind::Screen));
        assert!(!state.toggle(MediaKind::Screen));
        assert!(!state.is_sharing(MediaKind::Screen));
    }

    #[test]
    fn test_toggle_only_affects_one_kind() {
        let state = SharingState::new();
        state.toggle(MediaKind::Video);
        let snap = state.snapshot();
        assert!(snap.video);
        assert!(!snap.audio);
        assert!(!snap.screen);
    }

    #[test]
    fn test_media_kind_parses_case_insensitively() {
        assert_eq!("Audio".parse::<MediaKind>(), Ok(MediaKind::Audio));
        assert_eq!("SCREEN".parse::<MediaKind>(), Ok(MediaKind::Screen));
        assert_eq!(
            "chat".parse::<MediaKind>(),
            Err(UnsupportedMediaKind("chat".to_string()))
        );
    }

    #[test]
    fn test_concurrent_toggles_are_not_lost() {
        // Arrange – an even number of toggles across threads must end at "off".
        let state = Arc::new(SharingState::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&state);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        s.toggle(MediaKind::Audio);
                    }
                })
            })
            .collect();

        // Act
        for h in handles {
            h.join().unwrap();
        }

        // Assert
        assert!(!state.is_sharing(MediaKind::Audio));
    }
}
