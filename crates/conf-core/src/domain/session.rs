//! Conference session state machine.
//!
//! A client is either [`SessionState::Idle`] or inside exactly one conference
//! with a fixed [`Role`].  The role is assigned once, when the conference is
//! created (Manager) or joined (Participant), and decides whether the client
//! may later cancel the whole conference.
//!
//! # Legal-transition table
//!
//! ```text
//!                 Idle          InConference(_, Participant)   InConference(_, Manager)
//! Create          allowed       AlreadyInConference            AlreadyInConference
//! Join(id)        allowed       AlreadyInConference            AlreadyInConference
//! Quit            NotInConf.    allowed                        allowed
//! Cancel          NotInConf.    NotManager                     allowed
//! ```
//!
//! The state only changes through [`SessionState::apply`], which takes a
//! [`CompletedOperation`] (something the server has confirmed), never a bare
//! request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server-assigned conference identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConferenceId(pub u64);

/// A conference id string that is not made of decimal digits.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("conference id must be in digital form, got {0:?}")]
pub struct InvalidConferenceId(pub String);

impl FromStr for ConferenceId {
    type Err = InvalidConferenceId;

    /// Accepts only ASCII digits (no sign, no whitespace), matching what the
    /// session server hands out.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidConferenceId(s.to_string()));
        }
        s.parse::<u64>()
            .map(ConferenceId)
            .map_err(|_| InvalidConferenceId(s.to_string()))
    }
}

impl fmt::Display for ConferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The client's role inside a conference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Created the conference; may cancel it for everyone.
    Manager,
    /// Joined an existing conference; may only quit.
    Participant,
}

/// Local conference membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not in any conference.
    #[default]
    Idle,
    /// Member of `id` with the given role.
    InConference { id: ConferenceId, role: Role },
}

/// An operation the caller asks for, before any request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Join(ConferenceId),
    Quit,
    Cancel,
}

impl Operation {
    /// Lower-case verb used in logs and in the command surface.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Join(_) => "join",
            Operation::Quit => "quit",
            Operation::Cancel => "cancel",
        }
    }
}

/// An operation the server has acknowledged with a success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletedOperation {
    /// CREATE succeeded; the server assigned this id.
    Created(ConferenceId),
    /// JOIN succeeded for this id.
    Joined(ConferenceId),
    /// QUIT succeeded.
    Quit,
    /// CANCEL succeeded.
    Cancelled,
}

impl CompletedOperation {
    /// The request this completion answers, used to re-check legality.
    fn requested(&self) -> Operation {
        match *self {
            CompletedOperation::Created(_) => Operation::Create,
            CompletedOperation::Joined(id) => Operation::Join(id),
            CompletedOperation::Quit => Operation::Quit,
            CompletedOperation::Cancelled => Operation::Cancel,
        }
    }
}

/// Why an operation is not legal in the current state.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PreconditionViolation {
    /// Create/Join while already a member of a conference.
    #[error("already in conference {0}; quit before creating or joining another one")]
    AlreadyInConference(ConferenceId),

    /// Quit/Cancel while idle.
    #[error("not in a conference")]
    NotInConference,

    /// Cancel by a participant.
    #[error("only the conference manager may cancel conference {0}")]
    NotManager(ConferenceId),
}

impl SessionState {
    /// Returns the current conference id, if any.
    pub fn conference_id(&self) -> Option<ConferenceId> {
        match self {
            SessionState::Idle => None,
            SessionState::InConference { id, .. } => Some(*id),
        }
    }

    /// Returns the current role, if any.
    pub fn role(&self) -> Option<Role> {
        match self {
            SessionState::Idle => None,
            SessionState::InConference { role, .. } => Some(*role),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Checks `op` against the legal-transition table.
    ///
    /// # Errors
    ///
    /// Returns the [`PreconditionViolation`] that forbids `op` in this state.
    pub fn authorize(&self, op: Operation) -> Result<(), PreconditionViolation> {
        match (self, op) {
            (SessionState::Idle, Operation::Create | Operation::Join(_)) => Ok(()),
            (SessionState::InConference { id, .. }, Operation::Create | Operation::Join(_)) => {
                Err(PreconditionViolation::AlreadyInConference(*id))
            }
            (SessionState::Idle, Operation::Quit | Operation::Cancel) => {
                Err(PreconditionViolation::NotInConference)
            }
            (SessionState::InConference { .. }, Operation::Quit) => Ok(()),
            (SessionState::InConference { role: Role::Manager, .. }, Operation::Cancel) => Ok(()),
            (SessionState::InConference { id, role: Role::Participant }, Operation::Cancel) => {
                Err(PreconditionViolation::NotManager(*id))
            }
        }
    }

    /// Applies a server-confirmed operation.
    ///
    /// The completion is re-checked against [`authorize`](Self::authorize) so
    /// the state can never take an illegal edge, even if a caller skipped the
    /// check before sending the request.
    ///
    /// # Errors
    ///
    /// Returns the violation and leaves `self` untouched when the completion
    /// does not fit the current state.
    pub fn apply(&mut self, completed: CompletedOperation) -> Result<(), PreconditionViolation> {
        self.authorize(completed.requested())?;
        *self = match completed {
            CompletedOperation::Created(id) => SessionState::InConference { id, role: Role::Manager },
            CompletedOperation::Joined(id) => {
                SessionState::InConference { id, role: Role::Participant }
            }
            CompletedOperation::Quit | CompletedOperation::Cancelled => SessionState::Idle,
        };
        Ok(())
    }
}

impl fmt::Display for SessionState {
    /// Prompt label: `Free` or `OnMeeting-<id>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Free"),
            SessionState::InConference { id, .. } => write!(f, "OnMeeting-{id}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
