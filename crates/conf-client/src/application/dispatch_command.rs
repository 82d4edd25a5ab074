//! Command surface: parses user input and routes it.
//!
//! Each input line is trimmed and lower-cased, then parsed into a [`Command`].
//! Session commands go to the [`SessionHandle`]; `switch <kind>` flips the
//! shared [`SharingState`].  Parse errors never reach the session controller.
//!
//! | Input        | Command                  |
//! |--------------|--------------------------|
//! | `?`          | [`Command::Help`]        |
//! | `create`     | [`Command::Create`]      |
//! | `join <id>`  | [`Command::Join`]        |
//! | `quit`       | [`Command::Quit`]        |
//! | `cancel`     | [`Command::Cancel`]      |
//! | `switch <k>` | [`Command::Switch`]      |
//! | other        | [`Command::Unrecognized`]|

use std::str::FromStr;
use std::sync::Arc;

use conf_core::{
    ConferenceId, InvalidConferenceId, MediaKind, Operation, SessionState, SharingState,
    UnsupportedMediaKind,
};
use thiserror::Error;
use tracing::info;

use super::manage_session::SessionError;
use super::session_actor::SessionHandle;

/// Text printed for `?`.
pub const HELP: &str = "\
Commands:
  ?               show this help
  create          create a new conference (you become its manager)
  join <id>       join conference <id>
  quit            leave the current conference
  cancel          cancel the current conference (manager only)
  switch <kind>   start/stop sharing audio, video or screen";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Create,
    Join(ConferenceId),
    Quit,
    Cancel,
    Switch(MediaKind),
    /// Input that matches no command, kept for the warning message.
    Unrecognized(String),
}

/// A recognised command with a bad argument.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error(transparent)]
    InvalidConferenceId(#[from] InvalidConferenceId),

    #[error(transparent)]
    UnsupportedMediaKind(#[from] UnsupportedMediaKind),
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let input = line.trim().to_lowercase();
        let mut fields = input.splitn(2, char::is_whitespace);
        let head = fields.next().unwrap_or_default();
        let arg = fields.next().map(str::trim_start);

        let command = match (head, arg) {
            ("?" | "？", None) => Command::Help,
            ("create", None) => Command::Create,
            ("quit", None) => Command::Quit,
            ("cancel", None) => Command::Cancel,
            ("join", Some(id)) => Command::Join(id.parse()?),
            ("switch", Some(kind)) => Command::Switch(kind.parse()?),
            _ => Command::Unrecognized(input),
        };
        Ok(command)
    }
}

impl Command {
    /// The session operation this command maps to, if any.
    pub fn operation(&self) -> Option<Operation> {
        match *self {
            Command::Create => Some(Operation::Create),
            Command::Join(id) => Some(Operation::Join(id)),
            Command::Quit => Some(Operation::Quit),
            Command::Cancel => Some(Operation::Cancel),
            Command::Help | Command::Switch(_) | Command::Unrecognized(_) => None,
        }
    }
}

/// What happened as a result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Show [`HELP`].
    Help,
    /// A session operation succeeded; this is the new state.
    Session(SessionState),
    /// Sharing for `kind` is now `active`.
    Sharing { kind: MediaKind, active: bool },
    /// The input was not understood.
    Unrecognized(String),
}

/// Formats the prompt shown before each input line, e.g. `(Free)` or
/// `(OnMeeting-42)`.
pub fn prompt(state: &SessionState) -> String {
    format!("({state}) Please enter an operation (enter \"?\" for help): ")
}

/// Routes commands to the session task and the sharing tracker.
#[derive(Clone)]
pub struct CommandDispatcher {
    session: SessionHandle,
    sharing: Arc<SharingState>,
}

impl CommandDispatcher {
    pub fn new(session: SessionHandle, sharing: Arc<SharingState>) -> Self {
        Self { session, sharing }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn sharing(&self) -> &Arc<SharingState> {
        &self.sharing
    }

    /// Executes `command`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when a session operation fails.  Sharing
    /// toggles and help never fail.
    pub async fn dispatch(&self, command: Command) -> Result<CommandOutcome, SessionError> {
        if let Some(op) = command.operation() {
            return self.session.execute(op).await.map(CommandOutcome::Session);
        }

        let outcome = match command {
            Command::Switch(kind) => {
                let active = self.sharing.toggle(kind);
                info!(kind = kind.as_str(), "{kind} sharing {}", if active { "started" } else { "stopped" });
                CommandOutcome::Sharing { kind, active }
            }
            Command::Unrecognized(input) => CommandOutcome::Unrecognized(input),
            _ => CommandOutcome::Help,
        };
        Ok(outcome)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::manage_session::{
        ConferenceSessionController, MockMessagingClient, SignalingEndpoints,
    };
    use conf_core::PreconditionViolation;

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_single_word_commands() {
        assert_eq!("?".parse::<Command>().unwrap(), Command::Help);
        assert_eq!("  CREATE  ".parse::<Command>().unwrap(), Command::Create);
        assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);
        assert_eq!("Cancel".parse::<Command>().unwrap(), Command::Cancel);
    }

    #[test]
    fn test_parse_join_with_digits() {
        assert_eq!("join 42".parse::<Command>().unwrap(), Command::Join(ConferenceId(42)));
        assert_eq!("join    7".parse::<Command>().unwrap(), Command::Join(ConferenceId(7)));
    }

    #[test]
    fn test_parse_join_with_non_digits_is_error() {
        let err = "join abc".parse::<Command>().unwrap_err();
        assert!(matches!(err, CommandParseError::InvalidConferenceId(_)));
        assert!("join -1".parse::<Command>().is_err());
    }

    #[test]
    fn test_parse_bare_join_is_unrecognized() {
        assert_eq!(
            "join".parse::<Command>().unwrap(),
            Command::Unrecognized("join".to_string())
        );
    }

    #[test]
    fn test_parse_switch_kinds() {
        assert_eq!("switch video".parse::<Command>().unwrap(), Command::Switch(MediaKind::Video));
        assert_eq!("SWITCH Screen".parse::<Command>().unwrap(), Command::Switch(MediaKind::Screen));
        assert!(matches!(
            "switch hologram".parse::<Command>(),
            Err(CommandParseError::UnsupportedMediaKind(_))
        ));
    }

    #[test]
    fn test_parse_unknown_input_is_unrecognized() {
        assert_eq!(
            "dance now".parse::<Command>().unwrap(),
            Command::Unrecognized("dance now".to_string())
        );
        assert_eq!("create extra".parse::<Command>().unwrap(), Command::Unrecognized("create extra".to_string()));
    }

    #[test]
    fn test_prompt_shows_session_status() {
        assert!(prompt(&SessionState::Idle).starts_with("(Free)"));
        let state = SessionState::InConference { id: ConferenceId(42), role: conf_core::Role::Manager };
        assert!(prompt(&state).starts_with("(OnMeeting-42)"));
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    fn dispatcher(mock: MockMessagingClient) -> CommandDispatcher {
        let endpoints = SignalingEndpoints::new("client", "127.0.0.1", 5061, "127.0.0.1", 5060);
        let (session, _task) =
            SessionHandle::spawn(ConferenceSessionController::new(Arc::new(mock), endpoints));
        CommandDispatcher::new(session, Arc::new(SharingState::new()))
    }

    #[tokio::test]
    async fn test_switch_toggles_sharing_without_network() {
        // Arrange
        let mut mock = MockMessagingClient::new();
        mock.expect_request().times(0);
        let dispatcher = dispatcher(mock);

        // Act
        let first = dispatcher.dispatch(Command::Switch(MediaKind::Audio)).await.unwrap();
        let second = dispatcher.dispatch(Command::Switch(MediaKind::Audio)).await.unwrap();

        // Assert
        assert_eq!(first, CommandOutcome::Sharing { kind: MediaKind::Audio, active: true });
        assert_eq!(second, CommandOutcome::Sharing { kind: MediaKind::Audio, active: false });
        assert!(!dispatcher.sharing().is_sharing(MediaKind::Audio));
    }

    #[tokio::test]
    async fn test_quit_while_idle_is_precondition_error() {
        let mut mock = MockMessagingClient::new();
        mock.expect_request().times(0);
        let dispatcher = dispatcher(mock);

        let err = dispatcher.dispatch(Command::Quit).await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::PreconditionViolation(PreconditionViolation::NotInConference)
        ));
    }

    #[tokio::test]
    async fn test_help_and_unrecognized_pass_through() {
        let mut mock = MockMessagingClient::new();
        mock.expect_request().times(0);
        let dispatcher = dispatcher(mock);

        assert_eq!(dispatcher.dispatch(Command::Help).await.unwrap(), CommandOutcome::Help);
        assert_eq!(
            dispatcher.dispatch(Command::Unrecognized("xyz".into())).await.unwrap(),
            CommandOutcome::Unrecognized("xyz".into())
        );
    }
}
