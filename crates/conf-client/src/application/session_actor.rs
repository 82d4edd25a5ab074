//! Single-flight session task.
//!
//! The command loop and anything else that wants to change the session talk
//! to a [`SessionHandle`].  The handle forwards each request over an `mpsc`
//! channel to one spawned task that owns the [`ConferenceSessionController`].
//! The task handles commands strictly one after another, so exchange N has
//! applied its transition before exchange N+1 checks its precondition.
//!
//! # Why a task and not a `Mutex`? (for beginners)
//!
//! A `tokio::sync::Mutex` around the controller would also serialise the
//! exchanges, but every caller would need to know about the lock.  With the
//! actor pattern, the controller has exactly one owner and callers just send a
//! message and wait for the `oneshot` reply.  Cloning a `SessionHandle` is
//! cheap; when every clone is dropped, the channel closes and the task exits.

use conf_core::{Operation, SessionState};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::debug;

use super::manage_session::{ConferenceSessionController, SessionError};

/// Maximum number of queued session commands.
const COMMAND_QUEUE_CAPACITY: usize = 32;

enum SessionCommand {
    Execute {
        op: Operation,
        reply: oneshot::Sender<Result<SessionState, SessionError>>,
    },
    State {
        reply: oneshot::Sender<SessionState>,
    },
}

/// Cloneable handle to the task that owns the session controller.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Moves `controller` onto a new task and returns a handle to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(controller: ConferenceSessionController) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let task = tokio::spawn(run_session(controller, rx));
        (Self { tx }, task)
    }

    /// Runs `op` on the controller once every earlier command has finished.
    ///
    /// # Errors
    ///
    /// Returns whatever the controller returns, or
    /// [`SessionError::ActorStopped`] if the task is gone.
    pub async fn execute(&self, op: Operation) -> Result<SessionState, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Execute { op, reply })
            .await
            .map_err(|_| SessionError::ActorStopped)?;
        rx.await.map_err(|_| SessionError::ActorStopped)?
    }

    /// Returns the session state as of the last completed command.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ActorStopped`] if the task is gone.
    pub async fn state(&self) -> Result<SessionState, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::State { reply })
            .await
            .map_err(|_| SessionError::ActorStopped)?;
        rx.await.map_err(|_| SessionError::ActorStopped)
    }
}

async fn run_session(
    mut controller: ConferenceSessionController,
    mut rx: mpsc::Receiver<SessionCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            SessionCommand::Execute { op, reply } => {
                let result = controller.execute(op).await;
                // The caller may have given up waiting; that is not an error here.
                let _ = reply.send(result);
            }
            SessionCommand::State { reply } => {
                let _ = reply.send(controller.state());
            }
        }
    }
    debug!("all session handles dropped; session task exiting");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
