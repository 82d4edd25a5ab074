//! Console front end: line input and the interactive command loop.
//!
//! # Why a dedicated reader thread? (for beginners)
//!
//! `tokio::io::stdin()` performs its reads on the blocking pool, and a
//! blocking read cannot be cancelled.  If the user presses Ctrl-C while the
//! prompt is waiting, the runtime would hang on shutdown until one more line
//! arrived.  Instead, [`spawn_line_reader`] reads lines on a plain OS thread
//! and hands them over through a `tokio::sync::mpsc` channel.  The command
//! loop `select!`s on that channel and the shutdown signal; when it returns,
//! the reader thread is simply left behind and dies with the process.
//!
//! ```text
//! stdin ──► reader thread ──mpsc──► run_command_loop ──► CommandDispatcher
//!                                        ▲
//!                              Ctrl-C ───┘
//! ```

use std::future::Future;
use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::dispatch_command::{
    prompt, Command, CommandDispatcher, CommandOutcome, HELP,
};
use crate::application::manage_session::SessionError;

/// Lines buffered between the reader thread and the command loop.
pub const LINE_BUFFER: usize = 32;

/// Receiving end of the line channel.  `None` from `recv` means end of input.
pub type LineReceiver = mpsc::Receiver<io::Result<String>>;

/// Errors that end the command loop.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Why the command loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The input stream ended.
    EndOfInput,
    /// The shutdown future completed.
    Shutdown,
}

/// Reads `reader` line by line on a dedicated thread.
///
/// The thread stops after end of input, after the first read error (which is
/// forwarded), or as soon as the receiver is dropped and the next line
/// cannot be delivered.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_line_reader<R>(reader: R) -> io::Result<(LineReceiver, JoinHandle<()>)>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    let handle = thread::Builder::new()
        .name("console-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() {
                    debug!("line receiver dropped; reader stopping");
                    return;
                }
                if failed {
                    return;
                }
            }
            debug!("end of console input");
        })?;
    Ok((rx, handle))
}

/// Runs the interactive loop until input ends or `shutdown` completes.
///
/// Each round writes the prompt to `out`, waits for a line, parses it and
/// dispatches it.  Parse failures and command failures are reported and the
/// loop carries on; only console I/O errors or a stopped session task end it
/// early.
///
/// # Errors
///
/// - [`ConsoleError::Io`] if reading a line or writing to `out` fails.
/// - [`ConsoleError::Session`] if the session task has stopped.
pub async fn run_command_loop<W, S>(
    dispatcher: &CommandDispatcher,
    lines: &mut LineReceiver,
    out: &mut W,
    shutdown: S,
) -> Result<LoopExit, ConsoleError>
where
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let state = dispatcher.session().state().await?;
        out.write_all(prompt(&state).as_bytes()).await?;
        out.flush().await?;

        let line = tokio::select! {
            line = lines.recv() => line,
            () = &mut shutdown => {
                info!("shutdown signal received");
                return Ok(LoopExit::Shutdown);
            }
        };
        let Some(line) = line else {
            info!("end of input");
            return Ok(LoopExit::EndOfInput);
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        // Failures are logged by the controller; the loop carries on.
        let report = match dispatcher.dispatch(command).await {
            Ok(CommandOutcome::Help) => HELP.to_string(),
            Ok(CommandOutcome::Session(state)) => format!("now {state}"),
            Ok(CommandOutcome::Sharing { kind, active }) => {
                format!("{kind} sharing {}", if active { "on" } else { "off" })
            }
            Ok(CommandOutcome::Unrecognized(input)) => {
                warn!("unrecognized command {input:?}");
                continue;
            }
            Err(SessionError::ActorStopped) => return Err(SessionError::ActorStopped.into()),
            Err(e) => e.to_string(),
        };
        out.write_all(report.as_bytes()).await?;
        out.write_all(b"\n").await?;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
