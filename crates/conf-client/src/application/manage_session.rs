//! ConferenceSessionController: drives the conference lifecycle.
//!
//! The controller owns the client's [`SessionState`].  For each operation it:
//!
//! 1. Checks the legal-transition table ([`SessionState::authorize`]).  An
//!    illegal operation fails here and no request is sent.
//! 2. Sends exactly one [`SignalingRequest`] through the injected
//!    [`MessagingClient`] and waits for the answer.
//! 3. Applies the transition only if the server answered `200`.
//!
//! Any failure leaves the state exactly as it was.  There are no retries.
//!
//! # Architecture
//!
//! This use case depends only on the [`MessagingClient`] trait and `conf_core`
//! domain types.  The TCP adapter and the test doubles are injected at
//! construction time.  Every operation takes `&mut self`, so the borrow checker
//! rules out two exchanges in flight on the same controller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use conf_core::{
    protocol::ProtocolError, CompletedOperation, ConferenceId, Method, Operation,
    PreconditionViolation, SessionState, SignalingRequest, SignalingResponse,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Payload sent with CREATE: an empty JSON object.
pub const CREATE_PAYLOAD: &[u8] = b"{}";

// ── Messaging seam ────────────────────────────────────────────────────────────

/// Failures reported by a [`MessagingClient`] before any status code arrives.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server could not be reached.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No response arrived in time.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The server closed the connection.
    #[error("connection closed by server")]
    Closed,

    /// The response answers a different request.
    #[error("response {received} does not answer request {expected}")]
    UnexpectedResponse { expected: Uuid, received: Uuid },
}

/// Sends one signaling request and returns the server's response.
///
/// Reliability (retransmission, ordering) is the implementation's business;
/// the controller treats any `Err` as a failed exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Delivers `request` and awaits the matching response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if no response could be obtained.
    async fn request(&self, request: SignalingRequest) -> Result<SignalingResponse, TransportError>;
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why an exchange with the server did not succeed.
#[derive(Debug, Error)]
pub enum SignalingFailure {
    /// The server answered with a non-200 status.  The body is passed through
    /// uninterpreted.
    #[error("server rejected the request with status {status}")]
    Rejected { status: u16, body: Option<Vec<u8>> },

    /// The request never got an answer.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// A successful CREATE response without a usable `Conference-ID` header.
    #[error("CREATE response carried no valid Conference-ID header")]
    MissingConferenceId,
}

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation is not legal in the current state; nothing was sent.
    #[error("{0}")]
    PreconditionViolation(#[from] PreconditionViolation),

    /// The exchange with the server failed; state is unchanged.
    #[error("{0}")]
    Signaling(#[from] SignalingFailure),

    /// The task that owns the controller is no longer running.
    #[error("session task has stopped")]
    ActorStopped,
}

// ── Addressing ────────────────────────────────────────────────────────────────

/// SIP-style URIs placed on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalingEndpoints {
    /// `sip:{username}@{local_ip}:{local_port}`
    pub from_uri: String,
    /// `sip:server@{host}:{port}`
    pub to_uri: String,
}

impl SignalingEndpoints {
    pub fn new(
        username: &str,
        local_ip: &str,
        local_port: u16,
        server_host: &str,
        server_port: u16,
    ) -> Self {
        Self {
            from_uri: format!("sip:{username}@{local_ip}:{local_port}"),
            to_uri: format!("sip:server@{server_host}:{server_port}"),
        }
    }
}

// ── Use case ──────────────────────────────────────────────────────────────────

/// Owns the session state and performs the signaling exchanges.
pub struct ConferenceSessionController {
    messaging: Arc<dyn MessagingClient>,
    endpoints: SignalingEndpoints,
    state: SessionState,
}

impl ConferenceSessionController {
    /// Creates an idle controller.
    pub fn new(messaging: Arc<dyn MessagingClient>, endpoints: SignalingEndpoints) -> Self {
        Self {
            messaging,
            endpoints,
            state: SessionState::Idle,
        }
    }

    /// Returns the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Creates a new conference; on success this client is its manager.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn create(&mut self) -> Result<SessionState, SessionError> {
        self.execute(Operation::Create).await
    }

    /// Joins conference `id` as a participant.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn join(&mut self, id: ConferenceId) -> Result<SessionState, SessionError> {
        self.execute(Operation::Join(id)).await
    }

    /// Leaves the current conference.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn quit(&mut self) -> Result<SessionState, SessionError> {
        self.execute(Operation::Quit).await
    }

    /// Cancels the current conference for everyone.  Manager only.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn cancel(&mut self) -> Result<SessionState, SessionError> {
        self.execute(Operation::Cancel).await
    }

    /// Runs one operation end to end and returns the resulting state.
    ///
    /// # Errors
    ///
    /// - [`SessionError::PreconditionViolation`] if `op` is illegal right now
    ///   (no request is sent).
    /// - [`SessionError::Signaling`] if the server rejects the request, the
    ///   transport fails, or a CREATE response lacks a conference id.
    pub async fn execute(&mut self, op: Operation) -> Result<SessionState, SessionError> {
        if let Err(violation) = self.state.authorize(op) {
            warn!(operation = op.name(), state = %self.state, "{violation}");
            return Err(violation.into());
        }

        let request = self.build_request(op)?;
        let request_id = request.request_id;
        let method = request.method;
        debug!(%request_id, %method, "sending signaling request");

        let response = match self.messaging.request(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(%request_id, %method, "transport failure: {e}");
                return Err(SignalingFailure::Transport(e).into());
            }
        };

        if !response.is_success() {
            error!(%request_id, %method, status = response.status_code, "request rejected");
            return Err(SignalingFailure::Rejected {
                status: response.status_code,
                body: response.body,
            }
            .into());
        }

        let completed = match op {
            Operation::Create => match response.conference_id() {
                Some(id) => CompletedOperation::Created(id),
                None => {
                    error!(%request_id, %method, "CREATE response has no usable Conference-ID");
                    return Err(SignalingFailure::MissingConferenceId.into());
                }
            },
            Operation::Join(id) => CompletedOperation::Joined(id),
            Operation::Quit => CompletedOperation::Quit,
            Operation::Cancel => CompletedOperation::Cancelled,
        };

        self.state.apply(completed)?;
        info!(
            %request_id,
            %method,
            conference_id = ?self.state.conference_id().map(|id| id.0),
            state = %self.state,
            "{} succeeded",
            op.name()
        );
        Ok(self.state)
    }

    fn build_request(&self, op: Operation) -> Result<SignalingRequest, PreconditionViolation> {
        let request = SignalingRequest::new(
            Method::from(op),
            self.endpoints.from_uri.as_str(),
            self.endpoints.to_uri.as_str(),
        );
        let request = match op {
            Operation::Create => request.with_payload(CREATE_PAYLOAD),
            Operation::Join(id) => request.with_conference_id(id),
            Operation::Quit | Operation::Cancel => {
                let id = self
                    .state
                    .conference_id()
                    .ok_or(PreconditionViolation::NotInConference)?;
                request.with_conference_id(id)
            }
        };
        Ok(request)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
