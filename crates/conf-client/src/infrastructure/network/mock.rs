//! Scripted messaging client for tests and offline runs.
//!
//! # Why a scripted client?
//!
//! The real [`TcpMessagingClient`](super::TcpMessagingClient) needs a session
//! server on the other end.  `ScriptedMessagingClient` replaces the network
//! with a queue of canned replies, answered in order, and records every
//! request it receives so that tests can assert exactly what was sent.
//!
//! # Usage in tests
//!
//! ```ignore
//! let server = Arc::new(ScriptedMessagingClient::new());
//! server.reply_ok_with_conference_id(ConferenceId(42));
//!
//! let mut ctrl = ConferenceSessionController::new(server.clone(), endpoints);
//! ctrl.create().await.unwrap();
//!
//! assert_eq!(server.requests()[0].method, Method::Create);
//! ```
//!
//! When the script runs out, further requests fail with
//! [`TransportError::Closed`].

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use conf_core::{ConferenceId, SignalingRequest, SignalingResponse};

use crate::application::manage_session::{MessagingClient, TransportError};

/// One canned reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Answer with this status, optional `Conference-ID`, and optional body.
    Respond {
        status: u16,
        conference_id: Option<ConferenceId>,
        body: Option<Vec<u8>>,
    },
    /// Fail as if the server had closed the connection.
    TransportFailure,
}

/// A messaging client that replays a script and records requests.
#[derive(Default)]
pub struct ScriptedMessagingClient {
    script: Mutex<VecDeque<ScriptedReply>>,
    /// Every request received, in order.
    pub requests: Mutex<Vec<SignalingRequest>>,
}

impl ScriptedMessagingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `reply` to the script.
    pub fn push(&self, reply: ScriptedReply) -> &Self {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(reply);
        self
    }

    /// Appends a bare `200`.
    pub fn reply_ok(&self) -> &Self {
        self.push(ScriptedReply::Respond { status: 200, conference_id: None, body: None })
    }

    /// Appends a `200` carrying `Conference-ID: id`.
    pub fn reply_ok_with_conference_id(&self, id: ConferenceId) -> &Self {
        self.push(ScriptedReply::Respond { status: 200, conference_id: Some(id), body: None })
    }

    /// Appends a non-success status with a body.
    pub fn reply_status(&self, status: u16, body: &[u8]) -> &Self {
        self.push(ScriptedReply::Respond {
            status,
            conference_id: None,
            body: Some(body.to_vec()),
        })
    }

    /// Appends a transport failure.
    pub fn fail_transport(&self) -> &Self {
        self.push(ScriptedReply::TransportFailure)
    }

    /// Returns a copy of every request received so far.
    pub fn requests(&self) -> Vec<SignalingRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl MessagingClient for ScriptedMessagingClient {
    async fn request(&self, request: SignalingRequest) -> Result<SignalingResponse, TransportError> {
        let reply = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        match reply {
            Some(ScriptedReply::Respond { status, conference_id, body }) => {
                let mut response = SignalingResponse::to(&request, status);
                if let Some(id) = conference_id {
                    response = response.with_conference_id(id);
                }
                response.body = body;
                Ok(response)
            }
            Some(ScriptedReply::TransportFailure) | None => Err(TransportError::Closed),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
