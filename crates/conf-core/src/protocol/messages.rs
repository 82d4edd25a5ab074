//! Signaling message types exchanged with the session server.
//!
//! A signaling exchange is one [`SignalingRequest`] answered by one
//! [`SignalingResponse`].  Addressing uses SIP-style URIs
//! (`sip:user@host:port`); conference identity travels in the
//! [`CONFERENCE_ID_HEADER`] header.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::session::{ConferenceId, Operation};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current framing version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Size of the framing header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Header carrying the conference id on JOIN/QUIT/CANCEL and on the CREATE response.
pub const CONFERENCE_ID_HEADER: &str = "Conference-ID";

/// The only status code treated as success.
pub const STATUS_OK: u16 = 200;

// ── Message kinds ─────────────────────────────────────────────────────────────

/// Frame kind byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Request = 0x01,
    Response = 0x02,
}

impl TryFrom<u8> for MessageKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MessageKind::Request),
            0x02 => Ok(MessageKind::Response),
            _ => Err(()),
        }
    }
}

// ── Methods ───────────────────────────────────────────────────────────────────

/// Signaling request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Create,
    Join,
    Quit,
    Cancel,
}

impl Method {
    /// Upper-case method token as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Create => "CREATE",
            Method::Join => "JOIN",
            Method::Quit => "QUIT",
            Method::Cancel => "CANCEL",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Operation> for Method {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Create => Method::Create,
            Operation::Join(_) => Method::Join,
            Operation::Quit => Method::Quit,
            Operation::Cancel => Method::Cancel,
        }
    }
}

/// Header map; ordered so encoded requests are deterministic.
pub type Headers = BTreeMap<String, String>;

// ── Messages ──────────────────────────────────────────────────────────────────

/// A request to the session server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalingRequest {
    /// Correlates the response with this request.
    pub request_id: Uuid,
    pub method: Method,
    /// Sender URI, e.g. `sip:client@127.0.0.1:5061`.
    pub from_uri: String,
    /// Server URI, e.g. `sip:server@127.0.0.1:5060`.
    pub to_uri: String,
    pub headers: Headers,
    pub payload: Option<Vec<u8>>,
}

impl SignalingRequest {
    /// Creates a request with a fresh `request_id` and no headers or payload.
    pub fn new(method: Method, from_uri: impl Into<String>, to_uri: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            from_uri: from_uri.into(),
            to_uri: to_uri.into(),
            headers: Headers::new(),
            payload: None,
        }
    }

    /// Adds the `Conference-ID` header.
    pub fn with_conference_id(mut self, id: ConferenceId) -> Self {
        self.headers.insert(CONFERENCE_ID_HEADER.to_string(), id.to_string());
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Returns the `Conference-ID` header, if present and well-formed.
    pub fn conference_id(&self) -> Option<ConferenceId> {
        self.headers.get(CONFERENCE_ID_HEADER)?.parse().ok()
    }
}

/// The server's answer to a [`SignalingRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalingResponse {
    /// Copied from the request being answered.
    pub request_id: Uuid,
    pub status_code: u16,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl SignalingResponse {
    /// Creates a response to `request` with the given status.
    pub fn to(request: &SignalingRequest, status_code: u16) -> Self {
        Self {
            request_id: request.request_id,
            status_code,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Creates a `200` response to `request`.
    pub fn ok(request: &SignalingRequest) -> Self {
        Self::to(request, STATUS_OK)
    }

    pub fn with_conference_id(mut self, id: ConferenceId) -> Self {
        self.headers.insert(CONFERENCE_ID_HEADER.to_string(), id.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// `true` only for status 200.
    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    /// Returns the `Conference-ID` header, if present and well-formed.
    pub fn conference_id(&self) -> Option<ConferenceId> {
        self.headers.get(CONFERENCE_ID_HEADER)?.parse().ok()
    }
}

/// Either side of an exchange, as carried by one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingMessage {
    Request(SignalingRequest),
    Response(SignalingResponse),
}

impl SignalingMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            SignalingMessage::Request(_) => MessageKind::Request,
            SignalingMessage::Response(_) => MessageKind::Response,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_maps_from_operation() {
        assert_eq!(Method::from(Operation::Create), Method::Create);
        assert_eq!(Method::from(Operation::Join(ConferenceId(1))), Method::Join);
        assert_eq!(Method::from(Operation::Cancel).as_str(), "CANCEL");
    }

    #[test]
    fn test_request_conference_id_header_round_trips() {
        let req = SignalingRequest::new(Method::Join, "sip:a@h", "sip:server@h")
            .with_conference_id(ConferenceId(42));
        assert_eq!(req.headers.get(CONFERENCE_ID_HEADER).map(String::as_str), Some("42"));
        assert_eq!(req.conference_id(), Some(ConferenceId(42)));
    }

    #[test]
    fn test_requests_get_distinct_ids() {
        let a = SignalingRequest::new(Method::Quit, "a", "b");
        let b = SignalingRequest::new(Method::Quit, "a", "b");
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_response_success_is_only_200() {
        let req = SignalingRequest::new(Method::Create, "a", "b");
        assert!(SignalingResponse::ok(&req).is_success());
        assert!(!SignalingResponse::to(&req, 201).is_success());
        assert!(!SignalingResponse::to(&req, 404).is_success());
    }

    #[test]
    fn test_response_malformed_conference_id_is_none() {
        let req = SignalingRequest::new(Method::Create, "a", "b");
        let mut resp = SignalingResponse::ok(&req);
        resp.headers.insert(CONFERENCE_ID_HEADER.to_string(), "abc".to_string());
        assert_eq!(resp.conference_id(), None);
    }

    #[test]
    fn test_message_kind_from_byte() {
        assert_eq!(MessageKind::try_from(0x02), Ok(MessageKind::Response));
        assert!(MessageKind::try_from(0x7F).is_err());
    }
}
