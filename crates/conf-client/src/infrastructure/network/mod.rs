//! Network infrastructure for the client application.
//!
//! [`TcpMessagingClient`] implements [`MessagingClient`] over one TCP
//! connection to the session server, using the framing codec from
//! `conf_core::protocol`.
//!
//! Architecture:
//! - The stream is opened lazily on the first request and kept for later ones.
//! - The stream lives behind a `tokio::sync::Mutex`, so exchanges on one
//!   client never interleave on the wire.
//! - Each exchange is bounded by `request_timeout`.  Any failure drops the
//!   stream; the next request reconnects.
//!
//! This adapter is deliberately minimal: no retransmission and no
//! sequencing beyond checking that the response carries the request's id.

pub mod mock;

use std::time::Duration;

use async_trait::async_trait;
use conf_core::{
    decode_message, encode_message,
    protocol::{codec::read_payload_len, messages::HEADER_SIZE},
    SignalingMessage, SignalingRequest, SignalingResponse,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::Mutex,
    time,
};
use tracing::{debug, info, warn};

use crate::application::manage_session::{MessagingClient, TransportError};

/// Configuration for [`TcpMessagingClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpMessagingConfig {
    /// `host:port` of the session server.
    pub server_addr: String,
    /// Upper bound on one request/response exchange, connect included.
    pub request_timeout: Duration,
}

impl Default for TcpMessagingConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:5060".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Messaging client speaking the framed protocol over TCP.
pub struct TcpMessagingClient {
    config: TcpMessagingConfig,
    stream: Mutex<Option<TcpStream>>,
}

impl TcpMessagingClient {
    /// Creates a new (not yet connected) client.
    pub fn new(config: TcpMessagingConfig) -> Self {
        Self {
            config,
            stream: Mutex::new(None),
        }
    }

    /// Returns `true` if a connection is currently open.
    pub async fn is_connected(&self) -> bool {
        self.stream.lock().await.is_some()
    }

    async fn exchange(
        &self,
        slot: &mut Option<TcpStream>,
        request: SignalingRequest,
    ) -> Result<SignalingResponse, TransportError> {
        if slot.is_none() {
            let stream = TcpStream::connect(&self.config.server_addr)
                .await
                .map_err(|source| TransportError::Connect {
                    addr: self.config.server_addr.clone(),
                    source,
                })?;
            stream.set_nodelay(true)?;
            info!("connected to session server at {}", self.config.server_addr);
            *slot = Some(stream);
        }
        let stream = slot.as_mut().ok_or(TransportError::Closed)?;

        let expected = request.request_id;
        let bytes = encode_message(&SignalingMessage::Request(request))?;
        stream.write_all(&bytes).await?;

        loop {
            match read_frame(stream).await? {
                SignalingMessage::Response(response) if response.request_id == expected => {
                    return Ok(response);
                }
                SignalingMessage::Response(response) => {
                    return Err(TransportError::UnexpectedResponse {
                        expected,
                        received: response.request_id,
                    });
                }
                SignalingMessage::Request(unsolicited) => {
                    // Server-initiated requests are not part of this client's role.
                    warn!(method = %unsolicited.method, "ignoring request sent by server");
                }
            }
        }
    }
}

#[async_trait]
impl MessagingClient for TcpMessagingClient {
    async fn request(&self, request: SignalingRequest) -> Result<SignalingResponse, TransportError> {
        let timeout = self.config.request_timeout;
        let request_id = request.request_id;
        let mut guard = self.stream.lock().await;

        let result = match time::timeout(timeout, self.exchange(&mut guard, request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        };

        if let Err(e) = &result {
            debug!(%request_id, "dropping connection after failed exchange: {e}");
            *guard = None;
        }
        result
    }
}

/// Reads one complete frame from `stream`.
async fn read_frame(stream: &mut TcpStream) -> Result<SignalingMessage, TransportError> {
    let mut header = [0u8; HEADER_SIZE];
    if let Err(e) = stream.read_exact(&mut header).await {
        return Err(match e.kind() {
            std::io::ErrorKind::UnexpectedEof => TransportError::Closed,
            _ => e.into(),
        });
    }

    let payload_len = read_payload_len(&header)?;
    let mut frame = vec![0u8; HEADER_SIZE + payload_len];
    frame[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        stream.read_exact(&mut frame[HEADER_SIZE..]).await?;
    }

    let (msg, _) = decode_message(&frame)?;
    Ok(msg)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use conf_core::{ConferenceId, Method};
    use tokio::net::TcpListener;

    fn request() -> SignalingRequest {
        SignalingRequest::new(Method::Create, "sip:client@127.0.0.1:5061", "sip:server@127.0.0.1:5060")
    }

    fn client_for(addr: std::net::SocketAddr, timeout: Duration) -> TcpMessagingClient {
        TcpMessagingClient::new(TcpMessagingConfig {
            server_addr: addr.to_string(),
            request_timeout: timeout,
        })
    }

    /// Reads one request from `stream` and returns it.
    async fn read_request(stream: &mut TcpStream) -> SignalingRequest {
        match read_frame(stream).await.unwrap() {
            SignalingMessage::Request(req) => req,
            other => panic!("expected request, got {other:?}"),
        }
    }

    async fn write_message(stream: &mut TcpStream, msg: SignalingMessage) {
        stream.write_all(&encode_message(&msg).unwrap()).await.unwrap();
    }

    #[test]
    fn test_config_default_targets_local_server() {
        let cfg = TcpMessagingConfig::default();
        assert_eq!(cfg.server_addr, "127.0.0.1:5060");
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_request_round_trips_over_tcp() {
        // Arrange – a server that answers 200 with Conference-ID 42.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let req = read_request(&mut stream).await;
            let resp = SignalingResponse::ok(&req).with_conference_id(ConferenceId(42));
            write_message(&mut stream, SignalingMessage::Response(resp)).await;
        });
        let client = client_for(addr, Duration::from_secs(2));

        // Act
        let resp = client.request(request()).await.unwrap();

        // Assert
        assert!(resp.is_success());
        assert_eq!(resp.conference_id(), Some(ConferenceId(42)));
        assert!(client.is_connected().await);
    }

    #[tokio::test]
    async fn test_connection_is_reused_across_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept exactly once; a second connection attempt would hang.
            let (mut stream, _) = listener.accept().await.unwrap();
            for _ in 0..2 {
                let req = read_request(&mut stream).await;
                write_message(&mut stream, SignalingMessage::Response(SignalingResponse::ok(&req)))
                    .await;
            }
        });
        let client = client_for(addr, Duration::from_secs(2));

        assert!(client.request(request()).await.is_ok());
        assert!(client.request(request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unsolicited_server_request_is_skipped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let req = read_request(&mut stream).await;
            let noise = SignalingRequest::new(Method::Quit, "sip:server@h", "sip:client@h");
            write_message(&mut stream, SignalingMessage::Request(noise)).await;
            write_message(&mut stream, SignalingMessage::Response(SignalingResponse::ok(&req)))
                .await;
        });
        let client = client_for(addr, Duration::from_secs(2));

        assert!(client.request(request()).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_mismatched_request_id_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut stream).await;
            let other = SignalingResponse::ok(&request());
            write_message(&mut stream, SignalingMessage::Response(other)).await;
        });
        let client = client_for(addr, Duration::from_secs(2));

        let err = client.request(request()).await.unwrap_err();

        assert!(matches!(err, TransportError::UnexpectedResponse { .. }));
        assert!(!client.is_connected().await, "failed exchange must drop the stream");
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            // Hold the connection open without answering.
            time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });
        let client = client_for(addr, Duration::from_millis(100));

        let err = client.request(request()).await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout(_)));
        server.abort();
    }

    #[tokio::test]
    async fn test_server_closing_connection_is_closed_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut stream).await;
            // Dropping the stream closes the connection without a response.
        });
        let client = client_for(addr, Duration::from_secs(2));

        let err = client.request(request()).await.unwrap_err();

        assert!(matches!(err, TransportError::Closed));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connect_error() {
        // Bind then drop to obtain a port with nothing listening.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = client_for(addr, Duration::from_secs(2));

        let err = client.request(request()).await.unwrap_err();

        assert!(matches!(err, TransportError::Connect { .. }));
    }
}
