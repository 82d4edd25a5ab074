//! Framing codec for the TCP messaging adapter.
//!
//! Wire format:
//! ```text
//! [version:1][kind:1][reserved:2][payload_len:4][payload:N]
//! ```
//! Header size: 8 bytes.  `payload_len` is big-endian.  The payload is the
//! `bincode` encoding of a [`SignalingRequest`] or [`SignalingResponse`],
//! selected by `kind`.
//!
//! This is deliberately thin: no sequencing, acknowledgement, or
//! retransmission.  Reliability belongs to the messaging engine.

use thiserror::Error;

use crate::protocol::messages::{
    MessageKind, SignalingMessage, SignalingRequest, SignalingResponse, HEADER_SIZE,
    PROTOCOL_VERSION,
};

/// Upper bound on a single payload, to stop a corrupt length field from
/// triggering a huge allocation.
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The kind byte in the header is not a recognized value.
    #[error("unknown message kind: 0x{0:02X}")]
    UnknownMessageKind(u8),

    /// The framing version in the header is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The payload could not be (de)serialized.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The encoded payload length field does not match the actual data available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// The declared payload exceeds [`MAX_PAYLOAD_LEN`].
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`SignalingMessage`] into a byte vector including the header.
///
/// # Errors
///
/// Returns [`ProtocolError`] if serialization fails or the payload is too large.
///
/// # Examples
///
/// ```rust
/// use conf_core::protocol::{decode_message, encode_message};
/// use conf_core::protocol::messages::{Method, SignalingMessage, SignalingRequest};
///
/// let msg = SignalingMessage::Request(SignalingRequest::new(Method::Create, "sip:a@h", "sip:server@h"));
/// let bytes = encode_message(&msg).unwrap();
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg: &SignalingMessage) -> Result<Vec<u8>, ProtocolError> {
    let payload = match msg {
        SignalingMessage::Request(r) => bincode::serialize(r),
        SignalingMessage::Response(r) => bincode::serialize(r),
    }
    .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;

    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.push(PROTOCOL_VERSION);
    buf.push(msg.kind() as u8);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Validates a header and returns the payload length it declares.
///
/// Stream readers call this after reading [`HEADER_SIZE`] bytes to learn how
/// many more bytes make up the frame.
///
/// # Errors
///
/// Returns [`ProtocolError`] for a short header, an unknown version or kind,
/// or an oversized length.
pub fn read_payload_len(header: &[u8]) -> Result<usize, ProtocolError> {
    if header.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: header.len(),
        });
    }

    let version = header[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    MessageKind::try_from(header[1]).map_err(|_| ProtocolError::UnknownMessageKind(header[1]))?;

    // header[2..4] is reserved – ignored on decode

    let payload_len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge(payload_len));
    }
    Ok(payload_len)
}

/// Decodes one [`SignalingMessage`] from the beginning of `bytes`.
///
/// Returns the message and the total number of bytes consumed (header +
/// payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are malformed.
pub fn decode_message(bytes: &[u8]) -> Result<(SignalingMessage, usize), ProtocolError> {
    let payload_len = read_payload_len(bytes)?;

    let total_needed = HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: payload_len,
            available: bytes.len() - HEADER_SIZE,
        });
    }

    let payload = &bytes[HEADER_SIZE..total_needed];
    let malformed = |e: bincode::Error| ProtocolError::MalformedPayload(e.to_string());

    // read_payload_len has already validated the kind byte.
    let msg = match MessageKind::try_from(bytes[1]) {
        Ok(MessageKind::Request) => {
            SignalingMessage::Request(bincode::deserialize::<SignalingRequest>(payload).map_err(malformed)?)
        }
        Ok(MessageKind::Response) => SignalingMessage::Response(
            bincode::deserialize::<SignalingResponse>(payload).map_err(malformed)?,
        ),
        Err(()) => return Err(ProtocolError::UnknownMessageKind(bytes[1])),
    };
    Ok((msg, total_needed))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::ConferenceId;
    use crate::protocol::messages::Method;

    fn sample_request() -> SignalingRequest {
        SignalingRequest::new(Method::Join, "sip:client@127.0.0.1:5061", "sip:server@127.0.0.1:5060")
            .with_conference_id(ConferenceId(42))
    }

    #[test]
    fn test_encode_writes_header_fields() {
        // Arrange
        let msg = SignalingMessage::Request(sample_request());

        // Act
        let bytes = encode_message(&msg).unwrap();

        // Assert
        assert_eq!(bytes[0], PROTOCOL_VERSION);
        assert_eq!(bytes[1], MessageKind::Request as u8);
        assert_eq!(&bytes[2..4], &[0, 0]);
        let declared = u32::from_be_bytes(bytes[4..8].try_into().unwrap()) as usize;
        assert_eq!(declared, bytes.len() - HEADER_SIZE);
    }

    #[test]
    fn test_response_with_body_decodes_intact() {
        let req = sample_request();
        let resp = SignalingResponse::to(&req, 403).with_body(b"not allowed".to_vec());
        let msg = SignalingMessage::Response(resp);

        let (decoded, consumed) = decode_message(&encode_message(&msg).unwrap()).unwrap();

        assert_eq!(decoded, msg);
        assert!(consumed > HEADER_SIZE);
    }

    #[test]
    fn test_decode_consumes_only_first_frame() {
        // Arrange – two frames back to back
        let first = encode_message(&SignalingMessage::Request(sample_request())).unwrap();
        let mut stream = first.clone();
        stream.extend(encode_message(&SignalingMessage::Request(sample_request())).unwrap());

        // Act
        let (_, consumed) = decode_message(&stream).unwrap();

        // Assert
        assert_eq!(consumed, first.len());
    }

    #[test]
    fn test_decode_short_header_is_insufficient_data() {
        assert_eq!(
            decode_message(&[PROTOCOL_VERSION, 0x01, 0]).unwrap_err(),
            ProtocolError::InsufficientData { needed: HEADER_SIZE, available: 3 }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut bytes = encode_message(&SignalingMessage::Request(sample_request())).unwrap();
        bytes[0] = 0x09;
        assert_eq!(decode_message(&bytes).unwrap_err(), ProtocolError::UnsupportedVersion(0x09));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let mut bytes = encode_message(&SignalingMessage::Request(sample_request())).unwrap();
        bytes[1] = 0x33;
        assert_eq!(decode_message(&bytes).unwrap_err(), ProtocolError::UnknownMessageKind(0x33));
    }

    #[test]
    fn test_decode_truncated_payload_is_length_mismatch() {
        let bytes = encode_message(&SignalingMessage::Request(sample_request())).unwrap();
        let cut = &bytes[..bytes.len() - 1];
        assert!(matches!(
            decode_message(cut),
            Err(ProtocolError::PayloadLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_read_payload_len_rejects_oversized_frame() {
        let mut header = vec![PROTOCOL_VERSION, MessageKind::Response as u8, 0, 0];
        header.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(read_payload_len(&header), Err(ProtocolError::PayloadTooLarge(_))));
    }

    #[test]
    fn test_decode_garbage_payload_is_malformed() {
        let mut bytes = vec![PROTOCOL_VERSION, MessageKind::Response as u8, 0, 0];
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        assert!(matches!(decode_message(&bytes), Err(ProtocolError::MalformedPayload(_))));
    }
}
