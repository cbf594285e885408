//! JSON codec for the dashboard channel.
//!
//! Wire format: one UTF-8 JSON object per channel message, no framing of our
//! own (the transport delivers whole messages tagged with the namespace).
//!
//! - [`encode_command`] turns an [`OutboundCommand`] into its JSON text.
//! - [`try_decode_event`] parses inbound JSON and reports malformed payloads.
//! - [`decode_event`] never fails: malformed payloads are logged and degraded
//!   to an [`EventKind::Unknown`] event carrying the raw text.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::protocol::messages::{EventKind, InboundEvent, OutboundCommand};

/// Default channel namespace of the dashboard application.
pub const DASHBOARD_NAMESPACE: &str = "urn:flint:tv.matchstick.demo.dashboard";

/// Errors that can occur while encoding an outbound command.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CodecError {
    /// A `show` command was built with empty text.
    #[error("show command requires non-empty info")]
    EmptyInfo,

    /// serde_json refused to serialize the command.
    #[error("failed to serialize command: {0}")]
    Serialize(String),
}

/// Errors that can occur while decoding an inbound payload.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    /// The payload is not a JSON object with string `user`, `type` and
    /// `message` fields.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Inbound wire schema.  Unknown extra fields are ignored.
#[derive(Debug, Deserialize)]
struct InboundWire {
    user: String,
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a command into its JSON wire text.
///
/// `join` and `leave` carry exactly `command` and `user`; `show` additionally
/// carries `info`.
///
/// # Errors
///
/// Returns [`CodecError::EmptyInfo`] for a `show` command with empty text.
///
/// # Examples
///
/// ```rust
/// use dashboard_core::{encode_command, OutboundCommand};
///
/// let json = encode_command(&OutboundCommand::show("alice", "hello")).unwrap();
/// assert_eq!(json, r#"{"command":"show","user":"alice","info":"hello"}"#);
/// ```
pub fn encode_command(command: &OutboundCommand) -> Result<String, CodecError> {
    if let OutboundCommand::Show { info, .. } = command {
        if info.is_empty() {
            return Err(CodecError::EmptyInfo);
        }
    }
    serde_json::to_string(command).map_err(|e| CodecError::Serialize(e.to_string()))
}

/// Decodes an inbound payload.
///
/// A well-formed payload with an unrecognised `type` is **not** an error: it
/// decodes to an [`EventKind::Unknown`] event whose body is the raw payload.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] if the payload is not valid JSON or is
/// missing one of the required string fields.
pub fn try_decode_event(payload: &str) -> Result<InboundEvent, DecodeError> {
    let wire: InboundWire =
        serde_json::from_str(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let kind = EventKind::from_wire(&wire.kind);
    let body = match kind {
        EventKind::Unknown => payload.to_string(),
        _ => wire.message,
    };

    Ok(InboundEvent {
        user: wire.user,
        kind,
        body,
    })
}

/// Decodes an inbound payload, degrading failures to an `Unknown` event.
///
/// Inbound messages are never dropped: a malformed payload is logged at
/// `warn` level and returned as an `Unknown` event with an empty user and the
/// raw payload as body.
pub fn decode_event(payload: &str) -> InboundEvent {
    match try_decode_event(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!("could not decode dashboard payload ({e}): {payload}");
            InboundEvent::unknown(String::new(), payload)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
