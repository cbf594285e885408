//! DashboardChannel: the namespaced logical pipe to the dashboard application.
//!
//! The channel owns the namespace and wraps the [`dashboard_core`] codec:
//!
//! ```text
//! OutboundCommand ──encode──► JSON ──transport.send(namespace, ..)──► device
//! device ──MessageReceived(namespace, JSON)──► decode ──► InboundEvent
//! ```
//!
//! # Fire-and-forget sends
//!
//! [`DashboardChannel::send`] hands the payload to the transport and returns a
//! [`PendingSend`].  Settling it logs a failed delivery and nothing else: there
//! is no retry, no requeue, and the failure never reaches the caller.  Join,
//! show and leave are low-value presence and chat events, so at-most-once
//! delivery is acceptable.

use dashboard_core::protocol::DASHBOARD_NAMESPACE;
use dashboard_core::{decode_event, encode_command, CodecError, InboundEvent, OutboundCommand};
use tracing::{debug, warn};

use crate::application::transport::{AckReceiver, SendAck, SessionTransport};

/// The dashboard message channel.  The namespace never changes after
/// construction.
#[derive(Debug, Clone)]
pub struct DashboardChannel {
    namespace: String,
}

impl Default for DashboardChannel {
    fn default() -> Self {
        Self::new(DASHBOARD_NAMESPACE)
    }
}

impl DashboardChannel {
    /// Creates a channel bound to `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Returns the namespace this channel is bound to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Encodes a command into its wire text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EmptyInfo`] for a `show` with empty text.
    pub fn encode(&self, command: &OutboundCommand) -> Result<String, CodecError> {
        encode_command(command)
    }

    /// Decodes an inbound payload.  Malformed payloads become `Unknown` events.
    pub fn decode(&self, payload: &str) -> InboundEvent {
        decode_event(payload)
    }

    /// Encodes `command` and sends it on this channel's namespace.
    ///
    /// # Errors
    ///
    /// Only encoding errors are returned.  Delivery failures are reported by
    /// settling the returned [`PendingSend`], which logs them.
    pub fn send(
        &self,
        transport: &dyn SessionTransport,
        command: &OutboundCommand,
    ) -> Result<PendingSend, CodecError> {
        let payload = self.encode(command)?;
        debug!("sending message: (ns={}) {payload}", self.namespace);
        let ack = transport.send(&self.namespace, payload.clone());
        Ok(PendingSend {
            command: command.name(),
            payload,
            ack,
        })
    }
}

/// A message handed to the transport whose acknowledgement has not arrived.
#[derive(Debug)]
pub struct PendingSend {
    command: &'static str,
    payload: String,
    ack: AckReceiver,
}

impl PendingSend {
    /// Waits for the acknowledgement and logs a failed delivery.
    ///
    /// Returns `None` if the transport dropped the acknowledgement without
    /// resolving it.
    pub async fn settle(self) -> Option<SendAck> {
        match self.ack.await {
            Ok(ack) if ack.success => {
                debug!("{} delivered", self.command);
                Some(ack)
            }
            Ok(ack) => {
                warn!(
                    "failed to send message. status_code: {} message: {}",
                    ack.status_code, self.payload
                );
                Some(ack)
            }
            Err(_) => {
                warn!(
                    "transport dropped the acknowledgement for message: {}",
                    self.payload
                );
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
