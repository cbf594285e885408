//! The transport seam: what the session needs from the device connection.
//!
//! The sender does not implement networking itself.  It is handed a
//! [`SessionTransport`] that can connect to a device, launch the dashboard
//! application on it, and carry namespaced text messages.
//!
//! # Request / callback split
//!
//! Every transport operation that takes time is split in two:
//!
//! 1. The session manager calls a *request* method (`connect`,
//!    `launch_application`, ...).  Request methods never block; they only
//!    start the operation and report immediate refusals as [`TransportError`].
//! 2. The transport later reports the outcome by pushing a [`SessionEvent`]
//!    onto the session event queue.  The session actor processes those events
//!    one at a time, in arrival order.
//!
//! Sends are the exception: each send returns its own single-fire
//! acknowledgement future ([`AckReceiver`]) instead of a queue event.

use dashboard_core::{ApplicationMetadata, AttemptId, Device};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Delivery acknowledgement for one outbound channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendAck {
    /// `true` if the device accepted the message.
    pub success: bool,
    /// Transport status code (0 on success).
    pub status_code: i32,
}

impl SendAck {
    /// A successful acknowledgement.
    pub fn ok() -> Self {
        Self {
            success: true,
            status_code: 0,
        }
    }

    /// A failed acknowledgement with the given status code.
    pub fn failed(status_code: i32) -> Self {
        Self {
            success: false,
            status_code,
        }
    }
}

/// Receiving half of a send acknowledgement.  Resolves exactly once.
pub type AckReceiver = oneshot::Receiver<SendAck>;

/// Immediate refusals from transport request methods.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// `connect` was called while the handle is still connecting or
    /// connected.  The previous handle must be disconnected first.
    #[error("a connection attempt is already in progress on this handle")]
    ConnectInProgress,

    /// The operation needs an established connection.
    #[error("transport is not connected")]
    NotConnected,

    /// The transport could not carry out the request.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Connect / launch / send capability provided by the platform.
///
/// Implementations report asynchronous outcomes on the session event queue
/// (see [`SessionEvent`]).
#[cfg_attr(test, mockall::automock)]
pub trait SessionTransport: Send + Sync {
    /// Starts connecting to `device`.  The outcome arrives as
    /// [`SessionEvent::ConnectionEstablished`] or
    /// [`SessionEvent::ConnectionFailed`] tagged with `attempt`.
    fn connect(&self, attempt: AttemptId, device: &Device) -> Result<(), TransportError>;

    /// Releases the connection handle.  Completes before returning.
    fn disconnect(&self);

    /// Starts launching the application at `url`.  The outcome arrives as
    /// [`SessionEvent::ApplicationLaunchResult`] tagged with `attempt`.
    fn launch_application(&self, attempt: AttemptId, url: &str) -> Result<(), TransportError>;

    /// Asks the device to stop the running application.
    fn stop_application(&self) -> Result<(), TransportError>;

    /// Sends `payload` on `namespace`.  The returned future resolves once the
    /// device acknowledged (or refused) the message.
    fn send(&self, namespace: &str, payload: String) -> AckReceiver;

    /// Routes inbound messages on `namespace` to the session queue as
    /// [`SessionEvent::MessageReceived`].
    fn subscribe(&self, namespace: &str) -> Result<(), TransportError>;

    /// Stops routing inbound messages on `namespace`.
    fn unsubscribe(&self, namespace: &str) -> Result<(), TransportError>;
}

/// One entry on the session event queue.
///
/// Caller requests and transport callbacks share the same queue so that they
/// are processed strictly in arrival order by a single consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    // ── Caller requests ───────────────────────────────────────────────────────
    /// The user picked a device (`Some`) or dropped the current one (`None`).
    SelectDevice(Option<Device>),
    /// The user wants to show `info` on the dashboard.
    SendInfo(String),
    /// The user asked to stop the remote application.
    StopApplication,
    /// Stop the session actor.
    Shutdown,

    // ── Transport callbacks ───────────────────────────────────────────────────
    /// The connection requested for `attempt` is up.
    ConnectionEstablished { attempt: AttemptId },
    /// The connection requested for `attempt` failed.
    ConnectionFailed { attempt: AttemptId, reason: String },
    /// The connection was temporarily suspended.
    ConnectionSuspended { cause: i32 },
    /// Outcome of the launch requested for `attempt`.
    ApplicationLaunchResult {
        attempt: AttemptId,
        success: bool,
        status_code: i32,
        metadata: Option<ApplicationMetadata>,
    },
    /// The remote application went away.
    ApplicationDisconnected { attempt: AttemptId, status_code: i32 },
    /// An inbound message arrived on a subscribed namespace.
    MessageReceived { namespace: String, payload: String },

    // ── Session actor ─────────────────────────────────────────────────────────
    /// The connect or launch deadline of `attempt` passed.
    DeadlineElapsed { attempt: AttemptId },
}

/// Sending half of the session event queue.
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Receiving half of the session event queue.
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Creates the session event queue.
///
/// The sender half is cloned into the transport (for callbacks) and into
/// every `SessionHandle`; the receiver half goes to the session actor.
///
/// The queue is unbounded: transports report from synchronous request
/// methods and cannot wait for room, and every callback must arrive exactly
/// once.
pub fn session_queue() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
