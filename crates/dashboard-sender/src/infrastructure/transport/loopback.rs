//! Loopback transport: an in-process stand-in for a display device.
//!
//! The loopback plays both the device and the dashboard page running on it.
//! Connects and launches succeed immediately (unless configured to fail), and
//! every command sent on a subscribed namespace is echoed back the way the
//! dashboard page broadcasts it to all participants:
//!
//! | Sent command | Echoed inbound event                      |
//! |--------------|-------------------------------------------|
//! | `join`       | `{"user":..,"type":"join","message":"joined"}` |
//! | `show`       | `{"user":..,"type":"say","message":<info>}`   |
//! | `leave`      | `{"user":..,"type":"leave","message":"left"}`  |
//!
//! Results are reported on the unbounded session event queue, because
//! request methods are called from the session actor itself and must not
//! wait on the queue they feed.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dashboard_core::domain::session::ApplicationMetadata;
use dashboard_core::{AttemptId, Device};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::application::session_manager::DEFAULT_APPLICATION_ID;
use crate::application::transport::{
    AckReceiver, EventSender, SendAck, SessionEvent, SessionTransport, TransportError,
};

/// Status code of a send refused because no application is running.
pub const STATUS_NOT_CONNECTED: i32 = 7;

/// Status code of a refused launch.
pub const STATUS_LAUNCH_REFUSED: i32 = 2005;

/// Failure injection and identity of the simulated application.
#[derive(Debug, Clone)]
pub struct LoopbackOptions {
    /// Report every connect as failed.
    pub refuse_connect: bool,
    /// Report every launch as failed.
    pub fail_launch: bool,
    /// Application identifier reported in the launch metadata.
    pub application_id: String,
}

impl Default for LoopbackOptions {
    fn default() -> Self {
        Self {
            refuse_connect: false,
            fail_launch: false,
            application_id: DEFAULT_APPLICATION_ID.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct LoopbackState {
    /// Attempt of the open handle, `None` when disconnected.
    attempt: Option<AttemptId>,
    connected: bool,
    app_running: bool,
    subscribed: HashSet<String>,
    sent: Vec<(String, String)>,
}

/// In-process [`SessionTransport`].
pub struct LoopbackTransport {
    events: EventSender,
    options: LoopbackOptions,
    state: Mutex<LoopbackState>,
}

impl LoopbackTransport {
    /// Creates a loopback that reports to `events`.
    pub fn new(events: EventSender, options: LoopbackOptions) -> Self {
        Self {
            events,
            options,
            state: Mutex::new(LoopbackState::default()),
        }
    }

    /// Every `(namespace, payload)` accepted by [`send`](SessionTransport::send).
    pub fn sent(&self) -> Vec<(String, String)> {
        self.lock().sent.clone()
    }

    /// Returns `true` while a handle is connected.
    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Returns `true` while `namespace` is subscribed.
    pub fn is_subscribed(&self, namespace: &str) -> bool {
        self.lock().subscribed.contains(namespace)
    }

    /// Simulates the dashboard page going away (e.g. closed on the TV).
    pub fn simulate_remote_disconnect(&self, status_code: i32) {
        let attempt = {
            let mut state = self.lock();
            if !state.app_running {
                return;
            }
            state.app_running = false;
            state.attempt
        };
        if let Some(attempt) = attempt {
            self.report(SessionEvent::ApplicationDisconnected {
                attempt,
                status_code,
            });
        }
    }

    /// Delivers `payload` as if another participant's page sent it.
    pub fn inject_payload(&self, namespace: &str, payload: impl Into<String>) {
        if !self.is_subscribed(namespace) {
            debug!("loopback: dropping payload for unsubscribed namespace {namespace}");
            return;
        }
        self.report(SessionEvent::MessageReceived {
            namespace: namespace.to_string(),
            payload: payload.into(),
        });
    }

    fn lock(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            warn!("loopback: session queue closed, event not reported");
        }
    }

    /// Builds the inbound event the dashboard page would broadcast for
    /// `payload`.
    fn echo_for(payload: &str) -> Option<String> {
        let value: Value = serde_json::from_str(payload).ok()?;
        let user = value.get("user")?.as_str()?;
        let (kind, message) = match value.get("command")?.as_str()? {
            "join" => ("join", "joined"),
            "leave" => ("leave", "left"),
            "show" => ("say", value.get("info")?.as_str()?),
            _ => return None,
        };
        Some(json!({ "user": user, "type": kind, "message": message }).to_string())
    }
}

impl SessionTransport for LoopbackTransport {
    fn connect(&self, attempt: AttemptId, device: &Device) -> Result<(), TransportError> {
        {
            let mut state = self.lock();
            if state.attempt.is_some() {
                return Err(TransportError::ConnectInProgress);
            }
            state.attempt = Some(attempt);
            state.connected = !self.options.refuse_connect;
        }
        if self.options.refuse_connect {
            info!("loopback: refusing connection to {device}");
            self.report(SessionEvent::ConnectionFailed {
                attempt,
                reason: format!("{} refused the connection", device.name()),
            });
        } else {
            info!("loopback: connected to {device}");
            self.report(SessionEvent::ConnectionEstablished { attempt });
        }
        Ok(())
    }

    fn disconnect(&self) {
        let mut state = self.lock();
        state.attempt = None;
        state.connected = false;
        state.app_running = false;
        state.subscribed.clear();
        debug!("loopback: disconnected");
    }

    fn launch_application(&self, attempt: AttemptId, url: &str) -> Result<(), TransportError> {
        {
            let mut state = self.lock();
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            state.app_running = !self.options.fail_launch;
        }
        if self.options.fail_launch {
            self.report(SessionEvent::ApplicationLaunchResult {
                attempt,
                success: false,
                status_code: STATUS_LAUNCH_REFUSED,
                metadata: None,
            });
        } else {
            info!("loopback: launched {url}");
            self.report(SessionEvent::ApplicationLaunchResult {
                attempt,
                success: true,
                status_code: 0,
                metadata: Some(ApplicationMetadata {
                    application_id: self.options.application_id.clone(),
                    name: "Dashboard".to_string(),
                    data: Some(url.to_string()),
                }),
            });
        }
        Ok(())
    }

    fn stop_application(&self) -> Result<(), TransportError> {
        if !self.lock().connected {
            return Err(TransportError::NotConnected);
        }
        self.simulate_remote_disconnect(0);
        Ok(())
    }

    fn send(&self, namespace: &str, payload: String) -> AckReceiver {
        let (tx, rx) = oneshot::channel();
        let echo_to_self = {
            let mut state = self.lock();
            if !state.app_running {
                let _ = tx.send(SendAck::failed(STATUS_NOT_CONNECTED));
                return rx;
            }
            state.sent.push((namespace.to_string(), payload.clone()));
            state.subscribed.contains(namespace)
        };

        if echo_to_self {
            match Self::echo_for(&payload) {
                Some(echo) => self.report(SessionEvent::MessageReceived {
                    namespace: namespace.to_string(),
                    payload: echo,
                }),
                None => debug!("loopback: page ignores {payload}"),
            }
        }
        let _ = tx.send(SendAck::ok());
        rx
    }

    fn subscribe(&self, namespace: &str) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        state.subscribed.insert(namespace.to_string());
        Ok(())
    }

    fn unsubscribe(&self, namespace: &str) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.subscribed.remove(namespace) {
            return Err(TransportError::Unavailable(format!(
                "{namespace} is not subscribed"
            )));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
