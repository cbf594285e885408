//! Lifecycle properties of the session manager, checked against a recording
//! transport.
//!
//! The recording transport also holds the manager's update receiver.  Updates
//! are published before the manager calls the transport, so on every call the
//! transport knows the exact session state at invocation time.

use std::sync::{Arc, Mutex};

use dashboard_core::{AttemptId, ConnectionState, Device, OutboundCommand};
use dashboard_sender::application::identity::LocalIdentity;
use dashboard_sender::application::session_manager::{
    SessionError, SessionManager, SessionSettings, SessionUpdate,
};
use dashboard_sender::application::transport::{
    AckReceiver, SendAck, SessionTransport, TransportError,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

const NS: &str = "urn:flint:tv.matchstick.demo.dashboard";

// ── Recording transport ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Connect { attempt: AttemptId, device: String },
    Disconnect,
    Launch { attempt: AttemptId },
    Stop,
    Send { payload: String, state: ConnectionState },
    Subscribe,
    Unsubscribe,
}

#[derive(Default)]
struct Recorded {
    calls: Vec<Call>,
    updates: Option<mpsc::UnboundedReceiver<SessionUpdate>>,
    seen: Vec<SessionUpdate>,
    observed: ConnectionState,
    last_attempt: AttemptId,
}

impl Recorded {
    fn observe(&mut self) {
        let Some(rx) = self.updates.as_mut() else {
            return;
        };
        while let Ok(update) = rx.try_recv() {
            if let SessionUpdate::StateChanged(state) = update {
                self.observed = state;
            }
            self.seen.push(update);
        }
    }

    fn record(&mut self, call: Call) {
        self.observe();
        self.calls.push(call);
    }
}

#[derive(Default)]
struct RecordingTransport {
    inner: Mutex<Recorded>,
    fail_unsubscribe: bool,
}

impl RecordingTransport {
    fn attach(&self, updates: mpsc::UnboundedReceiver<SessionUpdate>) {
        self.inner.lock().unwrap().updates = Some(updates);
    }

    fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Drains pending updates and returns everything seen so far.
    fn updates(&self) -> Vec<SessionUpdate> {
        let mut inner = self.inner.lock().unwrap();
        inner.observe();
        inner.seen.clone()
    }

    fn observed_state(&self) -> ConnectionState {
        let mut inner = self.inner.lock().unwrap();
        inner.observe();
        inner.observed
    }

    fn last_attempt(&self) -> AttemptId {
        self.inner.lock().unwrap().last_attempt
    }

    fn sends(&self) -> Vec<(String, ConnectionState)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { payload, state } => Some((payload, state)),
                _ => None,
            })
            .collect()
    }
}

impl SessionTransport for RecordingTransport {
    fn connect(&self, attempt: AttemptId, device: &Device) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.last_attempt = attempt;
        inner.record(Call::Connect {
            attempt,
            device: device.name().to_string(),
        });
        Ok(())
    }

    fn disconnect(&self) {
        self.inner.lock().unwrap().record(Call::Disconnect);
    }

    fn launch_application(&self, attempt: AttemptId, _url: &str) -> Result<(), TransportError> {
        self.inner.lock().unwrap().record(Call::Launch { attempt });
        Ok(())
    }

    fn stop_application(&self) -> Result<(), TransportError> {
        self.inner.lock().unwrap().record(Call::Stop);
        Ok(())
    }

    fn send(&self, _namespace: &str, payload: String) -> AckReceiver {
        let mut inner = self.inner.lock().unwrap();
        inner.observe();
        let state = inner.observed;
        inner.record(Call::Send { payload, state });
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(SendAck::ok());
        rx
    }

    fn subscribe(&self, _namespace: &str) -> Result<(), TransportError> {
        self.inner.lock().unwrap().record(Call::Subscribe);
        Ok(())
    }

    fn unsubscribe(&self, _namespace: &str) -> Result<(), TransportError> {
        self.inner.lock().unwrap().record(Call::Unsubscribe);
        if self.fail_unsubscribe {
            return Err(TransportError::Unavailable("listener already gone".to_string()));
        }
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn setup(transport: &Arc<RecordingTransport>, user: Option<&str>) -> SessionManager {
    let (mgr, updates) = SessionManager::new(
        transport.clone(),
        SessionSettings::default(),
        LocalIdentity::new(user.map(str::to_string)),
    );
    transport.attach(updates);
    mgr
}

fn device(name: &str) -> Device {
    Device::new(Uuid::new_v4(), name)
}

fn walk_to_ready(mgr: &mut SessionManager, transport: &RecordingTransport) -> AttemptId {
    mgr.select_device(Some(device("Living Room")));
    let attempt = transport.last_attempt();
    mgr.on_connection_established(attempt);
    mgr.on_application_launch_result(attempt, true, 0, None);
    attempt
}

// ── Properties ────────────────────────────────────────────────────────────────

#[test]
fn test_send_happens_only_in_ready_for_random_interleavings() {
    let mut total_sends = 0;

    for seed in [1_u64, 7, 42, 2024] {
        // Arrange
        let transport = Arc::new(RecordingTransport::default());
        let mut mgr = setup(&transport, Some("alice"));
        let mut rng = StdRng::seed_from_u64(seed);

        // Act: drive a random mix of caller requests and callbacks, some of
        // them stale
        for _ in 0..400 {
            let current = transport.last_attempt();
            let attempt = if rng.gen_bool(0.8) {
                current
            } else {
                AttemptId(current.0.saturating_sub(1))
            };
            match rng.gen_range(0..10) {
                0 => {
                    let name = if rng.gen_bool(0.5) { "A" } else { "B" };
                    mgr.select_device(Some(device(name)));
                }
                1 => mgr.select_device(None),
                2 => mgr.on_connection_established(attempt),
                3 => mgr.on_connection_failed(attempt, "unreachable".to_string()),
                4 => mgr.on_application_launch_result(attempt, rng.gen_bool(0.7), 0, None),
                5 => mgr.on_remote_application_disconnected(attempt, 0),
                6 => {
                    let _ = mgr.send_info("hello");
                }
                7 => {
                    let _ = mgr.send(OutboundCommand::show("alice", "direct"));
                }
                8 => mgr.on_deadline_elapsed(attempt),
                _ => {
                    mgr.on_message_received(NS, r#"{"user":"bob","type":"say","message":"x"}"#);
                }
            }

            // The published state always matches the manager's own view.
            assert_eq!(transport.observed_state(), mgr.current_state(), "seed {seed}");
        }

        // Assert
        let sends = transport.sends();
        for (payload, state) in &sends {
            assert_eq!(
                *state,
                ConnectionState::Ready,
                "seed {seed}: {payload} sent while {state}"
            );
        }
        total_sends += sends.len();
    }

    assert!(total_sends > 0, "no interleaving ever reached Ready");
}

#[test]
fn test_reselect_during_connect_disconnects_before_connecting() {
    // Arrange
    let transport = Arc::new(RecordingTransport::default());
    let mut mgr = setup(&transport, Some("alice"));

    // Act
    mgr.select_device(Some(device("A")));
    mgr.select_device(Some(device("B")));

    // Assert
    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(&calls[0], Call::Connect { device, .. } if device == "A"));
    assert_eq!(calls[1], Call::Disconnect);
    assert!(matches!(&calls[2], Call::Connect { device, .. } if device == "B"));
}

#[test]
fn test_second_unselect_makes_no_transport_calls() {
    // Arrange
    let transport = Arc::new(RecordingTransport::default());
    let mut mgr = setup(&transport, Some("alice"));
    walk_to_ready(&mut mgr, &transport);
    mgr.select_device(None);
    let after_first = transport.calls().len();

    // Act
    mgr.select_device(None);

    // Assert
    assert_eq!(transport.calls().len(), after_first);
    assert_eq!(mgr.current_state(), ConnectionState::Idle);
}

#[test]
fn test_unselect_from_ready_sends_leave_before_disconnect() {
    let transport = Arc::new(RecordingTransport::default());
    let mut mgr = setup(&transport, Some("alice"));
    walk_to_ready(&mut mgr, &transport);

    mgr.select_device(None);

    let calls = transport.calls();
    let tail = &calls[calls.len() - 3..];
    assert_eq!(
        tail,
        &[
            Call::Send {
                payload: r#"{"command":"leave","user":"alice"}"#.to_string(),
                state: ConnectionState::Ready,
            },
            Call::Unsubscribe,
            Call::Disconnect,
        ]
    );
}

#[test]
fn test_ready_scenario_encodes_show_exactly() {
    // Arrange
    let transport = Arc::new(RecordingTransport::default());
    let mut mgr = setup(&transport, Some("alice"));

    // Act
    walk_to_ready(&mut mgr, &transport);
    mgr.send(OutboundCommand::show("alice", "hello")).unwrap();

    // Assert
    assert_eq!(mgr.current_state(), ConnectionState::Ready);
    let payloads: Vec<String> = transport.sends().into_iter().map(|(p, _)| p).collect();
    assert_eq!(
        payloads,
        vec![
            r#"{"command":"join","user":"alice"}"#.to_string(),
            r#"{"command":"show","user":"alice","info":"hello"}"#.to_string(),
        ]
    );
}

#[test]
fn test_ready_walk_calls_transport_in_lifecycle_order() {
    let transport = Arc::new(RecordingTransport::default());
    let mut mgr = setup(&transport, Some("alice"));

    let attempt = walk_to_ready(&mut mgr, &transport);

    assert_eq!(
        transport.calls(),
        vec![
            Call::Connect {
                attempt,
                device: "Living Room".to_string()
            },
            Call::Launch { attempt },
            Call::Subscribe,
            Call::Send {
                payload: r#"{"command":"join","user":"alice"}"#.to_string(),
                state: ConnectionState::Ready,
            },
        ]
    );
}

#[test]
fn test_remote_disconnect_with_failing_unsubscribe_still_reaches_idle() {
    // Arrange
    let transport = Arc::new(RecordingTransport {
        fail_unsubscribe: true,
        ..RecordingTransport::default()
    });
    let mut mgr = setup(&transport, Some("alice"));
    let attempt = walk_to_ready(&mut mgr, &transport);

    // Act
    mgr.on_remote_application_disconnected(attempt, 0);

    // Assert
    assert_eq!(mgr.current_state(), ConnectionState::Idle);
    assert!(mgr.device().is_none());
    assert!(transport.updates().ends_with(&[
        SessionUpdate::StateChanged(ConnectionState::Idle),
        SessionUpdate::RouteReset,
    ]));
}

#[test]
fn test_connection_and_launch_failures_are_distinguishable() {
    // Connection failure
    let transport = Arc::new(RecordingTransport::default());
    let mut mgr = setup(&transport, Some("alice"));
    mgr.select_device(Some(device("TV")));
    mgr.on_connection_failed(transport.last_attempt(), "refused".to_string());
    let connection_failure = transport
        .updates()
        .into_iter()
        .find_map(|u| match u {
            SessionUpdate::Failed(e) => Some(e),
            _ => None,
        })
        .unwrap();

    // Launch failure
    let transport = Arc::new(RecordingTransport::default());
    let mut mgr = setup(&transport, Some("alice"));
    mgr.select_device(Some(device("TV")));
    let attempt = transport.last_attempt();
    mgr.on_connection_established(attempt);
    mgr.on_application_launch_result(attempt, false, 2005, None);
    let launch_failure = transport
        .updates()
        .into_iter()
        .find_map(|u| match u {
            SessionUpdate::Failed(e) => Some(e),
            _ => None,
        })
        .unwrap();

    assert!(connection_failure.is_connection_error());
    assert!(!connection_failure.is_launch_error());
    assert!(launch_failure.is_launch_error());
    assert!(!launch_failure.is_connection_error());
    assert_eq!(
        launch_failure,
        SessionError::LaunchFailed {
            reason: "status code 2005".to_string()
        }
    );
}

#[test]
fn test_guest_user_is_never_labelled_me() {
    // Arrange
    let transport = Arc::new(RecordingTransport::default());
    let mut mgr = setup(&transport, None);
    walk_to_ready(&mut mgr, &transport);
    let guest = mgr.current_user();

    // Act
    let payload = format!(r#"{{"user":"{guest}","type":"say","message":"hi"}}"#);
    let line = mgr.on_message_received(NS, &payload);

    // Assert
    assert_eq!(line, Some(format!("{guest}: hi")));
}

#[test]
fn test_unknown_inbound_type_reaches_feed() {
    let transport = Arc::new(RecordingTransport::default());
    let mut mgr = setup(&transport, Some("alice"));
    walk_to_ready(&mut mgr, &transport);
    let raw = r#"{"user":"bob","type":"ping","message":"x"}"#;

    let line = mgr.on_message_received(NS, raw);

    assert_eq!(line, Some(format!("unrecognized message: {raw}")));
    assert_eq!(mgr.feed().len(), 1);
}
