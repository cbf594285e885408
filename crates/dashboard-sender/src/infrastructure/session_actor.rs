//! SessionActor: runs the session manager on a single tokio task.
//!
//! # Why an actor? (for beginners)
//!
//! The transport reports results from its own threads or tasks, the user
//! types commands on another, and deadlines fire on a timer.  Instead of
//! sharing the [`SessionManager`] behind a lock, everything that can change
//! the session is turned into a [`SessionEvent`] and pushed onto one queue.
//! A single task, the actor, pops events in arrival order and applies them:
//!
//! ```text
//!  SessionHandle ──┐
//!                  ├──► mpsc queue ──► SessionActor ──► SessionManager
//!  transport ──────┘                        │
//!                                           ├── watch<ConnectionState> ──► UI
//!                                           ├── FuturesUnordered<send acks>
//!                                           └── sleep_until(deadline)
//! ```
//!
//! Because only the actor touches the manager, a new selection can never
//! overlap with the teardown triggered by the previous one.
//!
//! # Deadlines
//!
//! Whenever the manager is waiting on a connect or launch result, the actor
//! arms a timer ([`SessionTimeouts`]).  If it fires before the state moves
//! on, the actor applies [`SessionEvent::DeadlineElapsed`] for that attempt
//! and the manager fails the session.

use std::time::Duration;

use dashboard_core::{AttemptId, ConnectionState, Device};
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, info, warn};

use crate::application::session_manager::SessionManager;
use crate::application::transport::{EventReceiver, EventSender, SendAck, SessionEvent};

/// Default bound on a pending connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default bound on a pending application launch.
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How long the actor waits for outstanding send acknowledgements (such as
/// the final `leave`) when it stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Bounds on the connect and launch stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    pub connect: Duration,
    pub launch: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            launch: DEFAULT_LAUNCH_TIMEOUT,
        }
    }
}

/// Errors returned by [`SessionHandle`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActorError {
    /// The actor task has stopped and no longer accepts events.
    #[error("session actor has stopped")]
    Stopped,
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Cheap, cloneable front-end to a running [`SessionActor`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: EventSender,
    state: watch::Receiver<ConnectionState>,
}

impl SessionHandle {
    /// Selects a device, or drops the current selection with `None`.
    pub async fn select_device(&self, device: Option<Device>) -> Result<(), ActorError> {
        self.push(SessionEvent::SelectDevice(device)).await
    }

    /// Asks the session to show `info` on the dashboard.
    ///
    /// Whether the message is sent depends on the session state when the
    /// actor processes the request; outside `Ready` the manager publishes a
    /// not-ready hint instead.
    pub async fn send_info(&self, info: impl Into<String>) -> Result<(), ActorError> {
        self.push(SessionEvent::SendInfo(info.into())).await
    }

    /// Asks the device to stop the dashboard application.
    pub async fn stop_application(&self) -> Result<(), ActorError> {
        self.push(SessionEvent::StopApplication).await
    }

    /// Leaves the session and stops the actor.
    pub async fn shutdown(&self) -> Result<(), ActorError> {
        self.push(SessionEvent::Shutdown).await
    }

    /// Returns the state published after the last processed event.
    pub fn current_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns `true` if the last published state is `Ready`.
    pub fn is_ready(&self) -> bool {
        self.current_state() == ConnectionState::Ready
    }

    /// Returns a receiver that observes every state change.
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Returns a sender for injecting events directly (used by transports).
    pub fn event_sender(&self) -> EventSender {
        self.events.clone()
    }

    async fn push(&self, event: SessionEvent) -> Result<(), ActorError> {
        self.events.send(event).map_err(|_| ActorError::Stopped)
    }
}

// ── Actor ─────────────────────────────────────────────────────────────────────

/// Armed deadline: the attempt and state it guards, and when it fires.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    attempt: AttemptId,
    state: ConnectionState,
    at: Instant,
}

/// Owns the [`SessionManager`] and feeds it events one at a time.
pub struct SessionActor {
    manager: SessionManager,
    events: EventReceiver,
    state_tx: watch::Sender<ConnectionState>,
    timeouts: SessionTimeouts,
    acks: FuturesUnordered<BoxFuture<'static, Option<SendAck>>>,
    deadline: Option<Deadline>,
}

impl SessionActor {
    /// Creates the actor and its handle.
    ///
    /// `events_tx` / `events_rx` come from
    /// [`session_queue`](crate::application::transport::session_queue); the
    /// transport should already hold a clone of `events_tx`.
    pub fn new(
        manager: SessionManager,
        events_tx: EventSender,
        events_rx: EventReceiver,
        timeouts: SessionTimeouts,
    ) -> (Self, SessionHandle) {
        let (state_tx, state_rx) = watch::channel(manager.current_state());
        let actor = Self {
            manager,
            events: events_rx,
            state_tx,
            timeouts,
            acks: FuturesUnordered::new(),
            deadline: None,
        };
        let handle = SessionHandle {
            events: events_tx,
            state: state_rx,
        };
        (actor, handle)
    }

    /// Processes events until `Shutdown` arrives or every sender is dropped.
    ///
    /// Returns the manager so the caller can inspect the final session.
    pub async fn run(mut self) -> SessionManager {
        info!("session actor started");

        loop {
            let deadline_at = self.deadline.map(|d| d.at);

            tokio::select! {
                maybe_event = self.events.recv() => {
                    match maybe_event {
                        Some(SessionEvent::Shutdown) => {
                            info!("session shutdown requested");
                            self.apply(SessionEvent::Shutdown);
                            break;
                        }
                        Some(event) => self.apply(event),
                        None => {
                            info!("session event queue closed");
                            break;
                        }
                    }
                }

                Some(ack) = self.acks.next(), if !self.acks.is_empty() => {
                    debug!("send settled: {ack:?}");
                }

                _ = sleep_until(deadline_at.unwrap_or_else(Instant::now)), if deadline_at.is_some() => {
                    if let Some(deadline) = self.deadline.take() {
                        warn!(
                            "deadline elapsed while {} (attempt {})",
                            deadline.state, deadline.attempt
                        );
                        self.apply(SessionEvent::DeadlineElapsed { attempt: deadline.attempt });
                    }
                }
            }
        }

        self.drain_acks().await;
        info!("session actor stopped");
        self.manager
    }

    /// Applies one event and publishes the resulting state.
    fn apply(&mut self, event: SessionEvent) {
        self.manager.handle_event(event);

        for pending in self.manager.take_pending_sends() {
            self.acks.push(pending.settle().boxed());
        }
        self.state_tx.send_replace(self.manager.current_state());
        self.arm_deadline();
    }

    /// Arms, keeps or clears the deadline to match the manager's pending stage.
    fn arm_deadline(&mut self) {
        let Some((attempt, state)) = self.manager.pending_attempt() else {
            self.deadline = None;
            return;
        };
        if matches!(self.deadline, Some(d) if d.attempt == attempt && d.state == state) {
            return;
        }
        let limit = match state {
            ConnectionState::Connecting => self.timeouts.connect,
            _ => self.timeouts.launch,
        };
        debug!("arming {limit:?} deadline while {state} (attempt {attempt})");
        self.deadline = Some(Deadline {
            attempt,
            state,
            at: Instant::now() + limit,
        });
    }

    async fn drain_acks(&mut self) {
        if self.acks.is_empty() {
            return;
        }
        let pending = self.acks.len();
        let drained = timeout(SHUTDOWN_GRACE, async {
            while self.acks.next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("{pending} send acknowledgement(s) still open at shutdown");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
