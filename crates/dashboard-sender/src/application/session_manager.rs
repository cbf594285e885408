//! SessionManager: the connection lifecycle state machine.
//!
//! The manager owns the single client session.  It drives the transport
//! through connect → launch → subscribe, sends `join` once the dashboard is
//! ready, and walks back to `Idle` on un-selection or remote disconnect.
//!
//! # State machine (for beginners)
//!
//! ```text
//!            select(D)                 established              launch ok
//!   Idle ───────────────► Connecting ─────────────► Connected ──► LaunchingApplication ──► Ready
//!    ▲                        │                                        │                    │
//!    │                        │ failed / timeout                       │ failed / timeout   │ remote
//!    │                        ▼                                        ▼                    │ disconnect
//!    │                      Failed ◄───────────────────────────────────┘                    │
//!    └──────────────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition is triggered by one method call.  The methods are plain
//! synchronous functions: nothing here blocks, spawns or sleeps.  The
//! asynchronous side (event queue, deadlines, send acknowledgements) lives in
//! `infrastructure::session_actor`, which calls these methods one event at a
//! time.
//!
//! # Stale callbacks
//!
//! Each device selection gets a fresh [`AttemptId`].  Transport callbacks are
//! tagged with the attempt that started them; a callback carrying an older
//! attempt belongs to a superseded selection and is ignored.
//!
//! # Observing the session
//!
//! The presentation layer reads [`SessionUpdate`]s from the receiver returned
//! by [`SessionManager::new`].

use std::sync::Arc;

use dashboard_core::domain::feed::DEFAULT_MAX_LINES;
use dashboard_core::protocol::DASHBOARD_NAMESPACE;
use dashboard_core::{
    ApplicationMetadata, AttemptId, CodecError, ConnectionState, DashboardFeed, Device,
    OutboundCommand,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::application::channel::{DashboardChannel, PendingSend};
use crate::application::identity::LocalIdentity;
use crate::application::transport::{SessionEvent, SessionTransport};

/// URL of the dashboard receiver page launched on the device.
pub const DEFAULT_APP_URL: &str = "http://openflint.github.io/dashboard-demo/receiver/index.html";

/// Application identifier of the dashboard receiver.
pub const DEFAULT_APPLICATION_ID: &str = "~dashboard";

// ── Settings ──────────────────────────────────────────────────────────────────

/// Static parameters of a session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// URL of the application launched on the device.
    pub app_url: String,
    /// Channel namespace.
    pub namespace: String,
    /// Number of lines kept in the dashboard feed.
    pub feed_max_lines: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            app_url: DEFAULT_APP_URL.to_string(),
            namespace: DASHBOARD_NAMESPACE.to_string(),
            feed_max_lines: DEFAULT_MAX_LINES,
        }
    }
}

// ── Errors and updates ────────────────────────────────────────────────────────

/// Errors reported by the session manager.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    /// The transport could not connect to the device.
    #[error("failed to connect to {device}: {reason}")]
    ConnectionFailed { device: String, reason: String },

    /// The connection did not complete before the deadline.
    #[error("timed out connecting to {device}")]
    ConnectTimeout { device: String },

    /// The device is connected but the dashboard application did not start.
    #[error("failed to launch the dashboard application: {reason}")]
    LaunchFailed { reason: String },

    /// The launch did not complete before the deadline.
    #[error("timed out launching the dashboard application")]
    LaunchTimeout,

    /// A command was sent while the session was not ready.
    #[error("session is not ready (state: {0})")]
    NotReady(ConnectionState),

    /// The command could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl SessionError {
    /// Returns `true` for failures of the connection stage.  These clear the
    /// selected device.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            SessionError::ConnectionFailed { .. } | SessionError::ConnectTimeout { .. }
        )
    }

    /// Returns `true` for failures of the launch stage.
    pub fn is_launch_error(&self) -> bool {
        matches!(
            self,
            SessionError::LaunchFailed { .. } | SessionError::LaunchTimeout
        )
    }
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The session moved to a new state.
    StateChanged(ConnectionState),
    /// A connection or launch failed.
    Failed(SessionError),
    /// The device selection was dropped; the picker should fall back to "no
    /// device".
    RouteReset,
    /// A new line was added to the dashboard feed.
    FeedLine(String),
    /// The user tried to send while not connected.
    NotReady,
}

// ── Manager ───────────────────────────────────────────────────────────────────

/// The session state machine.
pub struct SessionManager {
    transport: Arc<dyn SessionTransport>,
    channel: DashboardChannel,
    identity: LocalIdentity,
    feed: DashboardFeed,
    app_url: String,
    state: ConnectionState,
    device: Option<Device>,
    metadata: Option<ApplicationMetadata>,
    attempt: AttemptId,
    /// `true` from `connect` until the handle is released with `disconnect`.
    handle_open: bool,
    subscribed: bool,
    pending_sends: Vec<PendingSend>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
}

impl SessionManager {
    /// Creates an idle manager and returns it together with the update receiver.
    pub fn new(
        transport: Arc<dyn SessionTransport>,
        settings: SessionSettings,
        identity: LocalIdentity,
    ) -> (Self, mpsc::UnboundedReceiver<SessionUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mgr = Self {
            transport,
            channel: DashboardChannel::new(settings.namespace),
            identity,
            feed: DashboardFeed::new(settings.feed_max_lines),
            app_url: settings.app_url,
            state: ConnectionState::Idle,
            device: None,
            metadata: None,
            attempt: AttemptId::default(),
            handle_open: false,
            subscribed: false,
            pending_sends: Vec::new(),
            updates: tx,
        };
        (mgr, rx)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Current lifecycle state.
    pub fn current_state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `true` only in [`ConnectionState::Ready`].
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// The selected device, `None` when nothing is selected.
    pub fn device(&self) -> Option<&Device> {
        self.device.as_ref()
    }

    /// Metadata of the launched application; present only once ready.
    pub fn metadata(&self) -> Option<&ApplicationMetadata> {
        self.metadata.as_ref()
    }

    /// Display lines rendered from inbound messages so far.
    pub fn feed(&self) -> &DashboardFeed {
        &self.feed
    }

    /// Returns the local user name, generating a guest name on first use.
    pub fn current_user(&mut self) -> String {
        self.identity.current_user().to_string()
    }

    /// Returns the current attempt and state while waiting on a connect or
    /// launch result.
    pub fn pending_attempt(&self) -> Option<(AttemptId, ConnectionState)> {
        self.state.is_pending().then_some((self.attempt, self.state))
    }

    /// Removes and returns the sends whose acknowledgement is still open.
    pub fn take_pending_sends(&mut self) -> Vec<PendingSend> {
        std::mem::take(&mut self.pending_sends)
    }

    // ── Event dispatch ────────────────────────────────────────────────────────

    /// Applies one queued event.
    ///
    /// `Shutdown` leaves the session the same way an un-selection does.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SelectDevice(device) => self.select_device(device),
            SessionEvent::SendInfo(info) => {
                if let Err(e) = self.send_info(&info) {
                    warn!("message not sent: {e}");
                }
            }
            SessionEvent::StopApplication => self.stop_application(),
            SessionEvent::Shutdown => self.select_device(None),
            SessionEvent::ConnectionEstablished { attempt } => {
                self.on_connection_established(attempt)
            }
            SessionEvent::ConnectionFailed { attempt, reason } => {
                self.on_connection_failed(attempt, reason)
            }
            SessionEvent::ConnectionSuspended { cause } => self.on_connection_suspended(cause),
            SessionEvent::ApplicationLaunchResult {
                attempt,
                success,
                status_code,
                metadata,
            } => self.on_application_launch_result(attempt, success, status_code, metadata),
            SessionEvent::ApplicationDisconnected {
                attempt,
                status_code,
            } => self.on_remote_application_disconnected(attempt, status_code),
            SessionEvent::MessageReceived { namespace, payload } => {
                self.on_message_received(&namespace, &payload);
            }
            SessionEvent::DeadlineElapsed { attempt } => self.on_deadline_elapsed(attempt),
        }
    }

    // ── Caller operations ─────────────────────────────────────────────────────

    /// Selects a device (`Some`) or drops the current selection (`None`).
    ///
    /// Selecting a device discards the previous session: the old handle is
    /// disconnected before the new connect is issued.  Dropping the selection
    /// sends `leave` when ready and returns to `Idle`.  Dropping it again while
    /// idle does nothing.
    pub fn select_device(&mut self, device: Option<Device>) {
        match device {
            Some(device) => self.connect_to(device),
            None => self.unselect(),
        }
    }

    fn connect_to(&mut self, device: Device) {
        info!("device selected: {device}");
        self.release_handle();
        self.attempt = self.attempt.next();
        self.metadata = None;
        self.device = Some(device.clone());
        self.set_state(ConnectionState::Connecting);

        self.handle_open = true;
        if let Err(e) = self.transport.connect(self.attempt, &device) {
            self.fail(SessionError::ConnectionFailed {
                device: device.name().to_string(),
                reason: e.to_string(),
            });
        }
    }

    fn unselect(&mut self) {
        if self.state == ConnectionState::Idle && !self.handle_open && self.device.is_none() {
            debug!("device unselected while idle; nothing to do");
            return;
        }
        info!("device unselected");
        if self.state == ConnectionState::Ready {
            let user = self.current_user();
            self.send_presence(OutboundCommand::leave(user));
        }
        self.release_handle();
        self.attempt = self.attempt.next();
        self.device = None;
        self.metadata = None;
        self.set_state(ConnectionState::Idle);
        self.emit(SessionUpdate::RouteReset);
    }

    /// Shows `info` on the dashboard as the local user.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReady`] outside `Ready` (and publishes
    /// [`SessionUpdate::NotReady`]), or a codec error for empty text.
    pub fn send_info(&mut self, info: &str) -> Result<(), SessionError> {
        if !self.is_ready() {
            warn!("cannot send while {}: not connected", self.state);
            self.emit(SessionUpdate::NotReady);
            return Err(SessionError::NotReady(self.state));
        }
        let user = self.current_user();
        self.send(OutboundCommand::show(user, info))
    }

    /// Sends `command` on the dashboard channel.
    ///
    /// The acknowledgement is kept as a [`PendingSend`]; see
    /// [`take_pending_sends`](Self::take_pending_sends).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReady`] outside `Ready`.  Nothing is queued.
    pub fn send(&mut self, command: OutboundCommand) -> Result<(), SessionError> {
        if !self.is_ready() {
            return Err(SessionError::NotReady(self.state));
        }
        let pending = self.channel.send(self.transport.as_ref(), &command)?;
        self.pending_sends.push(pending);
        Ok(())
    }

    /// Asks the device to stop the dashboard application.  The resulting
    /// disconnect arrives as a regular remote-disconnect callback.
    pub fn stop_application(&mut self) {
        if !self.state.is_connected() {
            debug!("stop requested while {}; ignoring", self.state);
            return;
        }
        info!("stopping the dashboard application");
        if let Err(e) = self.transport.stop_application() {
            warn!("failed to stop application: {e}");
        }
    }

    // ── Transport callbacks ───────────────────────────────────────────────────

    /// The connection of `attempt` is up; launches the application.
    pub fn on_connection_established(&mut self, attempt: AttemptId) {
        if !self.is_current(attempt, "connection established") {
            return;
        }
        if self.state != ConnectionState::Connecting {
            debug!("connection established while {}; ignoring", self.state);
            return;
        }
        info!("connected to {}", self.device_name());
        self.set_state(ConnectionState::Connected);
        self.set_state(ConnectionState::LaunchingApplication);

        if let Err(e) = self.transport.launch_application(attempt, &self.app_url) {
            self.fail(SessionError::LaunchFailed {
                reason: e.to_string(),
            });
        }
    }

    /// The connection of `attempt` failed.
    pub fn on_connection_failed(&mut self, attempt: AttemptId, reason: String) {
        if !self.is_current(attempt, "connection failed") {
            return;
        }
        if matches!(self.state, ConnectionState::Idle | ConnectionState::Failed) {
            debug!("connection failure while {}; ignoring", self.state);
            return;
        }
        self.fail(SessionError::ConnectionFailed {
            device: self.device_name(),
            reason,
        });
    }

    /// The connection was suspended.  Logged only.
    pub fn on_connection_suspended(&mut self, cause: i32) {
        info!("connection suspended: cause {cause}");
    }

    /// Outcome of the launch requested for `attempt`.
    ///
    /// On success the channel is subscribed, the state becomes `Ready` and a
    /// `join` is sent for the local user.
    pub fn on_application_launch_result(
        &mut self,
        attempt: AttemptId,
        success: bool,
        status_code: i32,
        metadata: Option<ApplicationMetadata>,
    ) {
        if !self.is_current(attempt, "launch result") {
            return;
        }
        if self.state != ConnectionState::LaunchingApplication {
            debug!("launch result while {}; ignoring", self.state);
            return;
        }
        if !success {
            self.fail(SessionError::LaunchFailed {
                reason: format!("status code {status_code}"),
            });
            return;
        }

        if let Err(e) = self.transport.subscribe(self.channel.namespace()) {
            self.fail(SessionError::LaunchFailed {
                reason: format!("could not subscribe to {}: {e}", self.channel.namespace()),
            });
            return;
        }
        self.subscribed = true;
        if let Some(meta) = &metadata {
            info!("application launched: {} ({})", meta.name, meta.application_id);
        }
        self.metadata = metadata;
        self.set_state(ConnectionState::Ready);

        let user = self.current_user();
        self.send_presence(OutboundCommand::join(user));
    }

    /// The remote application went away.  Returns to `Idle`.
    pub fn on_remote_application_disconnected(&mut self, attempt: AttemptId, status_code: i32) {
        if !self.is_current(attempt, "application disconnected") {
            return;
        }
        if !self.state.is_connected() {
            debug!("application disconnected while {}; ignoring", self.state);
            return;
        }
        info!("application disconnected: status_code {status_code}");
        self.release_handle();
        self.attempt = self.attempt.next();
        self.device = None;
        self.metadata = None;
        self.set_state(ConnectionState::Idle);
        self.emit(SessionUpdate::RouteReset);
    }

    /// An inbound message arrived.  Returns the rendered feed line.
    pub fn on_message_received(&mut self, namespace: &str, payload: &str) -> Option<String> {
        if namespace != self.channel.namespace() {
            debug!("ignoring message on foreign namespace {namespace}");
            return None;
        }
        if !self.subscribed {
            debug!("ignoring message while not subscribed: {payload}");
            return None;
        }
        debug!("received message: (ns={namespace}) {payload}");

        let event = self.channel.decode(payload);
        let local_user = self.identity.current_user();
        let line = self.feed.on_inbound(&event, local_user).to_string();
        self.emit(SessionUpdate::FeedLine(line.clone()));
        Some(line)
    }

    /// The connect or launch deadline of `attempt` passed.
    pub fn on_deadline_elapsed(&mut self, attempt: AttemptId) {
        if !self.is_current(attempt, "deadline") {
            return;
        }
        match self.state {
            ConnectionState::Connecting => self.fail(SessionError::ConnectTimeout {
                device: self.device_name(),
            }),
            ConnectionState::LaunchingApplication => self.fail(SessionError::LaunchTimeout),
            other => debug!("deadline elapsed while {other}; ignoring"),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn is_current(&self, attempt: AttemptId, what: &str) -> bool {
        if attempt != self.attempt {
            debug!(
                "ignoring stale {what} for attempt {attempt} (current {})",
                self.attempt
            );
            return false;
        }
        true
    }

    fn device_name(&self) -> String {
        self.device
            .as_ref()
            .map(|d| d.name().to_string())
            .unwrap_or_default()
    }

    /// Sends `join` or `leave`.  Failures are logged only.
    fn send_presence(&mut self, command: OutboundCommand) {
        if let Err(e) = self.send(command) {
            warn!("failed to send presence message: {e}");
        }
    }

    /// Unsubscribes the channel and disconnects the handle, if open.
    fn release_handle(&mut self) {
        if self.subscribed {
            self.subscribed = false;
            if let Err(e) = self.transport.unsubscribe(self.channel.namespace()) {
                warn!("failed to unsubscribe {}: {e}", self.channel.namespace());
            }
        }
        if self.handle_open {
            self.handle_open = false;
            debug!("disconnecting transport handle");
            self.transport.disconnect();
        }
    }

    fn fail(&mut self, err: SessionError) {
        error!("{err}");
        self.release_handle();
        self.metadata = None;
        let route_reset = err.is_connection_error();
        if route_reset {
            self.device = None;
        }
        self.set_state(ConnectionState::Failed);
        self.emit(SessionUpdate::Failed(err));
        if route_reset {
            self.emit(SessionUpdate::RouteReset);
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        debug!("session state {} -> {}", self.state, state);
        self.state = state;
        self.emit(SessionUpdate::StateChanged(state));
    }

    fn emit(&self, update: SessionUpdate) {
        // The presentation layer may have gone away; the session keeps running.
        let _ = self.updates.send(update);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
