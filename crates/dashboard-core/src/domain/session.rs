//! Session lifecycle states.
//!
//! # Connection lifecycle (for beginners)
//!
//! Every time the user selects a device, the sender walks through these states:
//!
//! ```text
//! Idle ──► Connecting ──► Connected ──► LaunchingApplication ──► Ready
//!              │                               │                   │
//!              └──────────► Failed ◄───────────┘        remote disconnect
//!                                                                  │
//!                                                                 Idle
//! ```
//!
//! - `Idle`: no device selected, nothing in flight.
//! - `Connecting`: a transport connection to the device was requested.
//! - `Connected`: the transport reported the connection is up.
//! - `LaunchingApplication`: the dashboard page launch was requested.
//! - `Ready`: the page is running and the channel is subscribed; commands may
//!   be sent.
//! - `Failed`: the connection or the launch failed.  The user must pick a
//!   device again; there is no automatic retry.
//!
//! A new selection always restarts the walk from `Connecting`.

use std::fmt;

/// Current state of the single client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No device selected.
    #[default]
    Idle,
    /// Transport connect requested, waiting for the result.
    Connecting,
    /// Transport connection established.
    Connected,
    /// Remote application launch requested, waiting for the result.
    LaunchingApplication,
    /// Remote application running and channel subscribed.
    Ready,
    /// Connection or launch failed; waits for a new selection.
    Failed,
}

impl ConnectionState {
    /// Returns `true` while a transport connection is up (`Connected`,
    /// `LaunchingApplication` or `Ready`).
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected
                | ConnectionState::LaunchingApplication
                | ConnectionState::Ready
        )
    }

    /// Returns `true` while waiting on a collaborator result that may never
    /// arrive.  These are the states guarded by a deadline.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::LaunchingApplication
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::LaunchingApplication => "launching application",
            ConnectionState::Ready => "ready",
            ConnectionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Identifies one device-selection episode.
///
/// Transport callbacks carry the attempt they belong to so that late results
/// from a superseded selection can be recognised and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AttemptId(pub u64);

impl AttemptId {
    /// Returns the identifier of the following attempt.
    pub fn next(self) -> Self {
        AttemptId(self.0.wrapping_add(1))
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Metadata reported by the transport once the remote application launched.
///
/// The sender never interprets these fields; they are kept for logging and for
/// the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationMetadata {
    /// Application identifier as reported by the device.
    pub application_id: String,
    /// Display name of the running application.
    pub name: String,
    /// Free-form application data.
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(ConnectionState::default(), ConnectionState::Idle);
    }

    #[test]
    fn test_is_connected_covers_connected_launching_and_ready() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(ConnectionState::LaunchingApplication.is_connected());
        assert!(ConnectionState::Ready.is_connected());
        assert!(!ConnectionState::Idle.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Failed.is_connected());
    }

    #[test]
    fn test_is_pending_covers_connecting_and_launching_only() {
        assert!(ConnectionState::Connecting.is_pending());
        assert!(ConnectionState::LaunchingApplication.is_pending());
        assert!(!ConnectionState::Connected.is_pending());
        assert!(!ConnectionState::Ready.is_pending());
    }

    #[test]
    fn test_attempt_id_next_increments() {
        assert_eq!(AttemptId(4).next(), AttemptId(5));
        assert_eq!(AttemptId(u64::MAX).next(), AttemptId(0));
    }

    #[test]
    fn test_state_display_is_lowercase() {
        assert_eq!(
            ConnectionState::LaunchingApplication.to_string(),
            "launching application"
        );
        assert_eq!(ConnectionState::Ready.to_string(), "ready");
    }
}
