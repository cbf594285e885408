//! Message types carried on the dashboard channel.
//!
//! The two directions use different schemas:
//!
//! ```text
//! Sender → Dashboard:  {"command":"join"|"show"|"leave","user":"...","info":"..."}
//! Dashboard → Sender:  {"user":"...","type":"join"|"leave"|"say"|...,"message":"..."}
//! ```
//!
//! Outbound messages are *commands* the sender asks the dashboard page to carry
//! out.  Inbound messages are *events* the dashboard page broadcasts to every
//! connected sender.  Keeping them as two distinct types makes it impossible to
//! send an event by accident.

use serde::{Deserialize, Serialize};

// ── Sender → Dashboard ────────────────────────────────────────────────────────

/// A command sent to the dashboard page.
///
/// # Serde representation
///
/// `tag = "command"` writes the variant name into a `"command"` field, followed
/// by the variant's own fields:
///
/// ```json
/// {"command":"join","user":"alice"}
/// {"command":"show","user":"alice","info":"hello"}
/// {"command":"leave","user":"alice"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum OutboundCommand {
    /// Announces the local user on the dashboard.
    Join {
        /// Display name of the local user.
        user: String,
    },
    /// Shows a line of text on the dashboard, attributed to `user`.
    Show {
        /// Display name of the local user.
        user: String,
        /// The text to display.  Must not be empty.
        info: String,
    },
    /// Tells the dashboard the local user is going away.
    Leave {
        /// Display name of the local user.
        user: String,
    },
}

impl OutboundCommand {
    /// Convenience constructor for [`OutboundCommand::Join`].
    pub fn join(user: impl Into<String>) -> Self {
        OutboundCommand::Join { user: user.into() }
    }

    /// Convenience constructor for [`OutboundCommand::Show`].
    pub fn show(user: impl Into<String>, info: impl Into<String>) -> Self {
        OutboundCommand::Show {
            user: user.into(),
            info: info.into(),
        }
    }

    /// Convenience constructor for [`OutboundCommand::Leave`].
    pub fn leave(user: impl Into<String>) -> Self {
        OutboundCommand::Leave { user: user.into() }
    }

    /// Returns the wire name of the command (`"join"`, `"show"`, `"leave"`).
    pub fn name(&self) -> &'static str {
        match self {
            OutboundCommand::Join { .. } => "join",
            OutboundCommand::Show { .. } => "show",
            OutboundCommand::Leave { .. } => "leave",
        }
    }

    /// Returns the user the command is attributed to.
    pub fn user(&self) -> &str {
        match self {
            OutboundCommand::Join { user }
            | OutboundCommand::Show { user, .. }
            | OutboundCommand::Leave { user } => user,
        }
    }
}

// ── Dashboard → Sender ────────────────────────────────────────────────────────

/// Kind of an inbound event, derived from the payload's `"type"` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A participant joined the dashboard.
    Join,
    /// A participant left the dashboard.
    Leave,
    /// A participant said something.
    Say,
    /// Anything else, including payloads that could not be decoded.
    Unknown,
}

impl EventKind {
    /// Maps a wire `"type"` value to an event kind.
    ///
    /// Matching is exact: `"Join"` is not `"join"` and becomes `Unknown`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "join" => EventKind::Join,
            "leave" => EventKind::Leave,
            "say" => EventKind::Say,
            _ => EventKind::Unknown,
        }
    }
}

/// A decoded inbound event.
///
/// For `Join`, `Leave` and `Say`, `body` is the payload's `"message"` field.
/// For `Unknown`, `body` is the raw payload text exactly as received, so
/// nothing is lost when the dashboard page speaks a newer dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// The participant the event is attributed to (empty if undecodable).
    pub user: String,
    /// What happened.
    pub kind: EventKind,
    /// Message text, or the raw payload for `Unknown`.
    pub body: String,
}

impl InboundEvent {
    /// Builds an `Unknown` event that preserves the raw payload.
    pub fn unknown(user: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            kind: EventKind::Unknown,
            body: raw.into(),
        }
    }
}
