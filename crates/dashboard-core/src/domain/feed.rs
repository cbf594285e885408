//! DashboardFeed: turns inbound channel events into display lines.
//!
//! The feed mirrors the dashboard text view of the sender UI.  Each inbound
//! event becomes one line, and new lines go on **top** (most-recent-first):
//!
//! ```text
//! me: hello            ← newest
//! bob joined
//! me joined            ← oldest
//! ```
//!
//! # Line formats
//!
//! | Event kind        | Line                              |
//! |-------------------|-----------------------------------|
//! | `Join` / `Leave`  | `<label> <body>`                  |
//! | `Say`             | `<label>: <body>`                 |
//! | `Unknown`         | `unrecognized message: <raw>`     |
//!
//! `<label>` is [`SELF_LABEL`] when the event was sent by the local user,
//! unless the local user is a guest placeholder (see
//! [`crate::domain::identity::is_guest_placeholder`]).

use std::collections::VecDeque;

use crate::domain::identity::is_guest_placeholder;
use crate::protocol::messages::{EventKind, InboundEvent};

/// Label shown instead of the local user's own name.
pub const SELF_LABEL: &str = "me";

/// Prefix of the fallback line for events the feed does not understand.
pub const UNRECOGNIZED_PREFIX: &str = "unrecognized message: ";

/// Default number of lines kept in the feed.
pub const DEFAULT_MAX_LINES: usize = 200;

/// Returns the label to attribute an event from `user` with.
pub fn attribution_label<'a>(user: &'a str, local_user: &str) -> &'a str {
    if user == local_user && !is_guest_placeholder(local_user) {
        SELF_LABEL
    } else {
        user
    }
}

/// Renders a single event as a display line without touching any feed.
pub fn render_line(event: &InboundEvent, local_user: &str) -> String {
    match event.kind {
        EventKind::Join | EventKind::Leave => {
            format!("{} {}", attribution_label(&event.user, local_user), event.body)
        }
        EventKind::Say => {
            format!("{}: {}", attribution_label(&event.user, local_user), event.body)
        }
        EventKind::Unknown => format!("{UNRECOGNIZED_PREFIX}{}", event.body),
    }
}

/// Most-recent-first history of rendered display lines.
#[derive(Debug, Clone)]
pub struct DashboardFeed {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl Default for DashboardFeed {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

impl DashboardFeed {
    /// Creates an empty feed keeping at most `max_lines` lines (at least one).
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
        }
    }

    /// Renders `event`, prepends it to the feed and returns the new line.
    ///
    /// When the feed is full the oldest line is discarded.
    pub fn on_inbound(&mut self, event: &InboundEvent, local_user: &str) -> &str {
        let line = render_line(event, local_user);
        self.lines.push_front(line);
        self.lines.truncate(self.max_lines);
        &self.lines[0]
    }

    /// Iterates over the lines, newest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Returns the whole feed as newline-separated text, newest first.
    pub fn text(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }

    /// Number of lines currently kept.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if no line has arrived yet.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
