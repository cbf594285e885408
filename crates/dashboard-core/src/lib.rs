//! # dashboard-core
//!
//! Shared library for the dashboard sender containing the channel wire
//! protocol, the session domain types, and the message feed.
//!
//! It has zero dependencies on OS APIs, UI frameworks, async runtimes, or
//! network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! The dashboard sender is a "controller" application: the user picks a
//! display device on the local network, the sender launches a companion
//! dashboard page on it, and the two exchange short user-attributed text
//! messages over a namespaced channel.
//!
//! This crate (`dashboard-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How messages travel over the channel.  Outbound commands
//!   (`join`, `show`, `leave`) are encoded into small JSON objects, and inbound
//!   JSON payloads from the dashboard page are decoded into typed events.
//!
//! - **`domain`** – Pure business rules.  The connection lifecycle states, the
//!   device value handed to us by discovery, guest identity rules, and the
//!   message feed that turns inbound events into display lines.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `dashboard_core::Device` instead of `dashboard_core::domain::device::Device`.
pub use domain::device::{Device, DeviceId};
pub use domain::feed::DashboardFeed;
pub use domain::session::{ApplicationMetadata, AttemptId, ConnectionState};
pub use protocol::codec::{decode_event, encode_command, try_decode_event, CodecError, DecodeError};
pub use protocol::messages::{EventKind, InboundEvent, OutboundCommand};
