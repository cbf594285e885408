//! Application layer for the dashboard sender.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules in `dashboard_core`) and the infrastructure (async
//! runtime, transports, storage).
//!
//! Code in this layer:
//!
//! - **Orchestrates** domain objects to fulfil a user goal (e.g., "connect to
//!   the selected TV and tell the dashboard I joined").
//! - **Depends on abstractions** (the [`transport::SessionTransport`] trait)
//!   rather than concrete transports, so tests can swap in a mock.
//! - **Contains no async runtime, no network I/O, no file system access**.
//!
//! # Sub-modules
//!
//! - **`transport`**       – The transport seam: request methods, callback
//!   events and send acknowledgements.
//!
//! - **`channel`**         – The namespaced dashboard channel: encodes and
//!   sends commands, decodes inbound payloads.
//!
//! - **`identity`**        – Resolves the local user name, generating a guest
//!   name when none was configured.
//!
//! - **`session_manager`** – The connection lifecycle state machine.  This is
//!   the heart of the sender.

pub mod channel;
pub mod identity;
pub mod session_manager;
pub mod transport;
