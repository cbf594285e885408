//! Infrastructure layer for the dashboard sender.
//!
//! Contains the runtime-facing adapters: the tokio session actor, the
//! transports, and file-system storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `dashboard_core`, but MUST NOT be imported by the `application` layer.

pub mod session_actor;
pub mod storage;
pub mod transport;
