//! Transport adapters implementing
//! [`SessionTransport`](crate::application::transport::SessionTransport).
//!
//! Only the in-process loopback receiver ships with the sender.  Platform
//! transports live outside this crate and plug in through the same trait.

pub mod loopback;
