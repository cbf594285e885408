//! Domain entities for the dashboard sender.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code:
//!
//! - Contains the core business rules of the application.
//! - Has **no** imports from OS APIs, network libraries, or UI frameworks.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Code in outer layers (application, infrastructure) depends on the domain,
//! but the domain never depends on them.

/// The display device selected by the user.
pub mod device;

/// Message feed: turns inbound channel events into display lines.
pub mod feed;

/// Local participant naming rules (guest names, placeholder detection).
pub mod identity;

/// Connection lifecycle states and per-selection attempt identifiers.
pub mod session;
