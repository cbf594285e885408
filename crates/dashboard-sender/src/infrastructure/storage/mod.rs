//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform configuration directory, writes it back when the sender generated
//! a guest name, and falls back to defaults on first run.

pub mod config;
