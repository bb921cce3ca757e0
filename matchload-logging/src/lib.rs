//! Logging setup for matchload
//!
//! All crates log through `tracing`; the resilience crate logs through the
//! `log` facade and is bridged into the same subscriber.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing};
