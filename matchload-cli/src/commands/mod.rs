//! CLI command implementations

pub mod config;
pub mod output;
pub mod roster;
pub mod run;
