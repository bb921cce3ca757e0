//! Virtual user lifecycle engine for matchload
//!
//! A run is driven by [`LoadRunner`]: it computes the ramp schedule, starts
//! one [`VirtualUser`] per worker slot as the population ramps up, waits for
//! every slot to terminate and condenses the shared metrics into a
//! [`RunSummary`].

pub mod cleanup;
pub mod error;
pub mod runner;
pub mod settings;
pub mod summary;
pub mod virtual_user;

#[cfg(test)]
pub(crate) mod testing;

pub use cleanup::CleanupPath;
pub use error::EngineError;
pub use runner::LoadRunner;
pub use settings::{CycleSettings, RunPlan};
pub use summary::{RunSummary, ThresholdCheck, ThresholdReport};
pub use virtual_user::{SlotReport, VirtualUser};
