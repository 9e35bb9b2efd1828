//! Cadence-State: persistence between integration cycles
//!
//! Each project keeps exactly one record: the summary of its last completed
//! cycle. The next cycle is seeded from it.
//!
//! ## Key Components
//!
//! - `StateStore`: load/save the summary by project name
//! - `FileStateStore`: JSON files written atomically
//! - `ResultManager`: the `IntegrationResultManager` used by runners

mod error;
pub mod fakes;
mod file_store;
mod manager;
pub mod storage_traits;

pub use error::StateError;
pub use file_store::FileStateStore;
pub use manager::{ProjectSettings, ResultManager};
pub use storage_traits::{IntegrationResultManager, StateResult, StateStore};

/// Result type for cadence-state operations
pub type Result<T> = std::result::Result<T, StateError>;
