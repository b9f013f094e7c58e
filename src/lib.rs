pub mod config;
pub mod error;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod supervisor;
pub mod worker;

pub use config::{ExamSequence, MarkerConfig, PacingConfig, Variant};
pub use error::{MarkerError, Result};
pub use supervisor::{RunSummary, Supervisor};
