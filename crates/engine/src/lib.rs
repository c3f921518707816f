//! `engine` crate — batch models and the sequential batch executor.

pub mod models;
pub mod error;
pub mod executor;

pub use models::{parse_items, BatchOutcome, ExecutionResult, PairedItem};
pub use error::EngineError;
pub use executor::{BatchExecutor, ExecutorConfig};
