//! Engine-level error types.

use nodes::NodeError;
use thiserror::Error;

/// Errors produced while running a batch.
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Input errors ------

    /// The batch itself is malformed.
    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    /// The node could not be constructed.
    #[error("executor setup failed: {0}")]
    Setup(#[source] NodeError),

    // ------ Execution errors ------

    /// An item failed and continue-on-fail is off; later items were skipped.
    #[error("item {index} failed: {source}")]
    ItemFailed {
        index: usize,
        #[source]
        source: NodeError,
    },
}

impl EngineError {
    /// The node error behind an item failure.
    pub fn node_error(&self) -> Option<&NodeError> {
        match self {
            Self::ItemFailed { source, .. } => Some(source),
            Self::Setup(source) => Some(source),
            Self::InvalidBatch(_) => None,
        }
    }
}
