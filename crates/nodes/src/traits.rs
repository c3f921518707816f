//! The `ExecutableNode` trait — the contract every node must fulfil.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Credentials, NodeError};

/// Per-item context passed to a node during execution.
///
/// Defined here (in the nodes crate) so both the engine and individual node
/// implementations can import it without a circular dependency.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// ID of the current batch run.
    pub execution_id: uuid::Uuid,
    /// Position of the item being processed in the input batch.
    pub item_index: usize,
    /// Credentials resolved by the caller, shared read-only by every item.
    pub credentials: Arc<Credentials>,
}

impl ExecutionContext {
    /// Context for the item at `item_index`.
    pub fn new(execution_id: uuid::Uuid, item_index: usize, credentials: Arc<Credentials>) -> Self {
        Self {
            execution_id,
            item_index,
            credentials,
        }
    }

    /// Same run and credentials, next item.
    pub fn for_item(&self, item_index: usize) -> Self {
        Self {
            item_index,
            ..self.clone()
        }
    }
}

/// The core node trait.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node for one input item (its resolved parameter bag) and
    /// return the JSON payload for that item.
    async fn execute(&self, input: Value, ctx: &ExecutionContext) -> Result<Value, NodeError>;
}
