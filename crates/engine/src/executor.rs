//! Batch execution engine.
//!
//! `BatchExecutor` runs one node over a batch of items:
//! 1. Builds one `ExecutionContext` per item, sharing the credentials.
//! 2. Awaits each item in input order; items never overlap.
//! 3. Pairs every output with the index of the item that produced it.
//! 4. On a node error either records `{ "error": message }` and moves on
//!    (`continue_on_fail`) or aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use nodes::http::{ReqwestTransport, DEFAULT_TIMEOUT};
use nodes::{ApiEndpoints, Credentials, ExecutableNode, ExecutionContext, HlAutomateNode};

use crate::{BatchOutcome, EngineError, ExecutionResult};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Turn item failures into error records instead of aborting.
    pub continue_on_fail: bool,
    /// Reuse access tokens for this long. `None` logs in for every item.
    pub token_ttl: Option<Duration>,
    /// Per-request timeout for the HTTP client.
    pub request_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            continue_on_fail: false,
            token_ttl: None,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// BatchExecutor
// ---------------------------------------------------------------------------

/// Runs a single node over every item of a batch.
pub struct BatchExecutor {
    node: Arc<dyn ExecutableNode>,
    config: ExecutorConfig,
}

impl BatchExecutor {
    pub fn new(node: Arc<dyn ExecutableNode>, config: ExecutorConfig) -> Self {
        Self { node, config }
    }

    /// Executor around an [`HlAutomateNode`] talking to `endpoints` over
    /// reqwest.
    ///
    /// # Errors
    /// [`EngineError::Setup`] if the HTTP client cannot be built.
    pub fn for_hlautomate(endpoints: ApiEndpoints, config: ExecutorConfig) -> Result<Self, EngineError> {
        let transport = ReqwestTransport::new(config.request_timeout).map_err(EngineError::Setup)?;
        let mut node = HlAutomateNode::new(Arc::new(transport)).with_endpoints(endpoints);
        if let Some(ttl) = config.token_ttl {
            node = node.with_token_cache(ttl);
        }
        Ok(Self::new(Arc::new(node), config))
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run every item and collect one result per item.
    ///
    /// # Errors
    /// Returns [`EngineError::ItemFailed`] for the first failing item when
    /// `continue_on_fail` is off. Items after it are not executed.
    #[instrument(
        skip(self, items, credentials),
        fields(items = items.len(), api_version = %credentials.api_version)
    )]
    pub async fn run(
        &self,
        items: Vec<Value>,
        credentials: Arc<Credentials>,
    ) -> Result<BatchOutcome, EngineError> {
        let execution_id = Uuid::new_v4();
        let started_at = Utc::now();
        let ctx = ExecutionContext::new(execution_id, 0, credentials);
        info!(%execution_id, "starting batch");

        let mut results = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            match self.node.execute(item, &ctx.for_item(index)).await {
                Ok(output) => {
                    info!("item {} succeeded", index);
                    results.push(ExecutionResult::success(index, output));
                }

                Err(node_err) if self.config.continue_on_fail => {
                    warn!("item {} failed, continuing: {}", index, node_err);
                    results.push(ExecutionResult::failure(index, node_err.to_string()));
                }

                Err(node_err) => {
                    error!("item {} failed, aborting batch: {}", index, node_err);
                    return Err(EngineError::ItemFailed {
                        index,
                        source: node_err,
                    });
                }
            }
        }

        let outcome = BatchOutcome {
            execution_id,
            started_at,
            finished_at: Utc::now(),
            results,
        };
        info!(
            %execution_id,
            "batch finished: {} items, {} failed",
            outcome.results.len(),
            outcome.failed_count()
        );
        Ok(outcome)
    }
}
