//! Batch input and output models.
//!
//! Items are the host-resolved parameter objects, one per input record.
//! Results keep the host's `{json, pairedItem: {item}}` shape so they can be
//! handed back unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::EngineError;

// ---------------------------------------------------------------------------
// PairedItem
// ---------------------------------------------------------------------------

/// Index of the input item a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedItem {
    pub item: usize,
}

// ---------------------------------------------------------------------------
// ExecutionResult
// ---------------------------------------------------------------------------

/// Output for one input item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Vendor response, or `{ "error": message }`.
    pub json: Value,
    pub paired_item: PairedItem,
}

impl ExecutionResult {
    pub fn success(item: usize, json: Value) -> Self {
        Self {
            json,
            paired_item: PairedItem { item },
        }
    }

    pub fn failure(item: usize, message: impl Into<String>) -> Self {
        Self {
            json: json!({ "error": message.into() }),
            paired_item: PairedItem { item },
        }
    }

    /// The error message, if this is a failure record.
    pub fn error(&self) -> Option<&str> {
        self.json
            .as_object()
            .filter(|fields| fields.len() == 1)
            .and_then(|fields| fields.get("error"))
            .and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// BatchOutcome
// ---------------------------------------------------------------------------

/// Everything produced by one pass over a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub execution_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per input item, in input order.
    pub results: Vec<ExecutionResult>,
}

impl BatchOutcome {
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.error().is_some()).count()
    }
}

/// Accept either a JSON array of item objects or a single item object.
///
/// # Errors
/// [`EngineError::InvalidBatch`] for any other shape.
pub fn parse_items(value: Value) -> Result<Vec<Value>, EngineError> {
    match value {
        Value::Array(items) => {
            if let Some(pos) = items.iter().position(|item| !item.is_object()) {
                return Err(EngineError::InvalidBatch(format!(
                    "item {pos} is not a JSON object"
                )));
            }
            Ok(items)
        }
        item @ Value::Object(_) => Ok(vec![item]),
        _ => Err(EngineError::InvalidBatch(
            "expected a JSON array of items or a single item object".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_serialize_in_host_shape() {
        let ok = ExecutionResult::success(0, json!({ "id": "C1" }));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "json": { "id": "C1" }, "pairedItem": { "item": 0 } })
        );

        let failed = ExecutionResult::failure(3, "boom");
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({ "json": { "error": "boom" }, "pairedItem": { "item": 3 } })
        );
        assert_eq!(failed.error(), Some("boom"));
        assert_eq!(ok.error(), None);
    }

    #[test]
    fn vendor_payload_with_extra_fields_is_not_an_error_record() {
        let result = ExecutionResult::success(0, json!({ "error": "soft", "id": "C1" }));
        assert_eq!(result.error(), None);
    }

    #[test]
    fn items_accept_array_or_single_object() {
        assert_eq!(parse_items(json!([{ "a": 1 }, { "b": 2 }])).unwrap().len(), 2);
        assert_eq!(parse_items(json!({ "a": 1 })).unwrap().len(), 1);
        assert!(matches!(parse_items(json!([{ "a": 1 }, 7])), Err(EngineError::InvalidBatch(_))));
        assert!(parse_items(json!("nope")).is_err());
    }
}
