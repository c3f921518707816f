//! Typed access to the host-resolved parameter bag of one item.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::NodeError;

/// Named parameters for one item, already resolved by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// # Errors
    /// [`NodeError::Validation`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, NodeError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            Value::Null => Ok(Self::default()),
            other => Err(NodeError::validation(
                "item",
                format!("expected an object of parameters, got {}", type_name(&other)),
            )),
        }
    }

    /// Present and not `null`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    /// Text value that must be present and non-empty.
    ///
    /// # Errors
    /// [`NodeError::Validation`] naming `name`.
    pub fn required_str(&self, name: &str) -> Result<String, NodeError> {
        let value = self.get(name).ok_or_else(|| NodeError::missing(name))?;
        let text = scalar_text(value).ok_or_else(|| {
            NodeError::validation(name, format!("expected text, got {}", type_name(value)))
        })?;
        if text.is_empty() {
            return Err(NodeError::missing(name));
        }
        Ok(text)
    }

    /// Text value, `""` when absent.
    ///
    /// # Errors
    /// [`NodeError::Validation`] if the value is an object, array or bool.
    pub fn optional_str(&self, name: &str) -> Result<String, NodeError> {
        match self.get(name) {
            None => Ok(String::new()),
            Some(value) => scalar_text(value).ok_or_else(|| {
                NodeError::validation(name, format!("expected text, got {}", type_name(value)))
            }),
        }
    }

    /// Object value, `{}` when absent.
    ///
    /// # Errors
    /// [`NodeError::Validation`] if the value is present but not an object.
    pub fn object(&self, name: &str) -> Result<Map<String, Value>, NodeError> {
        match self.get(name) {
            None => Ok(Map::new()),
            Some(Value::Object(fields)) => Ok(fields.clone()),
            Some(other) => Err(NodeError::validation(
                name,
                format!("expected an object, got {}", type_name(other)),
            )),
        }
    }

    /// Decode an object-valued parameter into `T`, `T::default()` when absent.
    ///
    /// # Errors
    /// [`NodeError::Validation`] naming `name` with the serde message.
    pub fn decode<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, NodeError> {
        match self.get(name) {
            None => Ok(T::default()),
            Some(value) => T::deserialize(value)
                .map_err(|e| NodeError::validation(name, e.to_string())),
        }
    }

    /// Copy every listed field whose value is truthy, in listing order.
    pub fn truthy_fields(&self, names: &[&str]) -> Map<String, Value> {
        names
            .iter()
            .filter_map(|name| {
                self.get(name)
                    .filter(|value| is_truthy(value))
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect()
    }
}

/// Loose truthiness: `null`, `false`, `0`, and `""` are falsy, everything
/// else (including empty objects) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parse a field that carries raw JSON text.
///
/// Falsy values become `{}`; objects and arrays pass through unchanged.
///
/// # Errors
/// [`NodeError::Validation`] naming `field` when the text is not valid JSON.
pub fn parse_json_text(field: &str, value: Option<&Value>) -> Result<Value, NodeError> {
    match value {
        None => Ok(Value::Object(Map::new())),
        Some(value) if !is_truthy(value) => Ok(Value::Object(Map::new())),
        Some(Value::String(text)) => serde_json::from_str(text)
            .map_err(|e| NodeError::validation(field, format!("invalid JSON: {e}"))),
        Some(value @ (Value::Object(_) | Value::Array(_))) => Ok(value.clone()),
        Some(other) => Err(NodeError::validation(
            field,
            format!("expected JSON text, got {}", type_name(other)),
        )),
    }
}

/// Split comma-separated ids into a trimmed list; `""` gives an empty list.
pub fn split_ids(raw: &str) -> Vec<Value> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',')
        .map(|id| Value::String(id.trim().to_string()))
        .collect()
}

/// Strings as-is, numbers rendered; everything else has no text form.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serde helper for text fields inside decoded sub-objects: accepts strings,
/// numbers and `null` (as `""`).
pub(crate) fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(String::new()),
        other => scalar_text(&other).ok_or_else(|| {
            serde::de::Error::custom(format!("expected text, got {}", type_name(&other)))
        }),
    }
}

/// Serde helper for flags: `null` and other falsy values become `false`.
pub(crate) fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        Parameters::from_value(value).unwrap()
    }

    #[test]
    fn required_str_rejects_absent_null_and_empty() {
        let p = params(json!({ "a": "x", "b": "", "c": null, "n": 42 }));
        assert_eq!(p.required_str("a").unwrap(), "x");
        assert_eq!(p.required_str("n").unwrap(), "42");
        for name in ["b", "c", "missing"] {
            assert!(matches!(
                p.required_str(name),
                Err(NodeError::Validation { field, .. }) if field == name
            ));
        }
    }

    #[test]
    fn optional_str_defaults_to_empty() {
        let p = params(json!({ "email": "a@b.com", "flag": true }));
        assert_eq!(p.optional_str("email").unwrap(), "a@b.com");
        assert_eq!(p.optional_str("phone").unwrap(), "");
        assert!(p.optional_str("flag").is_err());
    }

    #[test]
    fn object_defaults_to_empty_and_rejects_scalars() {
        let p = params(json!({ "data": { "k": 1 }, "bad": "text" }));
        assert_eq!(p.object("data").unwrap().len(), 1);
        assert!(p.object("absent").unwrap().is_empty());
        assert!(p.object("bad").is_err());
    }

    #[test]
    fn truthy_fields_skip_falsy_values() {
        let p = params(json!({
            "title": "Demo",
            "description": "",
            "toNotify": false,
            "ignoreDateRange": true,
            "rrule": null
        }));
        let picked = p.truthy_fields(&["title", "description", "toNotify", "ignoreDateRange", "rrule", "absent"]);
        assert_eq!(Value::Object(picked), json!({ "title": "Demo", "ignoreDateRange": true }));
    }

    #[test]
    fn json_text_is_parsed_or_reported() {
        assert_eq!(parse_json_text("customValues", None).unwrap(), json!({}));
        assert_eq!(parse_json_text("customValues", Some(&json!(""))).unwrap(), json!({}));
        assert_eq!(
            parse_json_text("customValues", Some(&json!(r#"{"k":"v"}"#))).unwrap(),
            json!({ "k": "v" })
        );
        assert_eq!(
            parse_json_text("customValues", Some(&json!({ "k": "v" }))).unwrap(),
            json!({ "k": "v" })
        );
        let err = parse_json_text("customValues", Some(&json!("{not json"))).unwrap_err();
        assert!(matches!(err, NodeError::Validation { field, .. } if field == "customValues"));
    }

    #[test]
    fn ids_are_split_and_trimmed() {
        assert_eq!(split_ids("L1, L2 ,L3"), vec![json!("L1"), json!("L2"), json!("L3")]);
        assert!(split_ids("").is_empty());
    }

    #[test]
    fn non_object_items_are_rejected() {
        assert!(Parameters::from_value(json!([1, 2])).is_err());
        assert_eq!(Parameters::from_value(Value::Null).unwrap(), Parameters::default());
    }
}
