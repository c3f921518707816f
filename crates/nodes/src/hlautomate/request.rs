//! Operation requests and the HTTP calls they map to.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::params::Parameters;
use crate::http::{HttpRequest, Method};
use crate::{ApiVersion, NodeError};

/// Vendor entity type being manipulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Contact,
    Location,
    User,
    CalendarAppointment,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Contact,
        Resource::Location,
        Resource::User,
        Resource::CalendarAppointment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Location => "location",
            Self::User => "user",
            Self::CalendarAppointment => "calendarAppointment",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRUD-like verb applied to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Create,
    Get,
    Update,
    Delete,
    List,
    CalendarBook,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Create,
        Operation::Get,
        Operation::Update,
        Operation::Delete,
        Operation::List,
        Operation::CalendarBook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::List => "list",
            Self::CalendarBook => "calendarBook",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item's request, before any version-specific shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub resource: Resource,
    pub operation: Operation,
    pub api_version: ApiVersion,
    pub fields: Parameters,
}

impl OperationRequest {
    /// Build a request from an item's parameter object, which must carry
    /// `resource` and `operation` next to the operation's own fields.
    ///
    /// # Errors
    /// - [`NodeError::Validation`] if the item is not an object or lacks
    ///   `resource`/`operation`.
    /// - [`NodeError::UnknownOperation`] for names outside the known sets.
    pub fn from_item(item: Value, api_version: ApiVersion) -> Result<Self, NodeError> {
        let fields = Parameters::from_value(item)?;
        let resource_name = fields.required_str("resource")?;
        let operation_name = fields.required_str("operation")?;

        let unknown = || NodeError::UnknownOperation {
            resource: resource_name.clone(),
            operation: operation_name.clone(),
        };
        let resource = Resource::from_name(&resource_name).ok_or_else(unknown)?;
        let operation = Operation::from_name(&operation_name).ok_or_else(unknown)?;

        Ok(Self {
            resource,
            operation,
            api_version,
            fields,
        })
    }
}

/// Method, path, query and body for one vendor call. Base URL and headers
/// are added when the call is turned into an [`HttpRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpCall {
    pub method: Method,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl HttpCall {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Path plus the percent-encoded query string, e.g.
    /// `/ghlcontact?locationId=L1&email=a%40b.com`.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(name, value)| format!("{}={}", urlencoding::encode(name), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }

    /// Attach the base URL and the bearer/JSON headers.
    pub fn into_request(self, base_url: &str, bearer: &str) -> HttpRequest {
        let url = format!("{}{}", base_url.trim_end_matches('/'), self.path_and_query());
        let request = HttpRequest::new(self.method, url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {bearer}"));
        match self.body {
            Some(body) => request.json_body(body),
            None => request,
        }
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_is_parsed_into_typed_request() {
        let request = OperationRequest::from_item(
            json!({ "resource": "calendarAppointment", "operation": "calendarBook", "title": "x" }),
            ApiVersion::V2,
        )
        .unwrap();
        assert_eq!(request.resource, Resource::CalendarAppointment);
        assert_eq!(request.operation, Operation::CalendarBook);
        assert_eq!(request.fields.optional_str("title").unwrap(), "x");
    }

    #[test]
    fn unknown_names_are_reported_with_the_operation() {
        let err = OperationRequest::from_item(
            json!({ "resource": "contact", "operation": "archive" }),
            ApiVersion::V1,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unknown contact operation: archive");

        let err = OperationRequest::from_item(
            json!({ "resource": "invoice", "operation": "create" }),
            ApiVersion::V1,
        )
        .unwrap_err();
        assert!(matches!(err, NodeError::UnknownOperation { .. }));
    }

    #[test]
    fn missing_operation_is_a_validation_error() {
        let err = OperationRequest::from_item(json!({ "resource": "contact" }), ApiVersion::V1).unwrap_err();
        assert!(matches!(err, NodeError::Validation { field, .. } if field == "operation"));
    }

    #[test]
    fn query_is_percent_encoded() {
        let call = HttpCall::new(Method::Get, "/ghlcontact")
            .with_query("locationId", "L1")
            .with_query("email", "a@b.com");
        assert_eq!(call.path_and_query(), "/ghlcontact?locationId=L1&email=a%40b.com");
    }

    #[test]
    fn request_carries_bearer_and_json_headers() {
        let request = HttpCall::new(Method::Post, "/ghl")
            .with_body(json!({ "a": 1 }))
            .into_request("https://api.example.com/v2/", "tok");
        assert_eq!(request.url, "https://api.example.com/v2/ghl");
        assert_eq!(request.header_value("authorization"), Some("Bearer tok"));
        assert_eq!(request.header_value("content-type"), Some("application/json"));
        assert_eq!(request.body, Some(json!({ "a": 1 })));
    }
}
