//! Timezone options for appointment and location forms.
//!
//! Loading never fails: any error, or a response in an unexpected shape,
//! yields [`FALLBACK_TIMEZONES`]. The [`TimezoneSource`] tells the two apart.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::auth::Authenticator;
use super::params::is_truthy;
use crate::http::{HttpRequest, HttpTransport, Method};
use crate::{ApiEndpoints, ApiVersion, Credentials, NodeError};

pub const FALLBACK_TIMEZONES: [&str; 4] = ["US/Central", "US/Eastern", "US/Pacific", "US/Mountain"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimezoneOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimezoneSource {
    Remote,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimezoneList {
    pub options: Vec<TimezoneOption>,
    pub source: TimezoneSource,
}

impl TimezoneList {
    pub fn fallback() -> Self {
        Self {
            options: FALLBACK_TIMEZONES
                .iter()
                .map(|tz| TimezoneOption {
                    name: tz.to_string(),
                    value: tz.to_string(),
                })
                .collect(),
            source: TimezoneSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == TimezoneSource::Fallback
    }
}

/// Log in with `credentials`, then read `GET {v1 base}/ghl/timezones`.
/// The list lives on the V1 host for both generations.
pub async fn load_timezones(
    transport: &dyn HttpTransport,
    endpoints: &ApiEndpoints,
    credentials: &Credentials,
) -> TimezoneList {
    match fetch(transport, endpoints, credentials).await {
        Ok(body) => match parse_timezones(&body) {
            Some(options) => TimezoneList {
                options,
                source: TimezoneSource::Remote,
            },
            None => {
                warn!("unexpected timezone response shape, using fallback list");
                TimezoneList::fallback()
            }
        },
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "timezone lookup failed, using fallback list");
            TimezoneList::fallback()
        }
    }
}

async fn fetch(
    transport: &dyn HttpTransport,
    endpoints: &ApiEndpoints,
    credentials: &Credentials,
) -> Result<Value, NodeError> {
    let token = Authenticator::new(transport, endpoints)
        .authenticate(credentials)
        .await?;
    let url = format!("{}/ghl/timezones", endpoints.base_url(ApiVersion::V1));
    let request = HttpRequest::new(Method::Get, url)
        .header("Accept", "application/json")
        .header("Authorization", format!("Bearer {}", token.as_str()));
    transport.send(request).await
}

/// Accepts a bare array, or an object holding the array under `timezones`
/// or, when that is missing or falsy, `data`.
fn parse_timezones(body: &Value) -> Option<Vec<TimezoneOption>> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(fields) => fields
            .get("timezones")
            .filter(|list| is_truthy(list))
            .or_else(|| fields.get("data"))
            .and_then(Value::as_array)?,
        _ => return None,
    };
    Some(entries.iter().filter_map(parse_entry).collect())
}

fn parse_entry(entry: &Value) -> Option<TimezoneOption> {
    if let Some(id) = entry.as_str() {
        return Some(TimezoneOption {
            name: id.to_string(),
            value: id.to_string(),
        });
    }
    let value = first_text(entry, &["id", "value"])?;
    let name = first_text(entry, &["displayName", "name", "id"]).unwrap_or_else(|| value.clone());
    Some(TimezoneOption { name, value })
}

/// First non-empty string among `keys`.
fn first_text(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| entry.get(*key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
