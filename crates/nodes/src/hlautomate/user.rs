//! User builders.

use serde_json::{Map, Value};

use super::params::{is_truthy, split_ids, Parameters};
use super::request::HttpCall;
use crate::http::Method;
use crate::{ApiVersion, Credentials, NodeError};

/// Permission flags understood by both API generations.
const SHARED_PERMISSIONS: &[&str] = &[
    "adwordsReportingEnabled",
    "appointmentsEnabled",
    "assignedDataOnly",
    "attributionsReportingEnabled",
    "bulkRequestsEnabled",
    "phoneCallEnabled",
    "contactsEnabled",
    "conversationsEnabled",
    "dashboardStatsEnabled",
    "facebookAdsReportingEnabled",
    "funnelsEnabled",
    "leadValueEnabled",
    "marketingEnabled",
    "membershipEnabled",
    "onlineListingsEnabled",
    "opportunitiesEnabled",
    "reviewsEnabled",
    "settingsEnabled",
    "tagsEnabled",
    "triggersEnabled",
    "websitesEnabled",
    "workflowsEnabled",
];

/// Only V1 knows about campaigns.
const V1_ONLY_PERMISSIONS: &[&str] = &["campaignsEnabled", "campaignsReadOnly"];

const PROFILE_FIELDS: &[&str] = &["firstName", "lastName", "email", "password", "type", "role"];

/// Every known flag for `version`, each defaulting to `false`.
fn permission_flags(input: &Map<String, Value>, version: ApiVersion) -> Value {
    let extra: &[&str] = match version {
        ApiVersion::V1 => V1_ONLY_PERMISSIONS,
        ApiVersion::V2 => &[],
    };
    let flags: Map<String, Value> = SHARED_PERMISSIONS
        .iter()
        .chain(extra)
        .map(|name| {
            let enabled = input.get(*name).is_some_and(is_truthy);
            (name.to_string(), Value::Bool(enabled))
        })
        .collect();
    Value::Object(flags)
}

/// Full body for create; every key is always present.
fn create_body(params: &Parameters, version: ApiVersion) -> Result<Map<String, Value>, NodeError> {
    let mut body = Map::new();
    for field in PROFILE_FIELDS {
        body.insert(field.to_string(), Value::String(params.required_str(field)?));
    }
    body.insert(
        "locationIds".into(),
        Value::Array(split_ids(&params.optional_str("locationIds")?)),
    );
    body.insert("phone".into(), Value::String(params.optional_str("phone")?));
    body.insert(
        "permissions".into(),
        permission_flags(&params.object("permissions")?, version),
    );
    Ok(body)
}

/// Partial body for update: `userId` plus only the fields that were set.
fn update_body(params: &Parameters, version: ApiVersion) -> Result<Map<String, Value>, NodeError> {
    let mut body = Map::new();
    body.insert("userId".into(), Value::String(params.required_str("userId")?));

    for field in PROFILE_FIELDS.iter().chain(&["phone"]) {
        let value = params.optional_str(field)?;
        if !value.is_empty() {
            body.insert(field.to_string(), Value::String(value));
        }
    }

    let location_ids = params.optional_str("locationIds")?;
    if !location_ids.is_empty() {
        body.insert("locationIds".into(), Value::Array(split_ids(&location_ids)));
    }

    let permissions = params.object("permissions")?;
    if !permissions.is_empty() {
        body.insert("permissions".into(), permission_flags(&permissions, version));
    }
    Ok(body)
}

fn with_agency_key(
    body: Map<String, Value>,
    credentials: &Credentials,
) -> Result<Map<String, Value>, NodeError> {
    let key = credentials.agency_key()?;
    Ok(body
        .into_iter()
        .chain([("ghl_api_key".to_string(), Value::String(key.to_string()))])
        .collect())
}

pub(crate) fn create_v1(params: &Parameters, credentials: &Credentials) -> Result<HttpCall, NodeError> {
    let body = with_agency_key(create_body(params, ApiVersion::V1)?, credentials)?;
    Ok(HttpCall::new(Method::Post, "/ghluser").with_body(Value::Object(body)))
}

pub(crate) fn update_v1(params: &Parameters, credentials: &Credentials) -> Result<HttpCall, NodeError> {
    let body = with_agency_key(update_body(params, ApiVersion::V1)?, credentials)?;
    Ok(HttpCall::new(Method::Put, "/ghluser").with_body(Value::Object(body)))
}

pub(crate) fn create_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let body = create_body(params, ApiVersion::V2)?;
    Ok(HttpCall::new(Method::Post, "/ghluser").with_body(Value::Object(body)))
}

pub(crate) fn update_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let body = update_body(params, ApiVersion::V2)?;
    Ok(HttpCall::new(Method::Put, "/ghluser").with_body(Value::Object(body)))
}

pub(crate) fn get_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let email = params.optional_str("email")?;
    let call = HttpCall::new(Method::Get, "/ghluser");
    Ok(if email.is_empty() {
        call
    } else {
        call.with_query("email", email)
    })
}
