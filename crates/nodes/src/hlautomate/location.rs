//! Location (sub-account) builders.
//!
//! V1 flattens four form groups into `loc_*` keys and always sends every key
//! with a default. V2 forwards `locationData` as-is.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::params::{lenient_flag, lenient_text, parse_json_text, Parameters};
use super::request::{segment, HttpCall};
use crate::http::Method;
use crate::{Credentials, NodeError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LocationSettings {
    #[serde(deserialize_with = "lenient_flag")]
    allow_duplicate_contact: bool,
    #[serde(deserialize_with = "lenient_flag")]
    allow_duplicate_opportunity: bool,
    #[serde(deserialize_with = "lenient_flag")]
    allow_facebook_name_merge: bool,
    #[serde(deserialize_with = "lenient_flag")]
    disable_contact_timezone: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BusinessInfo {
    #[serde(deserialize_with = "lenient_text")]
    name: String,
    #[serde(deserialize_with = "lenient_text")]
    address: String,
    #[serde(deserialize_with = "lenient_text")]
    city: String,
    #[serde(deserialize_with = "lenient_text")]
    country: String,
    #[serde(deserialize_with = "lenient_text")]
    state: String,
    #[serde(deserialize_with = "lenient_text")]
    postal_code: String,
    #[serde(deserialize_with = "lenient_text")]
    website: String,
    #[serde(deserialize_with = "lenient_text")]
    timezone: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ContactInfo {
    #[serde(deserialize_with = "lenient_text")]
    first_name: String,
    #[serde(deserialize_with = "lenient_text")]
    last_name: String,
    #[serde(deserialize_with = "lenient_text")]
    email: String,
    #[serde(deserialize_with = "lenient_text")]
    phone: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AdditionalOptions {
    #[serde(deserialize_with = "lenient_text")]
    snapshot: String,
    custom_values: Value,
}

/// The flat V1 body shared by create and update.
fn flattened_v1(params: &Parameters, credentials: &Credentials) -> Result<Map<String, Value>, NodeError> {
    let agency_key = credentials.agency_key()?;
    let settings: LocationSettings = params.decode("locationSettings")?;
    let business: BusinessInfo = params.decode("businessInfo")?;
    let contact: ContactInfo = params.decode("contactInfo")?;
    let options: AdditionalOptions = params.decode("additionalOptions")?;
    let custom_values = parse_json_text("additionalOptions.customValues", Some(&options.custom_values))?;

    let entries = [
        ("ghl_api_key", json!(agency_key)),
        ("loc_setting_allowDuplicateContact", json!(settings.allow_duplicate_contact)),
        ("loc_setting_allowDuplicateOpportunity", json!(settings.allow_duplicate_opportunity)),
        ("loc_setting_allowFacebookNameMerge", json!(settings.allow_facebook_name_merge)),
        ("loc_setting_disableContactTimezone", json!(settings.disable_contact_timezone)),
        ("loc_bname", json!(business.name)),
        ("loc_address", json!(business.address)),
        ("loc_city", json!(business.city)),
        ("loc_country", json!(business.country)),
        ("loc_state", json!(business.state)),
        ("loc_postalCode", json!(business.postal_code)),
        ("loc_website", json!(business.website)),
        ("loc_timezone", json!(business.timezone)),
        ("loc_firstName", json!(contact.first_name)),
        ("loc_lastName", json!(contact.last_name)),
        ("loc_email", json!(contact.email)),
        ("loc_phone", json!(contact.phone)),
        ("snapshot", json!(options.snapshot)),
        ("customValues", custom_values),
    ];
    Ok(entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect())
}

pub(crate) fn create_v1(params: &Parameters, credentials: &Credentials) -> Result<HttpCall, NodeError> {
    let body = flattened_v1(params, credentials)?;
    Ok(HttpCall::new(Method::Post, "/ghl").with_body(Value::Object(body)))
}

pub(crate) fn update_v1(params: &Parameters, credentials: &Credentials) -> Result<HttpCall, NodeError> {
    let location_id = params.required_str("locationId")?;
    let body: Map<String, Value> = flattened_v1(params, credentials)?
        .into_iter()
        .chain([("locationId".to_string(), Value::String(location_id))])
        .collect();
    Ok(HttpCall::new(Method::Put, "/ghl").with_body(Value::Object(body)))
}

/// The vendor expects a GET with a JSON body here. Kept for compatibility.
pub(crate) fn get_v1(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let email = params.required_str("email")?;
    Ok(HttpCall::new(Method::Get, "/ghl").with_body(json!({ "email": email })))
}

pub(crate) fn create_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let data = params.object("locationData")?;
    Ok(HttpCall::new(Method::Post, "/ghl").with_body(Value::Object(data)))
}

pub(crate) fn update_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let location_id = params.required_str("locationId")?;
    let body: Map<String, Value> = params
        .object("locationData")?
        .into_iter()
        .chain([("locationId".to_string(), Value::String(location_id))])
        .collect();
    Ok(HttpCall::new(Method::Put, "/ghl").with_body(Value::Object(body)))
}

pub(crate) fn get_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let location_id = params.required_str("locationId")?;
    let email = params.optional_str("email")?;

    let call = HttpCall::new(Method::Get, "/ghl").with_query("locationId", location_id);
    Ok(if email.is_empty() {
        call
    } else {
        call.with_query("email", email)
    })
}

pub(crate) fn delete_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let location_id = params.required_str("locationId")?;
    Ok(HttpCall::new(Method::Delete, format!("/ghl/{}", segment(&location_id))))
}

pub(crate) fn list_v2(_: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    Ok(HttpCall::new(Method::Get, "/ghl"))
}
