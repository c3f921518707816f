//! Contact builders. V1 addresses contacts by path id; V2 uses a single
//! `/ghlcontact` endpoint and carries ids in the query or body.

use serde_json::{Map, Value};

use super::params::{parse_json_text, Parameters};
use super::request::{segment, HttpCall};
use crate::http::Method;
use crate::{Credentials, NodeError};

const CUSTOM_FIELD: &str = "customField";

/// `contactData` with its `customField` JSON text parsed.
fn contact_data(params: &Parameters) -> Result<Map<String, Value>, NodeError> {
    let mut data = params.object("contactData")?;
    if let Some(raw) = data.get(CUSTOM_FIELD) {
        let parsed = parse_json_text("contactData.customField", Some(raw))?;
        data.insert(CUSTOM_FIELD.to_string(), parsed);
    }
    Ok(data)
}

fn contact_path(params: &Parameters) -> Result<String, NodeError> {
    Ok(format!("/contacts/{}", segment(&params.required_str("contactId")?)))
}

pub(crate) fn create_v1(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    Ok(HttpCall::new(Method::Post, "/contacts").with_body(Value::Object(contact_data(params)?)))
}

pub(crate) fn get_v1(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    Ok(HttpCall::new(Method::Get, contact_path(params)?))
}

pub(crate) fn update_v1(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    Ok(HttpCall::new(Method::Put, contact_path(params)?).with_body(Value::Object(contact_data(params)?)))
}

pub(crate) fn delete_v1(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    Ok(HttpCall::new(Method::Delete, contact_path(params)?))
}

pub(crate) fn list_v1(_: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    Ok(HttpCall::new(Method::Get, "/contacts"))
}

pub(crate) fn create_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    Ok(HttpCall::new(Method::Post, "/ghlcontact").with_body(Value::Object(contact_data(params)?)))
}

/// `locationId` is mandatory; `email` and `phone` are sent only when set.
pub(crate) fn get_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let location_id = params.required_str("locationId")?;
    let email = params.optional_str("email")?;
    let phone = params.optional_str("phone")?;

    let mut call = HttpCall::new(Method::Get, "/ghlcontact").with_query("locationId", location_id);
    if !email.is_empty() {
        call = call.with_query("email", email);
    }
    if !phone.is_empty() {
        call = call.with_query("phone", phone);
    }
    Ok(call)
}

pub(crate) fn update_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let contact_id = params.required_str("contactId")?;
    let body: Map<String, Value> = contact_data(params)?
        .into_iter()
        .chain([("contact_id".to_string(), Value::String(contact_id))])
        .collect();
    Ok(HttpCall::new(Method::Put, "/ghlcontact").with_body(Value::Object(body)))
}

pub(crate) fn delete_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let contact_id = params.required_str("contactId")?;
    let location_id = params.required_str("locationId")?;
    Ok(HttpCall::new(Method::Delete, "/ghlcontact").with_body(serde_json::json!({
        "contact_id": contact_id,
        "locationId": location_id,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiVersion;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        Parameters::from_value(value).unwrap()
    }

    fn creds() -> Credentials {
        Credentials::new(ApiVersion::V2, "ops@example.com", "secret")
    }

    #[test]
    fn v1_paths_embed_the_contact_id() {
        let p = params(json!({ "contactId": "C 1", "contactData": { "firstName": "Jo" } }));
        assert_eq!(get_v1(&p, &creds()).unwrap().path, "/contacts/C%201");

        let update = update_v1(&p, &creds()).unwrap();
        assert_eq!(update.method, Method::Put);
        assert_eq!(update.body, Some(json!({ "firstName": "Jo" })));

        let delete = delete_v1(&p, &creds()).unwrap();
        assert_eq!(delete.method, Method::Delete);
        assert_eq!(delete.body, None);
    }

    #[test]
    fn v2_get_requires_location_and_orders_query() {
        let call = get_v2(
            &params(json!({ "locationId": "L1", "email": "a@b.com", "phone": "" })),
            &creds(),
        )
        .unwrap();
        assert_eq!(call.path_and_query(), "/ghlcontact?locationId=L1&email=a%40b.com");

        let err = get_v2(&params(json!({ "email": "a@b.com" })), &creds()).unwrap_err();
        assert!(matches!(err, NodeError::Validation { field, .. } if field == "locationId"));
    }

    #[test]
    fn v2_update_moves_id_into_body() {
        let call = update_v2(
            &params(json!({ "contactId": "C1", "contactData": { "firstName": "Jo" } })),
            &creds(),
        )
        .unwrap();
        assert_eq!(call.method, Method::Put);
        assert_eq!(call.path, "/ghlcontact");
        assert_eq!(call.body, Some(json!({ "firstName": "Jo", "contact_id": "C1" })));
    }

    #[test]
    fn v2_delete_sends_ids_in_body() {
        let call = delete_v2(&params(json!({ "contactId": "C1", "locationId": "L1" })), &creds()).unwrap();
        assert_eq!(call.path_and_query(), "/ghlcontact");
        assert_eq!(call.body, Some(json!({ "contact_id": "C1", "locationId": "L1" })));
    }

    #[test]
    fn custom_field_text_is_parsed() {
        let call = create_v2(
            &params(json!({ "contactData": { "email": "a@b.com", "customField": "{\"tier\":\"gold\"}" } })),
            &creds(),
        )
        .unwrap();
        assert_eq!(call.body, Some(json!({ "email": "a@b.com", "customField": { "tier": "gold" } })));

        let err = create_v2(&params(json!({ "contactData": { "customField": "{oops" } })), &creds()).unwrap_err();
        assert!(matches!(err, NodeError::Validation { field, .. } if field == "contactData.customField"));
    }
}
