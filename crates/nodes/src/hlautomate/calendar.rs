//! Calendar appointment builders, all under `/ghlcalendarteam`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::params::Parameters;
use super::request::HttpCall;
use crate::http::Method;
use crate::{Credentials, NodeError};

const APPOINTMENTS: &str = "/ghlcalendarteam/appointments";
const BLOCK_DATE: &str = "/ghlcalendarteam/appointments_block_date";

/// Optional V2 fields, sent only when truthy.
const V2_OPTIONAL: &[&str] = &[
    "meetingLocationType",
    "meetingLocationId",
    "overrideLocationConfig",
    "appointmentStatus",
    "assignedUserId",
    "description",
    "address",
    "ignoreDateRange",
    "toNotify",
    "ignoreFreeSlotValidation",
    "rrule",
];

/// Extra optional fields accepted by the V2 update.
const V2_UPDATE_OPTIONAL: &[&str] = &["title", "startTime", "endTime"];

/// Status values the V1 update endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
    Showed,
    Noshow,
    Invalid,
}

impl AppointmentStatus {
    fn parse(raw: &str) -> Result<Self, NodeError> {
        serde_json::from_value(Value::String(raw.to_string())).map_err(|_| {
            NodeError::validation(
                "status",
                format!("expected one of confirmed, cancelled, showed, noshow, invalid; got '{raw}'"),
            )
        })
    }
}

fn required_fields(params: &Parameters, names: &[&str]) -> Result<Map<String, Value>, NodeError> {
    names
        .iter()
        .map(|name| Ok((name.to_string(), Value::String(params.required_str(name)?))))
        .collect()
}

pub(crate) fn create_v1(params: &Parameters, credentials: &Credentials) -> Result<HttpCall, NodeError> {
    let key = credentials.agency_key()?;
    let body: Map<String, Value> = [("ghl_api_key".to_string(), Value::String(key.to_string()))]
        .into_iter()
        .chain(required_fields(
            params,
            &["calendarId", "locationId", "selectedTimezone", "selectedSlot"],
        )?)
        .collect();
    Ok(HttpCall::new(Method::Post, APPOINTMENTS).with_body(Value::Object(body)))
}

pub(crate) fn update_v1(params: &Parameters, credentials: &Credentials) -> Result<HttpCall, NodeError> {
    let key = credentials.agency_key()?;
    let appointment_id = params.required_str("appointmentId")?;
    let status = AppointmentStatus::parse(&params.required_str("status")?)?;
    let location_id = params.optional_str("locationId")?;
    Ok(HttpCall::new(Method::Put, APPOINTMENTS).with_body(json!({
        "ghl_api_key": key,
        "locationId": location_id,
        "appointmentId": appointment_id,
        "status": status,
    })))
}

/// Blocks a slot on a calendar. V2 only.
pub(crate) fn book_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let body = required_fields(
        params,
        &["locationId", "calendarId", "selectedSlot", "endAt", "title"],
    )?;
    Ok(HttpCall::new(Method::Post, BLOCK_DATE).with_body(Value::Object(body)))
}

pub(crate) fn create_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let body: Map<String, Value> = required_fields(
        params,
        &["title", "calendarId", "locationId", "contactId", "startTime", "endTime"],
    )?
    .into_iter()
    .chain(params.truthy_fields(V2_OPTIONAL))
    .collect();
    Ok(HttpCall::new(Method::Post, APPOINTMENTS).with_body(Value::Object(body)))
}

pub(crate) fn update_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let body: Map<String, Value> = required_fields(params, &["eventId", "locationId"])?
        .into_iter()
        .chain(params.truthy_fields(V2_UPDATE_OPTIONAL))
        .chain(params.truthy_fields(V2_OPTIONAL))
        .collect();
    Ok(HttpCall::new(Method::Put, APPOINTMENTS).with_body(Value::Object(body)))
}

pub(crate) fn list_v2(params: &Parameters, _: &Credentials) -> Result<HttpCall, NodeError> {
    let location_id = params.required_str("locationId")?;
    let start_time = params.required_str("startTime")?;
    let end_time = params.required_str("endTime")?;
    Ok(HttpCall::new(Method::Get, APPOINTMENTS)
        .with_query("locationId", location_id)
        .with_query("startTime", start_time)
        .with_query("endTime", end_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiVersion;

    fn params(value: Value) -> Parameters {
        Parameters::from_value(value).unwrap()
    }

    fn v1_creds() -> Credentials {
        Credentials::new(ApiVersion::V1, "ops@example.com", "secret").with_agency_key("AGENCY")
    }

    fn v2_creds() -> Credentials {
        Credentials::new(ApiVersion::V2, "ops@example.com", "secret")
    }

    #[test]
    fn v1_create_body() {
        let call = create_v1(
            &params(json!({
                "calendarId": "CAL",
                "locationId": "L1",
                "selectedTimezone": "US/Central",
                "selectedSlot": "2021-02-05T11:00:00+05:30"
            })),
            &v1_creds(),
        )
        .unwrap();
        assert_eq!(call.path, APPOINTMENTS);
        assert_eq!(
            call.body,
            Some(json!({
                "ghl_api_key": "AGENCY",
                "calendarId": "CAL",
                "locationId": "L1",
                "selectedTimezone": "US/Central",
                "selectedSlot": "2021-02-05T11:00:00+05:30"
            }))
        );
    }

    #[test]
    fn v1_update_validates_status() {
        let call = update_v1(
            &params(json!({ "appointmentId": "A1", "status": "noshow" })),
            &v1_creds(),
        )
        .unwrap();
        assert_eq!(
            call.body,
            Some(json!({
                "ghl_api_key": "AGENCY",
                "locationId": "",
                "appointmentId": "A1",
                "status": "noshow"
            }))
        );

        let err = update_v1(
            &params(json!({ "appointmentId": "A1", "status": "maybe" })),
            &v1_creds(),
        )
        .unwrap_err();
        assert!(matches!(err, NodeError::Validation { field, .. } if field == "status"));
    }

    #[test]
    fn v2_book_posts_to_block_date() {
        let call = book_v2(
            &params(json!({
                "locationId": "L1",
                "calendarId": "CAL",
                "selectedSlot": "2024-01-01T10:00:00Z",
                "endAt": "2024-01-01T11:00:00Z",
                "title": "Blocked"
            })),
            &v2_creds(),
        )
        .unwrap();
        assert_eq!((call.method, call.path.as_str()), (Method::Post, BLOCK_DATE));
        assert_eq!(call.body.unwrap().as_object().unwrap().len(), 5);
    }

    #[test]
    fn v2_create_adds_only_truthy_optionals() {
        let call = create_v2(
            &params(json!({
                "title": "Demo",
                "calendarId": "CAL",
                "locationId": "L1",
                "contactId": "C1",
                "startTime": "2024-01-01T10:00:00Z",
                "endTime": "2024-01-01T11:00:00Z",
                "rrule": "FREQ=WEEKLY",
                "toNotify": true,
                "ignoreDateRange": false,
                "description": ""
            })),
            &v2_creds(),
        )
        .unwrap();
        let body = call.body.unwrap();
        assert_eq!(body["rrule"], "FREQ=WEEKLY");
        assert_eq!(body["toNotify"], json!(true));
        assert!(body.get("ignoreDateRange").is_none());
        assert!(body.get("description").is_none());
        assert_eq!(body.as_object().unwrap().len(), 8);
    }

    #[test]
    fn v2_update_is_partial() {
        let call = update_v2(
            &params(json!({ "eventId": "E1", "locationId": "L1", "endTime": "2024-01-01T12:00:00Z", "title": "" })),
            &v2_creds(),
        )
        .unwrap();
        assert_eq!(call.method, Method::Put);
        assert_eq!(
            call.body,
            Some(json!({ "eventId": "E1", "locationId": "L1", "endTime": "2024-01-01T12:00:00Z" }))
        );
    }

    #[test]
    fn v2_list_requires_window() {
        let call = list_v2(
            &params(json!({ "locationId": "L1", "startTime": "1700000000000", "endTime": "1700086400000" })),
            &v2_creds(),
        )
        .unwrap();
        assert_eq!(
            call.path_and_query(),
            "/ghlcalendarteam/appointments?locationId=L1&startTime=1700000000000&endTime=1700086400000"
        );
        assert!(list_v2(&params(json!({ "locationId": "L1" })), &v2_creds()).is_err());
    }
}
