//! Request mapping: (resource, operation, apiVersion) → builder.
//!
//! Each route is a pure function of the parameter bag and credentials, so
//! mapping the same request twice yields identical calls. Pairs missing from
//! [`ROUTES`] are not offered by that API generation.

use super::params::Parameters;
use super::request::{HttpCall, Operation, OperationRequest, Resource};
use super::{calendar, contact, location, user};
use crate::{ApiVersion, Credentials, NodeError};

/// Signature shared by every builder.
pub type BuildFn = fn(&Parameters, &Credentials) -> Result<HttpCall, NodeError>;

/// One entry of the mapping table.
#[derive(Clone, Copy)]
pub struct Route {
    pub resource: Resource,
    pub operation: Operation,
    pub version: ApiVersion,
    pub build: BuildFn,
}

const fn route(resource: Resource, operation: Operation, version: ApiVersion, build: BuildFn) -> Route {
    Route {
        resource,
        operation,
        version,
        build,
    }
}

use ApiVersion::{V1, V2};
use Operation::{CalendarBook, Create, Delete, Get, List, Update};
use Resource::{CalendarAppointment, Contact, Location, User};

pub static ROUTES: &[Route] = &[
    // contact
    route(Contact, Create, V1, contact::create_v1),
    route(Contact, Get, V1, contact::get_v1),
    route(Contact, Update, V1, contact::update_v1),
    route(Contact, Delete, V1, contact::delete_v1),
    route(Contact, List, V1, contact::list_v1),
    route(Contact, Create, V2, contact::create_v2),
    route(Contact, Get, V2, contact::get_v2),
    route(Contact, Update, V2, contact::update_v2),
    route(Contact, Delete, V2, contact::delete_v2),
    // location
    route(Location, Create, V1, location::create_v1),
    route(Location, Update, V1, location::update_v1),
    route(Location, Get, V1, location::get_v1),
    route(Location, Create, V2, location::create_v2),
    route(Location, Update, V2, location::update_v2),
    route(Location, Get, V2, location::get_v2),
    route(Location, Delete, V2, location::delete_v2),
    route(Location, List, V2, location::list_v2),
    // user
    route(User, Create, V1, user::create_v1),
    route(User, Update, V1, user::update_v1),
    route(User, Create, V2, user::create_v2),
    route(User, Update, V2, user::update_v2),
    route(User, Get, V2, user::get_v2),
    // calendar appointment
    route(CalendarAppointment, Create, V1, calendar::create_v1),
    route(CalendarAppointment, Update, V1, calendar::update_v1),
    route(CalendarAppointment, CalendarBook, V2, calendar::book_v2),
    route(CalendarAppointment, Create, V2, calendar::create_v2),
    route(CalendarAppointment, Update, V2, calendar::update_v2),
    route(CalendarAppointment, List, V2, calendar::list_v2),
];

/// Builder for the triple, if the API generation offers it.
pub fn lookup(resource: Resource, operation: Operation, version: ApiVersion) -> Option<BuildFn> {
    ROUTES
        .iter()
        .find(|r| r.resource == resource && r.operation == operation && r.version == version)
        .map(|r| r.build)
}

/// Operations available for `resource` on `version`, in table order.
pub fn supported_operations(resource: Resource, version: ApiVersion) -> Vec<Operation> {
    ROUTES
        .iter()
        .filter(|r| r.resource == resource && r.version == version)
        .map(|r| r.operation)
        .collect()
}

/// Map one request to exactly one HTTP call.
///
/// # Errors
/// - [`NodeError::UnknownOperation`] when the triple has no route.
/// - [`NodeError::Validation`] from the builder.
pub fn map_request(request: &OperationRequest, credentials: &Credentials) -> Result<HttpCall, NodeError> {
    let build = lookup(request.resource, request.operation, request.api_version).ok_or_else(|| {
        NodeError::UnknownOperation {
            resource: request.resource.to_string(),
            operation: request.operation.to_string(),
        }
    })?;
    build(&request.fields, credentials)
}
