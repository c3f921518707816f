//! The HL Automate CRM node.
//!
//! For each item the node:
//! 1. reads `resource` and `operation` and maps the item to one [`HttpCall`]
//!    (no network I/O, so bad input fails before any login);
//! 2. logs in for a bearer token, or reuses one from the optional
//!    [`TokenCache`];
//! 3. sends the call to the base URL of the credentials' API generation.

pub mod auth;
mod calendar;
mod contact;
mod location;
pub mod mapper;
pub mod params;
pub mod request;
pub mod timezones;
mod user;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::http::HttpTransport;
use crate::traits::ExecutionContext;
use crate::{ApiEndpoints, Credentials, ExecutableNode, NodeError};

pub use auth::{AccessToken, Authenticator, TokenCache};
pub use mapper::map_request;
pub use params::Parameters;
pub use request::{HttpCall, Operation, OperationRequest, Resource};
pub use timezones::{load_timezones, TimezoneList, TimezoneOption, TimezoneSource};

/// Node that maps items onto HL Automate API calls.
pub struct HlAutomateNode {
    transport: Arc<dyn HttpTransport>,
    endpoints: ApiEndpoints,
    token_cache: Option<TokenCache>,
}

impl HlAutomateNode {
    /// Node using the vendor's default hosts and no token cache.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            endpoints: ApiEndpoints::default(),
            token_cache: None,
        }
    }

    pub fn with_endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Reuse tokens for `ttl` instead of logging in for every item.
    pub fn with_token_cache(mut self, ttl: std::time::Duration) -> Self {
        self.token_cache = Some(TokenCache::new(ttl));
        self
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// Map one item without sending anything.
    ///
    /// # Errors
    /// [`NodeError::UnknownOperation`] or [`NodeError::Validation`].
    pub fn plan(&self, item: Value, credentials: &Credentials) -> Result<HttpCall, NodeError> {
        let request = OperationRequest::from_item(item, credentials.api_version)?;
        map_request(&request, credentials)
    }

    /// A bearer token for `credentials`, from the cache when enabled.
    ///
    /// # Errors
    /// [`NodeError::Authentication`].
    pub async fn access_token(&self, credentials: &Credentials) -> Result<AccessToken, NodeError> {
        if let Some(token) = self.token_cache.as_ref().and_then(|cache| cache.get(credentials)) {
            debug!("reusing cached access token");
            return Ok(token);
        }
        let token = self.authenticator().authenticate(credentials).await?;
        if let Some(cache) = &self.token_cache {
            cache.insert(credentials, token.clone());
        }
        Ok(token)
    }

    /// Check that `credentials` can log in.
    ///
    /// # Errors
    /// [`NodeError::Authentication`].
    pub async fn verify_credentials(&self, credentials: &Credentials) -> Result<(), NodeError> {
        self.authenticator().verify(credentials).await
    }

    /// Timezone options; never fails.
    pub async fn timezones(&self, credentials: &Credentials) -> TimezoneList {
        load_timezones(self.transport.as_ref(), &self.endpoints, credentials).await
    }

    fn authenticator(&self) -> Authenticator<'_> {
        Authenticator::new(self.transport.as_ref(), &self.endpoints)
    }
}

#[async_trait]
impl ExecutableNode for HlAutomateNode {
    async fn execute(&self, input: Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let credentials = ctx.credentials.as_ref();
        let request = OperationRequest::from_item(input, credentials.api_version)?;
        let call = map_request(&request, credentials)?;
        info!(
            item = ctx.item_index,
            resource = %request.resource,
            operation = %request.operation,
            api_version = %request.api_version,
            method = %call.method,
            path = %call.path,
            "dispatching"
        );

        let token = self.access_token(credentials).await?;
        let base_url = self.endpoints.base_url(credentials.api_version);
        let result = self
            .transport
            .send(call.into_request(base_url, token.as_str()))
            .await;

        // A rejected token should not be served again from the cache.
        if let (Err(NodeError::Transport(message)), Some(cache)) = (&result, &self.token_cache) {
            if message.starts_with("HTTP 401") {
                cache.invalidate(credentials);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use crate::mock::MockTransport;
    use crate::ApiVersion;
    use serde_json::json;

    const LOGIN_V2: &str = "https://api.hlautomate.com/v2/auth/login";

    fn login() -> Value {
        json!({ "tokens": { "access": { "token": "tok" } } })
    }

    fn ctx(index: usize, credentials: Credentials) -> ExecutionContext {
        ExecutionContext::new(uuid::Uuid::new_v4(), index, Arc::new(credentials))
    }

    #[tokio::test]
    async fn executes_mapped_call_with_bearer() {
        let transport = Arc::new(
            MockTransport::new()
                .reply(Method::Post, LOGIN_V2, login())
                .reply(Method::Post, "https://api.hlautomate.com/v2/ghlcontact", json!({ "id": "C1" })),
        );
        let node = HlAutomateNode::new(transport.clone());
        let creds = Credentials::new(ApiVersion::V2, "ops@example.com", "secret");

        let out = node
            .execute(
                json!({ "resource": "contact", "operation": "create", "contactData": { "email": "a@b.com" } }),
                &ctx(0, creds),
            )
            .await
            .unwrap();
        assert_eq!(out, json!({ "id": "C1" }));

        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].header_value("Authorization"), Some("Bearer tok"));
        assert_eq!(sent[1].header_value("Content-Type"), Some("application/json"));
        assert_eq!(sent[1].body, Some(json!({ "email": "a@b.com" })));
    }

    #[tokio::test]
    async fn invalid_item_fails_before_login() {
        let transport = Arc::new(MockTransport::new().reply(Method::Post, LOGIN_V2, login()));
        let node = HlAutomateNode::new(transport.clone());
        let creds = Credentials::new(ApiVersion::V2, "ops@example.com", "secret");

        let err = node
            .execute(json!({ "resource": "contact", "operation": "get" }), &ctx(0, creds))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::Validation { field, .. } if field == "locationId"));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn token_cache_skips_repeat_logins() {
        let transport = Arc::new(
            MockTransport::new()
                .reply(Method::Post, LOGIN_V2, login())
                .reply(Method::Get, "https://api.hlautomate.com/v2/ghl", json!([])),
        );
        let node = HlAutomateNode::new(transport.clone())
            .with_token_cache(std::time::Duration::from_secs(300));
        let creds = Credentials::new(ApiVersion::V2, "ops@example.com", "secret");

        for i in 0..3 {
            node.execute(json!({ "resource": "location", "operation": "list" }), &ctx(i, creds.clone()))
                .await
                .unwrap();
        }
        assert_eq!(transport.requests_to(LOGIN_V2), 1);
        assert_eq!(transport.request_count(), 4);
    }

    #[tokio::test]
    async fn rejected_token_is_evicted_from_cache() {
        let transport = Arc::new(
            MockTransport::new()
                .reply(Method::Post, LOGIN_V2, login())
                .fail(
                    Method::Get,
                    "https://api.hlautomate.com/v2/ghl",
                    NodeError::Transport("HTTP 401 Unauthorized: token expired".into()),
                ),
        );
        let node = HlAutomateNode::new(transport.clone())
            .with_token_cache(std::time::Duration::from_secs(300));
        let creds = Credentials::new(ApiVersion::V2, "ops@example.com", "secret");

        for i in 0..2 {
            let err = node
                .execute(json!({ "resource": "location", "operation": "list" }), &ctx(i, creds.clone()))
                .await
                .unwrap_err();
            assert!(err.to_string().starts_with("HTTP 401"));
        }
        // The second item could not reuse the rejected token.
        assert_eq!(transport.requests_to(LOGIN_V2), 2);
        assert_eq!(transport.request_count(), 4);
    }

    #[tokio::test]
    async fn other_failures_keep_the_cached_token() {
        let transport = Arc::new(
            MockTransport::new()
                .reply(Method::Post, LOGIN_V2, login())
                .fail(
                    Method::Get,
                    "https://api.hlautomate.com/v2/ghl",
                    NodeError::Transport("HTTP 500 Internal Server Error: down".into()),
                ),
        );
        let node = HlAutomateNode::new(transport.clone())
            .with_token_cache(std::time::Duration::from_secs(300));
        let creds = Credentials::new(ApiVersion::V2, "ops@example.com", "secret");

        for i in 0..2 {
            assert!(node
                .execute(json!({ "resource": "location", "operation": "list" }), &ctx(i, creds.clone()))
                .await
                .is_err());
        }
        assert_eq!(transport.requests_to(LOGIN_V2), 1);
    }

    #[tokio::test]
    async fn without_cache_every_item_logs_in() {
        let transport = Arc::new(
            MockTransport::new()
                .reply(Method::Post, LOGIN_V2, login())
                .reply(Method::Get, "https://api.hlautomate.com/v2/ghl", json!([])),
        );
        let node = HlAutomateNode::new(transport.clone());
        let creds = Credentials::new(ApiVersion::V2, "ops@example.com", "secret");

        for i in 0..3 {
            node.execute(json!({ "resource": "location", "operation": "list" }), &ctx(i, creds.clone()))
                .await
                .unwrap();
        }
        assert_eq!(transport.requests_to(LOGIN_V2), 3);
    }

    #[test]
    fn plan_resolves_v1_routes() {
        let node = HlAutomateNode::new(Arc::new(MockTransport::new()));
        let creds = Credentials::new(ApiVersion::V1, "ops@example.com", "secret");
        let call = node
            .plan(json!({ "resource": "contact", "operation": "delete", "contactId": "C1" }), &creds)
            .unwrap();
        assert_eq!((call.method, call.path.as_str()), (Method::Delete, "/contacts/C1"));
    }

    #[test]
    fn plan_is_a_dry_run() {
        let transport = Arc::new(MockTransport::new());
        let node = HlAutomateNode::new(transport.clone());
        let creds = Credentials::new(ApiVersion::V2, "ops@example.com", "secret");

        let call = node
            .plan(
                json!({ "resource": "contact", "operation": "get", "locationId": "L1", "email": "a@b.com" }),
                &creds,
            )
            .unwrap();
        assert_eq!(call.path_and_query(), "/ghlcontact?locationId=L1&email=a%40b.com");

        let err = node
            .plan(json!({ "resource": "user", "operation": "delete" }), &creds)
            .unwrap_err();
        assert!(matches!(err, NodeError::UnknownOperation { .. }));
        assert_eq!(transport.request_count(), 0);
    }
}
