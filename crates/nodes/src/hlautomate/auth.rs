//! Login and bearer tokens.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::http::{HttpRequest, HttpTransport, Method};
use crate::{ApiEndpoints, Credentials, NodeError};

/// Opaque bearer token. No expiry is tracked on the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Exchanges credentials for a token via `POST {base}/auth/login`.
pub struct Authenticator<'a> {
    transport: &'a dyn HttpTransport,
    endpoints: &'a ApiEndpoints,
}

impl<'a> Authenticator<'a> {
    pub fn new(transport: &'a dyn HttpTransport, endpoints: &'a ApiEndpoints) -> Self {
        Self { transport, endpoints }
    }

    /// # Errors
    /// [`NodeError::Authentication`] if the call fails or the response has
    /// no `tokens.access.token` string.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, NodeError> {
        let url = format!(
            "{}/auth/login",
            self.endpoints.base_url(credentials.api_version)
        );
        let request = HttpRequest::new(Method::Post, url)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "email": credentials.email,
                "password": credentials.password,
            }));

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| NodeError::Authentication(e.to_string()))?;

        let token = extract_token(&response)?;
        debug!(api_version = %credentials.api_version, "login succeeded");
        Ok(token)
    }

    /// Log in once and discard the token; mirrors the credential test.
    ///
    /// # Errors
    /// Same as [`Authenticator::authenticate`].
    pub async fn verify(&self, credentials: &Credentials) -> Result<(), NodeError> {
        self.authenticate(credentials).await.map(|_| ())
    }
}

fn extract_token(response: &Value) -> Result<AccessToken, NodeError> {
    response
        .pointer("/tokens/access/token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(AccessToken::new)
        .ok_or_else(|| NodeError::Authentication("No access token received".into()))
}

/// SHA-256 over the fields that select a login, hex-encoded.
pub fn fingerprint(credentials: &Credentials) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credentials.api_version.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(credentials.email.as_bytes());
    hasher.update([0u8]);
    hasher.update(credentials.password.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: AccessToken,
    expires_at: DateTime<Utc>,
}

/// Short-lived token cache keyed by credential fingerprint.
///
/// Without a cache every item logs in again.
#[derive(Debug)]
pub struct TokenCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedToken>>,
}

impl TokenCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| {
            warn!("token TTL out of range, clamping to one day");
            Duration::days(1)
        });
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, credentials: &Credentials) -> Option<AccessToken> {
        self.get_at(credentials, Utc::now())
    }

    pub fn insert(&self, credentials: &Credentials, token: AccessToken) {
        self.insert_at(credentials, token, Utc::now());
    }

    pub fn invalidate(&self, credentials: &Credentials) {
        self.lock().remove(&fingerprint(credentials));
    }

    pub(crate) fn get_at(&self, credentials: &Credentials, now: DateTime<Utc>) -> Option<AccessToken> {
        let key = fingerprint(credentials);
        let mut entries = self.lock();
        let lookup = entries
            .get(&key)
            .map(|cached| (cached.expires_at > now, cached.token.clone()));
        match lookup {
            Some((true, token)) => Some(token),
            Some((false, _)) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub(crate) fn insert_at(&self, credentials: &Credentials, token: AccessToken, now: DateTime<Utc>) {
        let cached = CachedToken {
            token,
            expires_at: now + self.ttl,
        };
        self.lock().insert(fingerprint(credentials), cached);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedToken>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
