//! HL Automate credentials and API endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::NodeError;

/// Default host for the legacy API generation.
pub const DEFAULT_V1_BASE_URL: &str = "https://api.hlautomate.com/v1";
/// Default host for the current API generation.
pub const DEFAULT_V2_BASE_URL: &str = "https://api.hlautomate.com/v2";

/// Vendor API generation. V1 and V2 expose incompatible endpoint and body
/// shapes for the same logical operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    #[default]
    V1,
    V2,
}

impl ApiVersion {
    /// Lenient label lookup: anything other than `v2` selects V1.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("v2") {
            Self::V2
        } else {
            Self::V1
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            other => Err(NodeError::validation(
                "apiVersion",
                format!("expected 'v1' or 'v2', got '{other}'"),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map(Self::from_label).unwrap_or_default())
    }
}

/// Login credentials for one execution. Immutable for the duration of a run.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub api_version: ApiVersion,
    pub email: String,
    pub password: String,
    /// Agency API key, only meaningful for V1.
    #[serde(default, alias = "ghl_agency_key", skip_serializing_if = "Option::is_none")]
    pub agency_api_key: Option<String>,
}

impl Credentials {
    pub fn new(api_version: ApiVersion, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            api_version,
            email: email.into(),
            password: password.into(),
            agency_api_key: None,
        }
    }

    pub fn with_agency_key(mut self, key: impl Into<String>) -> Self {
        self.agency_api_key = Some(key.into());
        self
    }

    /// The agency key that V1 create/update bodies embed as `ghl_api_key`.
    ///
    /// # Errors
    /// [`NodeError::Validation`] when the key is absent or blank.
    pub fn agency_key(&self) -> Result<&str, NodeError> {
        self.agency_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| NodeError::missing("agencyApiKey"))
    }
}

// Keeps passwords and keys out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_version", &self.api_version)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("agency_api_key", &self.agency_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Base URLs for both API generations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    pub v1_base: String,
    pub v2_base: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            v1_base: DEFAULT_V1_BASE_URL.to_string(),
            v2_base: DEFAULT_V2_BASE_URL.to_string(),
        }
    }
}

impl ApiEndpoints {
    /// Point both generations at one host, e.g. a local test server.
    pub fn with_host(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            v1_base: format!("{host}/v1"),
            v2_base: format!("{host}/v2"),
        }
    }

    /// Pure lookup, no negotiation.
    pub fn base_url(&self, version: ApiVersion) -> &str {
        match version {
            ApiVersion::V1 => self.v1_base.trim_end_matches('/'),
            ApiVersion::V2 => self.v2_base.trim_end_matches('/'),
        }
    }
}
