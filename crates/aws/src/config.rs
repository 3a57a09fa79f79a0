use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default STS session name used when assuming a role.
pub const DEFAULT_SESSION_NAME: &str = "fireprox";

/// Settings shared by every session provider.
///
/// A missing region falls back to the SDK's environment and profile chain.
/// The endpoint override points the clients at a local stand-in such as
/// `LocalStack`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AwsBaseConfig {
    /// AWS region (e.g. `"us-east-1"`).
    #[serde(default)]
    pub region: Option<String>,

    /// Optional IAM role ARN to assume via STS.
    #[serde(default)]
    pub role_arn: Option<String>,

    /// Optional endpoint URL override for local development.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Optional STS session name (defaults to [`DEFAULT_SESSION_NAME`]).
    #[serde(default)]
    pub session_name: Option<String>,

    /// Optional external ID for cross-account trust policies.
    #[serde(default)]
    pub external_id: Option<String>,

    /// Free-form labels carried alongside the session. Never sent to AWS.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl std::fmt::Debug for AwsBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsBaseConfig")
            .field("region", &self.region)
            .field("role_arn", &self.role_arn.as_ref().map(|_| "[REDACTED]"))
            .field("endpoint_url", &self.endpoint_url)
            .field("session_name", &self.session_name)
            .field("external_id", &self.external_id.as_ref().map(|_| "[REDACTED]"))
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl AwsBaseConfig {
    /// Create a config pinned to `region`.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set an IAM role ARN to assume via STS.
    #[must_use]
    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.role_arn = Some(role_arn.into());
        self
    }

    /// Set an endpoint URL override for local development.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    #[must_use]
    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = Some(session_name.into());
        self
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn session_name(&self) -> &str {
        self.session_name.as_deref().unwrap_or(DEFAULT_SESSION_NAME)
    }

    /// Fill every unset field from `fallback`. Metadata keys already present
    /// win over the fallback's.
    #[must_use]
    pub fn or(mut self, fallback: AwsBaseConfig) -> Self {
        self.region = self.region.or(fallback.region);
        self.role_arn = self.role_arn.or(fallback.role_arn);
        self.endpoint_url = self.endpoint_url.or(fallback.endpoint_url);
        self.session_name = self.session_name.or(fallback.session_name);
        self.external_id = self.external_id.or(fallback.external_id);
        for (key, value) in fallback.metadata {
            self.metadata.entry(key).or_insert(value);
        }
        self
    }
}
