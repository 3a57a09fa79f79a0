use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FireProxError;

/// Stage every proxy is deployed under; also the path prefix of its endpoint.
pub const STAGE_NAME: &str = "fireprox";

/// Path of the child resource that carries the forwarding integration.
pub const WILDCARD_PATH: &str = "/{proxy+}";

/// Placeholder the provider substitutes with the request sub-path.
pub const PROXY_PLACEHOLDER: &str = "{proxy}";

/// Tag key used to attribute a proxy to its owner.
pub const OWNER_TAG: &str = "owner";

/// Public endpoint at which a deployed proxy receives traffic.
///
/// The shape is relied upon by external clients and must not change.
pub fn execute_endpoint(id: &str, region: &str) -> String {
    format!("https://{id}.execute-api.{region}.amazonaws.com/{STAGE_NAME}/")
}

/// Strip a single trailing slash from an origin URL.
pub fn strip_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// Lifecycle status of a proxy resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProxyStatus {
    /// Freshly imported and deployed.
    Created,
    /// Origin URL was replaced.
    Updated,
    /// Discovered live on the provider.
    Running,
    /// Removed from the provider. Terminal.
    Deleted,
}

impl ProxyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Running => "RUNNING",
            Self::Deleted => "DELETED",
        }
    }

    /// Whether moving from `self` to `next` respects
    /// `CREATED -> (RUNNING|UPDATED)* -> DELETED`.
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Deleted, _) | (_, Self::Created) => false,
            _ => true,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Deleted
    }
}

impl fmt::Display for ProxyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single key/value tag on a proxy resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTag {
    pub key: String,
    pub val: String,
}

impl ResourceTag {
    pub fn new(key: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            val: val.into(),
        }
    }
}

/// A provider-side proxy, projected into the domain model.
///
/// Instances are always built from provider state at call time. The status
/// field is private so that every change goes through [`set_status`](Self::set_status).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyResource {
    /// Provider-assigned API id.
    pub id: String,

    /// Provider-assigned API name.
    #[serde(default)]
    pub name: String,

    #[serde(
        rename = "createdDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Public endpoint, derived from `id` and region.
    pub url: String,

    /// Origin the proxy forwards to, without a trailing slash. Empty once
    /// the proxy is deleted.
    pub proxy_url: String,

    /// Id of the provider-side resource backing the proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    status: ProxyStatus,

    #[serde(default)]
    pub tags: Vec<ResourceTag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Remaining provider fields, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProxyResource {
    /// Create a resource with the given id and initial status.
    pub fn new(id: impl Into<String>, status: ProxyStatus) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            created_date: None,
            version: None,
            url: String::new(),
            proxy_url: String::new(),
            resource_id: None,
            status,
            tags: Vec::new(),
            owner: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_created_date(mut self, created_date: Option<DateTime<Utc>>) -> Self {
        self.created_date = created_date;
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the origin URL. A trailing slash is stripped.
    #[must_use]
    pub fn with_proxy_url(mut self, proxy_url: &str) -> Self {
        strip_trailing_slash(proxy_url).clone_into(&mut self.proxy_url);
        self
    }

    #[must_use]
    pub fn with_resource_id(mut self, resource_id: Option<String>) -> Self {
        self.resource_id = resource_id;
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<ResourceTag>) -> Self {
        self.set_tags(tags);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: serde_json::Map<String, serde_json::Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn status(&self) -> ProxyStatus {
        self.status
    }

    /// Move to `next`, rejecting backward transitions and any change after
    /// deletion.
    pub fn set_status(&mut self, next: ProxyStatus) -> Result<(), FireProxError> {
        if !self.status.can_transition_to(next) {
            return Err(FireProxError::Config(format!(
                "invalid status transition for {}: {} -> {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Replace the tag set and refresh the denormalized owner.
    pub fn set_tags(&mut self, tags: Vec<ResourceTag>) {
        self.owner = tags
            .iter()
            .find(|tag| tag.key == OWNER_TAG)
            .map(|tag| tag.val.clone());
        self.tags = tags;
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }
}

impl fmt::Display for ProxyResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}][API ID: {}] {} => {}",
            self.status, self.id, self.url, self.proxy_url
        )
    }
}

/// Deployment produced while creating a proxy.
///
/// Only its id and execute endpoint survive into the returned
/// [`ProxyResource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        rename = "createdDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_date: Option<DateTime<Utc>>,

    #[serde(rename = "apiSummary", default)]
    pub api_summary: BTreeMap<String, serde_json::Value>,

    #[serde(rename = "executeEndpoint", default)]
    pub execute_endpoint: String,
}

impl DeploymentRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            created_date: None,
            api_summary: BTreeMap::new(),
            execute_endpoint: String::new(),
        }
    }

    pub fn set_execute_endpoint(&mut self, api_id: &str, region: &str) {
        self.execute_endpoint = execute_endpoint(api_id, region);
    }
}
