use std::collections::BTreeMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use fireprox_core::{DeploymentRecord, FireProxError, OWNER_TAG, STAGE_NAME};

/// Identity of the principal behind the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
    pub user_id: String,
}

/// A REST API as reported by the provider, before projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestApiRecord {
    pub id: String,
    pub name: String,
    pub created_date: Option<DateTime<Utc>>,
    pub version: Option<String>,
    pub tags: BTreeMap<String, String>,
    /// Provider fields without a typed counterpart.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RestApiRecord {
    pub fn owner(&self) -> Option<&str> {
        self.tags.get(OWNER_TAG).map(String::as_str)
    }
}

/// A path resource inside a REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResource {
    pub id: String,
    pub path: String,
    pub parent_id: Option<String>,
}

/// The integration attached to a resource method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrationRecord {
    pub uri: Option<String>,
    pub http_method: Option<String>,
    pub integration_type: Option<String>,
}

/// Parameters of a stage deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub stage_name: String,
    pub stage_description: String,
    pub description: String,
    pub cache_cluster_enabled: bool,
    pub variables: BTreeMap<String, String>,
}

impl Default for DeploymentRequest {
    fn default() -> Self {
        Self {
            stage_name: STAGE_NAME.to_owned(),
            stage_description: "FireProx Prod".to_owned(),
            description: "FireProx Production Deployment".to_owned(),
            cache_cluster_enabled: false,
            variables: BTreeMap::new(),
        }
    }
}

/// The provider calls FireProx is built on.
///
/// Implementations translate each call into one remote request (or one
/// paginated sequence for [`list_rest_apis`](Self::list_rest_apis)) and
/// report failures as [`FireProxError`]s. They do not retry.
pub trait GatewayBackend: Send + Sync {
    /// Region the backend's gateway client is configured for.
    fn region(&self) -> &str;

    fn caller_identity(
        &self,
    ) -> impl Future<Output = Result<CallerIdentity, FireProxError>> + Send;

    /// Create a regional REST API from a Swagger definition.
    fn import_rest_api(
        &self,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<RestApiRecord, FireProxError>> + Send;

    /// Every REST API in the region, across all pages.
    fn list_rest_apis(
        &self,
    ) -> impl Future<Output = Result<Vec<RestApiRecord>, FireProxError>> + Send;

    /// Fails with [`FireProxError::NotFound`] when no such API exists.
    fn get_rest_api(
        &self,
        api_id: &str,
    ) -> impl Future<Output = Result<RestApiRecord, FireProxError>> + Send;

    fn delete_rest_api(
        &self,
        api_id: &str,
    ) -> impl Future<Output = Result<(), FireProxError>> + Send;

    fn get_resources(
        &self,
        api_id: &str,
    ) -> impl Future<Output = Result<Vec<ApiResource>, FireProxError>> + Send;

    fn get_integration(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
    ) -> impl Future<Output = Result<IntegrationRecord, FireProxError>> + Send;

    /// Replace the integration URI of a resource method.
    fn update_integration_uri(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
        uri: &str,
    ) -> impl Future<Output = Result<IntegrationRecord, FireProxError>> + Send;

    fn create_deployment(
        &self,
        api_id: &str,
        request: &DeploymentRequest,
    ) -> impl Future<Output = Result<DeploymentRecord, FireProxError>> + Send;

    fn tag_resource(
        &self,
        resource_arn: &str,
        tags: BTreeMap<String, String>,
    ) -> impl Future<Output = Result<(), FireProxError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deployment_targets_fireprox_stage() {
        let request = DeploymentRequest::default();
        assert_eq!(request.stage_name, "fireprox");
        assert_eq!(request.stage_description, "FireProx Prod");
        assert_eq!(request.description, "FireProx Production Deployment");
        assert!(!request.cache_cluster_enabled);
        assert!(request.variables.is_empty());
    }

    #[test]
    fn record_owner_reads_tag() {
        let mut record = RestApiRecord {
            id: "abc123".into(),
            ..RestApiRecord::default()
        };
        assert_eq!(record.owner(), None);
        record.tags.insert("owner".into(), "alice".into());
        assert_eq!(record.owner(), Some("alice"));
    }
}
