//! In-memory [`GatewayBackend`].
//!
//! Imported definitions are parsed so that the resource tree and integration
//! URIs reflect the Swagger document, the same way API Gateway would build
//! them. Failures can be injected to exercise error paths.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use fireprox_core::{DeploymentRecord, FireProxError, WILDCARD_PATH, build_template};
use serde_json::Value;

use crate::backend::{
    ApiResource, CallerIdentity, DeploymentRequest, GatewayBackend, IntegrationRecord,
    RestApiRecord,
};

#[derive(Debug, Clone)]
struct MemoryApi {
    record: RestApiRecord,
    resources: Vec<ApiResource>,
    /// Keyed by `(resource id, http method)`.
    integrations: HashMap<(String, String), IntegrationRecord>,
    deployments: Vec<DeploymentRequest>,
}

/// A [`GatewayBackend`] holding all state in memory.
#[derive(Debug)]
pub struct MemoryGateway {
    region: String,
    identity: CallerIdentity,
    apis: DashMap<String, MemoryApi>,
    tags_by_arn: DashMap<String, BTreeMap<String, String>>,
    preset_ids: Mutex<VecDeque<String>>,
    next_id: AtomicU64,
    throttled_deletes: AtomicU32,
    delete_calls: AtomicU32,
}

impl MemoryGateway {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            identity: CallerIdentity {
                account: "123456789012".to_owned(),
                arn: "arn:aws:iam::123456789012:user/fireprox".to_owned(),
                user_id: "AIDAEXAMPLEUSERID".to_owned(),
            },
            apis: DashMap::new(),
            tags_by_arn: DashMap::new(),
            preset_ids: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            throttled_deletes: AtomicU32::new(0),
            delete_calls: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn with_identity(mut self, identity: CallerIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Ids handed out, in order, to the next imported APIs.
    #[must_use]
    pub fn with_api_ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preset_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Import a proxy for `origin` directly, bypassing the manager.
    pub fn seed(&self, origin: &str, tags: &[(&str, &str)]) -> String {
        let mut record = self.import(&build_template(origin)).unwrap_or_default();
        record.tags = tags
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        let id = record.id.clone();
        if let Some(mut api) = self.apis.get_mut(&id) {
            api.record = record;
        }
        id
    }

    /// Remove the wildcard resource of an API so its origin can no longer be
    /// resolved.
    pub fn break_integration(&self, api_id: &str) {
        if let Some(mut api) = self.apis.get_mut(api_id) {
            api.resources.retain(|r| r.path != WILDCARD_PATH);
        }
    }

    /// Make the next `count` deletes fail with [`FireProxError::Throttled`].
    pub fn throttle_deletes(&self, count: u32) {
        self.throttled_deletes.store(count, Ordering::SeqCst);
    }

    /// Number of delete calls received, throttled ones included.
    pub fn delete_calls(&self) -> u32 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, api_id: &str) -> bool {
        self.apis.contains_key(api_id)
    }

    pub fn api_count(&self) -> usize {
        self.apis.len()
    }

    /// Current integration URI of the wildcard resource.
    pub fn wildcard_uri(&self, api_id: &str) -> Option<String> {
        let api = self.apis.get(api_id)?;
        let resource = api.resources.iter().find(|r| r.path == WILDCARD_PATH)?;
        api.integrations
            .get(&(resource.id.clone(), "ANY".to_owned()))
            .and_then(|i| i.uri.clone())
    }

    pub fn deployments(&self, api_id: &str) -> Vec<DeploymentRequest> {
        self.apis
            .get(api_id)
            .map(|api| api.deployments.clone())
            .unwrap_or_default()
    }

    pub fn tags_for_arn(&self, arn: &str) -> Option<BTreeMap<String, String>> {
        self.tags_by_arn.get(arn).map(|tags| tags.value().clone())
    }

    fn allocate_id(&self) -> String {
        let preset = self
            .preset_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        preset.unwrap_or_else(|| {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            format!("api{n:07}")
        })
    }

    fn import(&self, body: &[u8]) -> Result<RestApiRecord, FireProxError> {
        let doc: Value = serde_json::from_slice(body).map_err(|e| {
            FireProxError::Service(format!("BadRequestException: invalid definition: {e}"))
        })?;
        let paths = doc["paths"].as_object().ok_or_else(|| {
            FireProxError::Service("BadRequestException: definition has no paths".to_owned())
        })?;

        let id = self.allocate_id();
        let root_id = format!("{id}-root");
        let mut resources = Vec::new();
        let mut integrations = HashMap::new();

        for (path, operations) in paths {
            let resource_id = if path == "/" {
                root_id.clone()
            } else {
                format!("{id}-r{}", resources.len())
            };
            resources.push(ApiResource {
                id: resource_id.clone(),
                path: path.clone(),
                parent_id: (path != "/").then(|| root_id.clone()),
            });

            let Some(operations) = operations.as_object() else {
                continue;
            };
            for (operation, spec) in operations {
                let method = match operation.as_str() {
                    "x-amazon-apigateway-any-method" => "ANY".to_owned(),
                    other => other.to_ascii_uppercase(),
                };
                let integration = &spec["x-amazon-apigateway-integration"];
                integrations.insert(
                    (resource_id.clone(), method),
                    IntegrationRecord {
                        uri: integration["uri"].as_str().map(str::to_owned),
                        http_method: integration["httpMethod"].as_str().map(str::to_owned),
                        integration_type: integration["type"]
                            .as_str()
                            .map(str::to_ascii_uppercase),
                    },
                );
            }
        }

        let mut extra = serde_json::Map::new();
        extra.insert("apiKeySource".to_owned(), Value::from("HEADER"));
        extra.insert(
            "endpointConfiguration".to_owned(),
            serde_json::json!({ "types": ["REGIONAL"] }),
        );

        let record = RestApiRecord {
            id: id.clone(),
            name: doc["info"]["title"].as_str().unwrap_or_default().to_owned(),
            created_date: Some(Utc::now()),
            version: doc["info"]["version"].as_str().map(str::to_owned),
            tags: BTreeMap::new(),
            extra,
        };

        self.apis.insert(
            id,
            MemoryApi {
                record: record.clone(),
                resources,
                integrations,
                deployments: Vec::new(),
            },
        );
        Ok(record)
    }

    fn not_found(api_id: &str) -> FireProxError {
        FireProxError::NotFound(api_id.to_owned())
    }
}

impl GatewayBackend for MemoryGateway {
    fn region(&self) -> &str {
        &self.region
    }

    async fn caller_identity(&self) -> Result<CallerIdentity, FireProxError> {
        Ok(self.identity.clone())
    }

    async fn import_rest_api(&self, body: Vec<u8>) -> Result<RestApiRecord, FireProxError> {
        self.import(&body)
    }

    async fn list_rest_apis(&self) -> Result<Vec<RestApiRecord>, FireProxError> {
        let mut records: Vec<RestApiRecord> =
            self.apis.iter().map(|api| api.record.clone()).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn get_rest_api(&self, api_id: &str) -> Result<RestApiRecord, FireProxError> {
        self.apis
            .get(api_id)
            .map(|api| api.record.clone())
            .ok_or_else(|| Self::not_found(api_id))
    }

    async fn delete_rest_api(&self, api_id: &str) -> Result<(), FireProxError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let throttled = self
            .throttled_deletes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if throttled {
            return Err(FireProxError::Throttled);
        }
        self.apis
            .remove(api_id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(api_id))
    }

    async fn get_resources(&self, api_id: &str) -> Result<Vec<ApiResource>, FireProxError> {
        self.apis
            .get(api_id)
            .map(|api| api.resources.clone())
            .ok_or_else(|| Self::not_found(api_id))
    }

    async fn get_integration(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
    ) -> Result<IntegrationRecord, FireProxError> {
        let api = self.apis.get(api_id).ok_or_else(|| Self::not_found(api_id))?;
        api.integrations
            .get(&(resource_id.to_owned(), http_method.to_owned()))
            .cloned()
            .ok_or_else(|| {
                FireProxError::Service(format!(
                    "NotFoundException: no {http_method} integration on resource {resource_id}"
                ))
            })
    }

    async fn update_integration_uri(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
        uri: &str,
    ) -> Result<IntegrationRecord, FireProxError> {
        let mut api = self
            .apis
            .get_mut(api_id)
            .ok_or_else(|| Self::not_found(api_id))?;
        let integration = api
            .integrations
            .get_mut(&(resource_id.to_owned(), http_method.to_owned()))
            .ok_or_else(|| {
                FireProxError::Service(format!(
                    "NotFoundException: no {http_method} integration on resource {resource_id}"
                ))
            })?;
        integration.uri = Some(uri.to_owned());
        Ok(integration.clone())
    }

    async fn create_deployment(
        &self,
        api_id: &str,
        request: &DeploymentRequest,
    ) -> Result<DeploymentRecord, FireProxError> {
        let mut api = self
            .apis
            .get_mut(api_id)
            .ok_or_else(|| Self::not_found(api_id))?;
        api.deployments.push(request.clone());

        let mut deployment = DeploymentRecord::new(format!("{api_id}-d{}", api.deployments.len()));
        deployment.description = Some(request.description.clone());
        deployment.created_date = Some(Utc::now());
        Ok(deployment)
    }

    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: BTreeMap<String, String>,
    ) -> Result<(), FireProxError> {
        let api_id = resource_arn
            .rsplit_once("/restapis/")
            .map(|(_, id)| id)
            .ok_or_else(|| {
                FireProxError::Service(format!("BadRequestException: invalid ARN {resource_arn}"))
            })?;
        let mut api = self
            .apis
            .get_mut(api_id)
            .ok_or_else(|| Self::not_found(api_id))?;
        api.record.tags.extend(tags.clone());
        self.tags_by_arn
            .entry(resource_arn.to_owned())
            .or_default()
            .extend(tags);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn import_builds_resource_tree() {
        let backend = MemoryGateway::new("us-east-1").with_api_ids(["abc123"]);
        let record = backend
            .import_rest_api(build_template("https://example.com/"))
            .await
            .unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.name, "fireprox_example");

        let resources = backend.get_resources("abc123").await.unwrap();
        let paths: Vec<&str> = resources.iter().map(|r| r.path.as_str()).collect();
        assert!(paths.contains(&"/"));
        assert!(paths.contains(&"/{proxy+}"));
        assert_eq!(
            backend.wildcard_uri("abc123").as_deref(),
            Some("https://example.com/{proxy}")
        );
    }

    #[tokio::test]
    async fn generated_ids_are_unique() {
        let backend = MemoryGateway::new("us-east-1");
        let a = backend.seed("https://a.example.com", &[]);
        let b = backend.seed("https://b.example.com", &[]);
        assert_ne!(a, b);
        assert_eq!(backend.api_count(), 2);
    }

    #[tokio::test]
    async fn invalid_definition_is_rejected() {
        let backend = MemoryGateway::new("us-east-1");
        let err = backend.import_rest_api(b"not json".to_vec()).await.unwrap_err();
        assert!(matches!(err, FireProxError::Service(_)));
        assert_eq!(backend.api_count(), 0);
    }

    #[tokio::test]
    async fn throttled_deletes_then_succeeds() {
        let backend = MemoryGateway::new("us-east-1");
        let id = backend.seed("https://example.com", &[]);
        backend.throttle_deletes(1);

        let err = backend.delete_rest_api(&id).await.unwrap_err();
        assert!(matches!(err, FireProxError::Throttled));
        backend.delete_rest_api(&id).await.unwrap();
        assert!(!backend.contains(&id));
        assert_eq!(backend.delete_calls(), 2);
    }

    #[tokio::test]
    async fn missing_api_is_not_found() {
        let backend = MemoryGateway::new("us-east-1");
        let err = backend.get_rest_api("nope").await.unwrap_err();
        assert!(matches!(err, FireProxError::NotFound(_)));
    }
}
