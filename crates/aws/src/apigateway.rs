//! [`GatewayBackend`] over the AWS SDK.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_apigateway::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_apigateway::primitives::{Blob, DateTime as SdkDateTime};
use aws_sdk_apigateway::types::{MethodSnapshot, Op, PatchOperation};
use chrono::{DateTime, Utc};
use fireprox_core::{DeploymentRecord, FireProxError};
use fireprox_gateway::{
    ApiResource, CallerIdentity, DeploymentRequest, GatewayBackend, IntegrationRecord,
    RestApiRecord,
};
use serde_json::{Map, Value, json};
use tracing::{debug, error, info, instrument};

use crate::auth::SessionProvider;
use crate::error::classify_service_error;

/// Page size for `GetResources`. The service default is 25.
const RESOURCE_PAGE_LIMIT: i32 = 500;

/// `ImportRestApiOutput`, `GetRestApiOutput` and `RestApi` expose the same
/// accessors without a common trait.
macro_rules! rest_api_record {
    ($api:expr) => {{
        let api = &$api;
        RestApiFields {
            id: api.id(),
            name: api.name(),
            created_date: api.created_date(),
            version: api.version(),
            tags: api.tags(),
            description: api.description(),
            api_key_source: api.api_key_source().map(|s| s.as_str()),
            endpoint_types: api
                .endpoint_configuration()
                .map(|c| c.types().iter().map(|t| t.as_str()).collect())
                .unwrap_or_default(),
            disable_execute_api_endpoint: api.disable_execute_api_endpoint(),
        }
        .into_record()
    }};
}

/// Live AWS backend holding one API Gateway client and one STS client built
/// from the same session.
pub struct AwsGateway {
    region: String,
    client: aws_sdk_apigateway::Client,
    sts: aws_sdk_sts::Client,
}

impl std::fmt::Debug for AwsGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsGateway")
            .field("region", &self.region)
            .field("client", &"<ApiGatewayClient>")
            .field("sts", &"<StsClient>")
            .finish()
    }
}

impl AwsGateway {
    /// Load a session from `provider` and build both clients from it.
    ///
    /// Fails with [`FireProxError::Auth`] when no region can be resolved.
    pub async fn connect<P: SessionProvider>(provider: &P) -> Result<Self, FireProxError> {
        let sdk_config = provider.load().await?;
        Self::from_sdk_config(&sdk_config)
    }

    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig) -> Result<Self, FireProxError> {
        Self::with_clients(
            aws_sdk_apigateway::Client::new(sdk_config),
            aws_sdk_sts::Client::new(sdk_config),
        )
    }

    /// Wrap pre-built clients. The region comes from the gateway client.
    pub fn with_clients(
        client: aws_sdk_apigateway::Client,
        sts: aws_sdk_sts::Client,
    ) -> Result<Self, FireProxError> {
        let region = client
            .config()
            .region()
            .map(|r| r.as_ref().to_owned())
            .ok_or_else(|| FireProxError::Auth("no AWS region configured".to_owned()))?;
        info!(region = %region, "AWS gateway backend ready");
        Ok(Self {
            region,
            client,
            sts,
        })
    }
}

impl GatewayBackend for AwsGateway {
    fn region(&self) -> &str {
        &self.region
    }

    #[instrument(skip(self))]
    async fn caller_identity(&self) -> Result<CallerIdentity, FireProxError> {
        debug!("calling sts:GetCallerIdentity");
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| sdk_failure("GetCallerIdentity", "", &e))?;
        Ok(CallerIdentity {
            account: output.account().unwrap_or_default().to_owned(),
            arn: output.arn().unwrap_or_default().to_owned(),
            user_id: output.user_id().unwrap_or_default().to_owned(),
        })
    }

    #[instrument(skip(self, body), fields(region = %self.region, size = body.len()))]
    async fn import_rest_api(&self, body: Vec<u8>) -> Result<RestApiRecord, FireProxError> {
        debug!("importing REST API definition");
        let output = self
            .client
            .import_rest_api()
            .parameters("endpointConfigurationTypes", "REGIONAL")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| sdk_failure("ImportRestApi", "", &e))?;
        rest_api_record!(output)
    }

    #[instrument(skip(self), fields(region = %self.region))]
    async fn list_rest_apis(&self) -> Result<Vec<RestApiRecord>, FireProxError> {
        let mut records = Vec::new();
        let mut pages = self.client.get_rest_apis().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| sdk_failure("GetRestApis", "", &e))?;
            for api in page.items() {
                records.push(rest_api_record!(api)?);
            }
        }
        debug!(count = records.len(), "listed REST APIs");
        Ok(records)
    }

    #[instrument(skip(self), fields(region = %self.region))]
    async fn get_rest_api(&self, api_id: &str) -> Result<RestApiRecord, FireProxError> {
        debug!("calling apigateway:GetRestApi");
        let output = self
            .client
            .get_rest_api()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|e| sdk_failure("GetRestApi", api_id, &e))?;
        rest_api_record!(output)
    }

    #[instrument(skip(self), fields(region = %self.region))]
    async fn delete_rest_api(&self, api_id: &str) -> Result<(), FireProxError> {
        debug!("calling apigateway:DeleteRestApi");
        self.client
            .delete_rest_api()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|e| sdk_failure("DeleteRestApi", api_id, &e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(region = %self.region))]
    async fn get_resources(&self, api_id: &str) -> Result<Vec<ApiResource>, FireProxError> {
        let mut resources = Vec::new();
        let mut pages = self
            .client
            .get_resources()
            .rest_api_id(api_id)
            .limit(RESOURCE_PAGE_LIMIT)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| sdk_failure("GetResources", api_id, &e))?;
            resources.extend(page.items().iter().filter_map(|item| {
                Some(ApiResource {
                    id: item.id()?.to_owned(),
                    path: item.path().unwrap_or_default().to_owned(),
                    parent_id: item.parent_id().map(str::to_owned),
                })
            }));
        }
        Ok(resources)
    }

    #[instrument(skip(self), fields(region = %self.region))]
    async fn get_integration(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
    ) -> Result<IntegrationRecord, FireProxError> {
        let output = self
            .client
            .get_integration()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method(http_method)
            .send()
            .await
            .map_err(|e| sdk_failure("GetIntegration", api_id, &e))?;
        Ok(IntegrationRecord {
            uri: output.uri().map(str::to_owned),
            http_method: output.http_method().map(str::to_owned),
            integration_type: output.r#type().map(|t| t.as_str().to_owned()),
        })
    }

    #[instrument(skip(self), fields(region = %self.region))]
    async fn update_integration_uri(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
        uri: &str,
    ) -> Result<IntegrationRecord, FireProxError> {
        let output = self
            .client
            .update_integration()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method(http_method)
            .patch_operations(
                PatchOperation::builder()
                    .op(Op::Replace)
                    .path("/uri")
                    .value(uri)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| sdk_failure("UpdateIntegration", api_id, &e))?;
        info!(uri = %uri, "integration URI replaced");
        Ok(IntegrationRecord {
            uri: output.uri().map(str::to_owned),
            http_method: output.http_method().map(str::to_owned),
            integration_type: output.r#type().map(|t| t.as_str().to_owned()),
        })
    }

    #[instrument(skip(self, request), fields(region = %self.region, stage = %request.stage_name))]
    async fn create_deployment(
        &self,
        api_id: &str,
        request: &DeploymentRequest,
    ) -> Result<DeploymentRecord, FireProxError> {
        let variables: HashMap<String, String> = request
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let output = self
            .client
            .create_deployment()
            .rest_api_id(api_id)
            .stage_name(&request.stage_name)
            .stage_description(&request.stage_description)
            .description(&request.description)
            .cache_cluster_enabled(request.cache_cluster_enabled)
            .set_variables((!variables.is_empty()).then_some(variables))
            .send()
            .await
            .map_err(|e| sdk_failure("CreateDeployment", api_id, &e))?;

        let id = output.id().ok_or_else(|| {
            FireProxError::Serialization("deployment response carried no id".to_owned())
        })?;
        let mut record = DeploymentRecord::new(id);
        record.description = output.description().map(str::to_owned);
        record.created_date = output.created_date().and_then(to_chrono);
        if let Some(summary) = output.api_summary() {
            record.api_summary = api_summary(summary);
        }
        debug!(deployment_id = %record.id, "deployment created");
        Ok(record)
    }

    #[instrument(skip(self, tags), fields(region = %self.region))]
    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: BTreeMap<String, String>,
    ) -> Result<(), FireProxError> {
        self.client
            .tag_resource()
            .resource_arn(resource_arn)
            .set_tags(Some(tags.into_iter().collect()))
            .send()
            .await
            .map_err(|e| sdk_failure("TagResource", resource_arn, &e))?;
        Ok(())
    }
}

/// Log and classify a failed SDK call. `subject` names the entity reported
/// missing on `NotFoundException`.
fn sdk_failure<E, R>(operation: &'static str, subject: &str, err: &SdkError<E, R>) -> FireProxError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(err).to_string();
    error!(operation, code = ?err.code(), error = %message, "AWS call failed");
    classify_service_error(err.code(), subject, &message)
}

fn to_chrono(dt: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

fn api_summary(
    summary: &HashMap<String, HashMap<String, MethodSnapshot>>,
) -> BTreeMap<String, Value> {
    summary
        .iter()
        .map(|(path, methods)| {
            let methods: Map<String, Value> = methods
                .iter()
                .map(|(method, snapshot)| {
                    (
                        method.clone(),
                        json!({
                            "authorizationType": snapshot.authorization_type(),
                            "apiKeyRequired": snapshot.api_key_required(),
                        }),
                    )
                })
                .collect();
            (path.clone(), Value::Object(methods))
        })
        .collect()
}

/// The fields every REST API shape shares, borrowed from an SDK output.
struct RestApiFields<'a> {
    id: Option<&'a str>,
    name: Option<&'a str>,
    created_date: Option<&'a SdkDateTime>,
    version: Option<&'a str>,
    tags: Option<&'a HashMap<String, String>>,
    description: Option<&'a str>,
    api_key_source: Option<&'a str>,
    endpoint_types: Vec<&'a str>,
    disable_execute_api_endpoint: bool,
}

impl RestApiFields<'_> {
    fn into_record(self) -> Result<RestApiRecord, FireProxError> {
        let id = self.id.ok_or_else(|| {
            FireProxError::Serialization("REST API response carried no id".to_owned())
        })?;

        let mut extra = Map::new();
        if let Some(description) = self.description {
            extra.insert("description".to_owned(), json!(description));
        }
        if let Some(source) = self.api_key_source {
            extra.insert("apiKeySource".to_owned(), json!(source));
        }
        if !self.endpoint_types.is_empty() {
            extra.insert(
                "endpointConfiguration".to_owned(),
                json!({ "types": self.endpoint_types }),
            );
        }
        extra.insert(
            "disableExecuteApiEndpoint".to_owned(),
            json!(self.disable_execute_api_endpoint),
        );

        Ok(RestApiRecord {
            id: id.to_owned(),
            name: self.name.unwrap_or_default().to_owned(),
            created_date: self.created_date.and_then(to_chrono),
            version: self.version.map(str::to_owned),
            tags: self
                .tags
                .map(|tags| tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default(),
            extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_apigateway::types::{EndpointConfiguration, EndpointType, RestApi};

    use super::*;

    fn fields(id: Option<&str>) -> RestApiFields<'_> {
        RestApiFields {
            id,
            name: None,
            created_date: None,
            version: None,
            tags: None,
            description: None,
            api_key_source: None,
            endpoint_types: Vec::new(),
            disable_execute_api_endpoint: false,
        }
    }

    #[test]
    fn record_requires_id() {
        let err = fields(None).into_record().unwrap_err();
        assert!(matches!(err, FireProxError::Serialization(_)));
    }

    #[test]
    fn record_from_minimal_fields() {
        let record = fields(Some("abc123")).into_record().unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.name, "");
        assert!(record.tags.is_empty());
        assert_eq!(record.extra["disableExecuteApiEndpoint"], json!(false));
        assert!(!record.extra.contains_key("apiKeySource"));
    }

    #[test]
    fn record_from_sdk_rest_api() {
        let api = RestApi::builder()
            .id("abc123")
            .name("fireprox_example")
            .version("2026-10-15T08:00:00Z")
            .created_date(SdkDateTime::from_secs(1_700_000_000))
            .tags("owner", "alice")
            .endpoint_configuration(
                EndpointConfiguration::builder()
                    .types(EndpointType::Regional)
                    .build(),
            )
            .build();

        let record = rest_api_record!(api).unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.name, "fireprox_example");
        assert_eq!(record.version.as_deref(), Some("2026-10-15T08:00:00Z"));
        assert_eq!(record.owner(), Some("alice"));
        assert_eq!(
            record.created_date.map(|d| d.timestamp()),
            Some(1_700_000_000)
        );
        assert_eq!(
            record.extra["endpointConfiguration"],
            json!({ "types": ["REGIONAL"] })
        );
    }

    #[test]
    fn converts_sdk_timestamps() {
        let dt = SdkDateTime::from_secs_and_nanos(1_700_000_000, 500);
        let converted = to_chrono(&dt).unwrap();
        assert_eq!(converted.timestamp(), 1_700_000_000);
        assert_eq!(converted.timestamp_subsec_nanos(), 500);
    }

    #[test]
    fn api_summary_keeps_path_and_method() {
        let mut methods = HashMap::new();
        methods.insert(
            "ANY".to_owned(),
            MethodSnapshot::builder()
                .authorization_type("NONE")
                .api_key_required(false)
                .build(),
        );
        let mut summary = HashMap::new();
        summary.insert("/{proxy+}".to_owned(), methods);

        let converted = api_summary(&summary);
        assert_eq!(
            converted["/{proxy+}"],
            json!({ "ANY": { "authorizationType": "NONE", "apiKeyRequired": false } })
        );
    }
}
