use std::collections::BTreeMap;

use fireprox_core::{
    FireProxError, OWNER_TAG, OwnerFilter, PROXY_PLACEHOLDER, ProxyResource, ProxyStatus,
    ResourceTag, build_template, strip_trailing_slash,
};
use tracing::{debug, error, info, instrument};

use crate::backend::{DeploymentRequest, GatewayBackend, RestApiRecord};
use crate::builder::ProxyManagerBuilder;
use crate::response::{METHOD_ANY, build_response, find_wildcard_resource};
use crate::retry::RetryStrategy;

/// Marker present in the principal ARN of a temporary session.
pub const TEMPORARY_SESSION_MARKER: &str = "botocore-session-";

/// Lifecycle manager for FireProx proxies.
///
/// Each operation is a fixed sequence of provider calls awaited one at a
/// time. The manager keeps no state besides its backend and the region the
/// backend reports, so every result reflects the provider at call time.
pub struct ProxyManager<B> {
    pub(crate) backend: B,
    pub(crate) region: String,
    pub(crate) bulk_delete_enabled: bool,
    pub(crate) retry: RetryStrategy,
    pub(crate) max_delete_attempts: u32,
}

impl<B> std::fmt::Debug for ProxyManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyManager")
            .field("region", &self.region)
            .field("bulk_delete_enabled", &self.bulk_delete_enabled)
            .field("backend", &"<GatewayBackend>")
            .finish_non_exhaustive()
    }
}

impl<B: GatewayBackend> ProxyManager<B> {
    /// Create a manager with bulk delete disabled.
    pub fn new(backend: B) -> Self {
        ProxyManagerBuilder::new(backend).build()
    }

    pub fn builder(backend: B) -> ProxyManagerBuilder<B> {
        ProxyManagerBuilder::new(backend)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether the session uses temporary credentials.
    ///
    /// This is a heuristic on the principal ARN, not a security check.
    #[instrument(skip(self))]
    pub async fn test_auth(&self) -> Result<bool, FireProxError> {
        let identity = self.backend.caller_identity().await?;
        Ok(identity.arn.contains(TEMPORARY_SESSION_MARKER))
    }

    /// Numeric id of the account behind the session.
    #[instrument(skip(self))]
    pub async fn account_id(&self) -> Result<u64, FireProxError> {
        let identity = self.backend.caller_identity().await?;
        identity.account.parse().map_err(|_| {
            FireProxError::Auth(format!("invalid account id '{}'", identity.account))
        })
    }

    /// Import, optionally tag, and deploy a proxy for `origin`.
    ///
    /// An empty `owner` is treated as no owner.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn create(
        &self,
        origin: &str,
        owner: Option<&str>,
    ) -> Result<ProxyResource, FireProxError> {
        let origin = strip_trailing_slash(origin.trim());
        if origin.is_empty() {
            return Err(FireProxError::Config(
                "please provide a valid origin URL".to_owned(),
            ));
        }
        let owner = owner.filter(|owner| !owner.is_empty());

        debug!(origin = %origin, "importing proxy definition");
        let api = self.backend.import_rest_api(build_template(origin)).await?;

        let mut tags = Vec::new();
        if let Some(owner) = owner {
            self.tag(&api.id, owner).await?;
            tags.push(ResourceTag::new(OWNER_TAG, owner));
        }

        debug!(api_id = %api.id, "creating deployment");
        let mut deployment = self
            .backend
            .create_deployment(&api.id, &DeploymentRequest::default())
            .await?;
        deployment.set_execute_endpoint(&api.id, &self.region);

        info!(api_id = %api.id, url = %deployment.execute_endpoint, "proxy created");

        let RestApiRecord {
            id,
            name,
            created_date,
            version,
            extra,
            ..
        } = api;
        Ok(ProxyResource::new(id, ProxyStatus::Created)
            .with_name(name)
            .with_created_date(created_date)
            .with_version(version)
            .with_url(deployment.execute_endpoint)
            .with_proxy_url(origin)
            .with_resource_id(Some(deployment.id))
            .with_tags(tags)
            .with_extra(extra))
    }

    /// Point an existing proxy at a new origin.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn update(&self, api_id: &str, url: &str) -> Result<ProxyResource, FireProxError> {
        let url = strip_trailing_slash(url);
        if api_id.is_empty() || url.is_empty() {
            return Err(FireProxError::Config(
                "please provide a valid API ID and URL end-point".to_owned(),
            ));
        }

        let resource = find_wildcard_resource(&self.backend, api_id)
            .await?
            .ok_or_else(|| {
                FireProxError::Config(format!("unable to update, no valid resource for {api_id}"))
            })?;

        let uri = format!("{url}/{PROXY_PLACEHOLDER}");
        debug!(api_id = %api_id, resource_id = %resource.id, uri = %uri, "patching integration");
        self.backend
            .update_integration_uri(api_id, &resource.id, METHOD_ANY, &uri)
            .await?;

        let record = self.backend.get_rest_api(api_id).await?;
        let mut updated = build_response(&self.backend, &self.region, record, ProxyStatus::Running)
            .await?
            .with_proxy_url(url)
            .with_resource_id(Some(resource.id));
        updated.set_status(ProxyStatus::Updated)?;

        info!(api_id = %api_id, proxy_url = %url, "proxy updated");
        Ok(updated)
    }

    /// Fetch one proxy by id.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn get(&self, api_id: &str) -> Result<ProxyResource, FireProxError> {
        if api_id.is_empty() {
            return Err(FireProxError::Config("please provide a valid API ID".to_owned()));
        }
        let record = self.backend.get_rest_api(api_id).await?;
        build_response(&self.backend, &self.region, record, ProxyStatus::Running).await
    }

    /// Delete a proxy, returning its last snapshot.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn delete(&self, api_id: &str) -> Result<ProxyResource, FireProxError> {
        if api_id.is_empty() {
            return Err(FireProxError::Config("please provide a valid API ID".to_owned()));
        }
        let snapshot = self.backend.get_rest_api(api_id).await?;
        self.backend.delete_rest_api(api_id).await?;
        info!(api_id = %api_id, "proxy deleted");
        build_response(&self.backend, &self.region, snapshot, ProxyStatus::Deleted).await
    }

    /// Every proxy in the region, optionally narrowed to owners matching
    /// `owner_filter`.
    ///
    /// A single record that cannot be projected fails the whole listing.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn list(
        &self,
        owner_filter: Option<&str>,
    ) -> Result<Vec<ProxyResource>, FireProxError> {
        let filter = owner_filter
            .filter(|pattern| !pattern.is_empty())
            .map(OwnerFilter::new)
            .transpose()?;

        let records = self.backend.list_rest_apis().await?;
        debug!(count = records.len(), "projecting gateways");

        let mut resources = Vec::with_capacity(records.len());
        for record in records {
            let api_id = record.id.clone();
            let resource = build_response(&self.backend, &self.region, record, ProxyStatus::Running)
                .await
                .map_err(|e| {
                    error!(api_id = %api_id, error = %e, "failed to project gateway");
                    FireProxError::Config(format!("Error listing gateways: {e}"))
                })?;
            resources.push(resource);
        }

        Ok(match filter {
            Some(filter) => filter.apply(resources),
            None => resources,
        })
    }

    /// Tag a proxy with its owner.
    ///
    /// The target is the REST API ARN from [`rest_api_arn`], which is built
    /// from the region and API id only: API Gateway resource ARNs have an
    /// empty account field, so the account id is not part of it.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn tag(&self, api_id: &str, owner: &str) -> Result<(), FireProxError> {
        if api_id.is_empty() || owner.is_empty() {
            return Err(FireProxError::Config(
                "please provide a valid API ID and owner".to_owned(),
            ));
        }
        let arn = rest_api_arn(&self.region, api_id);
        debug!(arn = %arn, "tagging proxy");
        let tags = BTreeMap::from([(OWNER_TAG.to_owned(), owner.to_owned())]);
        self.backend.tag_resource(&arn, tags).await
    }
}

/// ARN of a REST API. API Gateway ARNs leave the account field empty.
pub fn rest_api_arn(region: &str, api_id: &str) -> String {
    let partition = if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else {
        "aws"
    };
    format!("arn:{partition}:apigateway:{region}::/restapis/{api_id}")
}
