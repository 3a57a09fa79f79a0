//! Projection of provider records into [`ProxyResource`]s.

use fireprox_core::{
    FireProxError, PROXY_PLACEHOLDER, ProxyResource, ProxyStatus, ResourceTag, WILDCARD_PATH,
    execute_endpoint, strip_trailing_slash,
};
use tracing::debug;

use crate::backend::{ApiResource, GatewayBackend, RestApiRecord};

/// HTTP method carrying the forwarding integration.
pub const METHOD_ANY: &str = "ANY";

/// Find the `/{proxy+}` child resource of an API, if any.
pub async fn find_wildcard_resource<B: GatewayBackend>(
    backend: &B,
    api_id: &str,
) -> Result<Option<ApiResource>, FireProxError> {
    let resources = backend.get_resources(api_id).await?;
    Ok(resources.into_iter().find(|r| r.path == WILDCARD_PATH))
}

/// Origin encoded in an integration URI (`https://host/{proxy}` -> `https://host`).
pub fn origin_from_integration_uri(uri: &str) -> String {
    let base = uri.strip_suffix(PROXY_PLACEHOLDER).unwrap_or(uri);
    strip_trailing_slash(base).to_owned()
}

/// Project `record` with the given status.
///
/// Unless the status is `DELETED`, the current origin is read back from the
/// wildcard resource's integration, so a missing wildcard resource or URI is
/// a `Config` error. Deleted proxies get an empty `proxy_url`.
pub async fn build_response<B: GatewayBackend>(
    backend: &B,
    region: &str,
    record: RestApiRecord,
    status: ProxyStatus,
) -> Result<ProxyResource, FireProxError> {
    let RestApiRecord {
        id,
        name,
        created_date,
        version,
        tags,
        extra,
    } = record;

    let (proxy_url, resource_id) = if status == ProxyStatus::Deleted {
        (String::new(), None)
    } else {
        let resource = find_wildcard_resource(backend, &id).await?.ok_or_else(|| {
            FireProxError::Config(format!("no {WILDCARD_PATH} resource for {id}"))
        })?;
        let integration = backend
            .get_integration(&id, &resource.id, METHOD_ANY)
            .await?;
        let uri = integration.uri.ok_or_else(|| {
            FireProxError::Config(format!("integration for {id} has no uri"))
        })?;
        debug!(api_id = %id, uri = %uri, "resolved proxy integration");
        (origin_from_integration_uri(&uri), Some(resource.id))
    };

    let tags = tags
        .into_iter()
        .map(|(key, val)| ResourceTag::new(key, val))
        .collect();

    Ok(ProxyResource::new(id.clone(), status)
        .with_name(name)
        .with_created_date(created_date)
        .with_version(version)
        .with_url(execute_endpoint(&id, region))
        .with_proxy_url(&proxy_url)
        .with_resource_id(resource_id)
        .with_tags(tags)
        .with_extra(extra))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGateway;

    #[test]
    fn origin_from_uri_strips_placeholder_and_slash() {
        assert_eq!(
            origin_from_integration_uri("https://example.com/{proxy}"),
            "https://example.com"
        );
        assert_eq!(
            origin_from_integration_uri("https://example.com/api/{proxy}"),
            "https://example.com/api"
        );
        assert_eq!(
            origin_from_integration_uri("https://example.com"),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn running_projection_reads_origin() {
        let backend = MemoryGateway::new("us-east-1").with_api_ids(["abc123"]);
        let id = backend.seed("https://example.com/", &[("owner", "alice")]);
        let record = backend.get_rest_api(&id).await.unwrap();

        let resource = build_response(&backend, "us-east-1", record, ProxyStatus::Running)
            .await
            .unwrap();
        assert_eq!(resource.id, "abc123");
        assert_eq!(
            resource.url,
            "https://abc123.execute-api.us-east-1.amazonaws.com/fireprox/"
        );
        assert_eq!(resource.proxy_url, "https://example.com");
        assert_eq!(resource.status(), ProxyStatus::Running);
        assert_eq!(resource.owner(), Some("alice"));
        assert_eq!(resource.tags, vec![ResourceTag::new("owner", "alice")]);
        assert!(resource.resource_id.is_some());
        assert_eq!(resource.extra["apiKeySource"], "HEADER");
    }

    #[tokio::test]
    async fn deleted_projection_skips_integration() {
        let backend = MemoryGateway::new("us-east-1");
        let id = backend.seed("https://example.com", &[]);
        backend.break_integration(&id);
        let record = backend.get_rest_api(&id).await.unwrap();

        let resource = build_response(&backend, "us-east-1", record, ProxyStatus::Deleted)
            .await
            .unwrap();
        assert_eq!(resource.proxy_url, "");
        assert_eq!(resource.status(), ProxyStatus::Deleted);
    }

    #[tokio::test]
    async fn missing_wildcard_is_config_error() {
        let backend = MemoryGateway::new("us-east-1");
        let id = backend.seed("https://example.com", &[]);
        backend.break_integration(&id);
        let record = backend.get_rest_api(&id).await.unwrap();

        let err = build_response(&backend, "us-east-1", record, ProxyStatus::Running)
            .await
            .unwrap_err();
        assert!(matches!(err, FireProxError::Config(_)));
    }
}
