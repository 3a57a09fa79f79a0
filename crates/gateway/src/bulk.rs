//! Gated removal of every proxy in the region.

use fireprox_core::{FireProxError, ProxyResource, ProxyStatus};
use tracing::{info, instrument, warn};

use crate::backend::GatewayBackend;
use crate::manager::ProxyManager;
use crate::response::build_response;

/// How a bulk delete should run.
///
/// The default is neither confirmed nor a dry run, which is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkDeleteOptions {
    /// The caller explicitly confirmed the deletion.
    pub confirm: bool,
    /// Report what would be deleted without deleting anything.
    pub dry_run: bool,
}

impl BulkDeleteOptions {
    pub fn confirmed() -> Self {
        Self {
            confirm: true,
            dry_run: false,
        }
    }

    pub fn dry_run() -> Self {
        Self {
            confirm: false,
            dry_run: true,
        }
    }
}

impl<B: GatewayBackend> ProxyManager<B> {
    /// Delete every REST API in the region.
    ///
    /// Fails with `Config` unless the manager was built with bulk delete
    /// enabled and `options` is confirmed or a dry run. A dry run returns the
    /// current listing. Deletes run one at a time; a throttled delete is
    /// retried with backoff until the attempt budget is spent.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn delete_all(
        &self,
        options: BulkDeleteOptions,
    ) -> Result<Vec<ProxyResource>, FireProxError> {
        if !self.bulk_delete_enabled {
            return Err(FireProxError::Config(
                "bulk delete is disabled for this manager".to_owned(),
            ));
        }
        if options.dry_run {
            return self.list(None).await;
        }
        if !options.confirm {
            return Err(FireProxError::Config(
                "bulk delete requires confirmation or a dry run".to_owned(),
            ));
        }

        let records = self.backend.list_rest_apis().await?;
        let mut deleted = Vec::with_capacity(records.len());
        for record in records {
            info!(api_id = %record.id, "deleting proxy");
            self.delete_with_backoff(&record.id).await?;
            deleted.push(
                build_response(&self.backend, &self.region, record, ProxyStatus::Deleted).await?,
            );
        }
        info!(count = deleted.len(), "bulk delete finished");
        Ok(deleted)
    }

    async fn delete_with_backoff(&self, api_id: &str) -> Result<(), FireProxError> {
        let mut attempt = 0;
        loop {
            match self.backend.delete_rest_api(api_id).await {
                Ok(()) => return Ok(()),
                Err(FireProxError::Throttled) if attempt + 1 < self.max_delete_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(api_id = %api_id, attempt, delay = ?delay, "delete throttled, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::memory::MemoryGateway;
    use crate::retry::RetryStrategy;

    fn enabled(backend: MemoryGateway) -> ProxyManager<MemoryGateway> {
        ProxyManager::builder(backend)
            .enable_bulk_delete(true)
            .retry_strategy(RetryStrategy::Constant {
                delay: Duration::from_millis(10),
            })
            .max_delete_attempts(3)
            .build()
    }

    #[tokio::test]
    async fn disabled_by_default() {
        let mgr = ProxyManager::new(MemoryGateway::new("us-east-1"));
        mgr.backend().seed("https://a.com", &[]);

        let err = mgr
            .delete_all(BulkDeleteOptions::confirmed())
            .await
            .unwrap_err();
        assert!(matches!(err, FireProxError::Config(_)));
        assert_eq!(mgr.backend().api_count(), 1);
    }

    #[tokio::test]
    async fn requires_confirmation() {
        let mgr = enabled(MemoryGateway::new("us-east-1"));
        mgr.backend().seed("https://a.com", &[]);

        let err = mgr
            .delete_all(BulkDeleteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FireProxError::Config(_)));
        assert_eq!(mgr.backend().api_count(), 1);
    }

    #[tokio::test]
    async fn dry_run_deletes_nothing() {
        let mgr = enabled(MemoryGateway::new("us-east-1"));
        mgr.backend().seed("https://a.com", &[]);
        mgr.backend().seed("https://b.com", &[]);

        let planned = mgr.delete_all(BulkDeleteOptions::dry_run()).await.unwrap();
        assert_eq!(planned.len(), 2);
        assert!(planned.iter().all(|p| p.status() == ProxyStatus::Running));
        assert_eq!(mgr.backend().api_count(), 2);
        assert_eq!(mgr.backend().delete_calls(), 0);
    }

    #[tokio::test]
    async fn confirmed_deletes_everything() {
        let mgr = enabled(MemoryGateway::new("us-east-1"));
        mgr.backend().seed("https://a.com", &[]);
        mgr.backend().seed("https://b.com", &[]);

        let deleted = mgr.delete_all(BulkDeleteOptions::confirmed()).await.unwrap();
        assert_eq!(deleted.len(), 2);
        assert!(deleted.iter().all(|p| p.status() == ProxyStatus::Deleted));
        assert!(deleted.iter().all(|p| p.proxy_url.is_empty()));
        assert_eq!(mgr.backend().api_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn throttled_delete_is_retried() {
        let mgr = enabled(MemoryGateway::new("us-east-1"));
        mgr.backend().seed("https://a.com", &[]);
        mgr.backend().throttle_deletes(2);

        let deleted = mgr.delete_all(BulkDeleteOptions::confirmed()).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(mgr.backend().delete_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_attempt_budget() {
        let mgr = enabled(MemoryGateway::new("us-east-1"));
        mgr.backend().seed("https://a.com", &[]);
        mgr.backend().throttle_deletes(5);

        let err = mgr
            .delete_all(BulkDeleteOptions::confirmed())
            .await
            .unwrap_err();
        assert!(matches!(err, FireProxError::Throttled));
        assert_eq!(mgr.backend().delete_calls(), 3);
        assert_eq!(mgr.backend().api_count(), 1);
    }
}
