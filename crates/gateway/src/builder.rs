use crate::backend::GatewayBackend;
use crate::manager::ProxyManager;
use crate::retry::RetryStrategy;

/// Fluent builder for a [`ProxyManager`].
///
/// Only the backend is required. Bulk delete stays disabled unless
/// [`enable_bulk_delete`](Self::enable_bulk_delete) is called.
pub struct ProxyManagerBuilder<B> {
    backend: B,
    bulk_delete_enabled: bool,
    retry: RetryStrategy,
    max_delete_attempts: u32,
}

impl<B: GatewayBackend> ProxyManagerBuilder<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            bulk_delete_enabled: false,
            retry: RetryStrategy::default(),
            max_delete_attempts: 5,
        }
    }

    /// Allow [`ProxyManager::delete_all`] to run.
    #[must_use]
    pub fn enable_bulk_delete(mut self, enabled: bool) -> Self {
        self.bulk_delete_enabled = enabled;
        self
    }

    /// Backoff applied when a bulk delete is throttled.
    #[must_use]
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry = strategy;
        self
    }

    /// Attempts per proxy during a bulk delete, first try included. Values
    /// below one are treated as one.
    #[must_use]
    pub fn max_delete_attempts(mut self, attempts: u32) -> Self {
        self.max_delete_attempts = attempts.max(1);
        self
    }

    pub fn build(self) -> ProxyManager<B> {
        let region = self.backend.region().to_owned();
        ProxyManager {
            backend: self.backend,
            region,
            bulk_delete_enabled: self.bulk_delete_enabled,
            retry: self.retry,
            max_delete_attempts: self.max_delete_attempts,
        }
    }
}
