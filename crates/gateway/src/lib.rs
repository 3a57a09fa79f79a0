//! Lifecycle management for FireProx proxies.
//!
//! [`ProxyManager`] drives the provider calls behind each operation through a
//! [`GatewayBackend`]. The AWS implementation lives in `fireprox-aws`;
//! [`MemoryGateway`] keeps everything in process.

pub mod backend;
pub mod builder;
pub mod bulk;
pub mod manager;
pub mod memory;
pub mod response;
pub mod retry;

pub use backend::{
    ApiResource, CallerIdentity, DeploymentRequest, GatewayBackend, IntegrationRecord,
    RestApiRecord,
};
pub use builder::ProxyManagerBuilder;
pub use bulk::BulkDeleteOptions;
pub use manager::{ProxyManager, TEMPORARY_SESSION_MARKER, rest_api_arn};
pub use memory::MemoryGateway;
pub use response::{METHOD_ANY, build_response, origin_from_integration_uri};
pub use retry::RetryStrategy;
