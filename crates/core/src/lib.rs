//! Core types for FireProx: the proxy domain model, its error taxonomy, the
//! owner filter, and the Swagger template imported for each new proxy.

pub mod error;
pub mod filter;
pub mod resource;
pub mod template;

pub use error::FireProxError;
pub use filter::OwnerFilter;
pub use resource::{
    DeploymentRecord, OWNER_TAG, PROXY_PLACEHOLDER, ProxyResource, ProxyStatus, ResourceTag,
    STAGE_NAME, WILDCARD_PATH, execute_endpoint, strip_trailing_slash,
};
pub use template::{build_template, build_template_at};
