//! AWS backend for FireProx.
//!
//! [`AwsGateway`] implements [`GatewayBackend`](fireprox_gateway::GatewayBackend)
//! with the API Gateway and STS SDK clients. Sessions come from a
//! [`SessionProvider`]: [`ProfileAuth`] for the default chain or a named
//! profile, [`KeyAuth`] for static keys. Both share an [`AwsBaseConfig`] for
//! region, endpoint override and optional STS assume-role credentials.

pub mod apigateway;
pub mod auth;
pub mod config;
pub mod error;

pub use apigateway::AwsGateway;
pub use auth::{KeyAuth, ProfileAuth, SessionProvider};
pub use config::AwsBaseConfig;
pub use error::{classify_sdk_error, classify_service_error};
