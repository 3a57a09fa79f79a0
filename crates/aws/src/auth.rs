//! Session construction for the AWS clients.
//!
//! A [`SessionProvider`] turns caller-supplied credentials into an
//! [`SdkConfig`]. [`ProfileAuth`] walks the SDK's default chain, optionally
//! pinned to a named profile; [`KeyAuth`] uses static keys. Both honor the
//! region, endpoint override and assume-role settings of [`AwsBaseConfig`].

use std::future::Future;

use aws_config::{ConfigLoader, Region, SdkConfig};
use aws_sdk_sts::config::Credentials;
use fireprox_core::FireProxError;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::config::AwsBaseConfig;

/// Provider name attached to static credentials.
const STATIC_PROVIDER_NAME: &str = "fireprox-static";

/// Something that can produce a loaded SDK configuration.
pub trait SessionProvider: Send + Sync {
    /// Shared settings this provider was built with.
    fn base(&self) -> &AwsBaseConfig;

    /// Resolve credentials and region into an [`SdkConfig`].
    ///
    /// Fails with [`FireProxError::Auth`] when the supplied credentials are
    /// unusable. Whether AWS accepts them is only known on the first call.
    fn load(&self) -> impl Future<Output = Result<SdkConfig, FireProxError>> + Send;
}

/// Credentials from the SDK default chain, optionally from a named profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileAuth {
    pub aws: AwsBaseConfig,
    pub profile_name: Option<String>,
}

impl ProfileAuth {
    pub fn new(aws: AwsBaseConfig) -> Self {
        Self {
            aws,
            profile_name: None,
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile_name: impl Into<String>) -> Self {
        self.profile_name = Some(profile_name.into());
        self
    }
}

impl SessionProvider for ProfileAuth {
    fn base(&self) -> &AwsBaseConfig {
        &self.aws
    }

    async fn load(&self) -> Result<SdkConfig, FireProxError> {
        let mut loader = base_loader(&self.aws);
        if let Some(profile) = &self.profile_name {
            if profile.trim().is_empty() {
                return Err(FireProxError::Auth("profile name is empty".to_owned()));
            }
            debug!(profile = %profile, "using named AWS profile");
            loader = loader.profile_name(profile);
        }
        finish(loader, &self.aws).await
    }
}

/// Static access keys, with an optional session token for temporary
/// credentials.
#[derive(Debug)]
pub struct KeyAuth {
    pub aws: AwsBaseConfig,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
}

impl KeyAuth {
    pub fn new(
        aws: AwsBaseConfig,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            aws,
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::new(secret_access_key.into()),
            session_token: None,
        }
    }

    #[must_use]
    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(SecretString::new(session_token.into()));
        self
    }

    fn credentials(&self) -> Result<Credentials, FireProxError> {
        if self.access_key_id.trim().is_empty() {
            return Err(FireProxError::Auth("access key id is empty".to_owned()));
        }
        if self.secret_access_key.expose_secret().is_empty() {
            return Err(FireProxError::Auth("secret access key is empty".to_owned()));
        }
        Ok(Credentials::new(
            self.access_key_id.as_str(),
            self.secret_access_key.expose_secret().as_str(),
            self.session_token
                .as_ref()
                .map(|token| token.expose_secret().clone()),
            None,
            STATIC_PROVIDER_NAME,
        ))
    }
}

impl SessionProvider for KeyAuth {
    fn base(&self) -> &AwsBaseConfig {
        &self.aws
    }

    async fn load(&self) -> Result<SdkConfig, FireProxError> {
        let credentials = self.credentials()?;
        debug!(
            temporary = self.session_token.is_some(),
            "using static AWS credentials"
        );
        let loader = base_loader(&self.aws).credentials_provider(credentials);
        finish(loader, &self.aws).await
    }
}

fn base_loader(config: &AwsBaseConfig) -> ConfigLoader {
    let mut loader = aws_config::from_env();
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint_url {
        debug!(endpoint = %endpoint, "using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }
    loader
}

/// Load `loader`, then swap in an auto-refreshing assume-role provider when
/// a role ARN is configured.
async fn finish(loader: ConfigLoader, config: &AwsBaseConfig) -> Result<SdkConfig, FireProxError> {
    let base = loader.load().await;
    let Some(role_arn) = &config.role_arn else {
        return Ok(base);
    };

    let session_name = config.session_name();
    info!(role_arn = %role_arn, session_name = %session_name, "assuming IAM role via STS");

    let mut provider_builder =
        aws_config::sts::AssumeRoleProvider::builder(role_arn).session_name(session_name);
    if let Some(region) = base.region() {
        provider_builder = provider_builder.region(region.clone());
    }
    if let Some(external_id) = &config.external_id {
        provider_builder = provider_builder.external_id(external_id);
    }
    let assume_role_provider = provider_builder.configure(&base).build().await;

    // The role's credentials sign every later call, including STS.
    let mut final_loader = aws_config::from_env().credentials_provider(assume_role_provider);
    if let Some(region) = base.region() {
        final_loader = final_loader.region(region.clone());
    }
    if let Some(endpoint) = &config.endpoint_url {
        final_loader = final_loader.endpoint_url(endpoint);
    }
    Ok(final_loader.load().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_auth_debug_hides_secrets() {
        let auth = KeyAuth::new(AwsBaseConfig::new("us-east-1"), "AKIDEXAMPLE", "wJalrXUtnFEMI")
            .with_session_token("FwoGZXIvYXdzEXAMPLE");
        let debug = format!("{auth:?}");
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("wJalrXUtnFEMI"));
        assert!(!debug.contains("FwoGZXIvYXdzEXAMPLE"));
    }

    #[test]
    fn key_auth_builds_static_credentials() {
        let auth = KeyAuth::new(AwsBaseConfig::default(), "AKIDEXAMPLE", "secret")
            .with_session_token("token");
        let credentials = auth.credentials().unwrap();
        assert_eq!(credentials.access_key_id(), "AKIDEXAMPLE");
        assert_eq!(credentials.secret_access_key(), "secret");
        assert_eq!(credentials.session_token(), Some("token"));
    }

    #[tokio::test]
    async fn key_auth_rejects_empty_keys() {
        let auth = KeyAuth::new(AwsBaseConfig::default(), "", "secret");
        assert!(matches!(auth.load().await, Err(FireProxError::Auth(_))));

        let auth = KeyAuth::new(AwsBaseConfig::default(), "AKIDEXAMPLE", "");
        assert!(matches!(auth.load().await, Err(FireProxError::Auth(_))));
    }

    #[tokio::test]
    async fn profile_auth_rejects_blank_profile() {
        let auth = ProfileAuth::new(AwsBaseConfig::default()).with_profile("  ");
        assert!(matches!(auth.load().await, Err(FireProxError::Auth(_))));
    }

    #[test]
    fn providers_expose_base_config() {
        let profile = ProfileAuth::new(AwsBaseConfig::new("eu-west-1"));
        assert_eq!(profile.base().region.as_deref(), Some("eu-west-1"));

        let keys = KeyAuth::new(AwsBaseConfig::new("us-west-2"), "AKID", "secret");
        assert_eq!(keys.base().region.as_deref(), Some("us-west-2"));
    }
}
