//! Session settings from flags, environment and an optional TOML file.

use std::path::Path;

use anyhow::{Context, bail};
use clap::Args;
use fireprox_aws::{AwsBaseConfig, AwsGateway, KeyAuth, ProfileAuth};
use serde::Deserialize;

/// Contents of the `--config` file.
///
/// ```toml
/// profile = "research"
///
/// [aws]
/// region = "us-east-1"
/// endpoint_url = "http://localhost:4566"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub aws: AwsBaseConfig,
}

impl FileSettings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// Credential and endpoint flags shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct SessionArgs {
    /// AWS region.
    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    /// Named AWS profile.
    #[arg(long, env = "AWS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Static access key id. Requires `--secret-access-key`.
    #[arg(long, env = "AWS_ACCESS_KEY_ID", global = true, hide_env_values = true)]
    pub access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", global = true, hide_env_values = true)]
    pub secret_access_key: Option<String>,

    #[arg(long, env = "AWS_SESSION_TOKEN", global = true, hide_env_values = true)]
    pub session_token: Option<String>,

    /// Endpoint override, e.g. a LocalStack URL.
    #[arg(long, env = "FIREPROX_ENDPOINT_URL", global = true)]
    pub endpoint_url: Option<String>,
}

/// A resolved way to open a session.
#[derive(Debug)]
pub enum Session {
    Profile(ProfileAuth),
    Keys(KeyAuth),
}

impl Session {
    pub async fn connect(&self) -> anyhow::Result<AwsGateway> {
        let gateway = match self {
            Session::Profile(auth) => AwsGateway::connect(auth).await?,
            Session::Keys(auth) => AwsGateway::connect(auth).await?,
        };
        Ok(gateway)
    }
}

impl SessionArgs {
    /// Merge the flags over `file` and pick a session provider. Static keys
    /// win over a profile.
    pub fn resolve(self, file: FileSettings) -> anyhow::Result<Session> {
        let aws = AwsBaseConfig {
            region: self.region,
            endpoint_url: self.endpoint_url,
            ..AwsBaseConfig::default()
        }
        .or(file.aws);

        match (self.access_key_id, self.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                let mut auth = KeyAuth::new(aws, access_key_id, secret_access_key);
                if let Some(token) = self.session_token {
                    auth = auth.with_session_token(token);
                }
                Ok(Session::Keys(auth))
            }
            (Some(_), None) => bail!("--access-key-id requires --secret-access-key"),
            (None, Some(_)) => bail!("--secret-access-key requires --access-key-id"),
            (None, None) => Ok(Session::Profile(ProfileAuth {
                aws,
                profile_name: self.profile.or(file.profile),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aws_table() {
        let file = FileSettings::parse(
            r#"
            profile = "research"

            [aws]
            region = "eu-west-1"
            endpoint_url = "http://localhost:4566"
            role_arn = "arn:aws:iam::111111111111:role/proxy"
            "#,
        )
        .unwrap();
        assert_eq!(file.profile.as_deref(), Some("research"));
        assert_eq!(file.aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(
            file.aws.role_arn.as_deref(),
            Some("arn:aws:iam::111111111111:role/proxy")
        );
    }

    #[test]
    fn empty_file_is_default() {
        let file = FileSettings::parse("").unwrap();
        assert!(file.profile.is_none());
        assert!(file.aws.region.is_none());
    }

    #[test]
    fn flags_override_file() {
        let file = FileSettings::parse(
            r#"
            profile = "from-file"
            [aws]
            region = "eu-west-1"
            endpoint_url = "http://localhost:4566"
            "#,
        )
        .unwrap();
        let args = SessionArgs {
            region: Some("us-east-1".into()),
            profile: Some("from-flag".into()),
            ..SessionArgs::default()
        };

        match args.resolve(file).unwrap() {
            Session::Profile(auth) => {
                assert_eq!(auth.profile_name.as_deref(), Some("from-flag"));
                assert_eq!(auth.aws.region.as_deref(), Some("us-east-1"));
                assert_eq!(
                    auth.aws.endpoint_url.as_deref(),
                    Some("http://localhost:4566")
                );
            }
            other => panic!("expected profile session, got {other:?}"),
        }
    }

    #[test]
    fn keys_win_over_profile() {
        let args = SessionArgs {
            profile: Some("ignored".into()),
            access_key_id: Some("AKIDEXAMPLE".into()),
            secret_access_key: Some("secret".into()),
            session_token: Some("token".into()),
            ..SessionArgs::default()
        };
        match args.resolve(FileSettings::default()).unwrap() {
            Session::Keys(auth) => {
                assert_eq!(auth.access_key_id, "AKIDEXAMPLE");
                assert!(auth.session_token.is_some());
            }
            other => panic!("expected key session, got {other:?}"),
        }
    }

    #[test]
    fn half_a_key_pair_is_rejected() {
        let args = SessionArgs {
            access_key_id: Some("AKIDEXAMPLE".into()),
            ..SessionArgs::default()
        };
        assert!(args.resolve(FileSettings::default()).is_err());

        let args = SessionArgs {
            secret_access_key: Some("secret".into()),
            ..SessionArgs::default()
        };
        assert!(args.resolve(FileSettings::default()).is_err());
    }
}
