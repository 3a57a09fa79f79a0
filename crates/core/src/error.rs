use thiserror::Error;

/// Errors surfaced by FireProx lifecycle operations.
///
/// `Auth`, `Config` and `NotFound` are raised by FireProx itself. The remaining
/// variants classify failures reported by the remote provider, which are
/// propagated to the caller without retry.
#[derive(Debug, Error)]
pub enum FireProxError {
    /// Session setup is invalid or was rejected by the provider.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Caller-supplied arguments are invalid, or a provider result could not
    /// be projected into the domain model.
    #[error("configuration error: {0}")]
    Config(String),

    /// The provider reports no gateway with the requested id.
    #[error("API gateway not found: {0}")]
    NotFound(String),

    /// The provider returned an error for the request.
    #[error("provider error: {0}")]
    Service(String),

    /// The request was throttled by the provider.
    #[error("provider request throttled")]
    Throttled,

    /// A network or connection error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("provider request timed out")]
    Timeout,

    /// A provider payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl FireProxError {
    /// Returns `true` if the error is transient and the operation may succeed
    /// on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled | Self::Connection(_) | Self::Timeout)
    }
}

impl From<serde_json::Error> for FireProxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(FireProxError::Throttled.is_retryable());
        assert!(FireProxError::Timeout.is_retryable());
        assert!(FireProxError::Connection("reset".into()).is_retryable());
    }

    #[test]
    fn non_retryable_errors() {
        assert!(!FireProxError::Auth("x".into()).is_retryable());
        assert!(!FireProxError::Config("x".into()).is_retryable());
        assert!(!FireProxError::NotFound("x".into()).is_retryable());
        assert!(!FireProxError::Service("x".into()).is_retryable());
        assert!(!FireProxError::Serialization("x".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            FireProxError::NotFound("abc123".into()).to_string(),
            "API gateway not found: abc123"
        );
        assert_eq!(
            FireProxError::Config("Error listing gateways".into()).to_string(),
            "configuration error: Error listing gateways"
        );
        assert_eq!(
            FireProxError::Throttled.to_string(),
            "provider request throttled"
        );
    }

    #[test]
    fn json_error_maps_to_serialization() {
        let err: FireProxError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, FireProxError::Serialization(_)));
    }
}
