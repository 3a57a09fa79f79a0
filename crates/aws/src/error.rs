use fireprox_core::FireProxError;

/// Service error codes meaning the caller's credentials were rejected.
const AUTH_ERROR_CODES: &[&str] = &[
    "UnrecognizedClientException",
    "InvalidClientTokenId",
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidSignatureException",
    "SignatureDoesNotMatch",
    "MissingAuthenticationTokenException",
];

/// Service error codes meaning the request was throttled.
const THROTTLE_ERROR_CODES: &[&str] = &[
    "TooManyRequestsException",
    "ThrottlingException",
    "Throttling",
];

/// Classify an AWS SDK error string into the appropriate [`FireProxError`].
///
/// Inspects the message for common patterns (throttling, credentials,
/// timeout, connection). Anything else is a service error.
pub fn classify_sdk_error(error_str: &str) -> FireProxError {
    let lower = error_str.to_lowercase();
    if lower.contains("throttl") || lower.contains("rate exceed") || lower.contains("too many") {
        FireProxError::Throttled
    } else if lower.contains("credential") || lower.contains("security token") {
        FireProxError::Auth(error_str.to_owned())
    } else if lower.contains("timeout") || lower.contains("timed out") {
        FireProxError::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        FireProxError::Connection(error_str.to_owned())
    } else {
        FireProxError::Service(error_str.to_owned())
    }
}

/// Classify using the service error code when there is one, falling back to
/// [`classify_sdk_error`].
///
/// `subject` names the missing entity for `NotFoundException`.
pub fn classify_service_error(code: Option<&str>, subject: &str, message: &str) -> FireProxError {
    match code {
        Some("NotFoundException") => FireProxError::NotFound(subject.to_owned()),
        Some(code) if THROTTLE_ERROR_CODES.contains(&code) => FireProxError::Throttled,
        Some(code) if AUTH_ERROR_CODES.contains(&code) => FireProxError::Auth(message.to_owned()),
        _ => classify_sdk_error(message),
    }
}
