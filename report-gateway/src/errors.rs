use http::StatusCode;
use thiserror::Error;

/// Failures that end a report request with an error response.
///
/// Remote failures are deliberately absent: the fetcher absorbs them into an
/// empty result, see [`crate::remote::RemoteError`].
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid or missing API key")]
    AuthenticationFailure,

    #[error("This API requires admin access")]
    AuthorizationFailure,

    #[error("{0}")]
    InternalFailure(String),
}

impl ReportError {
    pub fn status(&self) -> StatusCode {
        match self {
            ReportError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            ReportError::AuthorizationFailure => StatusCode::FORBIDDEN,
            ReportError::InternalFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Value of the `error` field in the JSON error body.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::AuthenticationFailure => "Authentication Required",
            ReportError::AuthorizationFailure => "Access Denied",
            ReportError::InternalFailure(_) => "Internal Server Error",
        }
    }
}

impl From<crate::store::StoreError> for ReportError {
    fn from(e: crate::store::StoreError) -> Self {
        ReportError::InternalFailure(e.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        ReportError::InternalFailure(format!("serialization failed: {e}"))
    }
}

/// Errors that prevent the gateway from starting
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ValidationError),

    #[error("local store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("invalid remote URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
