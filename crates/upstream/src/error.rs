use std::{error, fmt, sync::Arc};

/// §7 error taxonomy: transient upstream errors (5xx, timeout, connection
/// reset) are retried next tick; permanent upstream errors (4xx except 304)
/// are logged once per (endpoint, code) and skipped. This enum only
/// describes what went wrong — the retry/skip decision is the collector's,
/// not the client's.
#[derive(Debug, Clone)]
pub enum ApiError {
    Transient(Arc<reqwest::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        body: Option<String>,
    },
    Decode {
        url: String,
        message: String,
    },
}

impl ApiError {
    /// §7: "permanent upstream (4xx except 304)".
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidResponse { status_code, .. }
                if status_code.is_client_error() && *status_code != reqwest::StatusCode::NOT_MODIFIED
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transient(e) => write!(f, "transient upstream error: {e}"),
            ApiError::InvalidResponse { status_code, url, body } => match body {
                Some(body) => write!(f, "upstream returned {status_code} for {url}: {body}"),
                None => write!(f, "upstream returned {status_code} for {url}"),
            },
            ApiError::Decode { url, message } => write!(f, "failed to decode response from {url}: {message}"),
        }
    }
}

impl error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transient(Arc::new(e))
    }
}
