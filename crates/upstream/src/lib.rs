pub mod client;
pub mod dto;
pub mod error;

pub use client::{FetchOutcome, UpstreamBaseUrls, UpstreamClient};
pub use error::ApiError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_error_excludes_not_modified() {
        let not_modified = ApiError::InvalidResponse {
            status_code: reqwest::StatusCode::NOT_MODIFIED,
            url: "http://x".into(),
            body: None,
        };
        assert!(!not_modified.is_permanent());

        let not_found = ApiError::InvalidResponse {
            status_code: reqwest::StatusCode::NOT_FOUND,
            url: "http://x".into(),
            body: None,
        };
        assert!(not_found.is_permanent());

        let server_error = ApiError::InvalidResponse {
            status_code: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            url: "http://x".into(),
            body: None,
        };
        assert!(!server_error.is_permanent());
    }
}
