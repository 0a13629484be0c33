use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{dto, error::ApiError};

/// §4.1: a GET that came back `304 Not Modified` short-circuits the caller.
#[derive(Debug, Clone)]
pub enum FetchOutcome<T> {
    Fresh(T),
    NotModified,
}

impl<T> FetchOutcome<T> {
    pub fn fresh(self) -> Option<T> {
        match self {
            FetchOutcome::Fresh(v) => Some(v),
            FetchOutcome::NotModified => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamBaseUrls {
    pub panel: String,
    pub aws: String,
    pub routing: String,
    pub profile: String,
}

/// Typed HTTP access to the game's JSON endpoints (§4.1). ETag is tracked
/// per (endpoint, server) pair so conditional GETs only re-fetch when the
/// upstream signals a change.
pub struct UpstreamClient {
    http: reqwest::Client,
    base_urls: UpstreamBaseUrls,
    etags: DashMap<(String, String), String>,
}

impl UpstreamClient {
    pub fn new(base_urls: UpstreamBaseUrls) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(5))
            .build()
            .expect("reqwest client with fixed timeouts always builds");
        Self {
            http,
            base_urls,
            etags: DashMap::new(),
        }
    }

    pub async fn list_servers(&self) -> Result<FetchOutcome<Vec<dto::ServerDto>>, ApiError> {
        let url = format!("{}/servers", self.base_urls.panel);
        self.get_with_etag("servers", "-", &url).await
    }

    pub async fn time_offset(&self, server_code: &str) -> Result<FetchOutcome<dto::TimeOffsetDto>, ApiError> {
        let url = format!("{}/servers/{server_code}/time-offset", self.base_urls.panel);
        self.get_with_etag("time-offset", server_code, &url).await
    }

    pub async fn active_trains(
        &self,
        server_code: &str,
    ) -> Result<FetchOutcome<Vec<dto::ActiveTrainDto>>, ApiError> {
        let url = format!("{}/servers/{server_code}/active-trains", self.base_urls.panel);
        self.get_with_etag("active-trains", server_code, &url).await
    }

    pub async fn dispatch_posts(
        &self,
        server_code: &str,
    ) -> Result<FetchOutcome<Vec<dto::DispatchPostDto>>, ApiError> {
        let url = format!("{}/servers/{server_code}/dispatch-posts", self.base_urls.panel);
        self.get_with_etag("dispatch-posts", server_code, &url).await
    }

    pub async fn timetable(
        &self,
        server_code: &str,
    ) -> Result<FetchOutcome<Vec<dto::TimetableDto>>, ApiError> {
        let url = format!("{}/servers/{server_code}/timetable", self.base_urls.aws);
        self.get_with_etag("timetable", server_code, &url).await
    }

    pub async fn vehicle_sequence(
        &self,
        server_code: &str,
        run_id: &str,
    ) -> Result<FetchOutcome<dto::VehicleSequenceDto>, ApiError> {
        let url = format!(
            "{}/servers/{server_code}/trains/{run_id}/vehicles",
            self.base_urls.aws
        );
        self.get_with_etag("vehicle-sequence", &format!("{server_code}:{run_id}"), &url)
            .await
    }

    pub async fn thumbnail(&self, railcar_api_id: &str) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}/railcars/{railcar_api_id}/thumbnail", self.base_urls.aws);
        let response = self.http.get(&url).send().await?;
        self.bytes_or_error(response, &url).await
    }

    pub async fn resolve_polyline(&self, server_code: &str, run_id: &str) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}/servers/{server_code}/trains/{run_id}/polyline", self.base_urls.routing);
        let response = self.http.get(&url).send().await?;
        self.bytes_or_error(response, &url).await
    }

    pub async fn resolve_profile(&self, platform_id: &str) -> Result<dto::ProfileDto, ApiError> {
        let url = format!("{}/profiles/{platform_id}", self.base_urls.profile);
        let response = self.http.get(&url).send().await?;
        self.json_or_error(response, &url).await
    }

    async fn get_with_etag<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        server_key: &str,
        url: &str,
    ) -> Result<FetchOutcome<T>, ApiError> {
        let cache_key = (endpoint.to_owned(), server_key.to_owned());
        let mut request = self.http.get(url);
        if let Some(etag) = self.etags.get(&cache_key) {
            request = request.header(reqwest::header::IF_NONE_MATCH, etag.value().as_str());
        }

        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }

        if let Some(etag) = response.headers().get(reqwest::header::ETAG) {
            if let Ok(etag) = etag.to_str() {
                self.etags.insert(cache_key, etag.to_owned());
            }
        }

        let value = self.json_or_error(response, url).await?;
        Ok(FetchOutcome::Fresh(value))
    }

    async fn json_or_error<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        url: &str,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            return Err(ApiError::InvalidResponse {
                status_code: status,
                url: url.to_owned(),
                body,
            });
        }
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            url: url.to_owned(),
            message: e.to_string(),
        })
    }

    async fn bytes_or_error(&self, response: reqwest::Response, url: &str) -> Result<Vec<u8>, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            return Err(ApiError::InvalidResponse {
                status_code: status,
                url: url.to_owned(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
