use std::io::Write;
use std::time::Duration;

use bytes::Bytes;
use crawl_core::{JobId, JobStatus, ScrapeRequest};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use url::Url;

use crate::{ApiError, ApiErrorKind};

pub const SUBMIT_FALLBACK_MESSAGE: &str = "Failed to start scraping";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Bound for submit and status calls.
    pub request_timeout: Duration,
    /// Bound for the zip and pdf exports, which may take minutes.
    pub export_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            export_timeout: Duration::from_secs(600),
        }
    }
}

/// The four endpoints of the job engine.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    /// `POST /api/scrape`
    async fn submit(&self, request: &ScrapeRequest) -> Result<JobId, ApiError>;

    /// `GET /api/project/{id}/status`
    async fn status(&self, job_id: &JobId) -> Result<JobStatus, ApiError>;

    /// `GET /api/project/{id}/export/zip`, streamed chunk by chunk into `out`.
    /// Returns the number of bytes written.
    async fn fetch_archive(
        &self,
        job_id: &JobId,
        out: &mut (dyn Write + Send),
    ) -> Result<u64, ApiError>;

    /// `POST /api/project/{id}/export/pdf`; the document is generated by this call.
    async fn export_document(&self, job_id: &JobId) -> Result<Bytes, ApiError>;
}

#[derive(Deserialize)]
struct SubmitResponse {
    project_id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    base: Url,
    client: reqwest::Client,
    request_timeout: Duration,
    export_timeout: Duration,
}

impl ReqwestJobApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                ApiErrorKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }
        // Total timeouts are set per request: exports outlive status calls.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiErrorKind::Network, err.to_string()))?;
        Ok(Self {
            base,
            client,
            request_timeout: settings.request_timeout,
            export_timeout: settings.export_timeout,
        })
    }

    /// Appends path segments to the base url, escaping each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn project_endpoint(&self, job_id: &JobId, tail: &[&str]) -> Url {
        let mut segments = vec!["api", "project", job_id.as_str()];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                ApiErrorKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn submit(&self, request: &ScrapeRequest) -> Result<JobId, ApiError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(self.endpoint(&["api", "scrape"]))
            .timeout(self.request_timeout)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(ApiError::new(
                ApiErrorKind::HttpStatus(status.as_u16()),
                rejection_message(&bytes),
            ));
        }

        let parsed: SubmitResponse = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))?;
        Ok(JobId::new(parsed.project_id))
    }

    async fn status(&self, job_id: &JobId) -> Result<JobStatus, ApiError> {
        let response = self
            .send(
                self.client
                    .get(self.project_endpoint(job_id, &["status"]))
                    .timeout(self.request_timeout),
            )
            .await?;
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))
    }

    async fn fetch_archive(
        &self,
        job_id: &JobId,
        out: &mut (dyn Write + Send),
    ) -> Result<u64, ApiError> {
        let response = self
            .send(
                self.client
                    .get(self.project_endpoint(job_id, &["export", "zip"]))
                    .timeout(self.export_timeout),
            )
            .await?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            out.write_all(&chunk)
                .map_err(|err| ApiError::new(ApiErrorKind::Io, err.to_string()))?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }

    async fn export_document(&self, job_id: &JobId) -> Result<Bytes, ApiError> {
        let response = self
            .send(
                self.client
                    .post(self.project_endpoint(job_id, &["export", "pdf"]))
                    .timeout(self.export_timeout),
            )
            .await?;
        response.bytes().await.map_err(map_reqwest_error)
    }
}

/// Picks the most useful text out of a rejected submission body.
fn rejection_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorResponse>(body) {
        if !parsed.error.trim().is_empty() {
            return parsed.error;
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        SUBMIT_FALLBACK_MESSAGE.to_string()
    } else {
        text.to_string()
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiErrorKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(ApiErrorKind::Decode, err.to_string());
    }
    ApiError::new(ApiErrorKind::Network, err.to_string())
}
