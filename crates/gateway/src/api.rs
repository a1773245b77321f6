//! REST client for the conversion gateway.
//!
//! Wraps `/login`, `/upload`, `/status` and `/download` using [`reqwest`].
//! Every request carries its own timeout from [`TimeoutPolicy`]; the
//! client never retries.

use async_trait::async_trait;
use serde::Deserialize;
use vidconv_core::status::JobStatus;
use vidconv_core::types::{ArtifactId, BearerToken, Credentials};

use crate::config::{GatewayConfig, TimeoutPolicy};
use crate::gateway::{Gateway, StatusReport};
use crate::upload::Upload;

/// Multipart field name the gateway reads the video from.
const UPLOAD_FIELD: &str = "file";

/// HTTP client for a single gateway deployment.
///
/// Cheap to share: the inner [`reqwest::Client`] pools connections and
/// nothing here is mutated after construction.
#[derive(Debug, Clone)]
pub struct GatewayApi {
    client: reqwest::Client,
    base_url: String,
    timeouts: TimeoutPolicy,
}

/// Response returned by `/upload`.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    video_fid: String,
}

/// Response returned by `/status`.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    mp3_fid: Option<String>,
}

/// Errors from the gateway REST layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayApiError {
    /// Connection refused, DNS failure, TLS failure, or timeout.
    #[error("HTTP request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The gateway answered with a non-2xx status code.
    #[error("Gateway rejected request ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Raw response body, usually the gateway's error message.
        body: String,
    },

    /// A 2xx answer whose body is not what the endpoint documents.
    #[error("Unexpected gateway response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(Box::new(e))
    }
}

impl GatewayApiError {
    /// 401/403: the credentials or token were refused.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401 | 403, .. })
    }
}

impl GatewayApi {
    /// Create a client for the gateway at `base_url`, e.g.
    /// `http://localhost:30002`.
    pub fn new(base_url: impl Into<String>, timeouts: TimeoutPolicy) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, timeouts)
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        timeouts: TimeoutPolicy,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            timeouts,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.base_url.clone(), config.timeouts)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange basic credentials for a bearer token.
    ///
    /// Sends `POST /login` with HTTP basic auth. The response body is the
    /// token, returned exactly as received.
    pub async fn login(&self, credentials: &Credentials) -> Result<BearerToken, GatewayApiError> {
        let response = self
            .client
            .post(self.url("login"))
            .basic_auth(&credentials.username, Some(&credentials.secret))
            .timeout(self.timeouts.login)
            .send()
            .await?;

        let body = Self::ensure_success(response).await?.text().await?;
        BearerToken::new(body).map_err(|_| GatewayApiError::Decode("login returned an empty token".into()))
    }

    /// Upload a video for conversion.
    ///
    /// Sends `POST /upload` as multipart with a single `file` part and
    /// returns the stored video's identifier (`video_fid`).
    pub async fn upload(&self, token: &BearerToken, upload: Upload) -> Result<ArtifactId, GatewayApiError> {
        let (file_name, content_type, bytes) = upload.into_parts();
        let size = bytes.len();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

        tracing::debug!(file_name = %file_name, size, "Uploading video to gateway");

        let response = self
            .client
            .post(self.url("upload"))
            .bearer_auth(token.expose())
            .multipart(form)
            .timeout(self.timeouts.upload)
            .send()
            .await?;

        let parsed: UploadResponse = Self::parse_json(response).await?;
        ArtifactId::new(parsed.video_fid)
            .map_err(|_| GatewayApiError::Decode("upload returned an empty video_fid".into()))
    }

    /// Query conversion status for an uploaded video.
    ///
    /// Sends `GET /status?video_fid=<id>`. An empty or missing `mp3_fid`
    /// is reported as no result.
    pub async fn status(
        &self,
        token: &BearerToken,
        source: &ArtifactId,
    ) -> Result<StatusReport, GatewayApiError> {
        let response = self
            .client
            .get(self.url("status"))
            .query(&[("video_fid", source.as_str())])
            .bearer_auth(token.expose())
            .timeout(self.timeouts.status)
            .send()
            .await?;

        let parsed: StatusResponse = Self::parse_json(response).await?;
        Ok(StatusReport {
            status: JobStatus::from_wire(&parsed.status),
            result: parsed.mp3_fid.and_then(|fid| ArtifactId::new(fid).ok()),
        })
    }

    /// Download a stored artifact's raw bytes via `GET /download?fid=<id>`.
    pub async fn download(
        &self,
        token: &BearerToken,
        artifact: &ArtifactId,
    ) -> Result<Vec<u8>, GatewayApiError> {
        let response = self
            .client
            .get(self.url("download"))
            .query(&[("fid", artifact.as_str())])
            .bearer_auth(token.expose())
            .timeout(self.timeouts.download)
            .send()
            .await?;

        let bytes = Self::ensure_success(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`GatewayApiError::Rejected`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GatewayApiError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    ///
    /// Body read failures are transport errors; a body that is not the
    /// expected JSON is a decode error.
    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayApiError> {
        let bytes = Self::ensure_success(response).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Gateway for GatewayApi {
    async fn authenticate(&self, credentials: &Credentials) -> Result<BearerToken, GatewayApiError> {
        self.login(credentials).await
    }

    async fn submit(&self, token: &BearerToken, upload: Upload) -> Result<ArtifactId, GatewayApiError> {
        self.upload(token, upload).await
    }

    async fn query_status(
        &self,
        token: &BearerToken,
        source: &ArtifactId,
    ) -> Result<StatusReport, GatewayApiError> {
        self.status(token, source).await
    }

    async fn fetch_artifact(
        &self,
        token: &BearerToken,
        artifact: &ArtifactId,
    ) -> Result<Vec<u8>, GatewayApiError> {
        self.download(token, artifact).await
    }
}
