//! Transport seam between the workflow and the gateway service.
//!
//! [`GatewayApi`](crate::api::GatewayApi) is the HTTP implementation. The
//! poller and workflow only depend on this trait, so tests can script
//! gateway behaviour without a network.

use async_trait::async_trait;
use vidconv_core::status::JobStatus;
use vidconv_core::types::{ArtifactId, BearerToken, Credentials};

use crate::api::GatewayApiError;
use crate::upload::Upload;

/// One answer from the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: JobStatus,
    /// Converted artifact, present once the job has completed.
    pub result: Option<ArtifactId>,
}

/// The four gateway operations. Implementations hold no per-call state and
/// never retry internally.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<BearerToken, GatewayApiError>;

    /// Upload a video; returns the gateway's identifier for the stored source.
    async fn submit(&self, token: &BearerToken, upload: Upload) -> Result<ArtifactId, GatewayApiError>;

    async fn query_status(
        &self,
        token: &BearerToken,
        source: &ArtifactId,
    ) -> Result<StatusReport, GatewayApiError>;

    async fn fetch_artifact(
        &self,
        token: &BearerToken,
        artifact: &ArtifactId,
    ) -> Result<Vec<u8>, GatewayApiError>;
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for std::sync::Arc<G> {
    async fn authenticate(&self, credentials: &Credentials) -> Result<BearerToken, GatewayApiError> {
        (**self).authenticate(credentials).await
    }

    async fn submit(&self, token: &BearerToken, upload: Upload) -> Result<ArtifactId, GatewayApiError> {
        (**self).submit(token, upload).await
    }

    async fn query_status(
        &self,
        token: &BearerToken,
        source: &ArtifactId,
    ) -> Result<StatusReport, GatewayApiError> {
        (**self).query_status(token, source).await
    }

    async fn fetch_artifact(
        &self,
        token: &BearerToken,
        artifact: &ArtifactId,
    ) -> Result<Vec<u8>, GatewayApiError> {
        (**self).fetch_artifact(token, artifact).await
    }
}
