//! Login → upload → poll → download orchestration for one user session.
//!
//! [`Workflow`] owns the session's [`CredentialStore`], a [`JobPoller`],
//! and the [`SessionState`] machine. Every operation either advances the
//! state machine or records an [`ErrorReport`]; nothing fails silently.
//! The accessors (`state`, `last_job`, `last_download`, `last_error`) are
//! what a presentation layer renders.
//!
//! Retrieval does not depend on job state: [`Workflow::fetch`] downloads
//! any artifact the gateway knows about, including results of jobs from
//! earlier sessions or jobs whose polling timed out.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use vidconv_core::credentials::CredentialStore;
use vidconv_core::media::{audio_file_name, AUDIO_MIME_TYPE};
use vidconv_core::status::JobStatus;
use vidconv_core::types::{ArtifactId, BearerToken, Credentials, Timestamp};
use vidconv_core::workflow_state::{transition, Effect, SessionState, WorkflowEvent};

use crate::api::GatewayApiError;
use crate::gateway::Gateway;
use crate::poller::{JobPoller, PollConfig, PollOutcome};
use crate::upload::{Upload, UploadError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The gateway refused the username/secret.
    #[error("Login failed: {0}")]
    AuthFailure(String),

    /// An authorized operation was attempted without a token.
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("A conversion is already pending for {0}")]
    JobInFlight(ArtifactId),

    #[error("No conversion is pending")]
    NoPendingJob,

    #[error("Invalid upload: {0}")]
    InvalidUpload(#[from] UploadError),

    #[error(transparent)]
    Gateway(#[from] GatewayApiError),
}

/// Coarse error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthFailure,
    NotAuthenticated,
    TransportFailure,
    RemoteRejected,
    Decode,
    PollTimedOut,
    InvalidUpload,
    InvalidState,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthFailure(_) => ErrorKind::AuthFailure,
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::JobInFlight(_) | Self::NoPendingJob => ErrorKind::InvalidState,
            Self::InvalidUpload(_) => ErrorKind::InvalidUpload,
            Self::Gateway(GatewayApiError::Transport(_)) => ErrorKind::TransportFailure,
            Self::Gateway(GatewayApiError::Rejected { .. }) => ErrorKind::RemoteRejected,
            Self::Gateway(GatewayApiError::Decode(_)) => ErrorKind::Decode,
        }
    }
}

/// The most recent failure, as shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    pub at: Timestamp,
}

impl ErrorReport {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            at: chrono::Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Presentation snapshots
// ---------------------------------------------------------------------------

/// The last submitted job as far as this client knows.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub source: ArtifactId,
    pub status: JobStatus,
    pub result: Option<ArtifactId>,
    /// Status checks made during the last polling cycle.
    pub attempts: u32,
    pub submitted_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

/// Bytes of a downloaded artifact plus how to save them.
#[derive(Clone)]
pub struct DownloadedArtifact {
    pub artifact_id: ArtifactId,
    /// Suggested file name, `<artifactId>.mp3`.
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl DownloadedArtifact {
    fn new(artifact_id: ArtifactId, bytes: Vec<u8>) -> Self {
        Self {
            file_name: audio_file_name(&artifact_id),
            artifact_id,
            mime_type: AUDIO_MIME_TYPE,
            bytes,
        }
    }

    /// Write the bytes to `dir/<file_name>`, returning the full path.
    ///
    /// The name comes from a gateway-supplied id, so it must be a single
    /// plain path component; anything that would land outside `dir` is
    /// refused with [`std::io::ErrorKind::InvalidInput`].
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let mut components = Path::new(&self.file_name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to save {:?} outside the output directory", self.file_name),
            ));
        }

        let path = dir.as_ref().join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

impl std::fmt::Debug for DownloadedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadedArtifact")
            .field("artifact_id", &self.artifact_id)
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Result of [`Workflow::convert`] / [`Workflow::wait_for_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Completed {
        source: ArtifactId,
        result: ArtifactId,
    },
    /// Polling gave up; the conversion may still finish server-side.
    /// Retrieve it later with [`Workflow::fetch`].
    Pending {
        source: ArtifactId,
        last_status: JobStatus,
    },
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

pub struct Workflow<G> {
    gateway: G,
    credentials: CredentialStore,
    poller: JobPoller,
    state: SessionState,
    last_job: Option<JobSnapshot>,
    last_download: Option<DownloadedArtifact>,
    last_error: Option<ErrorReport>,
}

impl<G: Gateway> Workflow<G> {
    /// Start an unauthenticated session against `gateway`.
    pub fn new(gateway: G, poll: PollConfig) -> Self {
        Self {
            gateway,
            credentials: CredentialStore::new(),
            poller: JobPoller::new(poll),
            state: SessionState::Unauthenticated,
            last_job: None,
            last_download: None,
            last_error: None,
        }
    }

    /// Let `cancel` interrupt polling. A cancelled poll ends like a timed
    /// out one.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.poller = self.poller.with_cancellation(cancel);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    pub fn last_job(&self) -> Option<&JobSnapshot> {
        self.last_job.as_ref()
    }

    pub fn last_download(&self) -> Option<&DownloadedArtifact> {
        self.last_download.as_ref()
    }

    pub fn last_error(&self) -> Option<&ErrorReport> {
        self.last_error.as_ref()
    }

    /// Authenticate and keep the returned token for later calls.
    ///
    /// On failure the current session, including any previous token, is
    /// left untouched.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), WorkflowError> {
        self.last_error = None;

        match self.gateway.authenticate(credentials).await {
            Ok(token) => {
                tracing::info!(username = %credentials.username, "Logged in");
                self.apply(WorkflowEvent::LoginSucceeded(token));
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                let message = match &e {
                    GatewayApiError::Rejected { body, .. } if !body.is_empty() => body.clone(),
                    _ => e.to_string(),
                };
                Err(self.fail(WorkflowError::AuthFailure(message)))
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Forget the token and the last job.
    pub fn logout(&mut self) {
        tracing::info!("Logged out");
        self.last_error = None;
        self.apply(WorkflowEvent::LoggedOut);
    }

    /// Upload a video and wait for its conversion.
    pub async fn convert(&mut self, upload: Upload) -> Result<ConversionOutcome, WorkflowError> {
        self.submit(upload).await?;
        self.wait_for_result().await
    }

    /// Upload a video. Moves the session to `JobPending`.
    ///
    /// The upload is consumed even if the request fails; submit is never
    /// retried here because the gateway does not deduplicate.
    pub async fn submit(&mut self, upload: Upload) -> Result<ArtifactId, WorkflowError> {
        self.last_error = None;
        let token = self.require_token()?;

        if let SessionState::JobPending { source } = &self.state {
            let source = source.clone();
            return Err(self.fail(WorkflowError::JobInFlight(source)));
        }

        let file_name = upload.file_name().to_string();
        match self.gateway.submit(&token, upload).await {
            Ok(source) => {
                tracing::info!(file_name = %file_name, source_id = %source, "Video submitted");
                self.apply(WorkflowEvent::Submitted {
                    source: source.clone(),
                });
                Ok(source)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Poll the pending job until it completes or the budget is spent.
    ///
    /// A timed-out poll is not an error: the session returns to idle with
    /// the source id and last status kept in [`last_job`](Self::last_job).
    pub async fn wait_for_result(&mut self) -> Result<ConversionOutcome, WorkflowError> {
        self.last_error = None;
        let token = self.require_token()?;

        let source = match &self.state {
            SessionState::JobPending { source } => source.clone(),
            _ => return Err(self.fail(WorkflowError::NoPendingJob)),
        };

        let outcome = match self.poller.poll(&self.gateway, &token, &source).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e.into())),
        };

        if let Some(job) = self.last_job.as_mut() {
            job.attempts = outcome.attempts();
        }

        match outcome {
            PollOutcome::Completed { result, .. } => {
                self.apply(WorkflowEvent::PollCompleted {
                    source: source.clone(),
                    result: result.clone(),
                });
                Ok(ConversionOutcome::Completed { source, result })
            }
            PollOutcome::TimedOut {
                last_status,
                attempts,
                cancelled,
                ..
            } => {
                tracing::warn!(
                    source_id = %source,
                    attempts,
                    cancelled,
                    last_status = %last_status,
                    "Conversion still pending; retrieve it later by id",
                );
                self.apply(WorkflowEvent::PollTimedOut {
                    source: source.clone(),
                    last_status,
                });
                Ok(ConversionOutcome::Pending {
                    source,
                    last_status,
                })
            }
        }
    }

    /// Download any artifact by identifier, independent of job state.
    pub async fn fetch(&mut self, artifact: &ArtifactId) -> Result<&DownloadedArtifact, WorkflowError> {
        self.last_error = None;
        let token = self.require_token()?;

        match self.gateway.fetch_artifact(&token, artifact).await {
            Ok(bytes) => {
                tracing::info!(artifact_id = %artifact, size = bytes.len(), "Artifact downloaded");
                let download = self
                    .last_download
                    .insert(DownloadedArtifact::new(artifact.clone(), bytes));
                Ok(&*download)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    // ---- private helpers ----

    /// Clone the current token, or fail without touching the network.
    fn require_token(&mut self) -> Result<BearerToken, WorkflowError> {
        match self.credentials.token() {
            Some(token) => Ok(token.clone()),
            None => Err(self.fail(WorkflowError::NotAuthenticated)),
        }
    }

    /// Record a failure for display and hand the error back.
    fn fail(&mut self, error: WorkflowError) -> WorkflowError {
        tracing::warn!(kind = ?error.kind(), error = %error, "Workflow operation failed");
        self.last_error = Some(ErrorReport::new(error.kind(), error.to_string()));
        self.apply(WorkflowEvent::Failed);
        error
    }

    fn apply(&mut self, event: WorkflowEvent) {
        let (next, effect) = transition(&self.state, event);
        self.state = next;

        match effect {
            Effect::StoreToken(token) => self.credentials.set_token(token),
            Effect::ClearSession => {
                self.credentials.clear();
                self.last_job = None;
            }
            Effect::TrackJob(source) => {
                self.last_job = Some(JobSnapshot {
                    source,
                    status: JobStatus::Submitted,
                    result: None,
                    attempts: 0,
                    submitted_at: chrono::Utc::now(),
                    finished_at: None,
                });
            }
            Effect::ExposeResult(result) => {
                if let Some(job) = self.last_job.as_mut() {
                    job.status = JobStatus::Completed;
                    job.result = Some(result);
                    job.finished_at = Some(chrono::Utc::now());
                }
            }
            Effect::ExposePending {
                source,
                last_status,
            } => {
                if let Some(job) = self.last_job.as_mut() {
                    job.status = last_status;
                    job.finished_at = Some(chrono::Utc::now());
                }
                self.last_error = Some(ErrorReport::new(
                    ErrorKind::PollTimedOut,
                    format!(
                        "Conversion of {source} is taking longer than expected (last status: {last_status})"
                    ),
                ));
            }
            Effect::None => {}
            Effect::Ignored => {
                tracing::debug!(state = ?self.state, "Event ignored in current state");
            }
        }
    }
}
