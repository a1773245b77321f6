//! Headless driver for the conversion workflow.
//!
//! One run logs in, then either converts a local video and downloads the
//! resulting MP3, or downloads an MP3 that already exists on the gateway.

pub mod config;

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use vidconv_core::status::JobStatus;
use vidconv_core::types::ArtifactId;
use vidconv_gateway::api::GatewayApi;
use vidconv_gateway::upload::Upload;
use vidconv_gateway::workflow::{ConversionOutcome, Workflow, WorkflowError};

pub use config::{RunnerConfig, RunnerConfigError, Task};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Failed to write {path}: {source}")]
    Save {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// How a run ended when nothing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// The MP3 was downloaded and written to `path`.
    Saved { artifact: ArtifactId, path: PathBuf },
    /// Polling gave up before the conversion finished. Re-run with
    /// `VIDCONV_FETCH_ID` once it has.
    Pending {
        source: ArtifactId,
        last_status: JobStatus,
    },
}

/// Execute one run. `cancel` stops polling early; the run then reports
/// the job as pending.
pub async fn run(config: &RunnerConfig, cancel: CancellationToken) -> Result<RunReport, RunnerError> {
    let api = GatewayApi::from_config(&config.gateway);
    let mut workflow = Workflow::new(api, config.gateway.poll).with_cancellation(cancel);

    workflow.login(&config.credentials).await?;

    let artifact = match &config.task {
        Task::Fetch(id) => id.clone(),
        Task::Convert(input) => {
            let upload = Upload::from_path(input).await.map_err(WorkflowError::from)?;
            tracing::info!(
                file_name = upload.file_name(),
                size = upload.size(),
                max_wait_secs = config.gateway.poll.max_wait().as_secs(),
                "Converting video",
            );

            match workflow.convert(upload).await? {
                ConversionOutcome::Completed { result, .. } => result,
                ConversionOutcome::Pending {
                    source,
                    last_status,
                } => {
                    workflow.logout();
                    return Ok(RunReport::Pending {
                        source,
                        last_status,
                    });
                }
            }
        }
    };

    let download = workflow.fetch(&artifact).await?;
    let path = download
        .save_to(&config.output_dir)
        .await
        .map_err(|source| RunnerError::Save {
            path: config.output_dir.join(&download.file_name).display().to_string(),
            source,
        })?;

    tracing::info!(artifact_id = %artifact, path = %path.display(), "MP3 saved");
    workflow.logout();

    Ok(RunReport::Saved { artifact, path })
}
