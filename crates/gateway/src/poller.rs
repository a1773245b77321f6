//! Bounded, fixed-interval polling of a conversion job.
//!
//! [`JobPoller::poll`] sleeps, asks the gateway for the job's status, and
//! repeats until the job reports completed with a result identifier or the
//! attempt budget runs out. A failed status check is just an unsuccessful
//! attempt; only a refused token ends the loop early. An optional
//! [`CancellationToken`] interrupts the wait between attempts.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vidconv_core::status::JobStatus;
use vidconv_core::types::{ArtifactId, BearerToken};

use crate::api::GatewayApiError;
use crate::gateway::Gateway;

/// Attempt budget and spacing for status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum number of status checks.
    pub max_attempts: u32,
    /// Delay before each status check.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            interval: Duration::from_secs(2),
        }
    }
}

impl PollConfig {
    /// Upper bound on how long a poll can wait, ignoring request time.
    /// Saturates at [`Duration::MAX`].
    pub fn max_wait(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

/// How a polling cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job finished and produced `result`.
    Completed { result: ArtifactId, attempts: u32 },
    /// The budget ran out (or the poll was cancelled) before completion.
    /// The job is not failed; `source` can be checked again later.
    TimedOut {
        source: ArtifactId,
        last_status: JobStatus,
        attempts: u32,
        cancelled: bool,
    },
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Completed { attempts, .. } | Self::TimedOut { attempts, .. } => *attempts,
        }
    }
}

/// Drives status checks for one job at a time.
#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    config: PollConfig,
    cancel: Option<CancellationToken>,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Stop waiting as soon as `cancel` fires. A cancelled poll returns
    /// [`PollOutcome::TimedOut`] with the last status seen.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `source` until it completes or the budget is spent.
    ///
    /// Returns `Err` only when the gateway refuses the token (401/403);
    /// more attempts cannot succeed then. Transport failures, other
    /// rejections, and malformed answers count as attempts and the loop
    /// goes on.
    pub async fn poll<G>(
        &self,
        gateway: &G,
        token: &BearerToken,
        source: &ArtifactId,
    ) -> Result<PollOutcome, GatewayApiError>
    where
        G: Gateway + ?Sized,
    {
        let mut last_status = JobStatus::Unknown;
        let mut attempts = 0u32;

        while attempts < self.config.max_attempts {
            if !self.wait().await {
                tracing::info!(
                    source_id = %source,
                    attempts,
                    last_status = %last_status,
                    "Polling cancelled",
                );
                return Ok(PollOutcome::TimedOut {
                    source: source.clone(),
                    last_status,
                    attempts,
                    cancelled: true,
                });
            }

            attempts += 1;

            match gateway.query_status(token, source).await {
                Ok(report) => {
                    last_status = report.status;
                    tracing::debug!(
                        source_id = %source,
                        attempt = attempts,
                        status = %report.status,
                        "Status check",
                    );

                    if report.status.is_terminal() {
                        match report.result {
                            Some(result) => {
                                tracing::info!(
                                    source_id = %source,
                                    result_id = %result,
                                    attempts,
                                    "Conversion completed",
                                );
                                return Ok(PollOutcome::Completed { result, attempts });
                            }
                            None => {
                                tracing::warn!(
                                    source_id = %source,
                                    attempt = attempts,
                                    "Job reported completed without a result id",
                                );
                            }
                        }
                    }
                }
                Err(e) if e.is_unauthorized() => {
                    tracing::warn!(source_id = %source, error = %e, "Status check refused");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        source_id = %source,
                        error = %e,
                        "Status check {attempts}/{} failed",
                        self.config.max_attempts,
                    );
                }
            }
        }

        tracing::info!(
            source_id = %source,
            attempts,
            last_status = %last_status,
            "Poll budget exhausted",
        );

        Ok(PollOutcome::TimedOut {
            source: source.clone(),
            last_status,
            attempts,
            cancelled: false,
        })
    }

    /// Sleep for one interval. Returns `false` if cancelled first.
    async fn wait(&self) -> bool {
        match &self.cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = tokio::time::sleep(self.config.interval) => true,
            },
            None => {
                tokio::time::sleep(self.config.interval).await;
                true
            }
        }
    }
}
