use std::path::PathBuf;

use vidconv_core::error::CoreError;
use vidconv_core::types::{ArtifactId, Credentials};
use vidconv_gateway::config::{ConfigError, GatewayConfig};

/// Default directory downloaded MP3s are written to.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// What a single run does after logging in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Upload this video, wait for the conversion, download the MP3.
    Convert(PathBuf),
    /// Download an artifact that already exists on the gateway.
    Fetch(ArtifactId),
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("Set exactly one of VIDCONV_INPUT or VIDCONV_FETCH_ID")]
    AmbiguousTask,

    #[error("VIDCONV_FETCH_ID is not a valid artifact id: {0}")]
    InvalidFetchId(#[source] CoreError),

    #[error(transparent)]
    Gateway(#[from] ConfigError),
}

/// Everything the runner needs, loaded from environment variables.
///
/// | Env Var              | Required | Default | Description                        |
/// |----------------------|----------|---------|------------------------------------|
/// | `VIDCONV_EMAIL`      | yes      | --      | Gateway account username           |
/// | `VIDCONV_PASSWORD`   | yes      | --      | Gateway account password           |
/// | `VIDCONV_INPUT`      | one of   | --      | Video file to convert              |
/// | `VIDCONV_FETCH_ID`   | one of   | --      | Existing MP3 id to download        |
/// | `VIDCONV_OUTPUT_DIR` | no       | `.`     | Where the MP3 is written           |
///
/// Gateway variables are read by [`GatewayConfig::from_lookup`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub credentials: Credentials,
    pub task: Task,
    pub output_dir: PathBuf,
    pub gateway: GatewayConfig,
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self, RunnerConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, RunnerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let username =
            non_empty("VIDCONV_EMAIL").ok_or(RunnerConfigError::Missing("VIDCONV_EMAIL"))?;
        // Secrets are passed through untrimmed.
        let secret = lookup("VIDCONV_PASSWORD")
            .filter(|v| !v.is_empty())
            .ok_or(RunnerConfigError::Missing("VIDCONV_PASSWORD"))?;

        // Ids are opaque; the value is used exactly as given.
        let fetch_id = non_empty("VIDCONV_FETCH_ID")
            .map(ArtifactId::new)
            .transpose()
            .map_err(RunnerConfigError::InvalidFetchId)?;
        let task = match (non_empty("VIDCONV_INPUT"), fetch_id) {
            (Some(input), None) => Task::Convert(PathBuf::from(input)),
            (None, Some(id)) => Task::Fetch(id),
            (Some(_), Some(_)) => return Err(RunnerConfigError::AmbiguousTask),
            (None, None) => return Err(RunnerConfigError::Missing("VIDCONV_INPUT")),
        };

        let output_dir = PathBuf::from(
            non_empty("VIDCONV_OUTPUT_DIR").unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into()),
        );

        Ok(Self {
            credentials: Credentials::new(username.trim(), secret),
            task,
            output_dir,
            gateway: GatewayConfig::from_lookup(&lookup)?,
        })
    }
}
