//! `vidconv-runner` -- converts one video to MP3 through the gateway.
//!
//! Logs in, uploads `VIDCONV_INPUT`, polls until the conversion finishes,
//! and writes `<mp3_id>.mp3` into `VIDCONV_OUTPUT_DIR`. With
//! `VIDCONV_FETCH_ID` set instead it only downloads that MP3.
//!
//! # Exit codes
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | `0`  | MP3 saved                                            |
//! | `1`  | configuration or workflow error                      |
//! | `2`  | conversion still pending when polling gave up        |
//!
//! Ctrl-C during polling stops waiting and exits with code `2`.

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidconv_runner::{run, RunReport, RunnerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidconv_runner=info,vidconv_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RunnerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        gateway = %config.gateway.base_url,
        username = %config.credentials.username,
        task = ?config.task,
        "Starting vidconv-runner",
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, giving up on polling");
            ctrl_c.cancel();
        }
    });

    match run(&config, cancel).await {
        Ok(RunReport::Saved { artifact, path }) => {
            println!("{artifact} -> {}", path.display());
        }
        Ok(RunReport::Pending {
            source,
            last_status,
        }) => {
            println!("{source} still {last_status}; fetch the MP3 later by its id");
            std::process::exit(2);
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            std::process::exit(1);
        }
    }
}
