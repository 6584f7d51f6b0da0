//! Authenticate, list, download

use crate::api::ZoomClient;
use crate::config::Config;
use crate::download::{DownloadReport, download_all};
use crate::error::PipelineError;

/// One full run. Authentication and listing failures end the run; download
/// failures are collected in the report.
pub async fn run(config: &Config) -> Result<DownloadReport, PipelineError> {
    let mut client = ZoomClient::new(
        config.credentials.clone(),
        config.endpoints.clone(),
        config.timeout,
    )
    .map_err(PipelineError::HttpClient)?;

    client.authenticate().await?;

    tracing::info!("Recording path is {}", config.output_dir.display());
    let recordings = client
        .list_recordings(&config.range, &config.channel_type)
        .await?;
    if recordings.is_empty() {
        tracing::info!("No recordings found in {}", config.range);
    }

    Ok(download_all(&mut client, &recordings, &config.output_dir).await)
}
