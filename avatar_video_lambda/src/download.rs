use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to write download: {0}")]
    Io(#[from] std::io::Error),
}

/// Stream the body at `url` into `destination`.
///
/// # Returns
/// The number of bytes written.
///
/// # Errors
/// - `DownloadError::Http` for transport failures and non-success statuses.
/// - `DownloadError::Io` if the file cannot be written.
pub async fn download_to_file(
    http: &reqwest::Client,
    url: &str,
    destination: &Path,
) -> Result<u64, DownloadError> {
    let mut response = http.get(url).send().await?.error_for_status()?;

    let mut file = tokio::fs::File::create(destination).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    tracing::info!(
        "Downloaded {} to {} ({} bytes)",
        url,
        destination.display(),
        written
    );

    Ok(written)
}
