use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use jisho_core::StageOutcome;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;

use crate::{FetchError, ProgressFn, finish_partial, partial_path};

/// Stream `url` to `destination`, reporting `downloaded / total` per chunk.
///
/// The body is written to a `.part` sibling first and renamed on completion.
pub async fn download_to(
    client: &reqwest::Client,
    url: &str,
    destination: &Path,
    on_progress: ProgressFn<'_>,
    cancel: &CancellationToken,
) -> Result<StageOutcome<PathBuf>, FetchError> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(destination);
    let result = stream_body(client, url, &partial, on_progress, cancel).await;

    if let Ok(StageOutcome::Completed(bytes)) = &result {
        tracing::info!("Downloaded {} bytes to {}", bytes, destination.display());
    }

    finish_partial(&partial, destination, result)
}

async fn stream_body(
    client: &reqwest::Client,
    url: &str,
    partial: &Path,
    on_progress: ProgressFn<'_>,
    cancel: &CancellationToken,
) -> Result<StageOutcome<u64>, FetchError> {
    tracing::info!("Downloading {}", url);

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(StageOutcome::Cancelled),
        response = client.get(url).send() => response?,
    };

    if !response.status().is_success() {
        return Err(FetchError::Http {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    let total = response.content_length().filter(|len| *len > 0);
    let file = tokio::fs::File::create(partial).await?;
    let mut writer = BufWriter::with_capacity(128 * 1024, file);
    let mut stream = response.bytes_stream();
    let mut downloaded = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            chunk = stream.next() => Some(chunk),
        };

        // Stream and writer are dropped on return, closing the connection and the file
        let Some(chunk) = next else {
            return Ok(StageOutcome::Cancelled);
        };
        let Some(chunk) = chunk else {
            break;
        };

        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        match total {
            Some(total) => on_progress(downloaded as f64 / total as f64),
            None => on_progress(0.0),
        }
    }

    writer.flush().await?;
    writer.get_ref().sync_all().await?;

    Ok(StageOutcome::Completed(downloaded))
}
