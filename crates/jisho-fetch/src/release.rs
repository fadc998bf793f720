use std::path::{Path, PathBuf};
use std::time::Duration;

use jisho_config::network::NetworkConfig;
use jisho_core::StageOutcome;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{DatasetFetcher, FetchError, ProgressFn, download_to};

/// Downloadable dataset archive from a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
    pub size: u64,
    /// Release tag, used as the dataset version
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: u64,
}

/// Pick the asset following the configured prefix/suffix naming convention
fn select_asset(release: Release, config: &NetworkConfig) -> Result<ReleaseAsset, FetchError> {
    let Release { tag_name, assets } = release;

    assets
        .into_iter()
        .find(|a| config.matches_asset(&a.name))
        .map(|a| ReleaseAsset {
            name: a.name,
            download_url: a.browser_download_url,
            size: a.size,
            version: tag_name,
        })
        .ok_or_else(|| FetchError::NotFound {
            prefix: config.asset_prefix.clone(),
            suffix: config.asset_suffix.clone(),
        })
}

/// Fetches jmdict-simplified archives from GitHub releases
#[derive(Clone)]
pub struct GithubReleaseFetcher {
    client: reqwest::Client,
    config: NetworkConfig,
}

impl GithubReleaseFetcher {
    pub fn new(config: NetworkConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .read_timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl DatasetFetcher for GithubReleaseFetcher {
    async fn resolve_latest(&self) -> Result<ReleaseAsset, FetchError> {
        tracing::info!("Querying release metadata at {}", self.config.release_url);

        let response = self
            .client
            .get(&self.config.release_url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                status: response.status().as_u16(),
                url: self.config.release_url.clone(),
            });
        }

        let release: Release = response.json().await?;
        let asset = select_asset(release, &self.config)?;

        tracing::info!("Latest dataset: {} ({})", asset.name, asset.version);
        Ok(asset)
    }

    async fn download(
        &self,
        asset: &ReleaseAsset,
        destination: &Path,
        on_progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome<PathBuf>, FetchError> {
        download_to(
            &self.client,
            &asset.download_url,
            destination,
            on_progress,
            cancel,
        )
        .await
    }
}
