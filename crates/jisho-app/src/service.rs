use std::path::{Path, PathBuf};
use std::sync::Arc;

use jisho_config::Config;
use jisho_config::dictionary::DictionaryConfig;
use jisho_core::{FailureKind, Stage, StageOutcome, StatusReporter, UpdateStatus};
use jisho_fetch::{DatasetFetcher, FetchError, GithubReleaseFetcher, extract_single_entry};
use jisho_lang_japanese::{IndexOptions, IndexSummary, QueryEngine, StoreError, rebuild_index};
use jisho_types::{DatasetMetadata, RankedEntry};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

pub const CANCELLED_MESSAGE: &str = "Update cancelled";
pub const BUSY_MESSAGE: &str = "A dictionary update is already running";

/// Outcome of one `update_dictionary` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub success: bool,
    pub message: String,
    /// Stopped by the caller's token; not a failure even though `success` is false
    #[serde(default)]
    pub cancelled: bool,
}

impl UpdateReport {
    fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            cancelled: false,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            cancelled: false,
        }
    }

    fn cancelled() -> Self {
        Self {
            success: false,
            message: CANCELLED_MESSAGE.to_string(),
            cancelled: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum UpdateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Background task failed: {0}")]
    Task(#[from] JoinError),
}

impl UpdateError {
    fn kind(&self) -> FailureKind {
        match self {
            UpdateError::Fetch(e) => e.kind(),
            UpdateError::Store(e) => e.kind(),
            UpdateError::Task(_) => FailureKind::Io,
        }
    }
}

fn join_error(e: JoinError) -> StoreError {
    StoreError::Io(std::io::Error::other(e))
}

/// Owns the update pipeline and the open store generation.
///
/// At most one update runs at a time. Searches share the current
/// [`QueryEngine`] through an `Arc`, so a search that started before a
/// rebuild finishes on the generation it started with.
pub struct DictionaryService {
    config: DictionaryConfig,
    fetcher: Arc<dyn DatasetFetcher>,
    status: StatusReporter,
    build_lock: Mutex<()>,
    engine: RwLock<Option<Arc<QueryEngine>>>,
}

impl DictionaryService {
    pub fn new(config: DictionaryConfig, fetcher: Arc<dyn DatasetFetcher>) -> Self {
        Self {
            config,
            fetcher,
            status: StatusReporter::new(),
            build_lock: Mutex::new(()),
            engine: RwLock::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let fetcher = GithubReleaseFetcher::new(config.network.clone())?;
        Ok(Self::new(config.dictionary.clone(), Arc::new(fetcher)))
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdateStatus> {
        self.status.subscribe()
    }

    /// Fetch the latest dataset and rebuild the store.
    ///
    /// Never returns an error: failures and cancellation are reported through
    /// the returned [`UpdateReport`] and the status channel.
    pub async fn update_dictionary(&self, cancel: &CancellationToken) -> UpdateReport {
        // The running update owns the status channel, so nothing is published here
        let Ok(_guard) = self.build_lock.try_lock() else {
            tracing::warn!("{}", BUSY_MESSAGE);
            return UpdateReport::failure(BUSY_MESSAGE);
        };

        let mut artifacts = Vec::new();
        let result = self.run_update(cancel, &mut artifacts).await;

        if !self.config.keep_artifacts {
            for path in &artifacts {
                remove_artifact(path).await;
            }
        }

        match result {
            Ok(StageOutcome::Completed(summary)) => {
                let message = format!("Dictionary updated: {} entries", summary.entries);
                self.status.succeed(&message);
                UpdateReport::success(message)
            }
            Ok(StageOutcome::Cancelled) => {
                self.status.cancel();
                UpdateReport::cancelled()
            }
            Err(e) => {
                let kind = e.kind();
                self.status.fail(kind, e.to_string());
                UpdateReport::failure(format!("Update failed ({kind}): {e}"))
            }
        }
    }

    async fn run_update(
        &self,
        cancel: &CancellationToken,
        artifacts: &mut Vec<PathBuf>,
    ) -> Result<StageOutcome<IndexSummary>, UpdateError> {
        self.status.begin(Stage::Resolving);
        let asset = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StageOutcome::Cancelled),
            asset = self.fetcher.resolve_latest() => asset?,
        };

        self.status.begin(Stage::Downloading);
        let archive = self.config.archive_path(&asset.name);
        artifacts.push(archive.clone());
        let status = self.status.clone();
        let on_download = move |p: f64| status.progress(Stage::Downloading, p);
        let downloaded = self
            .fetcher
            .download(&asset, &archive, &on_download, cancel)
            .await?;
        if downloaded.is_cancelled() {
            return Ok(StageOutcome::Cancelled);
        }

        self.status.begin(Stage::Extracting);
        let raw = self.config.raw_path();
        artifacts.push(raw.clone());
        let extracted = {
            let (archive, raw, cancel) = (archive.clone(), raw.clone(), cancel.clone());
            tokio::task::spawn_blocking(move || extract_single_entry(&archive, &raw, &cancel))
                .await??
        };
        if extracted.is_cancelled() {
            return Ok(StageOutcome::Cancelled);
        }

        self.status.begin(Stage::Indexing);
        let store = self.config.store_path();
        let options = IndexOptions {
            estimated_total: self.config.estimated_entries,
            progress_interval: self.config.progress_interval,
        };
        let outcome = {
            let (status, cancel) = (self.status.clone(), cancel.clone());
            tokio::task::spawn_blocking(move || {
                rebuild_index(
                    &raw,
                    &store,
                    &options,
                    &|p: f64| status.progress(Stage::Indexing, p),
                    &cancel,
                )
            })
            .await??
        };

        if !outcome.is_cancelled() {
            // Next search opens the new generation; in-flight ones keep the old handle
            self.engine.write().await.take();
            tracing::info!("Dictionary generation swapped, version {}", asset.version);
        }
        Ok(outcome)
    }

    /// True when a built store exists and opens
    pub async fn is_dictionary_ready(&self) -> bool {
        match self.engine().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Dictionary not ready: {}", e);
                false
            }
        }
    }

    pub async fn metadata(&self) -> Option<DatasetMetadata> {
        self.engine().await.ok().map(|e| e.metadata().clone())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<RankedEntry>, StoreError> {
        let engine = self.engine().await?;
        let query = query.to_string();
        tokio::task::spawn_blocking(move || engine.search(&query))
            .await
            .map_err(join_error)?
    }

    async fn engine(&self) -> Result<Arc<QueryEngine>, StoreError> {
        if let Some(engine) = self.engine.read().await.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let mut slot = self.engine.write().await;
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let path = self.config.store_path();
        let max_results = self.config.max_results;
        let engine = tokio::task::spawn_blocking(move || {
            QueryEngine::open(&path).map(|e| e.with_max_results(max_results))
        })
        .await
        .map_err(join_error)??;

        let engine = Arc::new(engine);
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }
}

async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
