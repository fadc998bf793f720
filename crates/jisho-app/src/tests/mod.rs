//! Service-level tests against a local archive instead of the network

mod service_tests;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;
use jisho_config::dictionary::DictionaryConfig;
use jisho_core::StageOutcome;
use jisho_fetch::{DatasetFetcher, FetchError, ProgressFn, ReleaseAsset};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::service::DictionaryService;

pub(crate) const SAMPLE: &str = r#"{
  "version": "3.6.1",
  "dictDate": "2025-01-06",
  "tags": { "n": "noun (common) (futsuumeishi)", "v1": "Ichidan verb" },
  "words": [
    {"id": "1467640", "kanji": [{"common": true, "text": "猫"}], "kana": [{"common": true, "text": "ねこ"}],
     "sense": [{"partOfSpeech": ["n"], "gloss": [{"lang": "eng", "text": "cat"}]}]},
    {"id": "1078500", "kanji": [], "kana": [{"common": false, "text": "キャット"}],
     "sense": [{"partOfSpeech": ["n"], "gloss": [{"lang": "eng", "text": "cat"}]}]},
    {"id": "1358280", "kanji": [{"common": true, "text": "食べる"}], "kana": [{"common": true, "text": "たべる"}],
     "sense": [{"partOfSpeech": ["v1"], "gloss": [{"lang": "eng", "text": "to eat"}]}]}
  ]
}"#;

pub(crate) const ASSET_NAME: &str = "jmdict-examples-eng-3.6.1.json.tgz";

/// Write a `.tgz` holding the given `(name, contents)` members
pub(crate) fn write_archive(path: &Path, members: &[(&str, &str)]) {
    let gz = GzEncoder::new(File::create(path).unwrap(), Compression::fast());
    let mut builder = tar::Builder::new(gz);
    for (name, data) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append_data(&mut header, name, data.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Serves a prepared archive from disk
pub(crate) struct LocalFetcher {
    pub archive: PathBuf,
    /// Fire the update's token once the download has started
    pub cancel_during_download: bool,
    /// When set, `resolve_latest` waits for a notification
    pub gate: Option<Arc<Notify>>,
}

impl LocalFetcher {
    pub fn new(archive: PathBuf) -> Self {
        Self {
            archive,
            cancel_during_download: false,
            gate: None,
        }
    }
}

#[async_trait::async_trait]
impl DatasetFetcher for LocalFetcher {
    async fn resolve_latest(&self) -> Result<ReleaseAsset, FetchError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(ReleaseAsset {
            name: ASSET_NAME.into(),
            download_url: self.archive.display().to_string(),
            size: std::fs::metadata(&self.archive)?.len(),
            version: "3.6.1+test".into(),
        })
    }

    async fn download(
        &self,
        _asset: &ReleaseAsset,
        destination: &Path,
        on_progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome<PathBuf>, FetchError> {
        if cancel.is_cancelled() {
            return Ok(StageOutcome::Cancelled);
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&self.archive, destination).await?;
        on_progress(0.5);
        on_progress(1.0);
        if self.cancel_during_download {
            cancel.cancel();
        }
        Ok(StageOutcome::Completed(destination.to_path_buf()))
    }
}

pub(crate) fn dictionary_config(data_dir: &Path) -> DictionaryConfig {
    DictionaryConfig {
        data_dir: data_dir.to_path_buf(),
        raw_file: "jmdict.json".into(),
        store_file: "jisho.sqlite3".into(),
        max_results: 20,
        estimated_entries: 3,
        progress_interval: 1,
        keep_artifacts: false,
    }
}

/// Service over `data/` in a scratch directory, fed by `source.tgz`
pub(crate) fn service_with(
    dir: &Path,
    members: &[(&str, &str)],
    configure: impl FnOnce(&mut LocalFetcher),
) -> DictionaryService {
    let archive = dir.join("source.tgz");
    write_archive(&archive, members);
    let mut fetcher = LocalFetcher::new(archive);
    configure(&mut fetcher);
    DictionaryService::new(dictionary_config(&dir.join("data")), Arc::new(fetcher))
}
