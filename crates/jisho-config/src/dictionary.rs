use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{env_flag, env_or};

/// Local storage and query limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Directory holding the archive, the raw JSON and the compiled store
    pub data_dir: PathBuf,
    pub raw_file: String,
    pub store_file: String,
    /// Results returned per query
    pub max_results: usize,
    /// Entry count used for indexing progress, the exact count is unknown upfront
    pub estimated_entries: u64,
    /// Entries between progress reports and cancellation checks
    pub progress_interval: u64,
    /// Keep the downloaded archive and raw JSON after an update
    pub keep_artifacts: bool,
}

impl DictionaryConfig {
    pub fn new() -> Self {
        let data_dir = env::var("JISHO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".jisho"));

        Self {
            data_dir,
            raw_file: "jmdict.json".to_string(),
            store_file: "jisho.sqlite3".to_string(),
            max_results: env_or("JISHO_MAX_RESULTS", 20),
            estimated_entries: env_or("JISHO_ESTIMATED_ENTRIES", 210_000),
            progress_interval: 1000,
            keep_artifacts: env_flag("JISHO_KEEP_ARTIFACTS"),
        }
    }

    /// Downloaded archives keep their release asset name
    pub fn archive_path(&self, asset_name: &str) -> PathBuf {
        self.data_dir.join(asset_name)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.data_dir.join(&self.raw_file)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self::new()
    }
}
