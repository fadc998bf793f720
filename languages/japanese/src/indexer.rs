//! Builds a searchable store generation from the raw dataset.
//!
//! A build writes into a uniquely named `.building` file next to the store
//! and is renamed over the live store only after a successful commit. Readers
//! holding the previous file keep seeing the previous generation.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use jisho_core::{DefaultPreprocessor, Preprocessor, StageOutcome};
use jisho_types::DictionaryEntry;
use rusqlite::{Connection, params};
use tokio_util::sync::CancellationToken;

use crate::error::{LoadError, StoreError};
use crate::kana::normalize_kana;
use crate::loader::{JmdictMetadata, JmdictReader};
use crate::schema;

const BUILDING_SUFFIX: &str = ".building";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    /// Expected entry count, the denominator for progress
    pub estimated_total: u64,
    /// Entries between progress reports
    pub progress_interval: u64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            estimated_total: 210_000,
            progress_interval: 1_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub entries: u64,
    /// Entries dropped for having no kana form
    pub skipped: u64,
    pub kanji_keys: u64,
    pub kana_keys: u64,
    pub glosses: u64,
}

/// Key under which kanji forms are indexed and looked up
pub fn kanji_key(text: &str) -> String {
    DefaultPreprocessor.process(text)
}

/// Rebuild the store at `store` from the JSON file at `raw`.
///
/// Blocking. On error or cancellation the partial build is removed and the
/// existing store, if any, is left untouched.
pub fn rebuild_index(
    raw: &Path,
    store: &Path,
    options: &IndexOptions,
    on_progress: &dyn Fn(f64),
    cancel: &CancellationToken,
) -> Result<StageOutcome<IndexSummary>, StoreError> {
    if let Some(parent) = store.parent() {
        std::fs::create_dir_all(parent)?;
    }
    remove_stale_builds(store);

    let reader = JmdictReader::open(raw)?;
    let dataset = reader.metadata().clone();
    let building = building_path(store);

    tracing::info!("Building dictionary index at {}", building.display());
    let result = build(&building, reader, &dataset, options, on_progress, cancel);

    match result {
        Ok(StageOutcome::Completed(summary)) => {
            if let Err(e) = std::fs::rename(&building, store) {
                discard(&building);
                return Err(e.into());
            }
            on_progress(1.0);
            tracing::info!(
                "Indexed {} entries ({} skipped) into {}",
                summary.entries,
                summary.skipped,
                store.display()
            );
            Ok(StageOutcome::Completed(summary))
        }
        other => {
            discard(&building);
            other
        }
    }
}

fn build<I>(
    path: &Path,
    entries: I,
    dataset: &JmdictMetadata,
    options: &IndexOptions,
    on_progress: &dyn Fn(f64),
    cancel: &CancellationToken,
) -> Result<StageOutcome<IndexSummary>, StoreError>
where
    I: IntoIterator<Item = Result<DictionaryEntry, LoadError>>,
{
    let mut conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode = MEMORY; PRAGMA synchronous = OFF;")?;

    let tx = conn.transaction()?;
    tx.execute_batch(schema::CREATE_TABLES)?;

    // An error drops the transaction, which rolls it back
    let summary = match populate(&tx, entries, options, on_progress, cancel)? {
        StageOutcome::Completed(summary) => summary,
        StageOutcome::Cancelled => {
            tx.rollback()?;
            tracing::info!("Index build cancelled");
            return Ok(StageOutcome::Cancelled);
        }
    };

    tx.execute_batch(schema::CREATE_INDEXES)?;
    write_metadata(&tx, dataset, &summary)?;
    tx.commit()?;

    conn.execute("INSERT INTO gloss_fts(gloss_fts) VALUES('optimize')", [])?;
    conn.execute_batch("PRAGMA journal_mode = DELETE;")?;
    conn.close().map_err(|(_, e)| e)?;
    File::open(path)?.sync_all()?;

    Ok(StageOutcome::Completed(summary))
}

/// Insert every entry of `entries` into the tables created by the schema.
///
/// Checks `cancel` before each entry and reports progress every
/// `progress_interval` entries. The caller owns the transaction.
pub fn populate<I>(
    conn: &Connection,
    entries: I,
    options: &IndexOptions,
    on_progress: &dyn Fn(f64),
    cancel: &CancellationToken,
) -> Result<StageOutcome<IndexSummary>, StoreError>
where
    I: IntoIterator<Item = Result<DictionaryEntry, LoadError>>,
{
    let mut insert_entry = conn.prepare_cached(
        "INSERT INTO entries (id, payload, common_forms, has_kanji) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut insert_kanji =
        conn.prepare_cached("INSERT INTO kanji_index (text, entry_id) VALUES (?1, ?2)")?;
    let mut insert_kana =
        conn.prepare_cached("INSERT INTO kana_index (text, entry_id) VALUES (?1, ?2)")?;
    let mut insert_gloss = conn.prepare_cached(
        "INSERT INTO gloss_fts (entry_id, sense_index, gloss) VALUES (?1, ?2, ?3)",
    )?;

    let interval = options.progress_interval.max(1);
    let estimated = options.estimated_total.max(1) as f64;
    let mut summary = IndexSummary::default();
    let mut processed = 0u64;

    for entry in entries {
        if cancel.is_cancelled() {
            return Ok(StageOutcome::Cancelled);
        }

        let entry = entry?;
        processed += 1;
        if processed % interval == 0 {
            on_progress((processed as f64 / estimated).min(0.99));
        }

        if entry.kana.is_empty() {
            tracing::warn!("Skipping entry {} without kana forms", entry.id);
            summary.skipped += 1;
            continue;
        }

        // has_kanji holds exactly when the entry has a kanji_index row
        let kanji: HashSet<String> = entry
            .kanji
            .iter()
            .map(|f| kanji_key(&f.text))
            .filter(|k| !k.is_empty())
            .collect();

        let payload = serde_json::to_string(&entry)?;
        insert_entry.execute(params![
            entry.id,
            payload,
            entry.common_forms_count(),
            !kanji.is_empty()
        ])?;

        for key in &kanji {
            insert_kanji.execute(params![key, entry.id])?;
            summary.kanji_keys += 1;
        }

        let kana: HashSet<String> = entry.kana.iter().map(|f| normalize_kana(&f.text)).collect();
        for key in kana.iter().filter(|k| !k.is_empty()) {
            insert_kana.execute(params![key, entry.id])?;
            summary.kana_keys += 1;
        }

        for (sense_index, sense) in entry.senses.iter().enumerate() {
            for gloss in sense.glosses.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
                insert_gloss.execute(params![entry.id, sense_index as i64, gloss])?;
                summary.glosses += 1;
            }
        }

        summary.entries += 1;
    }

    Ok(StageOutcome::Completed(summary))
}

fn write_metadata(
    conn: &Connection,
    dataset: &JmdictMetadata,
    summary: &IndexSummary,
) -> Result<(), StoreError> {
    let built_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string();

    let mut insert = conn.prepare("INSERT INTO metadata (key, value) VALUES (?1, ?2)")?;
    insert.execute(params![schema::KEY_VERSION, dataset.version])?;
    insert.execute(params![schema::KEY_DICT_DATE, dataset.dict_date])?;
    insert.execute(params![schema::KEY_ENTRY_COUNT, summary.entries.to_string()])?;
    insert.execute(params![schema::KEY_BUILT_AT, built_at])?;

    let mut insert_tag = conn.prepare("INSERT INTO tags (tag, label) VALUES (?1, ?2)")?;
    for (tag, label) in &dataset.tags {
        insert_tag.execute(params![tag, label])?;
    }
    Ok(())
}

/// Unique scratch file for one build, next to the store
pub fn building_path(store: &Path) -> PathBuf {
    let name = store
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    store.with_file_name(format!("{name}.{}{BUILDING_SUFFIX}", uuid::Uuid::new_v4()))
}

/// Delete `.building` files left behind by an interrupted process
pub fn remove_stale_builds(store: &Path) {
    let (Some(dir), Some(name)) = (store.parent(), store.file_name()) else {
        return;
    };
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    let prefix = format!("{}.", name.to_string_lossy());

    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return;
    };
    for path in read_dir.flatten().map(|e| e.path()) {
        let is_stale = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(BUILDING_SUFFIX));
        if is_stale {
            tracing::warn!("Removing stale build {}", path.display());
            discard(&path);
        }
    }
}

fn discard(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
