//! Read-only lookups against a built store generation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use jisho_core::{DefaultPreprocessor, Preprocessor};
use jisho_types::{DatasetMetadata, DictionaryEntry, QueryKind, RankedEntry};
use rusqlite::{Connection, OpenFlags, params};

use crate::error::StoreError;
use crate::format::{TagLabels, rank_entry};
use crate::indexer::kanji_key;
use crate::kana::{contains_japanese, is_all_kana, normalize_kana};
use crate::schema;
use crate::scoring::{RankSignals, Scorer, WeightedScorer, best_per_entry};

pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Route a query by script: kana (or romaji that converts fully to kana),
/// anything else containing Japanese, or English.
///
/// English words spelled only with romaji syllables ("home", "name") classify
/// as kana. [`QueryEngine::search`] retries them as English only when the kana
/// lookup finds nothing.
pub fn classify(query: &str) -> QueryKind {
    if is_all_kana(&normalize_kana(query)) {
        QueryKind::Kana
    } else if contains_japanese(query) {
        QueryKind::Kanji
    } else {
        QueryKind::English
    }
}

/// Quote each word as an FTS5 phrase; all words must match
fn fts_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" "))
}

#[derive(Debug, Clone, Copy)]
enum PrefixIndex {
    Kanji,
    Kana,
}

impl PrefixIndex {
    fn table(self) -> &'static str {
        match self {
            PrefixIndex::Kanji => "kanji_index",
            PrefixIndex::Kana => "kana_index",
        }
    }
}

pub struct QueryEngine {
    conn: Mutex<Connection>,
    metadata: DatasetMetadata,
    labels: TagLabels,
    scorer: Box<dyn Scorer>,
    max_results: usize,
}

impl QueryEngine {
    /// Open the store read-only. A missing or unbuilt store is
    /// [`StoreError::NotReady`].
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.is_file() {
            return Err(StoreError::NotReady(format!(
                "no dictionary at {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let metadata = schema::read_metadata(&conn)
            .map_err(|e| StoreError::NotReady(format!("{}: {e}", path.display())))?;
        let labels = schema::read_tag_labels(&conn)?;

        tracing::info!(
            "Opened dictionary {} (version {}, {} entries)",
            path.display(),
            metadata.version,
            metadata.entry_count
        );

        Ok(Self {
            conn: Mutex::new(conn),
            metadata,
            labels,
            scorer: Box::new(WeightedScorer::default()),
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    pub fn with_scorer(mut self, scorer: impl Scorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    /// Classify `query` and dispatch to the matching lookup.
    ///
    /// Romaji that finds no kana match is retried as English.
    pub fn search(&self, query: &str) -> Result<Vec<RankedEntry>, StoreError> {
        let query = DefaultPreprocessor.process(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let kind = classify(&query);
        tracing::debug!("Query {:?} classified as {:?}", query, kind);

        match kind {
            QueryKind::Kanji => self.search_kanji(&query),
            QueryKind::English => self.search_english(&query),
            QueryKind::Kana => {
                let hits = self.search_kana(&query)?;
                if hits.is_empty() && query.is_ascii() {
                    tracing::debug!("No kana match for {:?}, trying English", query);
                    return self.search_english(&query);
                }
                Ok(hits)
            }
        }
    }

    /// Prefix match on kanji forms; shorter matched forms first
    pub fn search_kanji(&self, query: &str) -> Result<Vec<RankedEntry>, StoreError> {
        self.prefix_search(PrefixIndex::Kanji, &kanji_key(query))
    }

    /// Prefix match on normalized kana forms; shorter matched forms first
    pub fn search_kana(&self, query: &str) -> Result<Vec<RankedEntry>, StoreError> {
        self.prefix_search(PrefixIndex::Kana, &normalize_kana(query))
    }

    /// Full-text match over glosses, ranked by the configured [`Scorer`]
    pub fn search_english(&self, query: &str) -> Result<Vec<RankedEntry>, StoreError> {
        let Some(expression) = fts_expression(query) else {
            return Ok(Vec::new());
        };

        let conn = self.connection();
        let mut stmt = conn.prepare_cached(
            "SELECT gloss_fts.entry_id, gloss_fts.sense_index, bm25(gloss_fts),
                    e.common_forms, e.has_kanji
             FROM gloss_fts
             JOIN entries e ON e.id = gloss_fts.entry_id
             WHERE gloss_fts MATCH ?1",
        )?;

        let mut scored = Vec::new();
        let rows = stmt.query_map([&expression], |row| {
            let signals = RankSignals {
                text_match: row.get(2)?,
                common_forms: row.get(3)?,
                has_kanji: row.get(4)?,
                sense_index: row.get(1)?,
            };
            Ok((row.get::<_, String>(0)?, signals))
        })?;
        for row in rows {
            let (id, signals) = row?;
            scored.push((id, self.scorer.score(&signals)));
        }

        let mut payload_stmt = conn.prepare_cached("SELECT payload FROM entries WHERE id = ?1")?;
        let mut results = Vec::new();
        for (id, score) in best_per_entry(scored, self.max_results) {
            let payload: String = payload_stmt.query_row([&id], |row| row.get(0))?;
            if let Some(entry) = decode(&id, &payload) {
                results.push(rank_entry(entry, score, &self.labels));
            }
        }
        Ok(results)
    }

    fn prefix_search(&self, index: PrefixIndex, key: &str) -> Result<Vec<RankedEntry>, StoreError> {
        if key.is_empty() {
            return Ok(Vec::new());
        }

        // [key, key + U+10FFFF) is exactly the set of strings starting with key,
        // with no wildcard characters to escape
        let upper = format!("{key}{}", char::MAX);
        let sql = format!(
            "SELECT e.id, e.payload, MIN(length(i.text)) AS key_len
             FROM {} i
             JOIN entries e ON e.id = i.entry_id
             WHERE i.text >= ?1 AND i.text < ?2
             GROUP BY e.id
             ORDER BY key_len, e.common_forms DESC, e.id
             LIMIT ?3",
            index.table()
        );

        let conn = self.connection();
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![key, upper, self.max_results as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (id, payload) = row?;
            if let Some(entry) = decode(&id, &payload) {
                results.push(rank_entry(entry, 0.0, &self.labels));
            }
        }
        Ok(results)
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn decode(id: &str, payload: &str) -> Option<DictionaryEntry> {
    match serde_json::from_str(payload) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!("Skipping malformed entry {}: {}", id, e);
            None
        }
    }
}
