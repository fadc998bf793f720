use std::collections::HashMap;

use jisho_types::DatasetMetadata;
use rusqlite::Connection;

pub(crate) const CREATE_TABLES: &str = "
DROP TABLE IF EXISTS entries;
DROP TABLE IF EXISTS kanji_index;
DROP TABLE IF EXISTS kana_index;
DROP TABLE IF EXISTS gloss_fts;
DROP TABLE IF EXISTS metadata;
DROP TABLE IF EXISTS tags;

CREATE TABLE entries (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    common_forms INTEGER NOT NULL,
    has_kanji INTEGER NOT NULL
) WITHOUT ROWID;

CREATE TABLE kanji_index (
    text TEXT NOT NULL,
    entry_id TEXT NOT NULL
);

CREATE TABLE kana_index (
    text TEXT NOT NULL,
    entry_id TEXT NOT NULL
);

CREATE VIRTUAL TABLE gloss_fts USING fts5(
    entry_id UNINDEXED,
    sense_index UNINDEXED,
    gloss
);

CREATE TABLE metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE tags (
    tag TEXT PRIMARY KEY,
    label TEXT NOT NULL
);
";

// Built after the bulk insert
pub(crate) const CREATE_INDEXES: &str = "
CREATE INDEX idx_kanji_text ON kanji_index(text);
CREATE INDEX idx_kana_text ON kana_index(text);
";

pub(crate) const KEY_VERSION: &str = "version";
pub(crate) const KEY_DICT_DATE: &str = "dict_date";
pub(crate) const KEY_ENTRY_COUNT: &str = "entry_count";
pub(crate) const KEY_BUILT_AT: &str = "built_at";

pub(crate) fn read_metadata(conn: &Connection) -> rusqlite::Result<DatasetMetadata> {
    let mut stmt = conn.prepare("SELECT key, value FROM metadata")?;
    let pairs = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<HashMap<String, String>>>()?;

    Ok(DatasetMetadata {
        version: pairs.get(KEY_VERSION).cloned().unwrap_or_default(),
        dict_date: pairs.get(KEY_DICT_DATE).cloned().unwrap_or_default(),
        entry_count: pairs
            .get(KEY_ENTRY_COUNT)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default(),
        built_at: pairs.get(KEY_BUILT_AT).cloned(),
    })
}

pub(crate) fn read_tag_labels(conn: &Connection) -> rusqlite::Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT tag, label FROM tags")?;
    let labels = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect();
    labels
}
