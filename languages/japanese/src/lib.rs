pub mod error;
pub mod format;
pub mod indexer;
pub mod kana;
pub mod loader;
pub mod query;
mod schema;
pub mod scoring;

#[cfg(test)]
mod fixtures;

pub use error::{LoadError, StoreError};
pub use format::{TagLabels, rank_entry, render_detail, render_summary};
pub use indexer::{IndexOptions, IndexSummary, populate, rebuild_index};
pub use kana::normalize_kana;
pub use loader::{JmdictMetadata, JmdictReader};
pub use query::{DEFAULT_MAX_RESULTS, QueryEngine, classify};
pub use scoring::{RankSignals, Scorer, WeightedScorer};
