use std::collections::HashMap;

/// Inputs to the English ranking formula for one matching sense
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankSignals {
    /// Full-text relevance; lower is better (SQLite bm25 convention)
    pub text_match: f64,
    pub common_forms: u32,
    pub has_kanji: bool,
    /// 0-based position of the matching sense
    pub sense_index: u32,
}

/// Combines [`RankSignals`] into a single rank. Lower ranks sort first.
pub trait Scorer: Send + Sync {
    fn score(&self, signals: &RankSignals) -> f64;
}

/// Linear scorer: common forms and kanji spellings pull a hit up, later
/// senses push it down.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedScorer {
    pub common_form_weight: f64,
    pub kanji_bonus: f64,
    pub sense_penalty: f64,
}

impl Default for WeightedScorer {
    fn default() -> Self {
        Self {
            common_form_weight: 1.0,
            kanji_bonus: 1.0,
            sense_penalty: 0.2,
        }
    }
}

impl Scorer for WeightedScorer {
    fn score(&self, s: &RankSignals) -> f64 {
        let kanji = if s.has_kanji { self.kanji_bonus } else { 0.0 };
        s.text_match - self.common_form_weight * f64::from(s.common_forms) - kanji
            + self.sense_penalty * f64::from(s.sense_index)
    }
}

/// Keep the best (minimum) rank per entry, order ascending with the entry id
/// as tie-break, and truncate to `limit`.
pub fn best_per_entry<I>(hits: I, limit: usize) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut best: HashMap<String, f64> = HashMap::new();
    for (id, rank) in hits {
        best.entry(id)
            .and_modify(|r| *r = r.min(rank))
            .or_insert(rank);
    }

    let mut ranked: Vec<(String, f64)> = best.into_iter().collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}
