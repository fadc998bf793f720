use serde::{Deserialize, Serialize};

/// A written form of an entry, either kanji or kana
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub text: String,
    #[serde(default)]
    pub common: bool,
}

impl Form {
    pub fn new(text: impl Into<String>, common: bool) -> Self {
        Self {
            text: text.into(),
            common,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleSentence {
    pub japanese: String,
    pub english: String,
}

/// One distinct meaning of an entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sense {
    #[serde(default)]
    pub part_of_speech: Vec<String>,
    #[serde(default)]
    pub glosses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub misc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ExampleSentence>,
}

/// Source-of-truth dictionary unit. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub id: String,
    #[serde(default)]
    pub kanji: Vec<Form>,
    #[serde(default)]
    pub kana: Vec<Form>,
    #[serde(default)]
    pub senses: Vec<Sense>,
}

impl DictionaryEntry {
    /// Number of kanji and kana forms flagged as common
    pub fn common_forms_count(&self) -> u32 {
        self.kanji
            .iter()
            .chain(self.kana.iter())
            .filter(|f| f.common)
            .count() as u32
    }

    pub fn has_kanji(&self) -> bool {
        !self.kanji.is_empty()
    }

    /// First kanji form if any, else first kana form
    pub fn primary_form(&self) -> Option<&str> {
        self.kanji
            .first()
            .or_else(|| self.kana.first())
            .map(|f| f.text.as_str())
    }

    /// Reading shown next to the primary form. None when the primary form is kana already.
    pub fn reading(&self) -> Option<&str> {
        if self.has_kanji() {
            self.kana.first().map(|f| f.text.as_str())
        } else {
            None
        }
    }
}

/// Dataset-level information stored alongside a generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub version: String,
    pub dict_date: String,
    pub entry_count: u64,
    pub built_at: Option<String>,
}

/// Senses that share part-of-speech tags, for the detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosGroup {
    /// Human-readable part-of-speech labels
    pub part_of_speech: Vec<String>,
    pub senses: Vec<DetailSense>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailSense {
    /// 1-based position of the sense within the entry
    pub number: usize,
    pub glosses: Vec<String>,
    pub notes: Vec<String>,
    pub examples: Vec<ExampleSentence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDetail {
    pub other_forms: Vec<String>,
    pub groups: Vec<PosGroup>,
}

/// A search hit ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub entry: DictionaryEntry,
    pub primary: String,
    pub reading: Option<String>,
    pub short_gloss: String,
    pub detail: EntryDetail,
    /// Lower is better. Prefix lookups report 0.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    Kanji,
    Kana,
    English,
}
