use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::indexer::{IndexOptions, rebuild_index};

/// Entries in [`SAMPLE`] that carry at least one kana form
pub const INDEXED_ENTRIES: u64 = 10;

pub const SAMPLE: &str = r#"{
  "version": "3.6.1",
  "languages": ["eng"],
  "commonOnly": false,
  "dictDate": "2025-01-06",
  "dictRevisions": ["1.09"],
  "tags": {
    "n": "noun (common) (futsuumeishi)",
    "v1": "Ichidan verb",
    "vt": "transitive verb",
    "uk": "word usually written using kana alone",
    "adv": "adverb",
    "int": "interjection"
  },
  "words": [
    {"id": "1467640", "kanji": [{"common": true, "text": "猫", "tags": []}],
     "kana": [{"common": true, "text": "ねこ", "tags": [], "appliesToKanji": ["*"]}],
     "sense": [
       {"partOfSpeech": ["n"], "misc": [], "info": [], "gloss": [{"lang": "eng", "text": "cat"}],
        "examples": [{"source": {"type": "tatoeba", "value": "1"}, "text": "猫",
                      "sentences": [{"land": "jpn", "text": "猫が好きです。"}, {"land": "eng", "text": "I like cats."}]}]},
       {"partOfSpeech": [], "misc": [], "info": ["colloquialism"], "gloss": [{"lang": "eng", "text": "shamisen"}]},
       {"partOfSpeech": ["n"], "misc": [], "info": [], "gloss": [{"lang": "eng", "text": "geisha"}]}
     ]},
    {"id": "1467650", "kanji": [{"common": false, "text": "猫舌"}],
     "kana": [{"common": false, "text": "ねこじた"}],
     "sense": [{"partOfSpeech": ["n"], "gloss": [{"lang": "eng", "text": "cat's tongue"}, {"lang": "eng", "text": "sensitivity to hot food"}]}]},
    {"id": "1593460", "kanji": [{"common": true, "text": "子猫"}, {"common": false, "text": "仔猫"}],
     "kana": [{"common": true, "text": "こねこ"}],
     "sense": [{"partOfSpeech": ["n"], "gloss": [{"lang": "eng", "text": "kitten"}]}]},
    {"id": "1078500", "kanji": [],
     "kana": [{"common": false, "text": "キャット"}],
     "sense": [{"partOfSpeech": ["n"], "gloss": [{"lang": "eng", "text": "cat"}]}]},
    {"id": "1358280", "kanji": [{"common": true, "text": "食べる"}, {"common": false, "text": "喰べる"}],
     "kana": [{"common": true, "text": "たべる"}],
     "sense": [{"partOfSpeech": ["v1", "vt"], "gloss": [{"lang": "eng", "text": "to eat"}]},
               {"partOfSpeech": ["v1", "vt"], "gloss": [{"lang": "eng", "text": "to live on (e.g. a salary)"}]}]},
    {"id": "1358300", "kanji": [{"common": true, "text": "食べ物"}],
     "kana": [{"common": true, "text": "たべもの"}],
     "sense": [{"partOfSpeech": ["n"], "gloss": [{"lang": "eng", "text": "food"}]}]},
    {"id": "1080100", "kanji": [],
     "kana": [{"common": true, "text": "ケーキ"}],
     "sense": [{"partOfSpeech": ["n"], "gloss": [{"lang": "eng", "text": "cake"}]}]},
    {"id": "1166340", "kanji": [{"common": true, "text": "犬"}],
     "kana": [{"common": true, "text": "いぬ"}],
     "sense": [{"partOfSpeech": ["n"], "gloss": [{"lang": "eng", "text": "dog"}]}]},
    {"id": "1008470", "kanji": [{"common": false, "text": "一寸"}],
     "kana": [{"common": true, "text": "ちょっと"}],
     "sense": [{"partOfSpeech": ["adv"], "misc": ["uk"], "gloss": [{"lang": "eng", "text": "a little"}]},
               {"partOfSpeech": ["int"], "misc": ["uk"], "gloss": [{"lang": "eng", "text": "hey!"}]}]},
    {"id": "1270190", "kanji": [{"common": true, "text": "今日は"}],
     "kana": [{"common": true, "text": "こんにちは"}],
     "sense": [{"partOfSpeech": ["int"], "gloss": [{"lang": "eng", "text": "hello"}, {"lang": "eng", "text": "good day"}]}]},
    {"id": "2830000", "kanji": [{"common": false, "text": "〇〇"}],
     "kana": [],
     "sense": [{"partOfSpeech": ["n"], "gloss": [{"lang": "eng", "text": "so-and-so"}]}]}
  ]
}"#;

/// Write [`SAMPLE`] as `jmdict.json` in `dir`
pub fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("jmdict.json");
    std::fs::write(&path, SAMPLE).unwrap();
    path
}

/// Build a store from [`SAMPLE`] and return its path
pub fn build_sample_store(dir: &Path) -> PathBuf {
    let raw = write_sample(dir);
    let store = dir.join("jisho.sqlite3");
    rebuild_index(
        &raw,
        &store,
        &IndexOptions::default(),
        &|_: f64| {},
        &CancellationToken::new(),
    )
    .unwrap();
    store
}
