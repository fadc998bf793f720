//! Streaming reader for jmdict-simplified JSON.
//!
//! The file is a single object whose `words` array holds ~200k entries. The
//! header fields before `words` are scanned by hand, then each word is cut out
//! of the byte stream and handed to serde one at a time, so memory stays
//! bounded by the largest single entry.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use jisho_types::{DictionaryEntry, ExampleSentence, Form, Sense};
use serde::Deserialize;

use crate::error::LoadError;

const ENGLISH: &str = "eng";

/// Header fields of a jmdict-simplified document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JmdictMetadata {
    pub version: String,
    pub dict_date: String,
    /// Tag abbreviation to human-readable label
    pub tags: BTreeMap<String, String>,
}

// JSON structures of the jmdict-simplified word format
#[derive(Debug, Deserialize)]
struct JmdictWord {
    id: String,
    #[serde(default)]
    kanji: Vec<JmdictForm>,
    #[serde(default)]
    kana: Vec<JmdictForm>,
    #[serde(default)]
    sense: Vec<JmdictSense>,
}

#[derive(Debug, Deserialize)]
struct JmdictForm {
    text: String,
    #[serde(default)]
    common: bool,
}

#[derive(Debug, Deserialize)]
struct JmdictSense {
    #[serde(rename = "partOfSpeech", default)]
    part_of_speech: Vec<String>,
    #[serde(default)]
    gloss: Vec<JmdictGloss>,
    #[serde(default)]
    misc: Vec<String>,
    #[serde(default)]
    info: Vec<String>,
    #[serde(default)]
    examples: Vec<JmdictExample>,
}

#[derive(Debug, Deserialize)]
struct JmdictGloss {
    #[serde(default)]
    lang: Option<String>,
    text: String,
}

#[derive(Debug, Deserialize)]
struct JmdictExample {
    #[serde(default)]
    sentences: Vec<JmdictSentence>,
}

#[derive(Debug, Deserialize)]
struct JmdictSentence {
    // the upstream key really is "land"
    #[serde(alias = "lang")]
    land: String,
    text: String,
}

impl From<JmdictForm> for Form {
    fn from(form: JmdictForm) -> Self {
        Form::new(form.text, form.common)
    }
}

/// Pair the Japanese sentence with its English translation, if both exist
fn example_sentence(example: JmdictExample) -> Option<ExampleSentence> {
    let mut japanese = None;
    let mut english = None;
    for sentence in example.sentences {
        match sentence.land.as_str() {
            "jpn" => japanese = Some(sentence.text),
            ENGLISH => english = Some(sentence.text),
            _ => {}
        }
    }
    Some(ExampleSentence {
        japanese: japanese?,
        english: english?,
    })
}

impl From<JmdictSense> for Sense {
    fn from(sense: JmdictSense) -> Self {
        Sense {
            part_of_speech: sense.part_of_speech,
            glosses: sense
                .gloss
                .into_iter()
                .filter(|g| g.lang.as_deref().is_none_or(|lang| lang == ENGLISH))
                .map(|g| g.text)
                .collect(),
            misc: sense.misc,
            info: sense.info,
            examples: sense
                .examples
                .into_iter()
                .filter_map(example_sentence)
                .collect(),
        }
    }
}

impl From<JmdictWord> for DictionaryEntry {
    fn from(word: JmdictWord) -> Self {
        DictionaryEntry {
            id: word.id,
            kanji: word.kanji.into_iter().map(Form::from).collect(),
            kana: word.kana.into_iter().map(Form::from).collect(),
            senses: word.sense.into_iter().map(Sense::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FirstWord,
    NextWord,
    Done,
}

/// Pull iterator over the entries of a jmdict-simplified document.
///
/// Yields entries in file order. After the first error the iterator is
/// exhausted.
pub struct JmdictReader<R> {
    reader: R,
    metadata: JmdictMetadata,
    state: State,
    scratch: Vec<u8>,
    yielded: u64,
}

impl JmdictReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        tracing::info!("Loading JMdict from file: {}", path.display());
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::FileNotFound(path.display().to_string()),
            _ => LoadError::IoError(e),
        })?;
        Self::new(BufReader::with_capacity(256 * 1024, file))
    }
}

impl<R: BufRead> JmdictReader<R> {
    /// Read the document header up to the first word
    pub fn new(reader: R) -> Result<Self, LoadError> {
        let mut this = Self {
            reader,
            metadata: JmdictMetadata::default(),
            state: State::FirstWord,
            scratch: Vec::new(),
            yielded: 0,
        };
        this.read_header()?;
        Ok(this)
    }

    pub fn metadata(&self) -> &JmdictMetadata {
        &self.metadata
    }

    /// Entries yielded so far
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    fn read_header(&mut self) -> Result<(), LoadError> {
        self.skip_whitespace()?;
        self.expect(b'{')?;

        loop {
            self.skip_whitespace()?;
            match self.peek()? {
                Some(b',') => {
                    self.reader.consume(1);
                    continue;
                }
                Some(b'"') => {}
                Some(b'}') => {
                    return Err(LoadError::InvalidFormat("document has no words array".into()));
                }
                other => return Err(unexpected(other, "an object key")),
            }

            self.scratch.clear();
            let mut raw = std::mem::take(&mut self.scratch);
            self.read_string(&mut raw)?;
            let key: String = serde_json::from_slice(&raw)?;

            self.skip_whitespace()?;
            self.expect(b':')?;
            self.skip_whitespace()?;

            if key == "words" {
                self.scratch = raw;
                self.expect(b'[')?;
                tracing::debug!(
                    "JMdict header: version {} dated {}, {} tags",
                    self.metadata.version,
                    self.metadata.dict_date,
                    self.metadata.tags.len()
                );
                return Ok(());
            }

            raw.clear();
            self.read_value(&mut raw)?;
            match key.as_str() {
                "version" => self.metadata.version = serde_json::from_slice(&raw)?,
                "dictDate" => self.metadata.dict_date = serde_json::from_slice(&raw)?,
                "tags" => self.metadata.tags = serde_json::from_slice(&raw)?,
                _ => {}
            }
            self.scratch = raw;
        }
    }

    fn next_word(&mut self) -> Result<Option<DictionaryEntry>, LoadError> {
        self.skip_whitespace()?;
        match (self.state, self.peek()?) {
            (_, Some(b']')) => {
                self.reader.consume(1);
                return Ok(None);
            }
            (State::NextWord, Some(b',')) => {
                self.reader.consume(1);
                self.skip_whitespace()?;
            }
            (State::FirstWord, Some(b'{')) => {}
            (_, other) => return Err(unexpected(other, "a word or the end of the words array")),
        }

        if self.peek()? != Some(b'{') {
            let found = self.peek()?;
            return Err(unexpected(found, "a word object"));
        }

        let mut raw = std::mem::take(&mut self.scratch);
        raw.clear();
        self.read_container(&mut raw)?;
        let word: JmdictWord = serde_json::from_slice(&raw)?;
        self.scratch = raw;

        self.state = State::NextWord;
        self.yielded += 1;
        Ok(Some(word.into()))
    }

    fn peek(&mut self) -> Result<Option<u8>, LoadError> {
        Ok(self.reader.fill_buf()?.first().copied())
    }

    fn expect(&mut self, byte: u8) -> Result<(), LoadError> {
        match self.peek()? {
            Some(b) if b == byte => {
                self.reader.consume(1);
                Ok(())
            }
            other => Err(unexpected(other, &format!("'{}'", byte as char))),
        }
    }

    fn skip_whitespace(&mut self) -> Result<(), LoadError> {
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(());
            }
            let skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
            let exhausted = skip == buf.len();
            self.reader.consume(skip);
            if !exhausted {
                return Ok(());
            }
        }
    }

    /// Copy one JSON value of any type into `out`
    fn read_value(&mut self, out: &mut Vec<u8>) -> Result<(), LoadError> {
        match self.peek()? {
            Some(b'{' | b'[') => self.read_container(out),
            Some(b'"') => self.read_string(out),
            Some(_) => self.read_scalar(out),
            None => Err(unexpected(None, "a value")),
        }
    }

    /// Copy a quoted string, quotes included
    fn read_string(&mut self, out: &mut Vec<u8>) -> Result<(), LoadError> {
        self.expect(b'"')?;
        out.push(b'"');
        let mut escaped = false;
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Err(unexpected(None, "the end of a string"));
            }
            let mut end = None;
            for (i, &b) in buf.iter().enumerate() {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    end = Some(i + 1);
                    break;
                }
            }
            let take = end.unwrap_or(buf.len());
            out.extend_from_slice(&buf[..take]);
            self.reader.consume(take);
            if end.is_some() {
                return Ok(());
            }
        }
    }

    /// Copy a balanced object or array, skipping brackets inside strings
    fn read_container(&mut self, out: &mut Vec<u8>) -> Result<(), LoadError> {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Err(unexpected(None, "the end of an object or array"));
            }
            let mut end = None;
            for (i, &b) in buf.iter().enumerate() {
                if in_string {
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == b'"' {
                        in_string = false;
                    }
                    continue;
                }
                match b {
                    b'"' => in_string = true,
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            end = Some(i + 1);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            let take = end.unwrap_or(buf.len());
            out.extend_from_slice(&buf[..take]);
            self.reader.consume(take);
            if end.is_some() {
                return Ok(());
            }
        }
    }

    /// Copy a number, boolean or null
    fn read_scalar(&mut self, out: &mut Vec<u8>) -> Result<(), LoadError> {
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(());
            }
            let len = buf
                .iter()
                .take_while(|b| !matches!(b, b',' | b'}' | b']') && !b.is_ascii_whitespace())
                .count();
            let exhausted = len == buf.len();
            out.extend_from_slice(&buf[..len]);
            self.reader.consume(len);
            if !exhausted {
                return Ok(());
            }
        }
    }
}

impl<R: BufRead> Iterator for JmdictReader<R> {
    type Item = Result<DictionaryEntry, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Done {
            return None;
        }
        match self.next_word() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.state = State::Done;
                tracing::info!("Loaded {} dictionary entries", self.yielded);
                None
            }
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}

fn unexpected(found: Option<u8>, expected: &str) -> LoadError {
    match found {
        Some(b) => LoadError::InvalidFormat(format!("expected {expected}, found '{}'", b as char)),
        None => LoadError::InvalidFormat(format!("expected {expected}, found end of input")),
    }
}
