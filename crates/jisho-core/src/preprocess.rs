use unicode_normalization::UnicodeNormalization;

/// Query/key cleanup applied before any script-specific conversion
pub trait Preprocessor {
    fn process(&self, text: &str) -> String {
        let text = text.trim();

        if text.is_empty() {
            return String::new();
        }

        // NFKC folds full-width latin and half-width katakana
        let text: String = text.nfkc().collect();

        // Collapse runs of whitespace, including newlines pasted from the clipboard
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

pub struct DefaultPreprocessor;
impl Preprocessor for DefaultPreprocessor {}
