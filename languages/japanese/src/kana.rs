//! Kana normalization and script detection.
//!
//! [`normalize_kana`] is the single key function for the kana index: it runs
//! on every kana form when the index is built and on every query, so both
//! sides always agree on the key.

use jisho_core::{DefaultPreprocessor, Preprocessor};

/// Katakana-hiragana prolonged sound mark. Never converted to a vowel.
pub const LONG_VOWEL_MARK: char = 'ー';

/// Lowercase, trim, and convert romaji and katakana to hiragana.
///
/// `ー` stays as is, so `けーき` and `けえき` remain distinct keys. An ASCII
/// `-` in romaji input becomes `ー`.
pub fn normalize_kana(text: &str) -> String {
    let text = DefaultPreprocessor.process(text).to_lowercase();
    katakana_to_hiragana(&romaji_to_hiragana(&text))
}

pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            // ァ..ヶ and the iteration marks sit 0x60 above their hiragana twins
            'ァ'..='ヶ' | 'ヽ' | 'ヾ' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
            _ => c,
        })
        .collect()
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'i' | 'u' | 'e' | 'o')
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_lowercase() && !is_vowel(c)
}

/// Convert the romaji parts of `text`; anything else passes through
pub fn romaji_to_hiragana(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() * 3);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if !c.is_ascii_lowercase() {
            out.push(if c == '-' { LONG_VOWEL_MARK } else { c });
            i += 1;
            continue;
        }

        if c == 'n' {
            match next {
                Some(n) if is_vowel(n) || n == 'y' => {}
                Some('n') => {
                    // "nn" is ん unless the second n starts a syllable (konnichiha)
                    let after = chars.get(i + 2).copied();
                    let second_starts_syllable = after.is_some_and(|a| is_vowel(a) || a == 'y');
                    out.push('ん');
                    i += if second_starts_syllable { 1 } else { 2 };
                    continue;
                }
                Some('\'') => {
                    out.push('ん');
                    i += 2;
                    continue;
                }
                _ => {
                    out.push('ん');
                    i += 1;
                    continue;
                }
            }
        }

        // Doubled consonant: kitte, matcha
        if is_consonant(c) && (next == Some(c) || (c == 't' && next == Some('c'))) {
            out.push('っ');
            i += 1;
            continue;
        }

        let matched = (1..=3).rev().find_map(|len| {
            let end = i + len;
            if end > chars.len() {
                return None;
            }
            let candidate: String = chars[i..end].iter().collect();
            romaji_syllable(&candidate).map(|kana| (kana, len))
        });

        match matched {
            Some((kana, len)) => {
                out.push_str(kana);
                i += len;
            }
            None => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn romaji_syllable(romaji: &str) -> Option<&'static str> {
    let kana = match romaji {
        "a" => "あ", "i" => "い", "u" => "う", "e" => "え", "o" => "お",

        "ka" => "か", "ki" => "き", "ku" => "く", "ke" => "け", "ko" => "こ",
        "kya" => "きゃ", "kyu" => "きゅ", "kyo" => "きょ",
        "ga" => "が", "gi" => "ぎ", "gu" => "ぐ", "ge" => "げ", "go" => "ご",
        "gya" => "ぎゃ", "gyu" => "ぎゅ", "gyo" => "ぎょ",

        "sa" => "さ", "shi" => "し", "si" => "し", "su" => "す", "se" => "せ", "so" => "そ",
        "sha" => "しゃ", "shu" => "しゅ", "she" => "しぇ", "sho" => "しょ",
        "sya" => "しゃ", "syu" => "しゅ", "syo" => "しょ",
        "za" => "ざ", "ji" => "じ", "zi" => "じ", "zu" => "ず", "ze" => "ぜ", "zo" => "ぞ",
        "ja" => "じゃ", "ju" => "じゅ", "je" => "じぇ", "jo" => "じょ",
        "jya" => "じゃ", "jyu" => "じゅ", "jyo" => "じょ",
        "zya" => "じゃ", "zyu" => "じゅ", "zyo" => "じょ",

        "ta" => "た", "chi" => "ち", "ti" => "ち", "tsu" => "つ", "tu" => "つ", "te" => "て", "to" => "と",
        "cha" => "ちゃ", "chu" => "ちゅ", "che" => "ちぇ", "cho" => "ちょ",
        "tya" => "ちゃ", "tyu" => "ちゅ", "tyo" => "ちょ",
        "cya" => "ちゃ", "cyu" => "ちゅ", "cyo" => "ちょ",
        "da" => "だ", "di" => "ぢ", "du" => "づ", "de" => "で", "do" => "ど",
        "dya" => "ぢゃ", "dyu" => "ぢゅ", "dyo" => "ぢょ",

        "na" => "な", "ni" => "に", "nu" => "ぬ", "ne" => "ね", "no" => "の",
        "nya" => "にゃ", "nyu" => "にゅ", "nyo" => "にょ",

        "ha" => "は", "hi" => "ひ", "fu" => "ふ", "hu" => "ふ", "he" => "へ", "ho" => "ほ",
        "hya" => "ひゃ", "hyu" => "ひゅ", "hyo" => "ひょ",
        "fa" => "ふぁ", "fi" => "ふぃ", "fe" => "ふぇ", "fo" => "ふぉ", "fyu" => "ふゅ",
        "ba" => "ば", "bi" => "び", "bu" => "ぶ", "be" => "べ", "bo" => "ぼ",
        "bya" => "びゃ", "byu" => "びゅ", "byo" => "びょ",
        "pa" => "ぱ", "pi" => "ぴ", "pu" => "ぷ", "pe" => "ぺ", "po" => "ぽ",
        "pya" => "ぴゃ", "pyu" => "ぴゅ", "pyo" => "ぴょ",

        "ma" => "ま", "mi" => "み", "mu" => "む", "me" => "め", "mo" => "も",
        "mya" => "みゃ", "myu" => "みゅ", "myo" => "みょ",
        "ya" => "や", "yu" => "ゆ", "yo" => "よ",
        "ra" => "ら", "ri" => "り", "ru" => "る", "re" => "れ", "ro" => "ろ",
        "rya" => "りゃ", "ryu" => "りゅ", "ryo" => "りょ",
        "wa" => "わ", "wi" => "うぃ", "we" => "うぇ", "wo" => "を",
        "va" => "ゔぁ", "vi" => "ゔぃ", "vu" => "ゔ", "ve" => "ゔぇ", "vo" => "ゔぉ",

        "xa" => "ぁ", "xi" => "ぃ", "xu" => "ぅ", "xe" => "ぇ", "xo" => "ぉ",
        "la" => "ぁ", "li" => "ぃ", "lu" => "ぅ", "le" => "ぇ", "lo" => "ぉ",
        "xya" => "ゃ", "xyu" => "ゅ", "xyo" => "ょ",
        "lya" => "ゃ", "lyu" => "ゅ", "lyo" => "ょ",
        "xtu" => "っ", "ltu" => "っ", "xwa" => "ゎ",
        _ => return None,
    };
    Some(kana)
}

pub fn is_hiragana(c: char) -> bool {
    matches!(c, '\u{3041}'..='\u{309F}')
}

pub fn is_katakana(c: char) -> bool {
    matches!(c, '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}')
}

pub fn is_kana(c: char) -> bool {
    is_hiragana(c) || is_katakana(c)
}

pub fn is_kanji(c: char) -> bool {
    matches!(
        c,
        '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}'
            | '々'
            | '〆'
    )
}

/// Kana, kanji, or CJK symbols and punctuation
pub fn is_japanese(c: char) -> bool {
    is_kana(c) || is_kanji(c) || matches!(c, '\u{3000}'..='\u{303F}')
}

pub fn is_all_kana(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_kana)
}

pub fn contains_japanese(text: &str) -> bool {
    text.chars().any(is_japanese)
}
