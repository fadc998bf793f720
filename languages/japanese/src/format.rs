use std::collections::HashMap;
use std::fmt::Write;

use jisho_types::{DetailSense, DictionaryEntry, EntryDetail, PosGroup, RankedEntry};

/// Tag abbreviation to human-readable label
pub type TagLabels = HashMap<String, String>;

fn label(labels: &TagLabels, tag: &str) -> String {
    labels.get(tag).cloned().unwrap_or_else(|| tag.to_string())
}

/// First sense's glosses joined with "; "
pub fn short_gloss(entry: &DictionaryEntry) -> String {
    entry
        .senses
        .first()
        .map(|s| s.glosses.join("; "))
        .unwrap_or_default()
}

/// Group consecutive senses by part of speech.
///
/// A sense without its own part-of-speech tags inherits the previous sense's.
pub fn entry_detail(entry: &DictionaryEntry, labels: &TagLabels) -> EntryDetail {
    let primary = entry.primary_form();
    let other_forms = entry
        .kanji
        .iter()
        .chain(entry.kana.iter())
        .map(|f| f.text.clone())
        .filter(|text| Some(text.as_str()) != primary)
        .collect();

    let mut groups: Vec<PosGroup> = Vec::new();
    let mut group_tags: Option<&[String]> = None;
    let mut inherited: &[String] = &[];

    for (i, sense) in entry.senses.iter().enumerate() {
        if !sense.part_of_speech.is_empty() {
            inherited = &sense.part_of_speech;
        }

        let notes = sense
            .misc
            .iter()
            .map(|tag| label(labels, tag))
            .chain(sense.info.iter().cloned())
            .collect();
        let detail = DetailSense {
            number: i + 1,
            glosses: sense.glosses.clone(),
            notes,
            examples: sense.examples.clone(),
        };

        match groups.last_mut() {
            Some(group) if group_tags == Some(inherited) => group.senses.push(detail),
            _ => {
                groups.push(PosGroup {
                    part_of_speech: inherited.iter().map(|tag| label(labels, tag)).collect(),
                    senses: vec![detail],
                });
                group_tags = Some(inherited);
            }
        }
    }

    EntryDetail {
        other_forms,
        groups,
    }
}

/// Build the display form of a search hit
pub fn rank_entry(entry: DictionaryEntry, score: f64, labels: &TagLabels) -> RankedEntry {
    RankedEntry {
        primary: entry.primary_form().unwrap_or(&entry.id).to_string(),
        reading: entry.reading().map(str::to_string),
        short_gloss: short_gloss(&entry),
        detail: entry_detail(&entry, labels),
        score,
        entry,
    }
}

/// One line per hit: `猫 【ねこ】 cat; shamisen`
pub fn render_summary(hit: &RankedEntry) -> String {
    match &hit.reading {
        Some(reading) => format!("{} 【{}】 {}", hit.primary, reading, hit.short_gloss),
        None => format!("{} {}", hit.primary, hit.short_gloss),
    }
}

/// Markdown rendering of the detail view
pub fn render_detail(hit: &RankedEntry) -> String {
    let mut out = String::new();
    match &hit.reading {
        Some(reading) => {
            let _ = writeln!(out, "# {} 【{}】", hit.primary, reading);
        }
        None => {
            let _ = writeln!(out, "# {}", hit.primary);
        }
    }

    for group in &hit.detail.groups {
        out.push('\n');
        if !group.part_of_speech.is_empty() {
            let _ = writeln!(out, "## {}\n", group.part_of_speech.join(", "));
        }
        for sense in &group.senses {
            let _ = write!(out, "{}. {}", sense.number, sense.glosses.join("; "));
            if !sense.notes.is_empty() {
                let _ = write!(out, " ({})", sense.notes.join("; "));
            }
            out.push('\n');
            for example in &sense.examples {
                let _ = writeln!(out, "   > {}", example.japanese);
                let _ = writeln!(out, "   > {}", example.english);
            }
        }
    }

    if !hit.detail.other_forms.is_empty() {
        let _ = writeln!(out, "\nOther forms: {}", hit.detail.other_forms.join("、"));
    }
    out
}

#[cfg(test)]
mod tests {
    use jisho_types::{ExampleSentence, Form, Sense};

    use super::*;

    fn labels() -> TagLabels {
        [("n", "noun"), ("v1", "Ichidan verb"), ("uk", "usually kana")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sense(pos: &[&str], glosses: &[&str]) -> Sense {
        Sense {
            part_of_speech: pos.iter().map(|p| p.to_string()).collect(),
            glosses: glosses.iter().map(|g| g.to_string()).collect(),
            ..Default::default()
        }
    }

    fn neko() -> DictionaryEntry {
        let mut first = sense(&["n"], &["cat"]);
        first.examples.push(ExampleSentence {
            japanese: "猫が好きです。".into(),
            english: "I like cats.".into(),
        });
        let mut second = sense(&[], &["shamisen"]);
        second.misc.push("uk".into());
        second.info.push("colloquialism".into());

        DictionaryEntry {
            id: "1467640".into(),
            kanji: vec![Form::new("猫", true)],
            kana: vec![Form::new("ねこ", true), Form::new("ネコ", false)],
            senses: vec![first, second, sense(&["v1"], &["to purr"]), sense(&["n"], &["geisha"])],
        }
    }

    #[test]
    fn senses_inherit_part_of_speech() {
        let detail = entry_detail(&neko(), &labels());

        let numbers: Vec<Vec<usize>> = detail
            .groups
            .iter()
            .map(|g| g.senses.iter().map(|s| s.number).collect())
            .collect();
        assert_eq!(numbers, vec![vec![1, 2], vec![3], vec![4]]);
        assert_eq!(detail.groups[0].part_of_speech, vec!["noun"]);
        assert_eq!(detail.groups[1].part_of_speech, vec!["Ichidan verb"]);
        assert_eq!(
            detail.groups[0].senses[1].notes,
            vec!["usually kana", "colloquialism"]
        );
    }

    #[test]
    fn other_forms_exclude_primary() {
        let detail = entry_detail(&neko(), &labels());
        assert_eq!(detail.other_forms, vec!["ねこ", "ネコ"]);
    }

    #[test]
    fn ranked_entry_fields() {
        let hit = rank_entry(neko(), -2.5, &labels());
        assert_eq!(hit.primary, "猫");
        assert_eq!(hit.reading.as_deref(), Some("ねこ"));
        assert_eq!(hit.short_gloss, "cat");
        assert_eq!(render_summary(&hit), "猫 【ねこ】 cat");
    }

    #[test]
    fn unknown_tags_fall_back_to_abbreviation() {
        let entry = DictionaryEntry {
            id: "1".into(),
            kanji: vec![],
            kana: vec![Form::new("けーき", true)],
            senses: vec![sense(&["n-x"], &["cake", "pastry"])],
        };
        let hit = rank_entry(entry, 0.0, &TagLabels::new());
        assert_eq!(hit.reading, None);
        assert_eq!(hit.short_gloss, "cake; pastry");
        assert_eq!(hit.detail.groups[0].part_of_speech, vec!["n-x"]);
    }

    #[test]
    fn detail_markdown() {
        let rendered = render_detail(&rank_entry(neko(), 0.0, &labels()));
        assert!(rendered.starts_with("# 猫 【ねこ】\n"));
        assert!(rendered.contains("## noun\n"));
        assert!(rendered.contains("2. shamisen (usually kana; colloquialism)\n"));
        assert!(rendered.contains("   > I like cats.\n"));
        assert!(rendered.ends_with("Other forms: ねこ、ネコ\n"));
    }
}
