//! Vocabulary file parsing and the built-in fallback word list.
//!
//! Two JSON shapes are accepted:
//!
//! ```json
//! { "level": "4", "description": "...", "words": [{ "chinese": "爱", "pinyin": "ài", "english": "love" }] }
//! { "levels": { "1": { "level": "1", "words": [...] }, "2": { ... } }, "summary": { ... } }
//! ```
//!
//! Multi-level files are flattened in ascending level order.

use crate::error::{QuizError, Result};
use crate::types::VocabularyEntry;
use crate::word_store::WordStore;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Subtitle used when the vocabulary file has no description.
pub const DEFAULT_SUBTITLE: &str = "Match Chinese characters to their meanings";

/// Display-only information from the vocabulary file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyMetadata {
    pub level: Option<String>,
    pub description: Option<String>,
}

impl VocabularyMetadata {
    pub fn title(&self) -> String {
        match &self.level {
            Some(level) => format!("HSK {level} Quiz"),
            None => "Vocabulary Quiz".to_string(),
        }
    }

    pub fn subtitle(&self) -> &str {
        self.description.as_deref().unwrap_or(DEFAULT_SUBTITLE)
    }
}

/// A parsed vocabulary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub metadata: VocabularyMetadata,
    pub entries: Vec<VocabularyEntry>,
}

/// Outcome of turning a vocabulary source into a word store.
#[derive(Debug)]
pub struct VocabularyLoad {
    pub store: WordStore,
    pub metadata: VocabularyMetadata,
    /// Set when the built-in list was used instead of the source.
    pub fallback: Option<QuizError>,
}

/// Parse a vocabulary file in either supported shape.
pub fn parse_vocabulary(json: &str) -> Result<Vocabulary> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| QuizError::InvalidVocabulary(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| QuizError::InvalidVocabulary("expected a JSON object".to_string()))?;

    let (metadata, words) = if let Some(words) = obj.get("words") {
        (metadata_of(obj), collect_words(std::iter::once(words)))
    } else if let Some(levels) = obj.get("levels").and_then(Value::as_object) {
        let mut sections: Vec<(&String, &Map<String, Value>)> = levels
            .iter()
            .filter_map(|(key, level)| level.as_object().map(|l| (key, l)))
            .collect();
        sections.sort_by_key(|(key, _)| (key.parse::<u32>().unwrap_or(u32::MAX), key.to_string()));

        let metadata = match sections.as_slice() {
            [(_, only)] => metadata_of(only),
            [(first, _), .., (last, _)] => VocabularyMetadata {
                level: Some(format!("{first}-{last}")),
                description: None,
            },
            [] => VocabularyMetadata::default(),
        };
        let words = collect_words(sections.iter().filter_map(|(_, level)| level.get("words")));
        (metadata, words)
    } else {
        return Err(QuizError::InvalidVocabulary(
            "expected a \"words\" list or a \"levels\" map".to_string(),
        ));
    };

    if words.is_empty() {
        return Err(QuizError::EmptyVocabulary);
    }
    Ok(Vocabulary {
        metadata,
        entries: words,
    })
}

/// Small word list used when no vocabulary can be loaded.
pub fn builtin_vocabulary() -> Vec<VocabularyEntry> {
    [
        ("爱", "ài", "love"),
        ("朋友", "péngyou", "friend"),
        ("学习", "xuéxí", "study"),
        ("工作", "gōngzuò", "work"),
        ("生活", "shēnghuó", "life"),
        ("时间", "shíjiān", "time"),
        ("今天", "jīntiān", "today"),
        ("明天", "míngtiān", "tomorrow"),
        ("昨天", "zuótiān", "yesterday"),
        ("年", "nián", "year"),
    ]
    .into_iter()
    .map(|(h, p, t)| VocabularyEntry::new(h, p, t))
    .collect()
}

/// Build the word store, falling back to the built-in list when the source
/// failed or had no usable words.
pub fn resolve_vocabulary(source: Result<Vocabulary>, similar_pool: usize) -> Result<VocabularyLoad> {
    let signal = match source {
        Ok(vocabulary) => match WordStore::load_with(vocabulary.entries, similar_pool) {
            Ok(store) => {
                return Ok(VocabularyLoad {
                    store,
                    metadata: vocabulary.metadata,
                    fallback: None,
                })
            }
            Err(e) => e,
        },
        Err(QuizError::EmptyVocabulary) => QuizError::EmptyVocabulary,
        Err(e @ QuizError::VocabularySourceUnavailable(_)) => e,
        Err(e) => QuizError::VocabularySourceUnavailable(e.to_string()),
    };

    tracing::warn!(reason = %signal, "using built-in vocabulary");
    Ok(VocabularyLoad {
        store: WordStore::load_with(builtin_vocabulary(), similar_pool)?,
        metadata: VocabularyMetadata::default(),
        fallback: Some(signal),
    })
}

fn metadata_of(obj: &Map<String, Value>) -> VocabularyMetadata {
    let level = match obj.get("level") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(clean_text)
        .filter(|d| !d.is_empty());
    VocabularyMetadata { level, description }
}

fn collect_words<'a>(lists: impl Iterator<Item = &'a Value>) -> Vec<VocabularyEntry> {
    let mut seen = HashSet::new();
    let mut skipped = 0usize;
    let mut words = Vec::new();
    for item in lists.filter_map(Value::as_array).flatten() {
        match word_of(item) {
            Some(entry) if seen.insert(entry.headword.clone()) => words.push(entry),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "incomplete or duplicate vocabulary rows skipped");
    }
    words
}

fn word_of(item: &Value) -> Option<VocabularyEntry> {
    let field = |key: &str| {
        item.get(key)
            .and_then(Value::as_str)
            .map(clean_text)
            .filter(|s| !s.is_empty())
    };
    Some(VocabularyEntry::new(
        field("chinese")?,
        field("pinyin")?,
        field("english")?,
    ))
}

/// Collapse runs of whitespace and trim.
fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
