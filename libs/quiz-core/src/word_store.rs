//! Sorted vocabulary with a precomputed phonetic-similarity index.

use crate::error::{QuizError, Result};
use crate::types::VocabularyEntry;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

/// Minimum similar words gathered per entry before falling back to
/// storage-order filler.
pub const DEFAULT_SIMILAR_POOL: usize = 5;

/// Canonical, headword-sorted vocabulary. Read-only once built.
#[derive(Debug, Clone)]
pub struct WordStore {
    entries: Vec<VocabularyEntry>,
    positions: HashMap<String, usize>,
    similar: HashMap<String, Vec<usize>>,
}

impl WordStore {
    /// Build a store with the default similarity pool size.
    pub fn load(entries: Vec<VocabularyEntry>) -> Result<Self> {
        Self::load_with(entries, DEFAULT_SIMILAR_POOL)
    }

    /// Build a store, sorting by headword and precomputing similar words.
    ///
    /// Duplicate headwords keep their first occurrence.
    pub fn load_with(entries: Vec<VocabularyEntry>, similar_pool: usize) -> Result<Self> {
        if entries.is_empty() {
            return Err(QuizError::EmptyVocabulary);
        }

        let given = entries.len();
        let mut seen = HashSet::new();
        let mut entries: Vec<VocabularyEntry> = entries
            .into_iter()
            .filter(|e| seen.insert(e.headword.clone()))
            .collect();
        if entries.len() < given {
            tracing::warn!(
                dropped = given - entries.len(),
                "duplicate headwords in vocabulary, keeping first occurrence"
            );
        }

        entries.sort_by(|a, b| a.headword.cmp(&b.headword));

        let positions = entries
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.headword.clone(), idx))
            .collect();
        let similar = build_similarity_index(&entries, similar_pool);

        tracing::debug!(words = entries.len(), "word store built");

        Ok(Self {
            entries,
            positions,
            similar,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a loaded store; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn get(&self, headword: &str) -> Option<&VocabularyEntry> {
        self.positions.get(headword).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, headword: &str) -> bool {
        self.positions.contains_key(headword)
    }

    /// Precomputed similar words, empty for an unknown headword.
    pub fn similar_to(&self, headword: &str) -> Vec<&VocabularyEntry> {
        self.similar
            .get(headword)
            .map(|indices| indices.iter().map(|&idx| &self.entries[idx]).collect())
            .unwrap_or_default()
    }

    /// Entries `[batch_index * batch_size, min(+batch_size, len))`.
    pub fn slice_batch(&self, batch_index: usize, batch_size: usize) -> &[VocabularyEntry] {
        let Some(start) = batch_index.checked_mul(batch_size) else {
            return &[];
        };
        if batch_size == 0 || start >= self.entries.len() {
            return &[];
        }
        let end = start.saturating_add(batch_size).min(self.entries.len());
        &self.entries[start..end]
    }

    /// Number of batches of `batch_size` needed to cover the vocabulary.
    pub fn batch_count(&self, batch_size: usize) -> usize {
        if batch_size == 0 {
            return 0;
        }
        self.entries.len().div_ceil(batch_size)
    }
}

/// Strip tone marks and tone digits, then lower-case.
pub fn normalize_pronunciation(pronunciation: &str) -> String {
    pronunciation
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .filter(|c| !c.is_ascii_digit())
        .collect::<String>()
        .to_lowercase()
}

fn first_two_chars(s: &str) -> &str {
    match s.char_indices().nth(2) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

struct Picker<'a> {
    entries: &'a [VocabularyEntry],
    seen: HashSet<&'a str>,
    picked: Vec<usize>,
}

impl<'a> Picker<'a> {
    fn new(entries: &'a [VocabularyEntry], own: &'a str) -> Self {
        Self {
            entries,
            seen: HashSet::from([own]),
            picked: Vec::new(),
        }
    }

    fn offer(&mut self, idx: usize) {
        if self.seen.insert(self.entries[idx].headword.as_str()) {
            self.picked.push(idx);
        }
    }
}

fn build_similarity_index(
    entries: &[VocabularyEntry],
    similar_pool: usize,
) -> HashMap<String, Vec<usize>> {
    let keys: Vec<String> = entries
        .iter()
        .map(|e| normalize_pronunciation(&e.pronunciation))
        .collect();

    // Insertion order matters: partial matches are appended group by group.
    let mut groups: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (idx, key) in keys.iter().enumerate() {
        groups.entry(key.as_str()).or_default().push(idx);
    }

    let mut index = HashMap::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let key = keys[idx].as_str();
        let mut picker = Picker::new(entries, &entry.headword);

        if let Some(members) = groups.get(key) {
            for &member in members {
                picker.offer(member);
            }
        }

        let own_prefix = first_two_chars(key);
        for (other, members) in &groups {
            if *other == key {
                continue;
            }
            if other.starts_with(own_prefix) || key.starts_with(first_two_chars(other)) {
                for &member in members {
                    picker.offer(member);
                }
            }
        }

        let mut scan = 0;
        while picker.picked.len() < similar_pool && scan < entries.len() {
            picker.offer(scan);
            scan += 1;
        }

        index.insert(entry.headword.clone(), picker.picked);
    }
    index
}
