//! Core types for the vocabulary quiz.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single vocabulary item. The headword is its identity.
///
/// Field names on the wire follow the vocabulary files and stored progress
/// (`chinese`, `pinyin`, `english`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    #[serde(rename = "chinese")]
    pub headword: String,
    #[serde(rename = "pinyin")]
    pub pronunciation: String,
    #[serde(rename = "english")]
    pub translation: String,
}

impl VocabularyEntry {
    pub fn new(
        headword: impl Into<String>,
        pronunciation: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            headword: headword.into(),
            pronunciation: pronunciation.into(),
            translation: translation.into(),
        }
    }
}

/// Which word sequence the session is drawing questions from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    #[default]
    Normal,
    Review,
}

impl QuizMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Review => "review",
        }
    }
}

/// Answer counters for the current batch or review session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counters {
    pub correct: u32,
    pub wrong: u32,
    pub total_answered: u32,
}

impl Counters {
    pub fn record(&mut self, correct: bool) {
        self.total_answered = self.total_answered.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        } else {
            self.wrong = self.wrong.saturating_add(1);
        }
    }

    /// Accuracy as a rounded percentage, 0 when nothing has been answered.
    pub fn accuracy(&self) -> u32 {
        accuracy_percent(self.correct, self.total_answered)
    }
}

/// Rounded percentage of `correct` over `total`.
pub fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(correct) / f64::from(total) * 100.0).round() as u32
}

/// Result recorded for a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub correct: u32,
    pub total: u32,
    pub accuracy: u32,
}

/// Where to return to when a review session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedOrigin {
    pub batch_index: usize,
    pub position: usize,
}

/// Requested batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSize {
    Fixed(usize),
    /// One batch spanning the whole vocabulary.
    All,
}

impl BatchSize {
    /// Parse `"all"` or a positive integer.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        match s.parse::<usize>() {
            Ok(0) | Err(_) => None,
            Ok(n) => Some(Self::Fixed(n)),
        }
    }

    /// Concrete size for a vocabulary of `vocabulary_len` entries.
    pub fn resolve(self, vocabulary_len: usize) -> usize {
        match self {
            Self::Fixed(n) => n,
            Self::All => vocabulary_len.max(1),
        }
    }
}

/// User preferences carried with saved progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSettings {
    /// Show pronunciations as options (otherwise translations).
    pub pinyin_mode: bool,
    /// In pinyin mode, show the translation under each pronunciation.
    pub show_translation: bool,
    pub auto_advance: bool,
    pub sound_enabled: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            pinyin_mode: true,
            show_translation: true,
            auto_advance: true,
            sound_enabled: true,
        }
    }
}

impl QuizSettings {
    /// Text shown for an option under the current settings.
    pub fn option_label(&self, entry: &VocabularyEntry) -> String {
        if self.pinyin_mode && self.show_translation {
            format!("{}\n{}", entry.pronunciation, entry.translation)
        } else if self.pinyin_mode {
            entry.pronunciation.clone()
        } else {
            entry.translation.clone()
        }
    }

    /// The correct answer as shown after a wrong pick.
    pub fn correction_text(&self, entry: &VocabularyEntry) -> String {
        if self.pinyin_mode {
            format!("{} - {}", entry.pronunciation, entry.translation)
        } else {
            entry.translation.clone()
        }
    }
}

/// Batch size used when nothing else is configured or stored.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    pub option_count: usize,
    pub default_batch_size: usize,
    /// How long answer feedback stays up before auto-advance.
    pub feedback_delay: Duration,
    /// Minimum number of similar words gathered per entry.
    pub similar_pool_size: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            option_count: 4,
            default_batch_size: DEFAULT_BATCH_SIZE,
            feedback_delay: Duration::from_millis(2000),
            similar_pool_size: crate::word_store::DEFAULT_SIMILAR_POOL,
        }
    }
}
