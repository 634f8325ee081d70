//! Durable progress record and share tokens.
//!
//! The record keeps the camelCase field names used by earlier saves so old
//! data keeps loading. Reading is lenient: anything missing or malformed
//! falls back to its default and the result is clamped to the vocabulary.

pub mod migration;
pub mod share;

pub use migration::migrate;
pub use share::{
    decode_share_token, encode_share_token, share_url, token_from_link, SharedProgress,
};

use crate::error::{QuizError, Result};
use crate::session::{Phase, SessionState};
use crate::types::{
    BatchStats, Counters, QuizMode, QuizSettings, SavedOrigin, VocabularyEntry,
};
use crate::word_store::WordStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Current record version.
pub const PROGRESS_VERSION: u32 = 3;

/// Key the progress record is stored under.
pub const PROGRESS_KEY: &str = "hskQuizProgress";

/// Key used by the first release; cleared on a full reset.
pub const LEGACY_PROGRESS_KEY: &str = "hsk4-progress";

/// Key holding the per-install device id.
pub const DEVICE_ID_KEY: &str = "hskDeviceId";

/// Snapshot of a session as written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub version: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub current_batch: usize,
    pub batch_size: usize,
    pub current_index: usize,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub total_answered: u32,
    pub is_pinyin_mode: bool,
    pub is_review_mode: bool,
    pub review_words: Vec<VocabularyEntry>,
    pub completed_batches: Vec<usize>,
    pub batch_performance: BTreeMap<usize, BatchStats>,
    pub total_words_count: usize,
    pub show_english_in_pinyin: bool,
    pub auto_proceed: bool,
    pub sound_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_origin: Option<SavedOrigin>,
    /// Set while the session is parked after the final batch.
    #[serde(default, skip_serializing_if = "is_false")]
    pub all_batches_complete: bool,
}

pub(crate) fn is_false(flag: &bool) -> bool {
    !*flag
}

impl ProgressRecord {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| QuizError::CorruptProgress(e.to_string()))
    }
}

/// Snapshot `state` for storage.
pub fn serialize(state: &SessionState, total_words: usize, now: DateTime<Utc>) -> ProgressRecord {
    ProgressRecord {
        version: PROGRESS_VERSION,
        timestamp: now.timestamp_millis(),
        current_batch: state.batch_index,
        batch_size: state.batch_size,
        current_index: state.position,
        correct_count: state.counters.correct,
        wrong_count: state.counters.wrong,
        total_answered: state.counters.total_answered,
        is_pinyin_mode: state.settings.pinyin_mode,
        is_review_mode: state.mode == QuizMode::Review,
        review_words: state.review_queue.clone(),
        completed_batches: state.completed_batches.iter().copied().collect(),
        batch_performance: state.batch_stats.clone(),
        total_words_count: total_words,
        show_english_in_pinyin: state.settings.show_translation,
        auto_proceed: state.settings.auto_advance,
        sound_enabled: state.settings.sound_enabled,
        saved_origin: state.saved_origin,
        all_batches_complete: state.phase == Phase::AllBatchesComplete,
    }
}

/// Restore a session from stored JSON, migrating older shapes first.
///
/// Only unparseable input is an error; every field is otherwise optional.
pub fn deserialize(raw: &str, store: &WordStore, default_batch_size: usize) -> Result<SessionState> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| QuizError::CorruptProgress(e.to_string()))?;
    let value = migrate(value);
    let obj = value
        .as_object()
        .ok_or_else(|| QuizError::CorruptProgress("expected a JSON object".to_string()))?;

    let batch_size = match index_field(obj, "batchSize") {
        Some(0) | None => default_batch_size.max(1),
        Some(n) => n,
    };
    let batch_count = store.batch_count(batch_size);

    let review_queue = resolve_headwords(
        obj.get("reviewWords")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(review_word_headword),
        store,
    );

    let completed_batches: BTreeSet<usize> = index_list(obj.get("completedBatches"))
        .into_iter()
        .filter(|&idx| idx < batch_count)
        .collect();

    let batch_stats: BTreeMap<usize, BatchStats> = obj
        .get("batchPerformance")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter_map(|(key, stats)| {
            let idx = key.parse::<usize>().ok().filter(|&idx| idx < batch_count)?;
            let stats = serde_json::from_value(stats.clone()).ok()?;
            Some((idx, stats))
        })
        .collect();

    let mode = if flag(obj, "isReviewMode", false) {
        QuizMode::Review
    } else {
        QuizMode::Normal
    };

    let mut state = SessionState {
        mode,
        batch_index: index_field(obj, "currentBatch").unwrap_or(0),
        batch_size,
        position: index_field(obj, "currentIndex").unwrap_or(0),
        counters: Counters {
            correct: count_field(obj, "correctCount"),
            wrong: count_field(obj, "wrongCount"),
            total_answered: count_field(obj, "totalAnswered"),
        },
        review_queue,
        completed_batches,
        batch_stats,
        saved_origin: obj
            .get("savedOrigin")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        settings: QuizSettings {
            pinyin_mode: flag(obj, "isPinyinMode", true),
            show_translation: flag(obj, "showEnglishInPinyin", true),
            auto_advance: flag(obj, "autoProceed", true),
            sound_enabled: flag(obj, "soundEnabled", true),
        },
        phase: if flag(obj, "allBatchesComplete", false) {
            Phase::AllBatchesComplete
        } else {
            Phase::Answering
        },
    };
    state.normalize(store);
    Ok(state)
}

pub(crate) fn index_field(obj: &Map<String, Value>, key: &str) -> Option<usize> {
    obj.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

pub(crate) fn count_field(obj: &Map<String, Value>, key: &str) -> u32 {
    obj.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

/// Booleans only count when they are actual JSON booleans.
pub(crate) fn flag(obj: &Map<String, Value>, key: &str, default: bool) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub(crate) fn index_list(value: Option<&Value>) -> Vec<usize> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_u64)
        .filter_map(|n| usize::try_from(n).ok())
        .collect()
}

/// Look headwords up in the store, dropping unknown and repeated ones.
pub(crate) fn resolve_headwords<'a>(
    headwords: impl Iterator<Item = &'a str>,
    store: &WordStore,
) -> Vec<VocabularyEntry> {
    let mut seen = HashSet::new();
    let mut dropped = 0usize;
    let entries: Vec<VocabularyEntry> = headwords
        .filter(|h| seen.insert(*h))
        .filter_map(|h| {
            let found = store.get(h).cloned();
            if found.is_none() {
                dropped += 1;
            }
            found
        })
        .collect();
    if dropped > 0 {
        tracing::debug!(dropped, "review words missing from vocabulary");
    }
    entries
}

fn review_word_headword(value: &Value) -> Option<&str> {
    match value {
        Value::String(h) => Some(h.as_str()),
        Value::Object(obj) => obj.get("chinese").and_then(Value::as_str),
        _ => None,
    }
}
