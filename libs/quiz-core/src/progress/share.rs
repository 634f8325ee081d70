//! Compact share tokens for moving progress between devices.
//!
//! A token is the LZ-String `compressToBase64` form of a short-keyed JSON
//! object, made URL-safe by swapping `+`/`/` for `-`/`_` and dropping the
//! `=` padding. Links built by earlier releases decode unchanged.

use super::{count_field, flag, index_field, index_list, is_false, resolve_headwords};
use crate::error::{QuizError, Result};
use crate::session::{Phase, SessionState};
use crate::types::{Counters, QuizMode, SavedOrigin, VocabularyEntry, DEFAULT_BATCH_SIZE};
use crate::word_store::WordStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

const SHARE_VERSION: u32 = 2;

/// Query parameter carrying the token in a share link.
pub const SHARE_PARAM: &str = "p";

#[derive(Debug, Serialize)]
struct ShareRecord<'a> {
    v: u32,
    b: usize,
    s: usize,
    i: usize,
    c: u32,
    w: u32,
    t: u32,
    p: bool,
    r: Vec<&'a str>,
    d: Vec<usize>,
    ts: i64,
    tw: usize,
    #[serde(skip_serializing_if = "is_false")]
    m: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    o: Option<[usize; 2]>,
}

/// Progress carried by a share token, resolved against the local vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedProgress {
    pub batch_index: usize,
    pub batch_size: usize,
    pub position: usize,
    pub counters: Counters,
    pub pinyin_mode: bool,
    pub mode: QuizMode,
    pub review_queue: Vec<VocabularyEntry>,
    pub completed_batches: BTreeSet<usize>,
    pub saved_origin: Option<SavedOrigin>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Vocabulary size on the sharing device.
    pub total_words: usize,
}

impl SharedProgress {
    /// Replace `base`'s progress with the shared one.
    ///
    /// Batch statistics and settings other than pinyin mode are not part of
    /// a token and are kept from `base`.
    pub fn into_session(self, base: &SessionState, store: &WordStore) -> SessionState {
        let mut state = base.clone();
        state.mode = self.mode;
        state.batch_index = self.batch_index;
        state.batch_size = self.batch_size;
        state.position = self.position;
        state.counters = self.counters;
        state.review_queue = self.review_queue;
        state.completed_batches = self.completed_batches;
        state.saved_origin = self.saved_origin;
        state.settings.pinyin_mode = self.pinyin_mode;
        state.phase = Phase::Answering;
        state.normalize(store);
        state
    }
}

/// Encode the shareable part of `state` as a URL-safe token.
pub fn encode_share_token(
    state: &SessionState,
    total_words: usize,
    now: DateTime<Utc>,
) -> Result<String> {
    let record = ShareRecord {
        v: SHARE_VERSION,
        b: state.batch_index,
        s: state.batch_size,
        i: state.position,
        c: state.counters.correct,
        w: state.counters.wrong,
        t: state.counters.total_answered,
        p: state.settings.pinyin_mode,
        r: state
            .review_queue
            .iter()
            .map(|e| e.headword.as_str())
            .collect(),
        d: state.completed_batches.iter().copied().collect(),
        ts: now.timestamp_millis(),
        tw: total_words,
        m: state.mode == QuizMode::Review,
        o: state
            .saved_origin
            .map(|origin| [origin.batch_index, origin.position]),
    };
    let json = serde_json::to_string(&record).map_err(|e| QuizError::CorruptToken(e.to_string()))?;
    let token = lz_str::compress_to_base64(json.as_str())
        .replace('+', "-")
        .replace('/', "_")
        .trim_end_matches('=')
        .to_string();
    Ok(token)
}

/// Decode a token produced by `encode_share_token`.
///
/// Review headwords missing from `store` are dropped.
pub fn decode_share_token(token: &str, store: &WordStore) -> Result<SharedProgress> {
    let token = token.trim();
    if token.is_empty() {
        return Err(QuizError::CorruptToken("empty token".to_string()));
    }

    let mut data = token.replace('-', "+").replace('_', "/");
    while data.len() % 4 != 0 {
        data.push('=');
    }

    let units = lz_str::decompress_from_base64(data.as_str())
        .ok_or_else(|| QuizError::CorruptToken("decompression failed".to_string()))?;
    let json = String::from_utf16(&units)
        .map_err(|_| QuizError::CorruptToken("decompressed data is not text".to_string()))?;
    let value: Value =
        serde_json::from_str(&json).map_err(|e| QuizError::CorruptToken(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| QuizError::CorruptToken("expected a JSON object".to_string()))?;

    let review_queue = resolve_headwords(
        obj.get("r")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str),
        store,
    );
    let saved_origin = match index_list(obj.get("o")).as_slice() {
        [batch_index, position] => Some(SavedOrigin {
            batch_index: *batch_index,
            position: *position,
        }),
        _ => None,
    };

    Ok(SharedProgress {
        batch_index: index_field(obj, "b").unwrap_or(0),
        batch_size: index_field(obj, "s")
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE),
        position: index_field(obj, "i").unwrap_or(0),
        counters: Counters {
            correct: count_field(obj, "c"),
            wrong: count_field(obj, "w"),
            total_answered: count_field(obj, "t"),
        },
        pinyin_mode: flag(obj, "p", true),
        mode: if flag(obj, "m", false) {
            QuizMode::Review
        } else {
            QuizMode::Normal
        },
        review_queue,
        completed_batches: index_list(obj.get("d")).into_iter().collect(),
        saved_origin,
        timestamp: obj
            .get("ts")
            .and_then(Value::as_i64)
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        total_words: index_field(obj, "tw").unwrap_or(0),
    })
}

/// `<base>?p=<token>`, or `&p=` when `base` already has a query.
pub fn share_url(base: &str, token: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{SHARE_PARAM}={token}")
}

/// Pull the token out of a share link. A string without a query is taken
/// as a bare token unless it looks like a URL.
pub fn token_from_link(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    let Some((_, query)) = link.split_once('?') else {
        return (!link.contains("://")).then(|| link.to_string());
    };
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SHARE_PARAM)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
