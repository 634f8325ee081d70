//! Multiple-choice option building.
//!
//! Options are the correct entry, then similar-sounding words, then random
//! picks from the pool, finally put in a deterministic order keyed by the
//! correct headword.

use crate::error::{QuizError, Result};
use crate::types::VocabularyEntry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Source of uniformly random indices.
pub trait RandomSource {
    /// A value in `0..upper`. `upper` is never zero.
    fn next_index(&mut self, upper: usize) -> usize;
}

/// `RandomSource` backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<StdRng> {
    /// Seeded from the operating system.
    pub fn from_os() -> Self {
        Self(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_index(&mut self, upper: usize) -> usize {
        self.0.random_range(0..upper)
    }
}

/// Replays a fixed list of values, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    values: Vec<usize>,
    cursor: usize,
}

impl FixedSequence {
    pub fn new(values: Vec<usize>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl RandomSource for FixedSequence {
    fn next_index(&mut self, upper: usize) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value % upper
    }
}

/// One multiple-choice option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub entry: VocabularyEntry,
    pub is_correct: bool,
}

/// Seed hash: `hash = hash * 31 + code_unit`, wrapping at 32 bits.
pub fn seed_hash(seed: &str) -> i32 {
    seed.encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        })
}

/// Fisher-Yates pass driven by the seed hash. Same items and seed always
/// give the same order.
pub fn deterministic_shuffle<T>(items: &mut [T], seed: &str) {
    let mut hash = seed_hash(seed);
    for i in (1..items.len()).rev() {
        let modulus = (i + 1) as i64;
        let j = (i64::from(hash) % modulus).unsigned_abs() as usize;
        items.swap(i, j);
        hash = hash.wrapping_mul(31).wrapping_add(i as i32);
    }
}

/// Build `option_count` options for `correct`.
///
/// `pool` must hold enough distinct headwords to fill whatever `similar`
/// leaves short, otherwise `InsufficientPoolForOptions` is returned instead
/// of retrying forever.
pub fn build_options(
    correct: &VocabularyEntry,
    pool: &[VocabularyEntry],
    similar: &[&VocabularyEntry],
    option_count: usize,
    random: &mut dyn RandomSource,
) -> Result<Vec<QuizOption>> {
    let mut chosen: Vec<&VocabularyEntry> = Vec::with_capacity(option_count);
    let mut present: HashSet<&str> = HashSet::new();
    chosen.push(correct);
    present.insert(correct.headword.as_str());

    for candidate in similar {
        if chosen.len() >= option_count {
            break;
        }
        if present.insert(candidate.headword.as_str()) {
            chosen.push(*candidate);
        }
    }

    if chosen.len() < option_count {
        let fresh: HashSet<&str> = pool
            .iter()
            .map(|e| e.headword.as_str())
            .filter(|h| !present.contains(h))
            .collect();
        let needed = option_count - chosen.len();
        if fresh.len() < needed {
            return Err(QuizError::InsufficientPoolForOptions {
                required: option_count,
                available: chosen.len() + fresh.len(),
            });
        }

        while chosen.len() < option_count {
            let candidate = &pool[random.next_index(pool.len())];
            if present.insert(candidate.headword.as_str()) {
                chosen.push(candidate);
            }
        }
    }

    let mut options: Vec<QuizOption> = chosen
        .into_iter()
        .map(|entry| QuizOption {
            is_correct: entry.headword == correct.headword,
            entry: entry.clone(),
        })
        .collect();
    deterministic_shuffle(&mut options, &correct.headword);
    Ok(options)
}
