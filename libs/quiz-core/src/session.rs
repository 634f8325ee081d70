//! Quiz session state machine.
//!
//! A session walks either a batch slice of the word store (normal mode) or
//! the review queue (review mode). Each position goes
//! `Answering -> Answered -> Answering(next)` until the sequence runs out,
//! which completes the batch or the review session.

use crate::distractor::{build_options, QuizOption, RandomSource};
use crate::error::{QuizError, Result};
use crate::types::{
    BatchSize, BatchStats, Counters, QuizMode, QuizSettings, SavedOrigin, VocabularyEntry,
};
use crate::word_store::WordStore;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Where the session is within the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Answering,
    Answered {
        was_correct: bool,
        /// The answered entry left the active sequence, so the next entry
        /// has already shifted into this position.
        removed: bool,
    },
    /// The last batch is done; only restart or a jump leaves this phase.
    AllBatchesComplete,
    ReviewComplete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answering => "answering",
            Self::Answered { .. } => "answered",
            Self::AllBatchesComplete => "all batches complete",
            Self::ReviewComplete => "review complete",
        }
    }

    fn is_in_progress(&self) -> bool {
        matches!(self, Self::Answering | Self::Answered { .. })
    }
}

/// Result of answering the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub was_correct: bool,
    pub word: VocabularyEntry,
    pub review_queue_len: usize,
}

/// What happened when the session moved past the current position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    NextQuestion {
        position: usize,
    },
    BatchComplete {
        batch_index: usize,
        stats: BatchStats,
        next_batch: usize,
    },
    AllBatchesComplete {
        batch_index: usize,
        stats: BatchStats,
    },
    ReviewComplete {
        counters: Counters,
        remaining: usize,
    },
}

/// A rendered-ready question for the current position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub word: VocabularyEntry,
    pub options: Vec<QuizOption>,
    pub position: usize,
    pub total: usize,
}

/// Status of one batch in the progress grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchStatus {
    Current,
    Completed { accuracy: Option<u32> },
    NotStarted,
}

/// Aggregate numbers for the statistics view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub total_batches: usize,
    pub completed: usize,
    pub review_count: usize,
    pub accuracy: u32,
    pub batches: Vec<BatchStatus>,
}

/// All mutable quiz progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) mode: QuizMode,
    pub(crate) batch_index: usize,
    pub(crate) batch_size: usize,
    pub(crate) position: usize,
    pub(crate) counters: Counters,
    pub(crate) review_queue: Vec<VocabularyEntry>,
    pub(crate) completed_batches: BTreeSet<usize>,
    pub(crate) batch_stats: BTreeMap<usize, BatchStats>,
    pub(crate) saved_origin: Option<SavedOrigin>,
    pub(crate) settings: QuizSettings,
    pub(crate) phase: Phase,
}

impl SessionState {
    /// Fresh state at batch 0.
    pub fn new(batch_size: usize) -> Self {
        Self {
            mode: QuizMode::Normal,
            batch_index: 0,
            batch_size: batch_size.max(1),
            position: 0,
            counters: Counters::default(),
            review_queue: Vec::new(),
            completed_batches: BTreeSet::new(),
            batch_stats: BTreeMap::new(),
            saved_origin: None,
            settings: QuizSettings::default(),
            phase: Phase::Answering,
        }
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn review_queue(&self) -> &[VocabularyEntry] {
        &self.review_queue
    }

    pub fn completed_batches(&self) -> &BTreeSet<usize> {
        &self.completed_batches
    }

    pub fn batch_stats(&self) -> &BTreeMap<usize, BatchStats> {
        &self.batch_stats
    }

    pub fn saved_origin(&self) -> Option<SavedOrigin> {
        self.saved_origin
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut QuizSettings {
        &mut self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The sequence questions are drawn from in the current mode.
    pub fn active_words<'a>(&'a self, store: &'a WordStore) -> &'a [VocabularyEntry] {
        match self.mode {
            QuizMode::Review => &self.review_queue,
            QuizMode::Normal => store.slice_batch(self.batch_index, self.batch_size),
        }
    }

    /// The word being asked, if a question is in progress.
    pub fn current_word<'a>(&'a self, store: &'a WordStore) -> Option<&'a VocabularyEntry> {
        if !self.phase.is_in_progress() {
            return None;
        }
        self.active_words(store).get(self.position)
    }

    pub fn is_final_batch(&self, store: &WordStore) -> bool {
        self.batch_index + 1 >= store.batch_count(self.batch_size)
    }

    /// Build the options for the current word.
    ///
    /// Normal mode draws distractors from similar words, then the batch;
    /// review mode draws them from the whole vocabulary.
    pub fn build_question(
        &self,
        store: &WordStore,
        option_count: usize,
        random: &mut dyn RandomSource,
    ) -> Result<Option<Question>> {
        let Some(word) = self.current_word(store) else {
            return Ok(None);
        };
        let options = match self.mode {
            QuizMode::Normal => {
                let similar = store.similar_to(&word.headword);
                build_options(
                    word,
                    store.slice_batch(self.batch_index, self.batch_size),
                    &similar,
                    option_count,
                    random,
                )?
            }
            QuizMode::Review => build_options(word, store.entries(), &[], option_count, random)?,
        };
        Ok(Some(Question {
            word: word.clone(),
            options,
            position: self.position,
            total: self.active_words(store).len(),
        }))
    }

    /// Record an answer for the current word.
    pub fn answer(&mut self, store: &WordStore, selected_headword: &str) -> Result<AnswerOutcome> {
        if self.phase != Phase::Answering {
            return Err(self.invalid("answer"));
        }
        let word = self
            .current_word(store)
            .cloned()
            .ok_or_else(|| self.invalid("answer"))?;
        let was_correct = selected_headword == word.headword;
        self.counters.record(was_correct);

        let mut removed = false;
        match (self.mode, was_correct) {
            (QuizMode::Normal, false) => {
                if !self.in_review_queue(&word.headword) {
                    self.review_queue.push(word.clone());
                }
            }
            (QuizMode::Normal, true) => {
                self.review_queue.retain(|e| e.headword != word.headword);
            }
            (QuizMode::Review, true) => {
                self.review_queue.remove(self.position);
                removed = true;
            }
            (QuizMode::Review, false) => {}
        }

        self.phase = Phase::Answered {
            was_correct,
            removed,
        };
        tracing::debug!(
            headword = %word.headword,
            was_correct,
            mode = self.mode.as_str(),
            "answer recorded"
        );

        Ok(AnswerOutcome {
            was_correct,
            word,
            review_queue_len: self.review_queue.len(),
        })
    }

    /// Move past an answered question.
    pub fn advance(&mut self, store: &WordStore) -> Result<AdvanceOutcome> {
        match self.phase {
            Phase::Answered { removed, .. } => Ok(self.move_on(store, removed)),
            _ => Err(self.invalid("advance")),
        }
    }

    /// Move on without crediting an answer.
    pub fn skip(&mut self, store: &WordStore) -> Result<AdvanceOutcome> {
        match self.phase {
            Phase::Answering => Ok(self.move_on(store, false)),
            Phase::Answered { removed, .. } => Ok(self.move_on(store, removed)),
            _ => Err(self.invalid("skip")),
        }
    }

    fn move_on(&mut self, store: &WordStore, removed: bool) -> AdvanceOutcome {
        let next = if removed {
            self.position
        } else {
            self.position + 1
        };
        let len = self.active_words(store).len();
        if next < len {
            self.position = next;
            self.phase = Phase::Answering;
            return AdvanceOutcome::NextQuestion { position: next };
        }

        match self.mode {
            QuizMode::Normal => self.complete_batch(store),
            QuizMode::Review => {
                self.position = 0;
                self.phase = Phase::ReviewComplete;
                tracing::debug!(remaining = self.review_queue.len(), "review session complete");
                AdvanceOutcome::ReviewComplete {
                    counters: self.counters,
                    remaining: self.review_queue.len(),
                }
            }
        }
    }

    fn complete_batch(&mut self, store: &WordStore) -> AdvanceOutcome {
        let batch_index = self.batch_index;
        let batch_len = store.slice_batch(batch_index, self.batch_size).len();
        let stats = BatchStats {
            correct: self.counters.correct,
            total: batch_len as u32,
            accuracy: self.counters.accuracy(),
        };
        self.batch_stats.insert(batch_index, stats);
        self.completed_batches.insert(batch_index);

        if self.is_final_batch(store) {
            self.position = batch_len.saturating_sub(1);
            self.phase = Phase::AllBatchesComplete;
            tracing::info!(batch = batch_index, "final batch complete");
            return AdvanceOutcome::AllBatchesComplete { batch_index, stats };
        }

        self.batch_index += 1;
        self.position = 0;
        self.counters = Counters::default();
        self.phase = Phase::Answering;
        tracing::info!(batch = batch_index, accuracy = stats.accuracy, "batch complete");
        AdvanceOutcome::BatchComplete {
            batch_index,
            stats,
            next_batch: self.batch_index,
        }
    }

    /// Step to the previous word without answering.
    pub fn step_back(&mut self) -> bool {
        if !self.phase.is_in_progress() || self.position == 0 {
            return false;
        }
        self.position -= 1;
        self.phase = Phase::Answering;
        true
    }

    /// Step to the next word without answering.
    ///
    /// After an in-place review removal the next word already sits at
    /// `position`, so that is where the step lands.
    pub fn step_forward(&mut self, store: &WordStore) -> bool {
        let next = match self.phase {
            Phase::Answered { removed: true, .. } => self.position,
            Phase::Answering | Phase::Answered { .. } => self.position + 1,
            _ => return false,
        };
        if next >= self.active_words(store).len() {
            return false;
        }
        self.position = next;
        self.phase = Phase::Answering;
        true
    }

    /// Jump to any batch with at least one word.
    pub fn go_to_batch(&mut self, store: &WordStore, batch_index: usize) -> Result<()> {
        if store.slice_batch(batch_index, self.batch_size).is_empty() {
            return Err(QuizError::BatchOutOfRange { batch_index });
        }
        self.mode = QuizMode::Normal;
        self.saved_origin = None;
        self.batch_index = batch_index;
        self.position = 0;
        self.counters = Counters::default();
        self.phase = Phase::Answering;
        Ok(())
    }

    /// Back to batch 0 with all progress cleared.
    pub fn restart(&mut self) {
        self.reset_all();
    }

    pub fn enter_review(&mut self) -> Result<()> {
        if self.mode == QuizMode::Review {
            return Err(QuizError::InvalidTransition {
                operation: "enter review",
                phase: "already reviewing",
            });
        }
        if self.review_queue.is_empty() {
            return Err(QuizError::ReviewQueueEmpty);
        }
        self.saved_origin = Some(SavedOrigin {
            batch_index: self.batch_index,
            position: self.position,
        });
        self.mode = QuizMode::Review;
        self.counters = Counters::default();
        self.position = 0;
        self.phase = Phase::Answering;
        tracing::debug!(words = self.review_queue.len(), "review session started");
        Ok(())
    }

    /// Practice one queued word first, then the rest of the queue.
    pub fn enter_review_with(&mut self, headword: &str) -> Result<()> {
        let idx = self
            .review_queue
            .iter()
            .position(|e| e.headword == headword)
            .ok_or_else(|| QuizError::NotInReviewQueue(headword.to_string()))?;
        if self.mode == QuizMode::Review {
            return Err(QuizError::InvalidTransition {
                operation: "enter review",
                phase: "already reviewing",
            });
        }
        let entry = self.review_queue.remove(idx);
        self.review_queue.insert(0, entry);
        self.enter_review()
    }

    /// Another pass over whatever is still queued.
    pub fn continue_review(&mut self) -> Result<()> {
        if self.mode != QuizMode::Review {
            return Err(self.invalid("continue review"));
        }
        if self.review_queue.is_empty() {
            return Err(QuizError::ReviewQueueEmpty);
        }
        self.counters = Counters::default();
        self.position = 0;
        self.phase = Phase::Answering;
        Ok(())
    }

    /// Leave review mode and return to the saved batch position.
    pub fn exit_review(&mut self, store: &WordStore) -> Result<()> {
        if self.mode != QuizMode::Review {
            return Err(self.invalid("exit review"));
        }
        let origin = self.saved_origin.take().unwrap_or(SavedOrigin {
            batch_index: self.batch_index,
            position: 0,
        });
        self.mode = QuizMode::Normal;
        self.batch_index = origin.batch_index;
        self.position = origin.position;
        self.counters = Counters::default();
        self.phase = Phase::Answering;
        self.normalize(store);
        tracing::debug!(batch = self.batch_index, position = self.position, "review exited");
        Ok(())
    }

    /// New batch size; resets position, queue and stats.
    pub fn change_batch_size(&mut self, store: &WordStore, size: BatchSize) -> Result<()> {
        let resolved = size.resolve(store.len());
        if resolved == 0 {
            return Err(QuizError::InvalidBatchSize);
        }
        let settings = self.settings;
        *self = Self::new(resolved);
        self.settings = settings;
        Ok(())
    }

    /// Clear the counters and drop the current batch's words from the queue.
    pub fn reset_batch(&mut self, store: &WordStore) {
        if self.mode == QuizMode::Review {
            // Review has no batch of its own; reset the one it was entered from.
            let origin = self.saved_origin.take();
            self.mode = QuizMode::Normal;
            if let Some(origin) = origin {
                self.batch_index = origin.batch_index;
            }
        }
        let batch: BTreeSet<&str> = store
            .slice_batch(self.batch_index, self.batch_size)
            .iter()
            .map(|e| e.headword.as_str())
            .collect();
        self.review_queue
            .retain(|e| !batch.contains(e.headword.as_str()));
        self.counters = Counters::default();
        self.position = 0;
        self.phase = Phase::Answering;
        self.normalize(store);
    }

    /// Fresh state, keeping the batch size and settings.
    pub fn reset_all(&mut self) {
        let settings = self.settings;
        *self = Self::new(self.batch_size);
        self.settings = settings;
    }

    /// Numbers for the statistics view.
    pub fn overview(&self, store: &WordStore) -> Overview {
        let total_batches = store.batch_count(self.batch_size);
        let batches = (0..total_batches)
            .map(|idx| {
                if idx == self.batch_index && self.mode == QuizMode::Normal {
                    BatchStatus::Current
                } else if self.completed_batches.contains(&idx) {
                    BatchStatus::Completed {
                        accuracy: self.batch_stats.get(&idx).map(|s| s.accuracy),
                    }
                } else {
                    BatchStatus::NotStarted
                }
            })
            .collect();
        Overview {
            total_batches,
            completed: self.completed_batches.len(),
            review_count: self.review_queue.len(),
            accuracy: self.counters.accuracy(),
            batches,
        }
    }

    /// Restore the invariants after loading state from outside.
    pub(crate) fn normalize(&mut self, store: &WordStore) {
        if self.batch_size == 0 {
            self.batch_size = 1;
        }
        if self.mode == QuizMode::Review && self.review_queue.is_empty() {
            let origin = self.saved_origin.take();
            self.mode = QuizMode::Normal;
            if let Some(origin) = origin {
                self.batch_index = origin.batch_index;
                self.position = origin.position;
            }
        }
        if self.mode == QuizMode::Normal {
            self.saved_origin = None;
        }
        if let Some(origin) = self.saved_origin {
            if store.slice_batch(origin.batch_index, self.batch_size).is_empty() {
                self.saved_origin = None;
            }
        }
        if store.slice_batch(self.batch_index, self.batch_size).is_empty() {
            self.batch_index = 0;
        }
        if self.position >= self.active_words(store).len() {
            self.position = 0;
        }
        if self.phase.is_in_progress() {
            self.phase = Phase::Answering;
        }
        if self.phase == Phase::AllBatchesComplete && !self.is_parked_at_end(store) {
            self.phase = Phase::Answering;
        }
    }

    /// Normal mode on the final batch with that batch completed.
    fn is_parked_at_end(&self, store: &WordStore) -> bool {
        self.mode == QuizMode::Normal
            && self.is_final_batch(store)
            && self.completed_batches.contains(&self.batch_index)
    }

    fn in_review_queue(&self, headword: &str) -> bool {
        self.review_queue.iter().any(|e| e.headword == headword)
    }

    fn invalid(&self, operation: &'static str) -> QuizError {
        QuizError::InvalidTransition {
            operation,
            phase: self.phase.as_str(),
        }
    }
}
