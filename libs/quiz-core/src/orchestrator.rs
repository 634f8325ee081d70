//! Wires the session to storage, rendering, time and randomness.
//!
//! Every user action goes through the orchestrator. A successful transition
//! cancels any pending auto-advance, saves progress and re-renders. Saving is
//! fire-and-forget: a failing store is logged and otherwise ignored.

use crate::distractor::RandomSource;
use crate::error::{QuizError, Result};
use crate::progress::{
    self, decode_share_token, encode_share_token, SharedProgress, DEVICE_ID_KEY,
    LEGACY_PROGRESS_KEY, PROGRESS_KEY,
};
use crate::scheduler::{AdvanceScheduler, PendingAdvance, Ticket};
use crate::session::{AdvanceOutcome, AnswerOutcome, Overview, Phase, Question, SessionState};
use crate::types::{BatchSize, BatchStats, Counters, QuizConfig, QuizMode, QuizSettings};
use crate::word_store::WordStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Key-value persistence for progress and device identity.
pub trait ProgressStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Receives snapshots to display. Holds no quiz state of its own.
pub trait Renderer {
    fn render(&mut self, view: &QuizView);
    fn notify(&mut self, event: &QuizEvent);
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shown after an answer until the session moves on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub selected: usize,
    pub correct_index: usize,
    pub was_correct: bool,
    /// The right answer in display form, set for wrong answers.
    pub correction: Option<String>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizView {
    pub question: Option<Question>,
    pub feedback: Option<Feedback>,
    pub mode: QuizMode,
    pub phase: Phase,
    pub batch_index: usize,
    pub total_batches: usize,
    pub counters: Counters,
    pub review_count: usize,
    pub settings: QuizSettings,
}

/// Things worth telling the user about, separate from the regular frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    Answered(AnswerOutcome),
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
    ProgressRestored,
    /// Stored progress could not be read and was replaced by a fresh session.
    ProgressDiscarded(QuizError),
    SharedProgressLoaded,
    ProgressReset,
}

pub struct Orchestrator<S, R, C = SystemClock> {
    store: WordStore,
    config: QuizConfig,
    state: SessionState,
    sink: S,
    renderer: R,
    clock: C,
    random: Box<dyn RandomSource>,
    scheduler: AdvanceScheduler,
    question: Option<Question>,
    feedback: Option<Feedback>,
}

impl<S: ProgressStore, R: Renderer, C: Clock> Orchestrator<S, R, C> {
    /// Set up a quiz and restore saved progress if there is any.
    ///
    /// Fails when the vocabulary is too small to fill a question.
    pub fn new(
        store: WordStore,
        config: QuizConfig,
        sink: S,
        renderer: R,
        clock: C,
        random: Box<dyn RandomSource>,
    ) -> Result<Self> {
        if store.len() < config.option_count {
            return Err(QuizError::InsufficientPoolForOptions {
                required: config.option_count,
                available: store.len(),
            });
        }

        let mut orchestrator = Self {
            state: SessionState::new(config.default_batch_size),
            store,
            config,
            sink,
            renderer,
            clock,
            random,
            scheduler: AdvanceScheduler::new(),
            question: None,
            feedback: None,
        };
        orchestrator.restore();
        Ok(orchestrator)
    }

    fn restore(&mut self) {
        let raw = match self.sink.get(PROGRESS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved progress");
                return;
            }
        };
        match progress::deserialize(&raw, &self.store, self.config.default_batch_size) {
            Ok(state) => {
                tracing::info!(
                    batch = state.batch_index(),
                    position = state.position(),
                    mode = state.mode().as_str(),
                    "progress restored"
                );
                self.state = state;
                self.renderer.notify(&QuizEvent::ProgressRestored);
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable progress");
                self.renderer.notify(&QuizEvent::ProgressDiscarded(e));
            }
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn word_store(&self) -> &WordStore {
        &self.store
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.scheduler.pending()
    }

    pub fn overview(&self) -> Overview {
        self.state.overview(&self.store)
    }

    /// Show the current question.
    pub fn start(&mut self) -> Result<()> {
        self.present()
    }

    /// Answer the current question by option index.
    pub fn answer(&mut self, index: usize) -> Result<AnswerOutcome> {
        let question = self
            .question
            .as_ref()
            .ok_or(QuizError::InvalidTransition {
                operation: "answer",
                phase: self.state.phase().as_str(),
            })?;
        let selected = question
            .options
            .get(index)
            .ok_or(QuizError::UnknownOption { index })?
            .entry
            .headword
            .clone();
        let correct_index = question
            .options
            .iter()
            .position(|o| o.is_correct)
            .unwrap_or_default();

        let outcome = self.state.answer(&self.store, &selected)?;
        self.scheduler.cancel();
        self.feedback = Some(Feedback {
            selected: index,
            correct_index,
            was_correct: outcome.was_correct,
            correction: (!outcome.was_correct)
                .then(|| self.state.settings().correction_text(&outcome.word)),
        });
        self.persist();
        self.renderer.notify(&QuizEvent::Answered(outcome.clone()));
        self.render();

        if self.state.settings().auto_advance {
            self.scheduler.schedule(self.config.feedback_delay);
        }
        Ok(outcome)
    }

    /// Run a fired auto-advance. Stale tickets are ignored.
    pub fn fire_advance(&mut self, ticket: Ticket) -> Result<Option<AdvanceOutcome>> {
        if !self.scheduler.take_due(ticket) {
            tracing::debug!("stale advance ticket ignored");
            return Ok(None);
        }
        self.advance().map(Some)
    }

    /// Move past an answered question.
    pub fn advance(&mut self) -> Result<AdvanceOutcome> {
        let outcome = self.state.advance(&self.store)?;
        self.moved_on(outcome)
    }

    pub fn skip(&mut self) -> Result<AdvanceOutcome> {
        let outcome = self.state.skip(&self.store)?;
        self.moved_on(outcome)
    }

    /// Returns false when already at the first word.
    pub fn step_back(&mut self) -> Result<bool> {
        if !self.state.step_back() {
            return Ok(false);
        }
        self.transitioned()?;
        Ok(true)
    }

    /// Returns false when already at the last word.
    pub fn step_forward(&mut self) -> Result<bool> {
        if !self.state.step_forward(&self.store) {
            return Ok(false);
        }
        self.transitioned()?;
        Ok(true)
    }

    pub fn go_to_batch(&mut self, batch_index: usize) -> Result<()> {
        self.state.go_to_batch(&self.store, batch_index)?;
        self.transitioned()
    }

    pub fn enter_review(&mut self) -> Result<()> {
        self.state.enter_review()?;
        self.transitioned()
    }

    pub fn enter_review_with(&mut self, headword: &str) -> Result<()> {
        self.state.enter_review_with(headword)?;
        self.transitioned()
    }

    pub fn continue_review(&mut self) -> Result<()> {
        self.state.continue_review()?;
        self.transitioned()
    }

    pub fn exit_review(&mut self) -> Result<()> {
        self.state.exit_review(&self.store)?;
        self.transitioned()
    }

    pub fn change_batch_size(&mut self, size: BatchSize) -> Result<()> {
        self.state.change_batch_size(&self.store, size)?;
        self.transitioned()
    }

    pub fn reset_batch(&mut self) -> Result<()> {
        self.state.reset_batch(&self.store);
        self.transitioned()
    }

    pub fn restart(&mut self) -> Result<()> {
        self.state.restart();
        self.transitioned()
    }

    /// Clear all progress, including anything under the legacy key.
    pub fn reset_all(&mut self) -> Result<()> {
        self.scheduler.cancel();
        self.state.reset_all();
        for key in [PROGRESS_KEY, LEGACY_PROGRESS_KEY] {
            if let Err(e) = self.sink.remove(key) {
                tracing::warn!(key, error = %e, "could not remove saved progress");
            }
        }
        self.renderer.notify(&QuizEvent::ProgressReset);
        self.present()
    }

    pub fn set_pinyin_mode(&mut self, on: bool) -> Result<()> {
        self.update_settings(|s| s.pinyin_mode = on)
    }

    pub fn set_show_translation(&mut self, on: bool) -> Result<()> {
        self.update_settings(|s| s.show_translation = on)
    }

    pub fn set_auto_advance(&mut self, on: bool) -> Result<()> {
        self.update_settings(|s| s.auto_advance = on)
    }

    pub fn set_sound(&mut self, on: bool) -> Result<()> {
        self.update_settings(|s| s.sound_enabled = on)
    }

    /// Settings only change labels, so the current question keeps its
    /// options and any feedback stays up.
    fn update_settings(&mut self, change: impl FnOnce(&mut QuizSettings)) -> Result<()> {
        change(self.state.settings_mut());
        if !self.state.settings().auto_advance {
            self.scheduler.cancel();
        }
        if let (Some(feedback), Some(question)) = (&mut self.feedback, &self.question) {
            if !feedback.was_correct {
                feedback.correction = question
                    .options
                    .get(feedback.correct_index)
                    .map(|o| self.state.settings().correction_text(&o.entry));
            }
        }
        self.persist();
        self.render();
        Ok(())
    }

    /// Current progress as a share token.
    pub fn share_token(&self) -> Result<String> {
        encode_share_token(&self.state, self.store.len(), self.clock.now())
    }

    /// Decode a token without applying it, so the caller can confirm first.
    pub fn decode_share(&self, token: &str) -> Result<SharedProgress> {
        decode_share_token(token, &self.store)
    }

    /// Replace the current progress with shared progress.
    pub fn apply_shared(&mut self, shared: SharedProgress) -> Result<()> {
        self.scheduler.cancel();
        self.state = shared.into_session(&self.state, &self.store);
        self.persist();
        self.renderer.notify(&QuizEvent::SharedProgressLoaded);
        tracing::info!(batch = self.state.batch_index(), "shared progress loaded");
        self.present()
    }

    /// Write progress now and report failures.
    pub fn save(&mut self) -> Result<()> {
        let record = progress::serialize(&self.state, self.store.len(), self.clock.now());
        self.sink.set(PROGRESS_KEY, &record.to_json()?)
    }

    /// Per-install id, created on first use.
    pub fn device_id(&mut self) -> Result<String> {
        if let Some(id) = self.sink.get(DEVICE_ID_KEY)? {
            return Ok(id);
        }
        let id = format!("device_{}", Uuid::new_v4());
        self.sink.set(DEVICE_ID_KEY, &id)?;
        Ok(id)
    }

    fn transitioned(&mut self) -> Result<()> {
        self.scheduler.cancel();
        self.persist();
        self.present()
    }

    fn moved_on(&mut self, outcome: AdvanceOutcome) -> Result<AdvanceOutcome> {
        self.scheduler.cancel();
        self.persist();
        self.announce(&outcome);
        self.present()?;
        Ok(outcome)
    }

    fn announce(&mut self, outcome: &AdvanceOutcome) {
        let event = match *outcome {
            AdvanceOutcome::NextQuestion { .. } => return,
            AdvanceOutcome::BatchComplete {
                batch_index,
                stats,
                next_batch,
            } => QuizEvent::BatchComplete {
                batch_index,
                stats,
                next_batch,
            },
            AdvanceOutcome::AllBatchesComplete { batch_index, stats } => {
                QuizEvent::AllBatchesComplete { batch_index, stats }
            }
            AdvanceOutcome::ReviewComplete {
                counters,
                remaining,
            } => QuizEvent::ReviewComplete {
                counters,
                remaining,
            },
        };
        self.renderer.notify(&event);
    }

    /// Regenerate the question for the current position and render it.
    fn present(&mut self) -> Result<()> {
        self.feedback = None;
        self.question =
            self.state
                .build_question(&self.store, self.config.option_count, &mut *self.random)?;
        self.render();
        Ok(())
    }

    fn render(&mut self) {
        let view = QuizView {
            question: self.question.clone(),
            feedback: self.feedback.clone(),
            mode: self.state.mode(),
            phase: self.state.phase(),
            batch_index: self.state.batch_index(),
            total_batches: self.store.batch_count(self.state.batch_size()),
            counters: self.state.counters(),
            review_count: self.state.review_queue().len(),
            settings: *self.state.settings(),
        };
        self.renderer.render(&view);
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "could not save progress");
        }
    }
}
