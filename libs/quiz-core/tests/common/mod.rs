//! Shared test collaborators for orchestrator tests.
//!
//! - `MemoryStore`: in-memory key-value sink that can be told to fail writes
//! - `RecordingRenderer`: keeps every frame and event it receives
//! - `FixedClock`: always returns the same instant

#![allow(dead_code)]

pub mod fixtures;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use quiz_core::{
    Clock, FixedSequence, Orchestrator, ProgressStore, QuizConfig, QuizError, QuizEvent, QuizView,
    Renderer, Result, VocabularyEntry, WordStore,
};

pub type TestQuiz = Orchestrator<MemoryStore, RecordingRenderer, FixedClock>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub values: HashMap<String, String>,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn with(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(QuizError::Storage("disk full".to_string()));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub views: Vec<QuizView>,
    pub events: Vec<QuizEvent>,
}

impl RecordingRenderer {
    pub fn last_view(&self) -> &QuizView {
        self.views.last().expect("nothing rendered yet")
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, view: &QuizView) {
        self.views.push(view.clone());
    }

    fn notify(&mut self, event: &QuizEvent) {
        self.events.push(event.clone());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(DateTime::<Utc>::from_timestamp_millis(1_714_000_000_000).expect("valid timestamp"))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Quiz over `words` with batches of four.
pub fn quiz(words: Vec<VocabularyEntry>, sink: MemoryStore) -> TestQuiz {
    try_quiz(words, sink).expect("quiz should build")
}

pub fn try_quiz(words: Vec<VocabularyEntry>, sink: MemoryStore) -> Result<TestQuiz> {
    let config = QuizConfig {
        default_batch_size: 4,
        ..QuizConfig::default()
    };
    let store = WordStore::load(words)?;
    Orchestrator::new(
        store,
        config,
        sink,
        RecordingRenderer::default(),
        FixedClock::default(),
        Box::new(FixedSequence::new(vec![5, 1, 7, 3, 2, 8, 0, 6, 4, 9])),
    )
}

/// Index of the correct option in the current question.
pub fn correct_option(quiz: &TestQuiz) -> usize {
    quiz.question()
        .expect("question on screen")
        .options
        .iter()
        .position(|o| o.is_correct)
        .expect("one option is correct")
}

/// Index of some wrong option in the current question.
pub fn wrong_option(quiz: &TestQuiz) -> usize {
    quiz.question()
        .expect("question on screen")
        .options
        .iter()
        .position(|o| !o.is_correct)
        .expect("a distractor exists")
}
