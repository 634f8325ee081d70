#![allow(dead_code)]

use quiz_core::{
    builtin_vocabulary, FixedSequence, Orchestrator, QuizConfig, SystemClock, WordStore,
};
use vocab_quiz_terminal::db::SqliteStore;
use vocab_quiz_terminal::render::TerminalRenderer;

pub type TestQuiz = Orchestrator<SqliteStore, TerminalRenderer<Vec<u8>>>;

/// Quiz over the built-in list in batches of four, backed by in-memory SQLite.
pub fn quiz() -> TestQuiz {
    let store = WordStore::load(builtin_vocabulary()).unwrap();
    let config = QuizConfig {
        default_batch_size: 4,
        ..QuizConfig::default()
    };
    let mut quiz = Orchestrator::new(
        store,
        config,
        SqliteStore::open_in_memory().unwrap(),
        TerminalRenderer::new(Vec::new(), "Vocabulary Quiz", "test"),
        SystemClock,
        Box::new(FixedSequence::new(vec![3, 1, 4, 1, 5, 9, 2, 6])),
    )
    .unwrap();
    quiz.start().unwrap();
    quiz
}

pub fn correct_index(quiz: &TestQuiz) -> usize {
    quiz.question()
        .unwrap()
        .options
        .iter()
        .position(|o| o.is_correct)
        .unwrap()
}

pub fn wrong_index(quiz: &TestQuiz) -> usize {
    quiz.question()
        .unwrap()
        .options
        .iter()
        .position(|o| !o.is_correct)
        .unwrap()
}
