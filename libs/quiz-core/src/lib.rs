//! Core of the vocabulary quiz, shared by every host application.
//!
//! Provides:
//! - Word store with a precomputed phonetic-similarity index
//! - Multiple-choice option building with a deterministic shuffle
//! - Batch and review session state machine
//! - Progress persistence, migration and share tokens
//! - Orchestrator wiring the above to storage, rendering and timers

pub mod distractor;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod types;
pub mod vocabulary;
pub mod word_store;

pub use distractor::{
    build_options, deterministic_shuffle, seed_hash, FixedSequence, QuizOption, RandomSource,
    RngSource,
};
pub use error::{QuizError, Result};
pub use orchestrator::{
    Clock, Feedback, Orchestrator, ProgressStore, QuizEvent, QuizView, Renderer, SystemClock,
};
pub use progress::{
    decode_share_token, encode_share_token, migrate, share_url, token_from_link, ProgressRecord,
    SharedProgress, DEVICE_ID_KEY, LEGACY_PROGRESS_KEY, PROGRESS_KEY, PROGRESS_VERSION,
};
pub use scheduler::{AdvanceScheduler, PendingAdvance, Ticket};
pub use session::{
    AdvanceOutcome, AnswerOutcome, BatchStatus, Overview, Phase, Question, SessionState,
};
pub use types::{
    accuracy_percent, BatchSize, BatchStats, Counters, QuizConfig, QuizMode, QuizSettings,
    SavedOrigin, VocabularyEntry, DEFAULT_BATCH_SIZE,
};
pub use vocabulary::{
    builtin_vocabulary, parse_vocabulary, resolve_vocabulary, Vocabulary, VocabularyLoad,
    VocabularyMetadata,
};
pub use word_store::{normalize_pronunciation, WordStore, DEFAULT_SIMILAR_POOL};
