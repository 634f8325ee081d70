//! Error types for quiz-core.

use thiserror::Error;

/// Result type alias using QuizError.
pub type Result<T> = std::result::Result<T, QuizError>;

/// Errors raised by the quiz engine and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("vocabulary is empty")]
    EmptyVocabulary,

    #[error("vocabulary source unavailable: {0}")]
    VocabularySourceUnavailable(String),

    #[error("invalid vocabulary data: {0}")]
    InvalidVocabulary(String),

    #[error("need {required} distinct options but only {available} are available")]
    InsufficientPoolForOptions { required: usize, available: usize },

    #[error("corrupt share token: {0}")]
    CorruptToken(String),

    #[error("corrupt progress data: {0}")]
    CorruptProgress(String),

    #[error("review queue is empty")]
    ReviewQueueEmpty,

    #[error("{0} is not in the review queue")]
    NotInReviewQueue(String),

    #[error("batch {batch_index} is out of range")]
    BatchOutOfRange { batch_index: usize },

    #[error("batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("no option at index {index}")]
    UnknownOption { index: usize },

    #[error("storage error: {0}")]
    Storage(String),
}

impl QuizError {
    /// Whether the caller can carry on with defaults after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InsufficientPoolForOptions { .. } | Self::InvalidBatchSize)
    }
}
