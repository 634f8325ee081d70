//! Application error types.

use crate::db::DbError;
use quiz_core::QuizError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown command: {0} (type `help` for a list)")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

pub type Result<T> = std::result::Result<T, AppError>;
