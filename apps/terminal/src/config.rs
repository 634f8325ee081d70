//! Environment-driven configuration.

use crate::error::{AppError, Result};
use quiz_core::{BatchSize, QuizConfig};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_VOCABULARY_PATH: &str = "vocabulary.json";
const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:8000/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub vocabulary_path: PathBuf,
    pub db_path: PathBuf,
    pub feedback_delay: Option<Duration>,
    pub batch_size: Option<BatchSize>,
    pub similar_pool_size: Option<usize>,
    /// Share link or bare token to offer on startup.
    pub share_link: Option<String>,
    /// Page address share links are built on.
    pub share_base_url: String,
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocab-quiz")
        .join("progress.db")
}

impl AppConfig {
    /// Read `QUIZ_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let feedback_delay = var("QUIZ_FEEDBACK_DELAY_MS")
            .map(|ms| {
                ms.parse::<u64>().map(Duration::from_millis).map_err(|_| {
                    AppError::Config(format!("QUIZ_FEEDBACK_DELAY_MS must be milliseconds, got {ms:?}"))
                })
            })
            .transpose()?;
        let batch_size = var("QUIZ_BATCH_SIZE")
            .map(|size| {
                BatchSize::parse(&size).ok_or_else(|| {
                    AppError::Config(format!(
                        "QUIZ_BATCH_SIZE must be a positive number or \"all\", got {size:?}"
                    ))
                })
            })
            .transpose()?;
        let similar_pool_size = var("QUIZ_SIMILAR_POOL_SIZE")
            .map(|n| {
                n.parse::<usize>().map_err(|_| {
                    AppError::Config(format!("QUIZ_SIMILAR_POOL_SIZE must be a number, got {n:?}"))
                })
            })
            .transpose()?;

        Ok(Self {
            vocabulary_path: var("QUIZ_VOCABULARY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VOCABULARY_PATH)),
            db_path: var("QUIZ_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            feedback_delay,
            batch_size,
            similar_pool_size,
            share_link: var("QUIZ_SHARE_LINK"),
            share_base_url: var("QUIZ_SHARE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SHARE_BASE_URL.to_string()),
        })
    }

    /// Similar words gathered per entry when the word store is built.
    pub fn similar_pool_size(&self) -> usize {
        self.similar_pool_size
            .unwrap_or(QuizConfig::default().similar_pool_size)
    }

    /// Engine settings for a vocabulary of `vocabulary_len` words.
    pub fn quiz_config(&self, vocabulary_len: usize) -> QuizConfig {
        let defaults = QuizConfig::default();
        QuizConfig {
            default_batch_size: self
                .batch_size
                .map_or(defaults.default_batch_size, |size| size.resolve(vocabulary_len)),
            feedback_delay: self.feedback_delay.unwrap_or(defaults.feedback_delay),
            similar_pool_size: self.similar_pool_size(),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quiz_core::DEFAULT_SIMILAR_POOL;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.vocabulary_path, PathBuf::from("vocabulary.json"));
        assert!(config.db_path.ends_with("vocab-quiz/progress.db"));
        assert_eq!(config.share_link, None);
        assert_eq!(config.similar_pool_size(), DEFAULT_SIMILAR_POOL);
        assert_eq!(config.quiz_config(600), QuizConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("QUIZ_VOCABULARY_PATH", "/data/hsk4.json"),
            ("QUIZ_DB_PATH", "/tmp/quiz.db"),
            ("QUIZ_FEEDBACK_DELAY_MS", "500"),
            ("QUIZ_BATCH_SIZE", "all"),
            ("QUIZ_SIMILAR_POOL_SIZE", "8"),
            ("QUIZ_SHARE_LINK", "https://quiz.example/?p=abc"),
            ("QUIZ_SHARE_BASE_URL", " "),
        ])
        .unwrap();

        assert_eq!(config.vocabulary_path, PathBuf::from("/data/hsk4.json"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/quiz.db"));
        assert_eq!(config.share_link.as_deref(), Some("https://quiz.example/?p=abc"));
        assert_eq!(config.share_base_url, DEFAULT_SHARE_BASE_URL);

        let quiz = config.quiz_config(600);
        assert_eq!(quiz.default_batch_size, 600);
        assert_eq!(quiz.feedback_delay, Duration::from_millis(500));
        assert_eq!(quiz.option_count, 4);
        assert_eq!(quiz.similar_pool_size, 8);
        assert_eq!(config.similar_pool_size(), 8);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("QUIZ_BATCH_SIZE", "0")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            config(&[("QUIZ_FEEDBACK_DELAY_MS", "soon")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            config(&[("QUIZ_SIMILAR_POOL_SIZE", "many")]),
            Err(AppError::Config(_))
        ));
    }
}
