//! Vocabulary file loading.

use quiz_core::{parse_vocabulary, QuizError, Vocabulary};
use std::path::Path;

/// Read and parse the vocabulary file. A missing or unreadable file is
/// reported as `VocabularySourceUnavailable`.
pub fn load_vocabulary_file(path: &Path) -> quiz_core::Result<Vocabulary> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        QuizError::VocabularySourceUnavailable(format!("{}: {e}", path.display()))
    })?;
    let vocabulary = parse_vocabulary(&json)?;
    tracing::info!(
        path = %path.display(),
        words = vocabulary.entries.len(),
        "vocabulary loaded"
    );
    Ok(vocabulary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = load_vocabulary_file(Path::new("/nonexistent/vocabulary.json")).unwrap_err();
        assert!(matches!(err, QuizError::VocabularySourceUnavailable(_)));
    }

    #[test]
    fn test_reads_file() {
        let path = std::env::temp_dir().join(format!("vocab-quiz-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"level": "4", "words": [{"chinese": "爱", "pinyin": "ài", "english": "love"}]}"#,
        )
        .unwrap();
        let vocabulary = load_vocabulary_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(vocabulary.entries.len(), 1);
        assert_eq!(vocabulary.metadata.title(), "HSK 4 Quiz");
    }
}
