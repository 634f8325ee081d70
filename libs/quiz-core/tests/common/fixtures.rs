//! Vocabulary and stored-progress fixtures.

use quiz_core::VocabularyEntry;

/// `count` entries named `w00`, `w01`, ... which sort in creation order.
pub fn numbered_words(count: usize) -> Vec<VocabularyEntry> {
    (0..count)
        .map(|i| VocabularyEntry::new(format!("w{i:02}"), format!("pin{i}"), format!("meaning {i}")))
        .collect()
}

/// A handful of real HSK words with overlapping pinyin.
pub fn hsk_words() -> Vec<VocabularyEntry> {
    [
        ("妈妈", "māma", "mother"),
        ("马", "mǎ", "horse"),
        ("吗", "ma", "question particle"),
        ("忙", "máng", "busy"),
        ("买", "mǎi", "to buy"),
        ("卖", "mài", "to sell"),
        ("猫", "māo", "cat"),
        ("没有", "méiyǒu", "not have"),
        ("朋友", "péngyou", "friend"),
        ("学习", "xuéxí", "study"),
    ]
    .into_iter()
    .map(|(h, p, t)| VocabularyEntry::new(h, p, t))
    .collect()
}

/// Progress as saved by the first release, before records were versioned.
pub fn first_release_progress() -> String {
    serde_json::json!({
        "currentBatch": 1,
        "batchSize": 4,
        "currentIndex": 3,
        "correctAnswers": 2,
        "wrongAnswers": [
            {"chinese": "w05", "pinyin": "pin5", "english": "meaning 5"}
        ],
        "totalAnswered": 3,
        "isPinyinMode": false,
        "reviewWords": [
            {"chinese": "w05", "pinyin": "pin5", "english": "meaning 5"},
            {"chinese": "removed", "pinyin": "x", "english": "x"}
        ],
        "completedBatches": [0],
        "batchPerformance": {"0": {"correct": 4, "total": 4, "accuracy": 100}}
    })
    .to_string()
}
