//! Upgrades older progress records to the current shape.

use super::PROGRESS_VERSION;
use serde_json::{Map, Value};

/// Settings that did not exist before versioned records.
const INTRODUCED_SETTINGS: [&str; 3] = ["showEnglishInPinyin", "autoProceed", "soundEnabled"];

/// Bring a raw record up to `PROGRESS_VERSION`.
///
/// Records without a version are first-release data: `correctAnswers`
/// becomes `correctCount`, the wrong count comes from the length of the old
/// `wrongAnswers` list, and the later settings are switched on. Fields that
/// are already present are left alone, so running this twice changes
/// nothing. Non-object input is returned unchanged.
pub fn migrate(mut raw: Value) -> Value {
    if let Some(obj) = raw.as_object_mut() {
        migrate_object(obj);
    }
    raw
}

fn migrate_object(obj: &mut Map<String, Value>) {
    let version = obj.get("version").and_then(Value::as_u64);
    if version.is_some_and(|v| v >= u64::from(PROGRESS_VERSION)) {
        return;
    }

    if !obj.contains_key("correctCount") {
        let correct = obj
            .get("correctAnswers")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        obj.insert("correctCount".to_string(), Value::from(correct));
    }
    if !obj.contains_key("wrongCount") {
        let wrong = obj
            .get("wrongAnswers")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        obj.insert("wrongCount".to_string(), Value::from(wrong));
    }
    for key in INTRODUCED_SETTINGS {
        obj.entry(key).or_insert(Value::Bool(true));
    }
    obj.insert("version".to_string(), Value::from(PROGRESS_VERSION));

    tracing::debug!(from = ?version, to = PROGRESS_VERSION, "progress record migrated");
}
