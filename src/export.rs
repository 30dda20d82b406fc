//! Timeline export to JSON files.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;

/// File name for an export taken at `at`, e.g. `memory-timeline-2024-01-01_12-30-05.json`.
pub fn default_export_name(at: OffsetDateTime) -> String {
    let stamp = at
        .format(format_description!(
            "[year]-[month]-[day]_[hour]-[minute]-[second]"
        ))
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    format!("memory-timeline-{stamp}.json")
}

/// Write `items` as a pretty JSON array.
pub fn export_json<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let body = serde_json::to_string_pretty(items).context("serialize timeline")?;
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Timestamped export path in the current directory.
pub fn default_export_path() -> Result<PathBuf> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let current_dir = std::env::current_dir().context("get current directory")?;
    Ok(current_dir.join(default_export_name(now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::record;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn export_name_is_timestamped() {
        let at = datetime!(2024-01-01 12:30:05 UTC);
        assert_eq!(
            default_export_name(at),
            "memory-timeline-2024-01-01_12-30-05.json"
        );
    }

    #[test]
    fn export_writes_a_json_array_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let records = vec![
            record("2", "둘", "1999", json!({"emotion": "그리움"}), None),
            record(
                "1",
                "하나",
                "1998",
                json!("{\"감정\": \"기쁨\"}"),
                Some("http://img/1.png"),
            ),
        ];

        export_json(&path, &records).unwrap();

        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back[0]["id"], "2");
        assert_eq!(back[0]["gpt_analysis"], json!({"emotion": "그리움"}));
        assert_eq!(back[1]["text"], "하나");
        assert_eq!(back[1]["gpt_analysis"], json!("{\"감정\": \"기쁨\"}"));
    }
}
