use crate::analysis::{self, AnalysisView};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub user_agent: String,
    pub require_date: bool,
}

/// Server-assigned record identifier. The backend emits integers, but the value is opaque
/// to the client and only ever echoed back in request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MemoryId(String);

impl MemoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MemoryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum WireId {
            Int(i64),
            Text(String),
        }
        Ok(match WireId::deserialize(deserializer)? {
            WireId::Int(n) => MemoryId(n.to_string()),
            WireId::Text(s) => MemoryId(s),
        })
    }
}

/// Text and date as entered in the form, already trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInput {
    pub text: String,
    pub date: String,
}

/// Cached copy of a stored memory.
///
/// `gpt_analysis` is kept exactly as the server sent it because it is resent unchanged on
/// update; `analysis` is the normalized view computed once at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireRecord")]
pub struct MemoryRecord {
    pub id: MemoryId,
    pub text: String,
    pub date: String,
    pub image_url: Option<String>,
    pub gpt_analysis: Value,
    #[serde(skip_serializing)]
    pub analysis: AnalysisView,
}

#[derive(Deserialize)]
struct WireRecord {
    id: MemoryId,
    #[serde(default)]
    text: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    gpt_analysis: Value,
}

impl From<WireRecord> for MemoryRecord {
    fn from(w: WireRecord) -> Self {
        let analysis = analysis::normalize(&w.gpt_analysis);
        Self {
            id: w.id,
            text: w.text,
            date: w.date,
            image_url: w.image_url.filter(|u| !u.is_empty()),
            gpt_analysis: w.gpt_analysis,
            analysis,
        }
    }
}

impl MemoryRecord {
    pub fn card(&self) -> Card {
        Card {
            id: self.id.clone(),
            date: self.date.clone(),
            text: self.text.clone(),
            image_url: self.image_url.clone(),
        }
    }

    pub fn detail(&self) -> Detail {
        Detail {
            id: self.id.clone(),
            text: self.text.clone(),
            date: self.date.clone(),
            image_url: self.image_url.clone(),
            analysis: self.analysis.clone(),
        }
    }
}

/// One entry of the rendered timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: MemoryId,
    pub date: String,
    pub text: String,
    pub image_url: Option<String>,
}

/// Contents of the detail view for the selected record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub id: MemoryId,
    pub text: String,
    pub date: String,
    pub image_url: Option<String>,
    pub analysis: AnalysisView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// A blocking notification; the UI keeps it on screen until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub id: MemoryId,
    pub text: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: MemoryId,
}

/// A validated mutation waiting for the user to confirm it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Edit(PendingEdit),
    Delete(PendingDelete),
}

/// Events emitted by the controllers and consumed by UI/CLI layers.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Busy indicator for the create request.
    Busy(bool),
    /// The previous result was cleared because a new request started.
    SubmissionStarted,
    SubmissionSucceeded {
        analysis: AnalysisView,
        image_url: Option<String>,
    },
    SubmissionFailed {
        message: String,
    },
    RetryAvailable(bool),
    TimelineLoaded {
        cards: Vec<Card>,
    },
    TimelineEmpty {
        message: String,
    },
    TimelineLoadFailed {
        message: String,
    },
    DetailOpened(Detail),
    DetailClosed,
    EditOpened {
        text: String,
        date: String,
    },
    ConfirmRequested {
        prompt: String,
        action: PendingAction,
    },
    CardPatched {
        id: MemoryId,
        text: String,
        date: String,
        image_url: Option<String>,
    },
    CardRemoved {
        id: MemoryId,
    },
    Notice(Notice),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_accepts_numeric_and_string_ids() {
        let a: MemoryRecord = serde_json::from_value(json!({
            "id": 7, "text": "t", "date": "2024-01-01", "gpt_analysis": {}
        }))
        .unwrap();
        let b: MemoryRecord = serde_json::from_value(json!({
            "id": "abc", "text": "t", "date": "2024-01-01"
        }))
        .unwrap();
        assert_eq!(a.id.as_str(), "7");
        assert_eq!(b.id.as_str(), "abc");
    }

    #[test]
    fn record_normalizes_analysis_once_at_parse_time() {
        let r: MemoryRecord = serde_json::from_value(json!({
            "id": 1,
            "text": "바닷가",
            "date": "1998-07-01",
            "image_url": "http://img/1.png",
            "gpt_analysis": "{\"감정\": \"설렘\"}"
        }))
        .unwrap();
        let AnalysisView::Fields(a) = &r.analysis else {
            panic!("expected fields");
        };
        assert_eq!(a.emotion.as_deref(), Some("설렘"));
        // Raw payload is untouched for resending.
        assert_eq!(r.gpt_analysis, json!("{\"감정\": \"설렘\"}"));
    }

    #[test]
    fn empty_image_url_is_treated_as_absent() {
        let r: MemoryRecord = serde_json::from_value(json!({
            "id": 2, "text": "t", "date": "d", "image_url": ""
        }))
        .unwrap();
        assert_eq!(r.image_url, None);
    }

    #[test]
    fn record_serializes_raw_analysis_only() {
        let r: MemoryRecord = serde_json::from_value(json!({
            "id": 3, "text": "t", "date": "d", "gpt_analysis": {"emotion": "x"}
        }))
        .unwrap();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["id"], json!("3"));
        assert_eq!(v["gpt_analysis"], json!({"emotion": "x"}));
        assert!(v.get("analysis").is_none());
    }
}
