//! Normalization of the AI analysis payload.
//!
//! Upstream sources are inconsistent about key language, so every known key variant is
//! mapped onto one canonical field here, once, when a payload is parsed. Rendering code
//! only ever sees [`AnalysisView`].

use crate::messages;
use serde_json::{Map, Value};

/// Canonical field name paired with its Korean alias. English wins when both are present.
const EMOTION_KEYS: (&str, &str) = ("emotion", "감정");
const IMAGERY_KEYS: (&str, &str) = ("imagery", "이미지");
const SYMBOLISM_KEYS: (&str, &str) = ("symbolism", "상징");
const TIME_PERIOD_KEYS: (&str, &str) = ("time_period", "시대");

/// Keys the analysis service falls back to when the model reply was not usable JSON.
const NOTE_KEYS: [&str; 2] = ["analysis_text", "analysis_error"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub emotion: Option<String>,
    pub imagery: Option<String>,
    pub symbolism: Option<String>,
    pub time_period: Option<String>,
    /// Free-form text or error returned instead of structured fields.
    pub note: Option<String>,
}

impl Analysis {
    /// Labelled rows in display order, with the placeholder for missing values.
    pub fn rows(&self) -> [(&'static str, &str); 4] {
        [
            (messages::LABEL_EMOTION, or_dash(&self.emotion)),
            (messages::LABEL_IMAGERY, or_dash(&self.imagery)),
            (messages::LABEL_SYMBOLISM, or_dash(&self.symbolism)),
            (messages::LABEL_TIME_PERIOD, or_dash(&self.time_period)),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnalysisView {
    Fields(Analysis),
    /// The payload was missing or could not be parsed.
    #[default]
    Unavailable,
}

impl AnalysisView {
    /// Human-readable lines, e.g. `감정: 기쁨`.
    pub fn render_lines(&self) -> Vec<String> {
        match self {
            AnalysisView::Fields(a) => {
                let mut lines: Vec<String> = a
                    .rows()
                    .iter()
                    .map(|(label, value)| format!("{label}: {value}"))
                    .collect();
                if let Some(note) = a.note.as_deref() {
                    lines.push(note.to_string());
                }
                lines
            }
            AnalysisView::Unavailable => vec![messages::ANALYSIS_UNAVAILABLE.to_string()],
        }
    }
}

/// Normalize a raw `gpt_analysis` value, which may be an object or a JSON-encoded string.
pub fn normalize(raw: &Value) -> AnalysisView {
    match raw {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(parsed) => from_parsed(&parsed),
            Err(e) => {
                tracing::warn!("gpt_analysis JSON parse failed: {e}");
                AnalysisView::Unavailable
            }
        },
        other => from_parsed(other),
    }
}

fn from_parsed(v: &Value) -> AnalysisView {
    if !is_truthy(v) {
        return AnalysisView::Unavailable;
    }
    match v {
        Value::Object(map) => AnalysisView::Fields(Analysis {
            emotion: pick(map, EMOTION_KEYS),
            imagery: pick(map, IMAGERY_KEYS),
            symbolism: pick(map, SYMBOLISM_KEYS),
            time_period: pick(map, TIME_PERIOD_KEYS),
            note: NOTE_KEYS
                .iter()
                .find_map(|k| map.get(*k).filter(|v| is_truthy(v)).map(display_value)),
        }),
        // Anything else that is present but not an object has no known fields.
        _ => AnalysisView::Fields(Analysis::default()),
    }
}

fn or_dash(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or(messages::PLACEHOLDER)
}

fn pick(map: &Map<String, Value>, (english, korean): (&str, &str)) -> Option<String> {
    [english, korean]
        .iter()
        .find_map(|k| map.get(*k).filter(|v| is_truthy(v)))
        .map(display_value)
}

/// Empty strings, `null`, `false` and zero count as absent so lookup falls through.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
