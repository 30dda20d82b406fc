//! Text rendering for subcommand mode.
//!
//! Turns controller events into plain lines: results and cards for stdout, notices and
//! failures for stderr.

use crate::messages;
use crate::model::{AppEvent, Card, NoticeKind};

/// Pre-formatted lines for text output.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
    pub notices: Vec<String>,
}

/// One timeline card on a single line.
pub(crate) fn card_line(card: &Card) -> String {
    let text = card.text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut line = format!("#{:<6} {:<12} {}", card.id.as_str(), card.date, text);
    if let Some(url) = card.image_url.as_deref() {
        line.push_str(&format!("  [{url}]"));
    }
    line
}

fn image_line(url: Option<&str>) -> String {
    format!(
        "{}: {}",
        messages::LABEL_IMAGE_URL,
        url.unwrap_or(messages::PLACEHOLDER)
    )
}

/// Build a text summary from the events of one command.
pub(crate) fn build_text_summary(events: &[AppEvent]) -> TextSummary {
    let mut out = TextSummary::default();

    for ev in events {
        match ev {
            AppEvent::SubmissionSucceeded {
                analysis,
                image_url,
            } => {
                out.lines.extend(analysis.render_lines());
                out.lines.push(image_line(image_url.as_deref()));
            }
            AppEvent::SubmissionFailed { message } | AppEvent::TimelineLoadFailed { message } => {
                out.notices.push(message.clone());
            }
            AppEvent::TimelineLoaded { cards } => {
                out.lines.extend(cards.iter().map(card_line));
            }
            AppEvent::TimelineEmpty { message } => {
                out.lines.push(message.clone());
            }
            AppEvent::CardPatched {
                id,
                text,
                date,
                image_url,
            } => {
                out.lines.push(card_line(&Card {
                    id: id.clone(),
                    date: date.clone(),
                    text: text.clone(),
                    image_url: image_url.clone(),
                }));
            }
            AppEvent::Notice(notice) => {
                let prefix = match notice.kind {
                    NoticeKind::Info => "",
                    NoticeKind::Warning => "warning: ",
                    NoticeKind::Error => "error: ",
                };
                out.notices.push(format!("{prefix}{}", notice.message));
            }
            // Interactive-only state.
            AppEvent::Busy(_)
            | AppEvent::SubmissionStarted
            | AppEvent::RetryAvailable(_)
            | AppEvent::DetailOpened(_)
            | AppEvent::DetailClosed
            | AppEvent::EditOpened { .. }
            | AppEvent::ConfirmRequested { .. }
            | AppEvent::CardRemoved { .. } => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis;
    use crate::model::{MemoryId, Notice};
    use serde_json::json;

    #[test]
    fn restored_memory_lists_four_fields_and_image() {
        let events = vec![
            AppEvent::Busy(true),
            AppEvent::SubmissionStarted,
            AppEvent::SubmissionSucceeded {
                analysis: analysis::normalize(&json!({"emotion": "기쁨"})),
                image_url: None,
            },
            AppEvent::Busy(false),
        ];
        let summary = build_text_summary(&events);
        assert_eq!(
            summary.lines,
            vec![
                "감정: 기쁨",
                "이미지: -",
                "상징: -",
                "시대: -",
                "이미지 URL: -",
            ]
        );
        assert!(summary.notices.is_empty());
    }

    #[test]
    fn failures_and_warnings_go_to_notices() {
        let events = vec![
            AppEvent::SubmissionFailed {
                message: messages::TRANSPORT_ERROR.into(),
            },
            AppEvent::Notice(Notice::warning(messages::TEXT_REQUIRED)),
            AppEvent::Notice(Notice::info(messages::DELETE_DONE)),
        ];
        let summary = build_text_summary(&events);
        assert!(summary.lines.is_empty());
        assert_eq!(
            summary.notices,
            vec![
                messages::TRANSPORT_ERROR.to_string(),
                format!("warning: {}", messages::TEXT_REQUIRED),
                messages::DELETE_DONE.to_string(),
            ]
        );
    }

    #[test]
    fn card_line_flattens_multiline_text() {
        let card = Card {
            id: MemoryId::new("12"),
            date: "1998-07".into(),
            text: "바닷가에서\n  처음 본 노을".into(),
            image_url: Some("http://img/12.png".into()),
        };
        assert_eq!(
            card_line(&card),
            "#12     1998-07      바닷가에서 처음 본 노을  [http://img/12.png]"
        );
    }

    #[test]
    fn empty_timeline_prints_placeholder() {
        let summary = build_text_summary(&[AppEvent::TimelineEmpty {
            message: messages::TIMELINE_EMPTY.into(),
        }]);
        assert_eq!(summary.lines, vec![messages::TIMELINE_EMPTY.to_string()]);
    }
}
