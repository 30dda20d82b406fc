use crate::analysis::AnalysisView;
use crate::model::{Card, Detail, Notice, PendingAction};
use std::collections::VecDeque;

pub const TAB_RESTORE: usize = 0;
pub const TAB_TIMELINE: usize = 1;
pub const TAB_HELP: usize = 2;
pub const TAB_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Text,
    Date,
}

/// Two-field text form shared by the restore tab and the edit overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub text: String,
    pub date: String,
    pub focus: Field,
}

impl FormState {
    pub fn prefilled(text: String, date: String) -> Self {
        Self {
            text,
            date,
            focus: Field::Text,
        }
    }

    pub fn active_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Text => &mut self.text,
            Field::Date => &mut self.date,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Text => Field::Date,
            Field::Date => Field::Text,
        };
    }

    pub fn push(&mut self, c: char) {
        self.active_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.active_mut().pop();
    }
}

/// What the restore tab shows below the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionView {
    #[default]
    Idle,
    Restored {
        analysis: AnalysisView,
        image_url: Option<String>,
    },
    Failed(String),
}

/// Confirmation prompt waiting for y/n.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub prompt: String,
    pub action: PendingAction,
}

#[derive(Debug, Default)]
pub struct UiState {
    pub tab: usize,
    pub form: FormState,
    pub busy: bool,
    pub retry_available: bool,
    pub result: SubmissionView,

    pub cards: Vec<Card>,
    /// Shown instead of the list when the timeline is empty or failed to load.
    pub timeline_message: Option<String>,
    pub timeline_selected: usize,

    pub detail: Option<Detail>,
    pub editor: Option<FormState>,
    pub confirm: Option<ConfirmPrompt>,
    /// Notices stack up and are dismissed oldest first.
    pub notices: VecDeque<Notice>,

    pub info: String,
}

impl UiState {
    pub fn selected_card(&self) -> Option<&Card> {
        self.cards.get(self.timeline_selected)
    }

    pub fn select_prev(&mut self) {
        if self.timeline_selected > 0 {
            self.timeline_selected -= 1;
        }
    }

    pub fn select_next(&mut self) {
        if self.timeline_selected + 1 < self.cards.len() {
            self.timeline_selected += 1;
        }
    }

    /// Keep the cursor inside the list after it shrinks.
    pub fn clamp_selection(&mut self) {
        if self.cards.is_empty() {
            self.timeline_selected = 0;
        } else if self.timeline_selected >= self.cards.len() {
            self.timeline_selected = self.cards.len() - 1;
        }
    }

    /// First card to draw so the selection stays within a window of `rows` lines.
    pub fn timeline_offset(&self, rows: usize) -> usize {
        self.timeline_selected.saturating_sub(rows.max(1) - 1)
    }
}

/// Truncate to at most `max` characters, marking the cut with `...`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryId;

    fn card(id: &str) -> Card {
        Card {
            id: MemoryId::new(id),
            date: "2024-01-01".into(),
            text: "t".into(),
            image_url: None,
        }
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("짧은 글", 10), "짧은 글");
        assert_eq!(truncate_chars("가나다라마바사", 5), "가나...");
    }

    #[test]
    fn form_edits_the_focused_field() {
        let mut form = FormState::default();
        form.push('a');
        form.toggle_focus();
        form.push('1');
        form.push('2');
        form.backspace();
        assert_eq!(form.text, "a");
        assert_eq!(form.date, "1");
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut state = UiState {
            cards: vec![card("1"), card("2")],
            ..Default::default()
        };
        state.select_prev();
        assert_eq!(state.timeline_selected, 0);
        state.select_next();
        state.select_next();
        assert_eq!(state.timeline_selected, 1);

        state.cards.pop();
        state.clamp_selection();
        assert_eq!(state.timeline_selected, 0);
    }

    #[test]
    fn offset_follows_selection_past_the_window() {
        let mut state = UiState {
            cards: (1..=10).map(|i| card(&i.to_string())).collect(),
            ..Default::default()
        };
        assert_eq!(state.timeline_offset(4), 0);
        state.timeline_selected = 3;
        assert_eq!(state.timeline_offset(4), 0);
        state.timeline_selected = 7;
        assert_eq!(state.timeline_offset(4), 4);
        assert_eq!(state.timeline_offset(0), 7);
    }
}
