mod export;
mod help;
mod state;

use crate::api::HttpMemoryApi;
use crate::model::{AppConfig, AppEvent, NoticeKind};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{
    truncate_chars, ConfirmPrompt, Field, FormState, SubmissionView, UiState, TAB_COUNT,
    TAB_HELP, TAB_RESTORE, TAB_TIMELINE,
};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::info;

pub async fn run(cfg: AppConfig) -> Result<()> {
    let api = Arc::new(HttpMemoryApi::new(&cfg)?);
    info!(base_url = %cfg.base_url, "starting TUI session");

    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let title = format!("memory-restore · {}", cfg.base_url);
    let ui_handle = std::thread::spawn(move || run_threaded(title, event_rx, cmd_tx));

    let res = orchestrator::run_controller(api, &cfg, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    title: String,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend).context("create terminal") {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            let _ = cmd_tx.send(UiCommand::Quit);
            return Err(e);
        }
    };
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        info: "Loading timeline…".into(),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state, &title)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(&mut state, k, &cmd_tx) {
                    break;
                }
            }
        }
    }

    restore_terminal();
    Ok(())
}

fn restore_terminal() {
    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
}

/// Apply one controller event to the screen state.
fn apply_event(state: &mut UiState, ev: AppEvent) {
    match ev {
        AppEvent::Busy(busy) => {
            state.busy = busy;
        }
        AppEvent::SubmissionStarted => {
            state.result = SubmissionView::Idle;
        }
        AppEvent::SubmissionSucceeded {
            analysis,
            image_url,
        } => {
            state.result = SubmissionView::Restored {
                analysis,
                image_url,
            };
        }
        AppEvent::SubmissionFailed { message } => {
            state.result = SubmissionView::Failed(message);
        }
        AppEvent::RetryAvailable(available) => {
            state.retry_available = available;
        }
        AppEvent::TimelineLoaded { cards } => {
            state.info = format!("Loaded {} memories", cards.len());
            state.cards = cards;
            state.timeline_message = None;
            state.clamp_selection();
        }
        AppEvent::TimelineEmpty { message } | AppEvent::TimelineLoadFailed { message } => {
            state.info.clear();
            state.cards.clear();
            state.timeline_message = Some(message);
            state.clamp_selection();
        }
        AppEvent::DetailOpened(detail) => {
            if let Some(idx) = state.cards.iter().position(|c| c.id == detail.id) {
                state.timeline_selected = idx;
            }
            state.detail = Some(detail);
        }
        AppEvent::DetailClosed => {
            state.detail = None;
            state.editor = None;
        }
        AppEvent::EditOpened { text, date } => {
            state.editor = Some(FormState::prefilled(text, date));
        }
        AppEvent::ConfirmRequested { prompt, action } => {
            state.confirm = Some(ConfirmPrompt { prompt, action });
        }
        AppEvent::CardPatched {
            id,
            text,
            date,
            image_url,
        } => {
            if let Some(card) = state.cards.iter_mut().find(|c| c.id == id) {
                card.text = text;
                card.date = date;
                if image_url.is_some() {
                    card.image_url = image_url;
                }
            }
        }
        AppEvent::CardRemoved { id } => {
            state.cards.retain(|c| c.id != id);
            state.clamp_selection();
        }
        AppEvent::Notice(notice) => {
            // Every mutation outcome arrives as a notice, ending "Working…".
            state.info.clear();
            state.notices.push_back(notice);
        }
    }
}

/// Route one key press. Returns true when the UI should exit.
fn handle_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) -> bool {
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        let _ = cmd_tx.send(UiCommand::Quit);
        return true;
    }

    // Overlays take the keyboard in stacking order, topmost first.
    if !state.notices.is_empty() {
        if matches!(k.code, KeyCode::Enter | KeyCode::Esc) {
            state.notices.pop_front();
        }
        return false;
    }

    if state.confirm.is_some() {
        match k.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(confirm) = state.confirm.take() {
                    state.info = "Working…".into();
                    let _ = cmd_tx.send(UiCommand::Confirm(confirm.action));
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.confirm = None;
                state.info = "Cancelled".into();
            }
            _ => {}
        }
        return false;
    }

    if let Some(editor) = state.editor.as_mut() {
        match k.code {
            KeyCode::Esc => state.editor = None,
            KeyCode::Up | KeyCode::Down | KeyCode::Tab => editor.toggle_focus(),
            KeyCode::Enter => {
                let _ = cmd_tx.send(UiCommand::SaveEdit {
                    text: editor.text.clone(),
                    date: editor.date.clone(),
                });
            }
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Char(c) if !ctrl => editor.push(c),
            _ => {}
        }
        return false;
    }

    if state.detail.is_some() {
        match k.code {
            KeyCode::Esc => state.detail = None,
            KeyCode::Char('q') => {
                let _ = cmd_tx.send(UiCommand::Quit);
                return true;
            }
            KeyCode::Char('e') => {
                let _ = cmd_tx.send(UiCommand::OpenEditor);
            }
            KeyCode::Char('d') => {
                let _ = cmd_tx.send(UiCommand::Delete);
            }
            KeyCode::Char('y') => export::copy_image_url(state),
            _ => {}
        }
        return false;
    }

    if k.code == KeyCode::Tab {
        state.tab = (state.tab + 1) % TAB_COUNT;
        return false;
    }

    match state.tab {
        TAB_RESTORE => handle_restore_key(state, k, ctrl, cmd_tx),
        TAB_TIMELINE => handle_timeline_key(state, k, cmd_tx),
        _ => {
            if k.code == KeyCode::Char('q') {
                let _ = cmd_tx.send(UiCommand::Quit);
                return true;
            }
            if k.code == KeyCode::Esc {
                state.tab = TAB_RESTORE;
            }
            false
        }
    }
}

fn handle_restore_key(
    state: &mut UiState,
    k: KeyEvent,
    ctrl: bool,
    cmd_tx: &UnboundedSender<UiCommand>,
) -> bool {
    match k.code {
        KeyCode::Up | KeyCode::Down => state.form.toggle_focus(),
        KeyCode::Enter => {
            if !state.busy {
                let _ = cmd_tx.send(UiCommand::Submit {
                    text: state.form.text.clone(),
                    date: state.form.date.clone(),
                });
            }
        }
        KeyCode::Char('r') if ctrl => {
            if state.retry_available && !state.busy {
                let _ = cmd_tx.send(UiCommand::Retry);
            }
        }
        KeyCode::Backspace => state.form.backspace(),
        KeyCode::Char(c) if !ctrl && !k.modifiers.contains(KeyModifiers::ALT) => {
            state.form.push(c)
        }
        _ => {}
    }
    false
}

fn handle_timeline_key(
    state: &mut UiState,
    k: KeyEvent,
    cmd_tx: &UnboundedSender<UiCommand>,
) -> bool {
    let selected = state.selected_card().map(|c| c.id.clone());
    match k.code {
        KeyCode::Char('q') => {
            let _ = cmd_tx.send(UiCommand::Quit);
            return true;
        }
        KeyCode::Char('?') => state.tab = TAB_HELP,
        KeyCode::Up | KeyCode::Char('k') => state.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => state.select_next(),
        KeyCode::Char('r') => {
            state.info = "Reloading…".into();
            let _ = cmd_tx.send(UiCommand::Reload);
        }
        KeyCode::Char('x') => match crate::export::default_export_path() {
            Ok(path) => {
                state.info = "Exporting…".into();
                let _ = cmd_tx.send(UiCommand::Export(path));
            }
            Err(e) => state.info = format!("JSON export failed: {e:#}"),
        },
        KeyCode::Enter => {
            if let Some(id) = selected {
                let _ = cmd_tx.send(UiCommand::Select(id));
            }
        }
        // Edit and delete act on the highlighted card, which becomes the selection first.
        KeyCode::Char('e') => {
            if let Some(id) = selected {
                let _ = cmd_tx.send(UiCommand::Select(id));
            }
            let _ = cmd_tx.send(UiCommand::OpenEditor);
        }
        KeyCode::Char('d') => {
            if let Some(id) = selected {
                let _ = cmd_tx.send(UiCommand::Select(id));
            }
            let _ = cmd_tx.send(UiCommand::Delete);
        }
        _ => {}
    }
    false
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, title: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Restore"),
        Line::from("Timeline"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title(title.to_string()))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_RESTORE => draw_restore(chunks[1], f, state),
        TAB_TIMELINE => draw_timeline(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
    draw_status(chunks[2], f, state);

    if let Some(detail) = state.detail.as_ref() {
        draw_detail(area, f, detail);
    }
    if let Some(editor) = state.editor.as_ref() {
        draw_editor(area, f, editor);
    }
    if let Some(confirm) = state.confirm.as_ref() {
        draw_confirm(area, f, confirm);
    }
    if let Some(notice) = state.notices.front() {
        draw_notice(area, f, notice.kind, &notice.message, state.notices.len());
    }
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = Vec::new();
    if state.busy {
        spans.push(Span::styled(
            "복원 중… ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        state.info.clone(),
        Style::default().fg(Color::Gray),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut spans = vec![
        Span::styled(format!("{label}: "), label_style),
        Span::raw(value.to_string()),
    ];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

fn form_lines(form: &FormState) -> Vec<Line<'static>> {
    vec![
        field_line("기억", &form.text, form.focus == Field::Text),
        field_line("날짜", &form.date, form.focus == Field::Date),
    ]
}

fn draw_restore(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let mut lines = form_lines(&state.form);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("enter", Style::default().fg(Color::Magenta)),
        Span::raw(": restore, "),
        Span::styled("↑/↓", Style::default().fg(Color::Magenta)),
        Span::raw(": switch field"),
    ]));
    let form = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Memory"));
    f.render_widget(form, chunks[0]);

    let mut lines: Vec<Line> = Vec::new();
    match &state.result {
        SubmissionView::Idle => {}
        SubmissionView::Restored {
            analysis,
            image_url,
        } => {
            for row in analysis.render_lines() {
                lines.push(Line::from(row));
            }
            lines.push(Line::from(""));
            lines.push(image_line(image_url.as_deref()));
        }
        SubmissionView::Failed(message) => {
            lines.push(Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            )));
        }
    }
    if state.retry_available && !state.busy {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Ctrl-R", Style::default().fg(Color::Magenta)),
            Span::raw(": retry with the same memory"),
        ]));
    }
    let title = if state.busy { "Result (working…)" } else { "Result" };
    let result = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(result, chunks[1]);
}

fn image_line(url: Option<&str>) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{}: ", crate::messages::LABEL_IMAGE_URL),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            url.unwrap_or(crate::messages::PLACEHOLDER).to_string(),
            Style::default().fg(Color::Cyan),
        ),
    ])
}

fn draw_timeline(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines: Vec<Line> = Vec::new();

    // Borders plus the header and spacer lines.
    let max_items = (area.height as usize).saturating_sub(4).max(1);
    let total = state.cards.len();
    let current = if total > 0 { state.timeline_selected + 1 } else { 0 };

    lines.push(Line::from(vec![
        Span::raw(format!("Timeline ({current}/{total}) - ")),
        Span::styled("↑/↓/j/k", Style::default().fg(Color::Magenta)),
        Span::raw(": navigate, "),
        Span::styled("enter", Style::default().fg(Color::Magenta)),
        Span::raw(": details, "),
        Span::styled("e", Style::default().fg(Color::Magenta)),
        Span::raw(": edit, "),
        Span::styled("d", Style::default().fg(Color::Magenta)),
        Span::raw(": delete, "),
        Span::styled("r", Style::default().fg(Color::Magenta)),
        Span::raw(": reload, "),
        Span::styled("x", Style::default().fg(Color::Magenta)),
        Span::raw(": export JSON"),
    ]));
    lines.push(Line::from(""));

    if let Some(message) = state.timeline_message.as_deref() {
        lines.push(Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Gray),
        )));
    } else {
        let scroll_offset = state.timeline_offset(max_items);

        let text_width = (area.width as usize).saturating_sub(30).max(10);
        for (idx, card) in state
            .cards
            .iter()
            .enumerate()
            .skip(scroll_offset)
            .take(max_items)
        {
            let is_selected = idx == state.timeline_selected;
            let style = if is_selected {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            let marker = if is_selected { "▶ " } else { "  " };
            let image = if card.image_url.is_some() { " 🖼" } else { "" };
            lines.push(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(format!("{:<12}", truncate_chars(&card.date, 12)), style),
                Span::styled(" ", style),
                Span::styled(truncate_chars(&card.text, text_width), style),
                Span::raw(image),
            ]));
        }
    }

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Timeline"));
    f.render_widget(p, area);
}

/// Centered rectangle taking `pct_x`/`pct_y` percent of `area`.
fn centered_rect(pct_x: u16, pct_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn draw_overlay(area: Rect, f: &mut ratatui::Frame, title: &str, border: Color, lines: Vec<Line>) {
    f.render_widget(Clear, area);
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title.to_string()),
    );
    f.render_widget(p, area);
}

fn draw_detail(area: Rect, f: &mut ratatui::Frame, detail: &crate::model::Detail) {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("#{}  ", detail.id), Style::default().fg(Color::Gray)),
            Span::styled(detail.date.clone(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(""),
        Line::from(detail.text.clone()),
        Line::from(""),
        image_line(detail.image_url.as_deref()),
        Line::from(""),
    ];
    lines.extend(detail.analysis.render_lines().into_iter().map(Line::from));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("e", Style::default().fg(Color::Magenta)),
        Span::raw(": edit, "),
        Span::styled("d", Style::default().fg(Color::Magenta)),
        Span::raw(": delete, "),
        Span::styled("y", Style::default().fg(Color::Magenta)),
        Span::raw(": copy image URL, "),
        Span::styled("esc", Style::default().fg(Color::Magenta)),
        Span::raw(": close"),
    ]));
    draw_overlay(centered_rect(80, 80, area), f, "Memory", Color::Cyan, lines);
}

fn draw_editor(area: Rect, f: &mut ratatui::Frame, editor: &FormState) {
    let mut lines = form_lines(editor);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("enter", Style::default().fg(Color::Magenta)),
        Span::raw(": save, "),
        Span::styled("↑/↓", Style::default().fg(Color::Magenta)),
        Span::raw(": switch field, "),
        Span::styled("esc", Style::default().fg(Color::Magenta)),
        Span::raw(": cancel"),
    ]));
    draw_overlay(centered_rect(70, 40, area), f, "Edit", Color::Yellow, lines);
}

fn draw_confirm(area: Rect, f: &mut ratatui::Frame, confirm: &ConfirmPrompt) {
    let lines = vec![
        Line::from(confirm.prompt.clone()),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Magenta)),
            Span::raw(": yes, "),
            Span::styled("n", Style::default().fg(Color::Magenta)),
            Span::raw(": no"),
        ]),
    ];
    draw_overlay(centered_rect(50, 25, area), f, "Confirm", Color::Yellow, lines);
}

fn draw_notice(area: Rect, f: &mut ratatui::Frame, kind: NoticeKind, message: &str, queued: usize) {
    let (title, color) = match kind {
        NoticeKind::Info => ("Notice", Color::Green),
        NoticeKind::Warning => ("Warning", Color::Yellow),
        NoticeKind::Error => ("Error", Color::Red),
    };
    let mut hint = vec![
        Span::styled("enter", Style::default().fg(Color::Magenta)),
        Span::raw(": dismiss"),
    ];
    if queued > 1 {
        hint.push(Span::raw(format!(" ({} more)", queued - 1)));
    }
    let lines = vec![Line::from(message.to_string()), Line::from(""), Line::from(hint)];
    draw_overlay(centered_rect(50, 25, area), f, title, color, lines);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{self, AnalysisView};
    use crate::messages;
    use crate::model::{
        Card, Detail, MemoryId, Notice, PendingAction, PendingDelete,
    };
    use serde_json::json;

    fn card(id: &str, text: &str) -> Card {
        Card {
            id: MemoryId::new(id),
            date: "2024-01-01".into(),
            text: text.into(),
            image_url: Some(format!("http://img/{id}.png")),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn commands(rx: &mut UnboundedReceiver<UiCommand>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            out.push(format!("{cmd:?}"));
        }
        out
    }

    fn loaded(ids: &[&str]) -> UiState {
        let mut state = UiState::default();
        apply_event(
            &mut state,
            AppEvent::TimelineLoaded {
                cards: ids.iter().map(|id| card(id, "text")).collect(),
            },
        );
        state
    }

    #[test]
    fn submission_events_drive_the_result_panel() {
        let mut state = UiState::default();
        apply_event(&mut state, AppEvent::Busy(true));
        apply_event(&mut state, AppEvent::SubmissionStarted);
        assert!(state.busy);
        assert_eq!(state.result, SubmissionView::Idle);

        let analysis = analysis::normalize(&json!({"emotion": "기쁨"}));
        apply_event(
            &mut state,
            AppEvent::SubmissionSucceeded {
                analysis: analysis.clone(),
                image_url: Some("http://img/1.png".into()),
            },
        );
        apply_event(&mut state, AppEvent::RetryAvailable(true));
        apply_event(&mut state, AppEvent::Busy(false));

        assert!(!state.busy);
        assert!(state.retry_available);
        let SubmissionView::Restored { analysis, .. } = &state.result else {
            panic!("expected restored result");
        };
        assert_eq!(analysis.render_lines()[0], "감정: 기쁨");
    }

    #[test]
    fn failure_replaces_previous_result() {
        let mut state = UiState {
            result: SubmissionView::Restored {
                analysis: AnalysisView::Unavailable,
                image_url: None,
            },
            ..Default::default()
        };
        apply_event(
            &mut state,
            AppEvent::SubmissionFailed {
                message: messages::RESTORE_FAILED.into(),
            },
        );
        assert_eq!(
            state.result,
            SubmissionView::Failed(messages::RESTORE_FAILED.into())
        );
    }

    #[test]
    fn empty_timeline_shows_placeholder() {
        let mut state = loaded(&["1"]);
        apply_event(
            &mut state,
            AppEvent::TimelineEmpty {
                message: messages::TIMELINE_EMPTY.into(),
            },
        );
        assert!(state.cards.is_empty());
        assert_eq!(
            state.timeline_message.as_deref(),
            Some(messages::TIMELINE_EMPTY)
        );
    }

    #[test]
    fn patched_card_keeps_image_when_response_had_none() {
        let mut state = loaded(&["1", "2"]);
        apply_event(
            &mut state,
            AppEvent::CardPatched {
                id: MemoryId::new("2"),
                text: "new".into(),
                date: "1999".into(),
                image_url: None,
            },
        );
        assert_eq!(state.cards[1].text, "new");
        assert_eq!(state.cards[1].date, "1999");
        assert_eq!(state.cards[1].image_url.as_deref(), Some("http://img/2.png"));
    }

    #[test]
    fn removed_card_disappears_and_cursor_is_clamped() {
        let mut state = loaded(&["1", "2"]);
        state.timeline_selected = 1;
        apply_event(
            &mut state,
            AppEvent::CardRemoved {
                id: MemoryId::new("2"),
            },
        );
        apply_event(&mut state, AppEvent::DetailClosed);
        assert_eq!(state.cards.len(), 1);
        assert_eq!(state.timeline_selected, 0);
        assert!(state.detail.is_none());
    }

    #[test]
    fn detail_open_moves_cursor_to_card() {
        let mut state = loaded(&["1", "2", "3"]);
        apply_event(
            &mut state,
            AppEvent::DetailOpened(Detail {
                id: MemoryId::new("3"),
                text: "text".into(),
                date: "2024-01-01".into(),
                image_url: None,
                analysis: AnalysisView::Unavailable,
            }),
        );
        assert_eq!(state.timeline_selected, 2);
        assert!(state.detail.is_some());
    }

    #[test]
    fn typing_on_restore_tab_fills_the_form_and_enter_submits() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        for c in "첫 기억".chars() {
            handle_key(&mut state, key(KeyCode::Char(c)), &tx);
        }
        handle_key(&mut state, key(KeyCode::Down), &tx);
        for c in "2024".chars() {
            handle_key(&mut state, key(KeyCode::Char(c)), &tx);
        }
        // 'q' is text here, not quit.
        assert!(!handle_key(&mut state, key(KeyCode::Char('q')), &tx));
        handle_key(&mut state, key(KeyCode::Backspace), &tx);
        handle_key(&mut state, key(KeyCode::Enter), &tx);

        assert_eq!(state.form.text, "첫 기억");
        assert_eq!(state.form.date, "2024");
        assert_eq!(
            commands(&mut rx),
            vec![r#"Submit { text: "첫 기억", date: "2024" }"#.to_string()]
        );
    }

    #[test]
    fn enter_while_busy_sends_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState {
            busy: true,
            ..Default::default()
        };
        handle_key(&mut state, key(KeyCode::Enter), &tx);
        handle_key(&mut state, ctrl('r'), &tx);
        assert!(commands(&mut rx).is_empty());
    }

    #[test]
    fn retry_requires_a_previous_success() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        handle_key(&mut state, ctrl('r'), &tx);
        assert!(commands(&mut rx).is_empty());

        state.retry_available = true;
        handle_key(&mut state, ctrl('r'), &tx);
        assert_eq!(commands(&mut rx), vec!["Retry".to_string()]);
    }

    #[test]
    fn notice_blocks_other_keys_until_dismissed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = loaded(&["1"]);
        state.tab = TAB_TIMELINE;
        apply_event(
            &mut state,
            AppEvent::Notice(Notice::warning(messages::NOTHING_SELECTED)),
        );

        assert!(!handle_key(&mut state, key(KeyCode::Char('q')), &tx));
        assert_eq!(state.notices.len(), 1);
        handle_key(&mut state, key(KeyCode::Enter), &tx);
        assert!(state.notices.is_empty());
        assert!(commands(&mut rx).is_empty());
    }

    #[test]
    fn confirm_yes_commits_and_no_drops() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let action = PendingAction::Delete(PendingDelete {
            id: MemoryId::new("1"),
        });
        let mut state = UiState::default();

        apply_event(
            &mut state,
            AppEvent::ConfirmRequested {
                prompt: messages::CONFIRM_DELETE.into(),
                action: action.clone(),
            },
        );
        handle_key(&mut state, key(KeyCode::Char('n')), &tx);
        assert!(state.confirm.is_none());
        assert!(commands(&mut rx).is_empty());

        apply_event(
            &mut state,
            AppEvent::ConfirmRequested {
                prompt: messages::CONFIRM_DELETE.into(),
                action,
            },
        );
        handle_key(&mut state, key(KeyCode::Char('y')), &tx);
        assert!(state.confirm.is_none());
        let sent = commands(&mut rx);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("Confirm(Delete"));
    }

    #[test]
    fn timeline_delete_selects_highlighted_card_first() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = loaded(&["1", "2"]);
        state.tab = TAB_TIMELINE;
        handle_key(&mut state, key(KeyCode::Char('j')), &tx);
        handle_key(&mut state, key(KeyCode::Char('d')), &tx);
        assert_eq!(
            commands(&mut rx),
            vec![
                r#"Select(MemoryId("2"))"#.to_string(),
                "Delete".to_string()
            ]
        );
    }

    #[test]
    fn export_is_handed_to_the_session() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = loaded(&["1"]);
        state.tab = TAB_TIMELINE;
        handle_key(&mut state, key(KeyCode::Char('x')), &tx);
        match rx.try_recv() {
            Ok(UiCommand::Export(path)) => {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                assert!(name.starts_with("memory-timeline-"), "{name}");
            }
            other => panic!("expected export command, got {other:?}"),
        }
        assert_eq!(state.info, "Exporting…");
    }

    #[test]
    fn editor_captures_keys_and_saves() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = loaded(&["1"]);
        state.tab = TAB_TIMELINE;
        apply_event(
            &mut state,
            AppEvent::EditOpened {
                text: "old".into(),
                date: "1998".into(),
            },
        );
        handle_key(&mut state, key(KeyCode::Char('!')), &tx);
        handle_key(&mut state, key(KeyCode::Enter), &tx);
        assert_eq!(
            commands(&mut rx),
            vec![r#"SaveEdit { text: "old!", date: "1998" }"#.to_string()]
        );

        handle_key(&mut state, key(KeyCode::Esc), &tx);
        assert!(state.editor.is_none());
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        state.notices.push_back(Notice::error("x"));
        assert!(handle_key(&mut state, ctrl('c'), &tx));
        assert_eq!(commands(&mut rx), vec!["Quit".to_string()]);
    }
}
