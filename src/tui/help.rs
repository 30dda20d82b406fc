use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(keys: &'static str, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{keys:<12}"), Style::default().fg(Color::Magenta)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("Ctrl-C", "Quit"),
        key_line("tab", "Switch tabs"),
        Line::from(""),
        Line::from("Restore tab:"),
        key_line("↑/↓", "Switch between memory and date"),
        key_line("enter", "Restore memory"),
        key_line("Ctrl-R", "Retry last memory"),
        Line::from(""),
        Line::from("Timeline tab:"),
        key_line("↑/↓ or j/k", "Navigate"),
        key_line("enter", "Open details"),
        key_line("e", "Edit selected"),
        key_line("d", "Delete selected"),
        key_line("r", "Reload timeline"),
        key_line("x", "Export timeline as JSON"),
        key_line("?", "Show this help"),
        key_line("q", "Quit"),
        Line::from(""),
        Line::from("Details:"),
        key_line("e / d", "Edit or delete this memory"),
        key_line("y", "Copy image URL to clipboard"),
        key_line("esc", "Close details"),
        key_line("q", "Quit"),
        Line::from(""),
        Line::from("Dialogs:"),
        key_line("y / n", "Confirm or cancel"),
        key_line("enter / esc", "Dismiss notice"),
        Line::from(""),
        Line::from("Help tab:"),
        key_line("esc", "Back to Restore"),
        key_line("q", "Quit"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
