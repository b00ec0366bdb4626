//! Custom TUI widgets

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Severity of a panel entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Ok,
    Warning,
    Error,
    Info,
}

/// A label/value row shown in a panel
#[derive(Debug, Clone)]
pub struct Entry {
    pub label: String,
    pub value: String,
    pub status: EntryStatus,
}

impl Entry {
    pub fn new(label: impl Into<String>, value: impl Into<String>, status: EntryStatus) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            status,
        }
    }

    pub fn ok(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, EntryStatus::Ok)
    }

    pub fn warning(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, EntryStatus::Warning)
    }

    pub fn error(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, EntryStatus::Error)
    }

    pub fn info(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, EntryStatus::Info)
    }
}

/// Widget for displaying label/value entries
pub struct ResultsPanel<'a> {
    entries: &'a [Entry],
    title: &'a str,
}

impl<'a> ResultsPanel<'a> {
    pub fn new(entries: &'a [Entry], title: &'a str) -> Self {
        Self { entries, title }
    }

    fn status_color(status: EntryStatus) -> Color {
        match status {
            EntryStatus::Ok => Color::Green,
            EntryStatus::Warning => Color::Yellow,
            EntryStatus::Error => Color::Red,
            EntryStatus::Info => Color::Cyan,
        }
    }

    fn status_symbol(status: EntryStatus) -> &'static str {
        match status {
            EntryStatus::Ok => "[OK]",
            EntryStatus::Warning => "[!!]",
            EntryStatus::Error => "[XX]",
            EntryStatus::Info => "[--]",
        }
    }
}

impl<'a> Widget for ResultsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut y = inner.y;
        for entry in self.entries {
            if y >= inner.y + inner.height {
                break;
            }

            let color = Self::status_color(entry.status);
            let line = Line::from(vec![
                Span::styled(
                    format!("{} ", Self::status_symbol(entry.status)),
                    Style::default().fg(color),
                ),
                Span::styled(
                    format!("{}: ", entry.label),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(&entry.value, Style::default().fg(color)),
            ]);

            buf.set_line(inner.x, y, &line, inner.width);
            y += 1;
        }
    }
}

/// Single-line text field showing keystrokes that reached the "page"
pub struct InputField<'a> {
    text: &'a str,
    focused: bool,
}

impl<'a> InputField<'a> {
    pub fn new(text: &'a str, focused: bool) -> Self {
        Self { text, focused }
    }
}

impl<'a> Widget for InputField<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, border) = if self.focused {
            (" Input ", Style::default().fg(Color::Cyan))
        } else {
            (" Input (focus released) ", Style::default().fg(Color::DarkGray))
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border);

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        // Keep the tail of long input visible
        let width = inner.width.saturating_sub(1) as usize;
        let skip = self.text.chars().count().saturating_sub(width);
        let visible: String = self.text.chars().skip(skip).collect();
        buf.set_string(inner.x, inner.y, &visible, Style::default().fg(Color::White));

        if self.focused {
            let cursor_x = inner.x + visible.chars().count() as u16;
            if cursor_x < inner.x + inner.width {
                buf.set_string(cursor_x, inner.y, "_", Style::default().fg(Color::Cyan));
            }
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    state: &'a str,
    enabled: bool,
    elapsed: &'a str,
    keystrokes: u64,
    message: Option<&'a str>,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a str, enabled: bool, elapsed: &'a str, keystrokes: u64) -> Self {
        Self {
            state,
            enabled,
            elapsed,
            keystrokes,
            message: None,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg_style = Style::default().bg(Color::DarkGray).fg(Color::White);
        for x in area.x..area.x + area.width {
            buf.set_string(x, area.y, " ", bg_style);
        }

        // Left side: scan state and capture mode
        let mode = if self.enabled { "CAPTURING" } else { "DISABLED" };
        let left = format!(" {} | {} ", self.state, mode);
        buf.set_string(area.x, area.y, &left, bg_style.add_modifier(Modifier::BOLD));

        if let Some(msg) = self.message {
            let msg_style = Style::default().bg(Color::DarkGray).fg(Color::Yellow);
            let msg_x = area.x + (area.width / 2).saturating_sub(msg.len() as u16 / 2);
            buf.set_string(msg_x, area.y, msg, msg_style);
        }

        let right = format!(" {} | Keys: {} ", self.elapsed, self.keystrokes);
        let right_x = area.x + area.width.saturating_sub(right.len() as u16);
        buf.set_string(right_x, area.y, &right, bg_style);
    }
}

/// One-line key reference
pub struct KeyHints;

impl Widget for KeyHints {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let hints = " F2 enable/disable | F5 reset | F10 export stats | Esc quit | swipe a card or type ";
        buf.set_string(area.x, area.y, hints, Style::default().fg(Color::DarkGray));
    }
}
