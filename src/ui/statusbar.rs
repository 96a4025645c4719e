use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::message::{Message, Task};
use crate::ui::truncate;

/// One-line summary below the active pane: key | value | info | extra.
#[derive(Debug, Default)]
pub struct StatusBar {
    key: String,
    value: String,
    info: String,
    extra: String,
    width: u16,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_size(&mut self, width: u16, _height: u16) {
        self.width = width;
    }

    pub fn set_status(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        info: impl Into<String>,
        extra: impl Into<String>,
    ) {
        self.key = key.into();
        self.value = value.into();
        self.info = info.into();
        self.extra = extra.into();
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn extra(&self) -> &str {
        &self.extra
    }

    pub fn init(&mut self) -> Vec<Task> {
        Vec::new()
    }

    pub fn update(&mut self, msg: &Message) -> Vec<Task> {
        if let Message::Resize { width, .. } = msg {
            self.width = *width;
        }
        Vec::new()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let padded = |s: &str| {
            if s.is_empty() {
                String::new()
            } else {
                format!(" {} ", s)
            }
        };
        let key = padded(&self.key);
        let info = padded(&self.info);
        let extra = padded(&self.extra);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(Span::raw(key.as_str()).width() as u16),
                Constraint::Min(0),
                Constraint::Length(Span::raw(info.as_str()).width() as u16),
                Constraint::Length(Span::raw(extra.as_str()).width() as u16),
            ])
            .split(area);

        let value = truncate(&padded(&self.value), chunks[1].width as usize);

        frame.render_widget(
            Paragraph::new(Span::styled(
                key,
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(value).style(Style::default().fg(Color::Gray).bg(Color::DarkGray)),
            chunks[1],
        );
        frame.render_widget(
            Paragraph::new(info).style(Style::default().fg(Color::White).bg(Color::DarkGray)),
            chunks[2],
        );
        frame.render_widget(
            Paragraph::new(extra).style(Style::default().fg(Color::Black).bg(Color::Cyan)),
            chunks[3],
        );
    }
}
