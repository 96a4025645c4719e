pub mod keymap;
pub mod pane;
pub mod repo;
pub mod selector;
pub mod spinner;
pub mod statusbar;
pub mod tabs;
pub mod viewport;
pub mod zone;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;
use crate::clipboard::Clipboard;
use crate::config::Config;
use keymap::{KeyBinding, KeyMap};
use zone::ZoneRegistry;

/// Context handed to every component at construction.
#[derive(Clone)]
pub struct Common {
    pub config: Arc<Config>,
    pub keymap: Arc<KeyMap>,
    pub zones: ZoneRegistry,
    pub clipboard: Arc<dyn Clipboard>,
}

impl Common {
    pub fn new(config: Config, clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            config: Arc::new(config),
            keymap: Arc::new(KeyMap::default()),
            zones: ZoneRegistry::new(),
            clipboard,
        }
    }
}

pub fn render(frame: &mut Frame, app: &App) {
    app.common.zones.clear();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(app.footer_height()),
        ])
        .split(frame.area());

    app.view.render(frame, chunks[0]);
    render_footer(frame, app, chunks[1]);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    app.common.zones.mark(repo::HELP_ZONE, area);

    if let Some(error) = &app.error {
        let line = Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let lines = if app.show_full_help {
        full_help_lines(&app.view.full_help())
    } else {
        vec![short_help_line(&app.view.short_help())]
    };
    frame.render_widget(Paragraph::new(lines), area);
}

fn key_style() -> Style {
    Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)
}

fn desc_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn short_help_line(bindings: &[KeyBinding]) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, binding) in bindings.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" • ", desc_style()));
        }
        spans.push(Span::styled(binding.help_key().to_string(), key_style()));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(binding.help_desc().to_string(), desc_style()));
    }
    Line::from(spans)
}

/// Lay help columns side by side.
fn full_help_lines(columns: &[Vec<KeyBinding>]) -> Vec<Line<'static>> {
    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<(usize, usize)> = columns
        .iter()
        .map(|col| {
            let key = col.iter().map(|b| b.help_key().chars().count()).max().unwrap_or(0);
            let desc = col.iter().map(|b| b.help_desc().chars().count()).max().unwrap_or(0);
            (key, desc)
        })
        .collect();

    (0..rows)
        .map(|row| {
            let mut spans = Vec::new();
            for (col, &(key_w, desc_w)) in columns.iter().zip(&widths) {
                match col.get(row) {
                    Some(binding) => {
                        spans.push(Span::styled(
                            format!("{:<key_w$} ", binding.help_key()),
                            key_style(),
                        ));
                        spans.push(Span::styled(
                            format!("{:<desc_w$}    ", binding.help_desc()),
                            desc_style(),
                        ));
                    }
                    None => spans.push(Span::raw(" ".repeat(key_w + desc_w + 5))),
                }
            }
            Line::from(spans)
        })
        .collect()
}

/// Cut `s` to at most `max` chars, ending in an ellipsis when shortened.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

pub fn format_age(dt: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// The rows of a rendered buffer as plain text.
#[cfg(test)]
pub fn buffer_text(buffer: &ratatui::buffer::Buffer) -> Vec<String> {
    let width = buffer.area.width.max(1) as usize;
    buffer
        .content
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect())
        .collect()
}
