use crossterm::event::{MouseButton, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::message::{Message, Task};
use crate::ui::Common;

const SEPARATOR: &str = " │ ";

/// Zone id of the `index`th tab.
pub fn tab_zone(index: usize) -> String {
    format!("tab-{}", index)
}

/// The tab strip. Owns the tab switching keys.
pub struct TabBar {
    common: Common,
    tabs: Vec<String>,
    active: usize,
    width: u16,
}

impl TabBar {
    pub fn new(common: Common, tabs: Vec<String>) -> Self {
        Self {
            common,
            tabs,
            active: 0,
            width: 0,
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn set_size(&mut self, width: u16, _height: u16) {
        self.width = width;
    }

    pub fn init(&mut self) -> Vec<Task> {
        self.active = 0;
        Vec::new()
    }

    fn activate(&mut self, index: usize) -> Vec<Task> {
        self.active = index;
        vec![Task::ready(Message::ActiveTab(index))]
    }

    pub fn update(&mut self, msg: &Message) -> Vec<Task> {
        let count = self.tabs.len();
        if count == 0 {
            return Vec::new();
        }

        match msg {
            Message::Key(key) if self.common.keymap.section.matches(key) => {
                self.activate((self.active + 1) % count)
            }
            Message::Key(key) if self.common.keymap.prev_section.matches(key) => {
                self.activate((self.active + count - 1) % count)
            }
            Message::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                match (0..count).find(|i| self.common.zones.in_bounds(&tab_zone(*i), mouse)) {
                    Some(i) => self.activate(i),
                    None => Vec::new(),
                }
            }
            Message::SelectTab(i) | Message::ActiveTab(i) if *i < count => {
                self.active = *i;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        let mut x = area.x;
        let right = area.x.saturating_add(area.width);

        for (i, name) in self.tabs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(SEPARATOR, Style::default().fg(Color::DarkGray)));
                x = x.saturating_add(Span::raw(SEPARATOR).width() as u16);
            }
            let style = if i == self.active {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::Gray)
            };
            let span = Span::styled(name.as_str(), style);
            let width = (span.width() as u16).min(right.saturating_sub(x));
            if width > 0 {
                self.common
                    .zones
                    .mark(tab_zone(i), Rect::new(x, area.y, width, 1.min(area.height)));
            }
            x = x.saturating_add(span.width() as u16);
            spans.push(span);
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
