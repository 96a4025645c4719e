use crossterm::event::MouseEventKind;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::message::Message;
use crate::ui::keymap::{KeyBinding, KeyMap};

/// Scrollable block of pre-styled lines.
#[derive(Debug, Default)]
pub struct Viewport {
    lines: Vec<Line<'static>>,
    offset: usize,
    height: usize,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_lines(&mut self, lines: Vec<Line<'static>>) {
        self.lines = lines;
        self.offset = 0;
    }

    pub fn clear(&mut self) {
        self.set_lines(Vec::new());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn set_height(&mut self, height: u16) {
        self.height = height as usize;
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    fn scroll_to(&mut self, offset: usize) {
        self.offset = offset.min(self.max_offset());
    }

    /// Fraction scrolled, 1.0 when everything fits.
    pub fn scroll_percent(&self) -> f64 {
        let max = self.max_offset();
        if max == 0 {
            return 1.0;
        }
        self.offset as f64 / max as f64
    }

    /// `☰ 42%`
    pub fn percent_label(&self) -> String {
        format!("☰ {:.0}%", self.scroll_percent() * 100.0)
    }

    /// Apply scroll keys and the mouse wheel. Returns whether the offset moved.
    pub fn update(&mut self, msg: &Message, keymap: &KeyMap) -> bool {
        let before = self.offset;
        let page = self.height.max(1);
        match msg {
            Message::Key(key) => {
                if keymap.up.matches(key) {
                    self.scroll_to(self.offset.saturating_sub(1));
                } else if keymap.down.matches(key) {
                    self.scroll_to(self.offset + 1);
                } else if keymap.page_up.matches(key) {
                    self.scroll_to(self.offset.saturating_sub(page));
                } else if keymap.page_down.matches(key) {
                    self.scroll_to(self.offset + page);
                } else if keymap.home.matches(key) {
                    self.scroll_to(0);
                } else if keymap.end.matches(key) {
                    self.scroll_to(self.max_offset());
                }
            }
            Message::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => self.scroll_to(self.offset.saturating_sub(1)),
                MouseEventKind::ScrollDown => self.scroll_to(self.offset + 1),
                _ => {}
            },
            _ => {}
        }
        self.offset != before
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let visible: Vec<Line> = self
            .lines
            .iter()
            .skip(self.offset)
            .take(area.height as usize)
            .cloned()
            .collect();
        frame.render_widget(Paragraph::new(visible), area);
    }
}

/// Bindings shown by panes that scroll text.
pub fn scroll_help(keymap: &KeyMap) -> Vec<Vec<KeyBinding>> {
    vec![
        vec![keymap.up.clone(), keymap.down.clone()],
        vec![keymap.page_up.clone(), keymap.page_down.clone()],
        vec![keymap.home.clone(), keymap.end.clone()],
    ]
}

/// Plain text as lines, tabs expanded.
pub fn text_lines(text: &str) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| Line::from(line.replace('\t', "    ")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;

    use crate::testing::key;

    fn viewport(lines: usize, height: u16) -> Viewport {
        let mut viewport = Viewport::new();
        let text: String = (0..lines).map(|i| format!("{}\n", i)).collect();
        viewport.set_lines(text_lines(&text));
        viewport.set_height(height);
        viewport
    }

    #[test]
    fn scroll_stops_at_bottom() {
        let keymap = KeyMap::default();
        let mut viewport = viewport(10, 4);
        assert!(viewport.update(&key(KeyCode::Char('G')), &keymap));
        assert_eq!(viewport.offset(), 6);
        assert!(!viewport.update(&key(KeyCode::Down), &keymap));
        assert_eq!(viewport.percent_label(), "☰ 100%");
    }

    #[test]
    fn short_content_is_fully_scrolled() {
        let keymap = KeyMap::default();
        let mut viewport = viewport(3, 10);
        assert!(!viewport.update(&key(KeyCode::PageDown), &keymap));
        assert_eq!(viewport.scroll_percent(), 1.0);
    }

    #[test]
    fn percent_tracks_offset() {
        let keymap = KeyMap::default();
        let mut viewport = viewport(12, 2);
        assert_eq!(viewport.percent_label(), "☰ 0%");
        for _ in 0..5 {
            viewport.update(&key(KeyCode::Char('j')), &keymap);
        }
        assert_eq!(viewport.percent_label(), "☰ 50%");
    }

    #[test]
    fn tabs_are_expanded() {
        let lines = text_lines("a\tb");
        assert_eq!(lines[0].to_string(), "a    b");
    }
}
