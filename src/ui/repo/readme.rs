use std::sync::Arc;

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::git::{self, Repository};
use crate::message::{Content, Message, Task};
use crate::types::Reference;
use crate::ui::keymap::KeyBinding;
use crate::ui::pane::Pane;
use crate::ui::repo::README_TAB;
use crate::ui::viewport::{scroll_help, text_lines, Viewport};
use crate::ui::Common;

/// The repository README at the current reference.
pub struct Readme {
    common: Common,
    repo: Option<Arc<dyn Repository>>,
    path: String,
    viewport: Viewport,
}

impl Readme {
    pub fn new(common: Common) -> Self {
        Self {
            common,
            repo: None,
            path: String::new(),
            viewport: Viewport::new(),
        }
    }

    fn fetch(&self, reference: &Reference) -> Option<Task> {
        let repo = self.repo.clone()?;
        let reference = reference.clone();
        Some(Task::attempt(
            async move { git::readme(repo.as_ref(), &reference).await },
            |(content, path)| Message::Content(Content::Readme { content, path }),
        ))
    }
}

impl Pane for Readme {
    fn tab_name(&self) -> &str {
        README_TAB
    }

    fn set_size(&mut self, _width: u16, height: u16) {
        self.viewport.set_height(height);
    }

    fn update(&mut self, msg: &Message) -> Vec<Task> {
        match msg {
            Message::Repo(repo) => {
                self.repo = Some(repo.clone());
                self.path.clear();
                self.viewport.clear();
                Vec::new()
            }
            Message::Ref(reference) => self.fetch(reference).into_iter().collect(),
            Message::EmptyRepo => {
                self.path.clear();
                self.viewport.clear();
                Vec::new()
            }
            Message::Content(Content::Readme { content, path }) => {
                self.path = path.clone();
                self.viewport.set_lines(text_lines(content));
                vec![Task::ready(Message::UpdateStatusBar)]
            }
            Message::Key(_) | Message::Mouse(_) => {
                if self.viewport.update(msg, &self.common.keymap) {
                    vec![Task::ready(Message::UpdateStatusBar)]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if self.viewport.is_empty() {
            frame.render_widget(
                Paragraph::new("No readme found.").style(Style::default().fg(Color::DarkGray)),
                area,
            );
            return;
        }
        self.viewport.render(frame, area);
    }

    fn short_help(&self) -> Vec<KeyBinding> {
        vec![self.common.keymap.up.clone(), self.common.keymap.down.clone()]
    }

    fn full_help(&self) -> Vec<Vec<KeyBinding>> {
        scroll_help(&self.common.keymap)
    }

    fn status_bar_value(&self) -> String {
        self.path.clone()
    }

    fn status_bar_info(&self) -> String {
        self.viewport.percent_label()
    }
}
