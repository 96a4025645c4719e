use std::any::Any;
use std::sync::Arc;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::Frame;

use crate::git::Repository;
use crate::message::{Content, Message, Task};
use crate::types::{EntryKind, Reference, TreeEntry};
use crate::ui::keymap::KeyBinding;
use crate::ui::pane::Pane;
use crate::ui::repo::FILES_TAB;
use crate::ui::selector::{FilterState, Identifiable, Item, SelectableList};
use crate::ui::viewport::{text_lines, Viewport};
use crate::ui::{truncate, Common};

#[derive(Debug, Clone)]
pub struct FileItem {
    pub entry: TreeEntry,
}

impl Identifiable for FileItem {
    fn id(&self) -> String {
        self.entry.path.clone()
    }

    fn filter_value(&self) -> String {
        self.entry.name.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn human_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "K", "M", "G"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}{}", size, UNITS[0])
    } else {
        format!("{:.1}{}", value, UNITS[unit])
    }
}

impl Item for FileItem {
    fn render(&self, active: bool, width: usize) -> Line<'static> {
        let marker = if active { "> " } else { "  " };
        let (name, style) = match self.entry.kind {
            EntryKind::Dir => (
                format!("{}/", self.entry.name),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
            EntryKind::Submodule => (
                format!("{} @", self.entry.name),
                Style::default().fg(Color::Magenta),
            ),
            EntryKind::File => (self.entry.name.clone(), Style::default()),
        };
        let style = if active {
            style.fg(Color::Yellow)
        } else {
            style
        };
        let size = match self.entry.kind {
            EntryKind::File => human_size(self.entry.size),
            _ => String::new(),
        };

        // marker + kind + space, size + space on the right
        let name_width = width.saturating_sub(4 + size.chars().count() + 1);
        let name = truncate(&name, name_width);
        let pad = name_width.saturating_sub(name.chars().count());
        Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Yellow)),
            Span::styled(format!("{} ", self.entry.kind), Style::default().fg(Color::DarkGray)),
            Span::styled(name, style),
            Span::raw(" ".repeat(pad + 1)),
            Span::styled(size, Style::default().fg(Color::DarkGray)),
        ])
    }
}

fn parent_of(path: &str) -> String {
    path.rsplit_once('/')
        .map(|(parent, _)| parent.to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    List,
    Content,
}

/// Tree browser for the current reference.
pub struct Files {
    common: Common,
    repo: Option<Arc<dyn Repository>>,
    reference: Option<Reference>,
    list: SelectableList<FileItem>,
    path: String,
    file_path: String,
    content: Viewport,
    view: View,
}

impl Files {
    pub fn new(common: Common) -> Self {
        Self {
            list: SelectableList::new(common.clone(), "files-"),
            common,
            repo: None,
            reference: None,
            path: String::new(),
            file_path: String::new(),
            content: Viewport::new(),
            view: View::List,
        }
    }

    fn reset(&mut self) {
        self.path.clear();
        self.file_path.clear();
        self.content.clear();
        self.view = View::List;
        self.list.set_items(Vec::new());
    }

    fn fetch_tree(&self, path: String) -> Option<Task> {
        let repo = self.repo.clone()?;
        let reference = self.reference.clone()?;
        Some(Task::attempt(
            async move {
                let entries = repo.tree(&reference, &path).await?;
                Ok((path, entries))
            },
            |(path, entries)| Message::Content(Content::FileItems { path, entries }),
        ))
    }

    fn fetch_file(&self, path: String) -> Option<Task> {
        let repo = self.repo.clone()?;
        let reference = self.reference.clone()?;
        Some(Task::attempt(
            async move {
                let content = repo.file(&reference, &path).await?;
                Ok((path, content))
            },
            |(path, content)| Message::Content(Content::FileContent { path, content }),
        ))
    }

    fn open(&self, item: &FileItem) -> Option<Task> {
        match item.entry.kind {
            EntryKind::Dir => self.fetch_tree(item.entry.path.clone()),
            EntryKind::File => self.fetch_file(item.entry.path.clone()),
            EntryKind::Submodule => None,
        }
    }

    fn update_list(&mut self, msg: &Message) -> Vec<Task> {
        let keymap = self.common.keymap.clone();
        if let Message::Key(key) = msg {
            let unfiltered = self.list.filter_state() == FilterState::Unfiltered;
            let leaving = keymap.parent.matches(key) || keymap.back.matches(key);
            if unfiltered && leaving && !self.path.is_empty() {
                return self.fetch_tree(parent_of(&self.path)).into_iter().collect();
            }
        }
        self.list.update(msg)
    }

    fn update_content(&mut self, msg: &Message) -> Vec<Task> {
        let keymap = &self.common.keymap;
        if let Message::Key(key) = msg {
            if keymap.parent.matches(key) || keymap.back.matches(key) {
                self.view = View::List;
                self.content.clear();
                return vec![Task::ready(Message::UpdateStatusBar)];
            }
        }
        if self.content.update(msg, keymap) {
            vec![Task::ready(Message::UpdateStatusBar)]
        } else {
            Vec::new()
        }
    }
}

impl Pane for Files {
    fn tab_name(&self) -> &str {
        FILES_TAB
    }

    fn set_size(&mut self, width: u16, height: u16) {
        self.list.set_size(width, height);
        self.content.set_height(height);
    }

    fn update(&mut self, msg: &Message) -> Vec<Task> {
        match msg {
            Message::Repo(repo) => {
                self.repo = Some(repo.clone());
                self.reference = None;
                self.reset();
                Vec::new()
            }
            Message::Ref(reference) => {
                self.reference = Some(reference.clone());
                self.reset();
                self.fetch_tree(String::new()).into_iter().collect()
            }
            Message::EmptyRepo => {
                self.reference = None;
                self.reset();
                Vec::new()
            }
            Message::Content(Content::FileItems { path, entries }) => {
                self.path = path.clone();
                self.view = View::List;
                let items = entries
                    .iter()
                    .cloned()
                    .map(|entry| FileItem { entry })
                    .collect();
                let mut tasks: Vec<Task> = self.list.set_items(items).into_iter().collect();
                self.list.select(0);
                tasks.push(Task::ready(Message::UpdateStatusBar));
                tasks
            }
            Message::Content(Content::FileContent { path, content }) => {
                self.file_path = path.clone();
                self.content.set_lines(text_lines(content));
                self.view = View::Content;
                vec![Task::ready(Message::UpdateStatusBar)]
            }
            Message::ItemSelected(Some(item)) if self.view == View::List => {
                match item.as_any().downcast_ref::<FileItem>() {
                    Some(file) => self.open(file).into_iter().collect(),
                    None => Vec::new(),
                }
            }
            Message::ItemActive(_) => vec![Task::ready(Message::UpdateStatusBar)],
            Message::Key(_) | Message::Mouse(_) => match self.view {
                View::List => self.update_list(msg),
                View::Content => self.update_content(msg),
            },
            _ => Vec::new(),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        match self.view {
            View::List => self.list.render(frame, area),
            View::Content => self.content.render(frame, area),
        }
    }

    fn short_help(&self) -> Vec<KeyBinding> {
        let keymap = &self.common.keymap;
        match self.view {
            View::List => vec![
                keymap.up.clone(),
                keymap.down.clone(),
                keymap.select.clone().with_help("enter", "open"),
                keymap.parent.clone(),
                keymap.filter.clone(),
            ],
            View::Content => vec![
                keymap.up.clone(),
                keymap.down.clone(),
                keymap.parent.clone(),
            ],
        }
    }

    fn full_help(&self) -> Vec<Vec<KeyBinding>> {
        let keymap = &self.common.keymap;
        vec![
            vec![keymap.up.clone(), keymap.down.clone()],
            vec![keymap.page_up.clone(), keymap.page_down.clone()],
            vec![keymap.home.clone(), keymap.end.clone()],
            vec![
                keymap.select.clone().with_help("enter", "open"),
                keymap.parent.clone(),
                keymap.filter.clone(),
            ],
        ]
    }

    fn status_bar_value(&self) -> String {
        match self.view {
            View::Content => self.file_path.clone(),
            View::List if self.path.is_empty() => "/".to_string(),
            View::List => self.path.clone(),
        }
    }

    fn status_bar_info(&self) -> String {
        match self.view {
            View::Content => self.content.percent_label(),
            View::List => match self.list.position() {
                (_, 0) => String::new(),
                (index, len) => format!("{}/{}", index + 1, len),
            },
        }
    }

    fn consumes_back(&self) -> bool {
        self.view == View::Content
            || !self.path.is_empty()
            || self.list.filter_state() != FilterState::Unfiltered
    }

    fn is_filtering(&self) -> bool {
        self.list.is_filtering()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;

    use crate::message::resolve_all;
    use crate::testing::{key, main_ref, test_common, FakeRepo};

    /// Feed every resolved message back into the pane until it goes quiet.
    async fn settle(files: &mut Files, tasks: Vec<Task>) {
        let mut pending = resolve_all(tasks).await;
        while let Some(msg) = pending.pop() {
            let more = files.update(&msg);
            pending.extend(resolve_all(more).await);
        }
    }

    async fn loaded() -> Files {
        let (common, _) = test_common();
        let mut files = Files::new(common);
        files.set_size(80, 10);
        files.update(&Message::Repo(Arc::new(FakeRepo::new())));
        let tasks = files.update(&Message::Ref(main_ref()));
        settle(&mut files, tasks).await;
        files
    }

    #[tokio::test]
    async fn ref_lists_root() {
        let files = loaded().await;
        let names: Vec<String> = files.list.items().iter().map(|i| i.id()).collect();
        assert_eq!(names, vec!["src", "README.md"]);
        assert_eq!(files.status_bar_value(), "/");
        assert_eq!(files.status_bar_info(), "1/2");
        assert!(!files.consumes_back());
    }

    #[tokio::test]
    async fn enter_descends_and_parent_goes_up() {
        let mut files = loaded().await;
        let tasks = files.update(&key(KeyCode::Enter));
        settle(&mut files, tasks).await;
        assert_eq!(files.status_bar_value(), "src");
        assert_eq!(files.list.items()[0].id(), "src/main.rs");
        assert!(files.consumes_back());

        let tasks = files.update(&key(KeyCode::Backspace));
        settle(&mut files, tasks).await;
        assert_eq!(files.status_bar_value(), "/");
        assert_eq!(files.list.items().len(), 2);
    }

    #[tokio::test]
    async fn opening_a_file_shows_its_content() {
        let mut files = loaded().await;
        let tasks = files.update(&key(KeyCode::Down));
        settle(&mut files, tasks).await;
        assert_eq!(files.status_bar_info(), "2/2");

        let tasks = files.update(&key(KeyCode::Enter));
        settle(&mut files, tasks).await;
        assert_eq!(files.view, View::Content);
        assert_eq!(files.status_bar_value(), "README.md");
        assert_eq!(files.status_bar_info(), "☰ 100%");

        files.update(&key(KeyCode::Esc));
        assert_eq!(files.view, View::List);
    }

    #[tokio::test]
    async fn foreign_selection_is_ignored() {
        let mut files = loaded().await;
        let other: crate::ui::selector::ItemRef = Arc::new(crate::ui::repo::refs::RefItem::new(
            crate::testing::main_ref(),
            "summary".into(),
            chrono::Utc::now(),
        ));
        assert!(files.update(&Message::ItemSelected(Some(other))).is_empty());
        assert!(files.update(&Message::ItemSelected(None)).is_empty());
    }

    #[test]
    fn parent_paths() {
        assert_eq!(parent_of("src/ui/mod.rs"), "src/ui");
        assert_eq!(parent_of("src"), "");
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(human_size(512), "512B");
        assert_eq!(human_size(2048), "2.0K");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0M");
    }
}
