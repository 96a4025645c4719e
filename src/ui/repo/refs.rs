use std::any::Any;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::Frame;

use crate::git::Repository;
use crate::message::{Content, Message, Task};
use crate::types::{Reference, BRANCH_PREFIX, TAG_PREFIX};
use crate::ui::keymap::KeyBinding;
use crate::ui::pane::Pane;
use crate::ui::repo::{BRANCHES_TAB, FILES_TAB, TAGS_TAB};
use crate::ui::selector::{FilterState, Identifiable, Item, SelectableList};
use crate::ui::{format_age, truncate, Common};

#[derive(Debug, Clone)]
pub struct RefItem {
    pub reference: Reference,
    summary: String,
    date: DateTime<Utc>,
}

impl RefItem {
    pub fn new(reference: Reference, summary: String, date: DateTime<Utc>) -> Self {
        Self {
            reference,
            summary,
            date,
        }
    }
}

impl Identifiable for RefItem {
    fn id(&self) -> String {
        self.reference.name().to_string()
    }

    fn filter_value(&self) -> String {
        self.reference.short().to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Item for RefItem {
    fn render(&self, active: bool, width: usize) -> Line<'static> {
        let marker = if active { "> " } else { "  " };
        let name_style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let name = self.reference.short().to_string();
        let age = format_age(self.date);
        let fixed = 2 + name.chars().count() + 2 + 1 + age.chars().count();
        let summary = truncate(&self.summary, width.saturating_sub(fixed));

        Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Yellow)),
            Span::styled(name, name_style),
            Span::raw("  "),
            Span::styled(summary, Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::styled(age, Style::default().fg(Color::DarkGray)),
        ])
    }
}

/// Branches or tags, depending on the prefix. Choosing one switches the whole
/// view to that reference.
pub struct Refs {
    common: Common,
    repo: Option<Arc<dyn Repository>>,
    reference: Option<Reference>,
    prefix: &'static str,
    name: &'static str,
    list: SelectableList<RefItem>,
}

impl Refs {
    fn new(common: Common, prefix: &'static str, name: &'static str) -> Self {
        Self {
            list: SelectableList::new(common.clone(), format!("{}-", name.to_lowercase())),
            common,
            repo: None,
            reference: None,
            prefix,
            name,
        }
    }

    pub fn branches(common: Common) -> Self {
        Self::new(common, BRANCH_PREFIX, BRANCHES_TAB)
    }

    pub fn tags(common: Common) -> Self {
        Self::new(common, TAG_PREFIX, TAGS_TAB)
    }

    fn fetch(&self) -> Option<Task> {
        let repo = self.repo.clone()?;
        let prefix = self.prefix.to_string();
        Some(Task::attempt(
            async move {
                let refs = repo.references(&prefix).await?;
                Ok((prefix, refs))
            },
            |(prefix, refs)| Message::Content(Content::RefItems { prefix, refs }),
        ))
    }

    /// Index of the reference currently shown, if it is in this list.
    fn current_index(&self) -> Option<usize> {
        let current = self.reference.as_ref()?;
        self.list
            .visible_items()
            .iter()
            .position(|item| &item.reference == current)
    }
}

impl Pane for Refs {
    fn tab_name(&self) -> &str {
        self.name
    }

    fn set_size(&mut self, width: u16, height: u16) {
        self.list.set_size(width, height);
    }

    fn update(&mut self, msg: &Message) -> Vec<Task> {
        match msg {
            Message::Repo(repo) => {
                self.repo = Some(repo.clone());
                self.reference = None;
                self.list.set_items(Vec::new());
                Vec::new()
            }
            Message::Ref(reference) => {
                self.reference = Some(reference.clone());
                self.fetch().into_iter().collect()
            }
            Message::EmptyRepo => {
                self.reference = None;
                self.list.set_items(Vec::new());
                Vec::new()
            }
            Message::Content(Content::RefItems { prefix, refs }) if prefix == self.prefix => {
                let items = refs
                    .iter()
                    .map(|r| RefItem::new(r.reference.clone(), r.summary.clone(), r.date))
                    .collect();
                let mut tasks: Vec<Task> = self.list.set_items(items).into_iter().collect();
                self.list.select(self.current_index().unwrap_or(0));
                tasks.push(Task::ready(Message::UpdateStatusBar));
                tasks
            }
            Message::ItemSelected(Some(item)) => {
                match item.as_any().downcast_ref::<RefItem>() {
                    Some(chosen) => vec![
                        Task::ready(Message::Ref(chosen.reference.clone())),
                        Task::ready(Message::SwitchTab(FILES_TAB.to_string())),
                    ],
                    None => Vec::new(),
                }
            }
            Message::ItemActive(_) => vec![Task::ready(Message::UpdateStatusBar)],
            Message::Key(_) | Message::Mouse(_) => self.list.update(msg),
            _ => Vec::new(),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.list.render(frame, area);
    }

    fn short_help(&self) -> Vec<KeyBinding> {
        let keymap = &self.common.keymap;
        vec![
            keymap.up.clone(),
            keymap.down.clone(),
            keymap.select.clone().with_help("enter", "checkout"),
            keymap.filter.clone(),
        ]
    }

    fn full_help(&self) -> Vec<Vec<KeyBinding>> {
        let keymap = &self.common.keymap;
        vec![
            vec![keymap.up.clone(), keymap.down.clone()],
            vec![keymap.page_up.clone(), keymap.page_down.clone()],
            vec![keymap.home.clone(), keymap.end.clone()],
            vec![
                keymap.select.clone().with_help("enter", "checkout"),
                keymap.filter.clone(),
            ],
        ]
    }

    fn status_bar_value(&self) -> String {
        self.list
            .selected_item()
            .map(|item| item.reference.short().to_string())
            .unwrap_or_default()
    }

    fn status_bar_info(&self) -> String {
        match self.list.position() {
            (_, 0) => String::new(),
            (index, len) => format!("{}/{}", index + 1, len),
        }
    }

    fn consumes_back(&self) -> bool {
        self.list.filter_state() != FilterState::Unfiltered
    }

    fn is_filtering(&self) -> bool {
        self.list.is_filtering()
    }
}
