//! Fakes and input helpers shared by the unit tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use parking_lot::Mutex;
use ratatui::layout::Rect;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::clipboard::MemoryClipboard;
use crate::config::Config;
use crate::error::{Result, RoveError};
use crate::git::Repository;
use crate::message::{Content, Message, Task};
use crate::types::{
    Commit, CommitDiff, EntryKind, RefEntry, Reference, TreeEntry, BRANCH_PREFIX, TAG_PREFIX,
};
use crate::ui::keymap::KeyBinding;
use crate::ui::pane::Pane;
use crate::ui::spinner::{Spinner, SpinnerId};
use crate::ui::Common;

pub fn test_common() -> (Common, Arc<MemoryClipboard>) {
    let clipboard = Arc::new(MemoryClipboard::default());
    let mut config = Config::default();
    config.ui.spinner_interval_ms = 0;
    (Common::new(config, clipboard.clone()), clipboard)
}

pub fn key(code: KeyCode) -> Message {
    Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Message {
    Message::Mouse(MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

pub fn click(column: u16, row: u16) -> Message {
    mouse(MouseEventKind::Down(MouseButton::Left), column, row)
}

pub fn right_click(column: u16, row: u16) -> Message {
    mouse(MouseEventKind::Down(MouseButton::Right), column, row)
}

pub fn main_ref() -> Reference {
    Reference::new(format!("{}main", BRANCH_PREFIX))
}

fn date(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}

pub fn commit(id: &str, summary: &str) -> Commit {
    Commit {
        id: id.to_string(),
        summary: summary.to_string(),
        message: format!("{}\n", summary),
        author: "Ada".to_string(),
        date: date(1_700_000_000),
    }
}

/// Canned repository: a README, `src/main.rs`, two commits, `main` and `v1`.
#[derive(Debug, Default)]
pub struct FakeRepo {
    pub empty: bool,
    pub description: String,
    pub project_name: String,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self {
            description: "A repository browser".to_string(),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self {
            empty: true,
            ..Self::new()
        }
    }

    fn commits_list() -> Vec<Commit> {
        vec![
            commit("2222222222222222222222222222222222222222", "expand readme"),
            commit("1111111111111111111111111111111111111111", "initial"),
        ]
    }
}

#[async_trait]
impl Repository for FakeRepo {
    fn name(&self) -> &str {
        "rove"
    }

    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn head(&self) -> Result<Option<Reference>> {
        Ok((!self.empty).then(main_ref))
    }

    async fn latest_file(
        &self,
        _reference: &Reference,
        _pattern: &str,
    ) -> Result<Option<(String, String)>> {
        let body: String = (1..=40).map(|i| format!("line {}\n", i)).collect();
        Ok(Some((format!("# rove\n{}", body), "README.md".to_string())))
    }

    async fn tree(&self, _reference: &Reference, path: &str) -> Result<Vec<TreeEntry>> {
        let entry = |name: &str, path: &str, kind| TreeEntry {
            name: name.to_string(),
            path: path.to_string(),
            kind,
            size: 12,
        };
        match path {
            "" => Ok(vec![
                entry("src", "src", EntryKind::Dir),
                entry("README.md", "README.md", EntryKind::File),
            ]),
            "src" => Ok(vec![entry("main.rs", "src/main.rs", EntryKind::File)]),
            other => Err(RoveError::Config(format!("no such path: {}", other))),
        }
    }

    async fn file(&self, _reference: &Reference, path: &str) -> Result<String> {
        Ok(format!("contents of {}\n", path))
    }

    async fn commit_count(&self, _reference: &Reference) -> Result<usize> {
        Ok(Self::commits_list().len())
    }

    async fn commits(
        &self,
        _reference: &Reference,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Commit>> {
        Ok(Self::commits_list().into_iter().skip(skip).take(limit).collect())
    }

    async fn diff(&self, commit_id: &str) -> Result<CommitDiff> {
        let commit = Self::commits_list()
            .into_iter()
            .find(|c| c.id == commit_id)
            .ok_or_else(|| RoveError::Config(format!("unknown commit {}", commit_id)))?;
        Ok(CommitDiff {
            commit,
            patch: "diff --git a/README.md b/README.md\n-old\n+new\n".to_string(),
            files_changed: 1,
            insertions: 1,
            deletions: 1,
        })
    }

    async fn references(&self, prefix: &str) -> Result<Vec<RefEntry>> {
        let name = if prefix == TAG_PREFIX { "v1" } else { "main" };
        Ok(vec![RefEntry {
            reference: Reference::new(format!("{}{}", prefix, name)),
            target: "2222222222222222222222222222222222222222".to_string(),
            summary: "expand readme".to_string(),
            date: date(1_700_000_000),
        }])
    }
}

/// What a [`FakePane`] has seen.
#[derive(Debug, Default)]
pub struct Record {
    pub messages: Vec<String>,
    pub items: usize,
    pub ticks: usize,
    pub size: (u16, u16),
}

/// Pane that records every message it receives.
pub struct FakePane {
    name: String,
    record: Arc<Mutex<Record>>,
    spinner: Option<Spinner>,
}

impl FakePane {
    pub fn new(name: &str) -> (Self, Arc<Mutex<Record>>) {
        let record = Arc::new(Mutex::new(Record::default()));
        let pane = Self {
            name: name.to_string(),
            record: record.clone(),
            spinner: None,
        };
        (pane, record)
    }

    /// A pane that is busy loading, with its own spinner.
    pub fn loading(name: &str) -> (Self, Arc<Mutex<Record>>, SpinnerId) {
        let (mut pane, record) = Self::new(name);
        let spinner = Spinner::new(Duration::ZERO);
        let id = spinner.id();
        pane.spinner = Some(spinner);
        (pane, record, id)
    }
}

/// Variant name of a message, e.g. `Content` or `SpinnerTick`.
pub fn label(msg: &Message) -> String {
    format!("{:?}", msg)
        .chars()
        .take_while(|c| c.is_alphanumeric())
        .collect()
}

impl Pane for FakePane {
    fn tab_name(&self) -> &str {
        &self.name
    }

    fn set_size(&mut self, width: u16, height: u16) {
        self.record.lock().size = (width, height);
    }

    fn update(&mut self, msg: &Message) -> Vec<Task> {
        let mut record = self.record.lock();
        record.messages.push(label(msg));
        match msg {
            Message::Content(Content::FileItems { entries, .. }) => {
                record.items = entries.len();
                Vec::new()
            }
            Message::SpinnerTick(id) => match self.spinner.as_mut() {
                Some(spinner) if spinner.id() == *id => {
                    record.ticks += 1;
                    spinner.update(msg)
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Paragraph::new(format!("{} pane", self.name)), area);
    }

    fn short_help(&self) -> Vec<KeyBinding> {
        vec![KeyBinding::new([KeyCode::Char('x')], "x", "poke")]
    }

    fn full_help(&self) -> Vec<Vec<KeyBinding>> {
        vec![self.short_help()]
    }

    fn status_bar_value(&self) -> String {
        format!("{} value", self.name)
    }

    fn status_bar_info(&self) -> String {
        format!("{} info", self.name)
    }

    fn spinner_id(&self) -> Option<SpinnerId> {
        self.spinner.as_ref().map(Spinner::id)
    }
}

