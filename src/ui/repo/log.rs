use std::any::Any;
use std::sync::Arc;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tracing::debug;

use crate::git::Repository;
use crate::message::{Content, Message, Task};
use crate::types::{Commit, CommitDiff, Reference};
use crate::ui::keymap::KeyBinding;
use crate::ui::pane::Pane;
use crate::ui::repo::LOG_TAB;
use crate::ui::selector::{FilterState, Identifiable, Item, SelectableList};
use crate::ui::spinner::{Spinner, SpinnerId};
use crate::ui::viewport::{scroll_help, Viewport};
use crate::ui::{format_age, truncate, Common};

#[derive(Debug, Clone)]
pub struct CommitItem {
    pub commit: Commit,
}

impl Identifiable for CommitItem {
    fn id(&self) -> String {
        self.commit.id.clone()
    }

    fn filter_value(&self) -> String {
        self.commit.summary.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Item for CommitItem {
    fn render(&self, active: bool, width: usize) -> Line<'static> {
        let marker = if active { "> " } else { "  " };
        let age = format_age(self.commit.date);
        let author = format!("@{}", self.commit.author);
        // marker(2) + sha(7) + 3 separating spaces
        let fixed = 2 + 7 + 3 + author.chars().count() + age.chars().count();
        let summary = truncate(&self.commit.summary, width.saturating_sub(fixed));
        let summary_style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Yellow)),
            Span::styled(
                self.commit.short_id().to_string(),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(" "),
            Span::styled(summary, summary_style),
            Span::raw(" "),
            Span::styled(author, Style::default().fg(Color::Cyan)),
            Span::raw(" "),
            Span::styled(age, Style::default().fg(Color::DarkGray)),
        ])
    }
}

fn diff_lines(diff: &CommitDiff) -> Vec<Line<'static>> {
    let commit = &diff.commit;
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("Commit {}", commit.short_id()),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(format!("@{}", commit.author), Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(format_age(commit.date), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::styled(format!("+{}", diff.insertions), Style::default().fg(Color::Green)),
            Span::raw("  "),
            Span::styled(format!("-{}", diff.deletions), Style::default().fg(Color::Red)),
            Span::raw("  "),
            Span::styled(
                format!("{} files changed", diff.files_changed),
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::from(""),
    ];

    for line in commit.message.lines() {
        lines.push(Line::from(format!("  {}", line)));
    }
    lines.push(Line::from(""));

    for line in diff.patch.lines() {
        let line = line.replace('\t', "    ");
        let color = if line.starts_with("+++") || line.starts_with("---") {
            Color::White
        } else if line.starts_with('+') {
            Color::Green
        } else if line.starts_with('-') {
            Color::Red
        } else if line.starts_with("@@") {
            Color::Cyan
        } else {
            Color::Gray
        };
        lines.push(Line::from(Span::styled(line, Style::default().fg(color))));
    }
    lines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    List,
    Diff,
}

/// Commit history of the current reference, with a diff view per commit.
///
/// Runs its own spinner while the count, the commit page or a diff is loading.
pub struct Log {
    common: Common,
    repo: Option<Arc<dyn Repository>>,
    reference: Option<Reference>,
    list: SelectableList<CommitItem>,
    count: usize,
    diff: Viewport,
    diff_title: String,
    view: View,
    spinner: Spinner,
    loading: bool,
    // a further page of commits is on its way
    fetching_more: bool,
}

impl Log {
    pub fn new(common: Common) -> Self {
        let spinner = Spinner::new(common.config.spinner_interval());
        Self {
            list: SelectableList::new(common.clone(), "log-"),
            common,
            repo: None,
            reference: None,
            count: 0,
            diff: Viewport::new(),
            diff_title: String::new(),
            view: View::List,
            spinner,
            loading: false,
            fetching_more: false,
        }
    }

    fn reset(&mut self) {
        self.count = 0;
        self.list.set_items(Vec::new());
        self.diff.clear();
        self.diff_title.clear();
        self.view = View::List;
        self.loading = false;
        self.fetching_more = false;
    }

    /// Start a fresh spinner; ticks of the previous one are dropped.
    fn start_loading(&mut self) -> Task {
        self.loading = true;
        self.spinner = Spinner::new(self.common.config.spinner_interval());
        self.spinner.tick()
    }

    fn fetch_count(&self) -> Option<Task> {
        let repo = self.repo.clone()?;
        let reference = self.reference.clone()?;
        Some(Task::attempt(
            async move { repo.commit_count(&reference).await },
            |count| Message::Content(Content::LogCount(count)),
        ))
    }

    fn fetch_commits(&self, skip: usize) -> Option<Task> {
        let repo = self.repo.clone()?;
        let reference = self.reference.clone()?;
        let limit = self.common.config.ui.log_page_size;
        Some(Task::attempt(
            async move { repo.commits(&reference, skip, limit).await },
            move |commits| Message::Content(Content::LogItems { skip, commits }),
        ))
    }

    /// Ask for the next page once the cursor sits on the last loaded commit.
    fn fetch_more(&mut self) -> Option<Task> {
        let loaded = self.list.items().len();
        if self.fetching_more
            || loaded >= self.count
            || self.list.filter_state() != FilterState::Unfiltered
            || self.list.index() + 1 < loaded
        {
            return None;
        }
        let task = self.fetch_commits(loaded)?;
        self.fetching_more = true;
        Some(task)
    }

    fn append_commits(&mut self, skip: usize, commits: &[Commit]) -> Vec<Task> {
        self.fetching_more = false;
        let mut items: Vec<CommitItem> = self.list.items().iter().map(|i| (**i).clone()).collect();
        if skip != items.len() {
            debug!("dropping commit page at {}, have {}", skip, items.len());
            return Vec::new();
        }
        items.extend(commits.iter().cloned().map(|commit| CommitItem { commit }));
        let mut tasks: Vec<Task> = self.list.set_items(items).into_iter().collect();
        tasks.push(Task::ready(Message::UpdateStatusBar));
        tasks
    }

    fn fetch_diff(&self, commit_id: String) -> Option<Task> {
        let repo = self.repo.clone()?;
        Some(Task::attempt(
            async move { repo.diff(&commit_id).await },
            |diff| Message::Content(Content::LogDiff(Box::new(diff))),
        ))
    }

    fn update_diff(&mut self, msg: &Message) -> Vec<Task> {
        let keymap = &self.common.keymap;
        if let Message::Key(key) = msg {
            if keymap.parent.matches(key) || keymap.back.matches(key) {
                self.view = View::List;
                return vec![Task::ready(Message::UpdateStatusBar)];
            }
        }
        if self.diff.update(msg, keymap) {
            vec![Task::ready(Message::UpdateStatusBar)]
        } else {
            Vec::new()
        }
    }
}

impl Pane for Log {
    fn tab_name(&self) -> &str {
        LOG_TAB
    }

    fn set_size(&mut self, width: u16, height: u16) {
        self.list.set_size(width, height);
        self.diff.set_height(height);
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
                let mut tasks = vec![self.start_loading()];
                tasks.extend(self.fetch_count());
                tasks
            }
            Message::EmptyRepo => {
                self.reference = None;
                self.reset();
                Vec::new()
            }
            Message::Content(Content::LogCount(count)) => {
                self.count = *count;
                self.fetch_commits(0).into_iter().collect()
            }
            Message::Content(Content::LogItems { skip, commits }) if *skip > 0 => {
                self.append_commits(*skip, commits)
            }
            Message::Content(Content::LogItems { commits, .. }) => {
                let items = commits
                    .iter()
                    .cloned()
                    .map(|commit| CommitItem { commit })
                    .collect();
                let mut tasks: Vec<Task> = self.list.set_items(items).into_iter().collect();
                self.list.select(0);
                self.loading = false;
                tasks.push(Task::ready(Message::UpdateStatusBar));
                tasks
            }
            Message::Content(Content::LogDiff(diff)) => {
                self.diff.set_lines(diff_lines(diff));
                self.diff_title = format!("{} {}", diff.commit.short_id(), diff.commit.summary);
                self.view = View::Diff;
                self.loading = false;
                vec![Task::ready(Message::UpdateStatusBar)]
            }
            Message::SpinnerTick(id) if self.loading && *id == self.spinner.id() => {
                self.spinner.update(msg)
            }
            Message::ItemSelected(Some(item)) if self.view == View::List && !self.loading => {
                let Some(commit) = item.as_any().downcast_ref::<CommitItem>() else {
                    return Vec::new();
                };
                match self.fetch_diff(commit.commit.id.clone()) {
                    Some(fetch) => vec![self.start_loading(), fetch],
                    None => Vec::new(),
                }
            }
            Message::ItemActive(_) => vec![Task::ready(Message::UpdateStatusBar)],
            Message::Key(_) | Message::Mouse(_) if !self.loading => match self.view {
                View::List => {
                    let mut tasks = self.list.update(msg);
                    tasks.extend(self.fetch_more());
                    tasks
                }
                View::Diff => self.update_diff(msg),
            },
            _ => Vec::new(),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if self.loading {
            frame.render_widget(
                Paragraph::new(format!("{} loading…", self.spinner.view()))
                    .style(Style::default().fg(Color::Yellow)),
                area,
            );
            return;
        }
        match self.view {
            View::List => self.list.render(frame, area),
            View::Diff => self.diff.render(frame, area),
        }
    }

    fn short_help(&self) -> Vec<KeyBinding> {
        let keymap = &self.common.keymap;
        match self.view {
            View::List => vec![
                keymap.up.clone(),
                keymap.down.clone(),
                keymap.select.clone().with_help("enter", "view diff"),
                keymap.filter.clone(),
            ],
            View::Diff => vec![
                keymap.up.clone(),
                keymap.down.clone(),
                keymap.parent.clone().with_help("←/h", "back to log"),
            ],
        }
    }

    fn full_help(&self) -> Vec<Vec<KeyBinding>> {
        let mut help = scroll_help(&self.common.keymap);
        help.push(self.short_help().into_iter().skip(2).collect());
        help
    }

    fn status_bar_value(&self) -> String {
        match self.view {
            View::Diff => self.diff_title.clone(),
            View::List => self
                .list
                .selected_item()
                .map(|item| item.commit.summary.clone())
                .unwrap_or_default(),
        }
    }

    fn status_bar_info(&self) -> String {
        match self.view {
            View::Diff => self.diff.percent_label(),
            View::List => match self.list.position() {
                (_, 0) => String::new(),
                (index, visible) if self.list.filter_state() != FilterState::Unfiltered => {
                    format!("{}/{}", index + 1, visible)
                }
                (index, _) => format!("{}/{}", index + 1, self.count),
            },
        }
    }

    fn spinner_id(&self) -> Option<SpinnerId> {
        self.loading.then(|| self.spinner.id())
    }

    fn consumes_back(&self) -> bool {
        self.view == View::Diff || self.list.filter_state() != FilterState::Unfiltered
    }

    fn is_filtering(&self) -> bool {
        self.list.is_filtering()
    }
}
