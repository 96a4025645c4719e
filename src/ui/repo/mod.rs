pub mod files;
pub mod log;
pub mod readme;
pub mod refs;

use std::sync::Arc;

use crossterm::event::{MouseButton, MouseEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use tracing::debug;

use crate::config::clone_cmd;
use crate::git::Repository;
use crate::message::{Content, Message, Task};
use crate::types::Reference;
use crate::ui::keymap::KeyBinding;
use crate::ui::pane::Pane;
use crate::ui::spinner::Spinner;
use crate::ui::statusbar::StatusBar;
use crate::ui::tabs::TabBar;
use crate::ui::{truncate, Common};

pub const README_TAB: &str = "Readme";
pub const FILES_TAB: &str = "Files";
pub const LOG_TAB: &str = "Commits";
pub const BRANCHES_TAB: &str = "Branches";
pub const TAGS_TAB: &str = "Tags";

/// Two text lines plus the bottom border.
const HEADER_HEIGHT: u16 = 3;
const TABS_HEIGHT: u16 = 1;
/// Top border of the main region.
const BODY_FRAME_HEIGHT: u16 = 1;
const STATUS_BAR_HEIGHT: u16 = 1;

pub const MAIN_ZONE: &str = "repo-main";
pub const HELP_ZONE: &str = "repo-help";

pub fn url_zone(repo_name: &str) -> String {
    format!("{}-url", repo_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Ready,
}

/// The repository page: header, tabs, the active pane and a status bar.
///
/// Owns message routing between the tab bar, status bar and panes. Content results
/// reach only the pane named by their target, spinner ticks only their owner.
pub struct RepoView {
    common: Common,
    repo: Option<Arc<dyn Repository>>,
    reference: Option<Reference>,
    active_tab: usize,
    tabs: TabBar,
    statusbar: StatusBar,
    panes: Vec<Box<dyn Pane>>,
    panes_ready: Vec<bool>,
    state: ViewState,
    spinner: Spinner,
}

impl RepoView {
    pub fn new(common: Common, panes: Vec<Box<dyn Pane>>) -> Self {
        let names = panes.iter().map(|p| p.tab_name().to_string()).collect();
        let spinner = Spinner::new(common.config.spinner_interval());
        Self {
            tabs: TabBar::new(common.clone(), names),
            statusbar: StatusBar::new(),
            panes_ready: vec![false; panes.len()],
            panes,
            common,
            repo: None,
            reference: None,
            active_tab: 0,
            state: ViewState::Loading,
            spinner,
        }
    }

    /// Readme, Files, Commits, Branches and Tags, in that order.
    pub fn with_default_panes(common: Common) -> Self {
        let panes: Vec<Box<dyn Pane>> = vec![
            Box::new(readme::Readme::new(common.clone())),
            Box::new(files::Files::new(common.clone())),
            Box::new(log::Log::new(common.clone())),
            Box::new(refs::Refs::branches(common.clone())),
            Box::new(refs::Refs::tags(common.clone())),
        ];
        Self::new(common, panes)
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn active_tab(&self) -> usize {
        self.active_tab
    }

    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    pub fn statusbar(&self) -> &StatusBar {
        &self.statusbar
    }

    pub fn pane_ready(&self, index: usize) -> bool {
        self.panes_ready.get(index).copied().unwrap_or(false)
    }

    fn active_pane(&self) -> Option<&dyn Pane> {
        self.panes.get(self.active_tab).map(|p| p.as_ref())
    }

    pub fn consumes_back(&self) -> bool {
        self.active_pane().is_some_and(|p| p.consumes_back())
    }

    pub fn is_filtering(&self) -> bool {
        self.active_pane().is_some_and(|p| p.is_filtering())
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        let overhead = HEADER_HEIGHT + TABS_HEIGHT + BODY_FRAME_HEIGHT + STATUS_BAR_HEIGHT;
        let body = height.saturating_sub(overhead);
        self.tabs.set_size(width, body);
        self.statusbar.set_size(width, body);
        for pane in &mut self.panes {
            pane.set_size(width, body);
        }
    }

    fn common_help(&self) -> Vec<KeyBinding> {
        vec![
            self.common.keymap.back.clone().with_help("esc", "back to menu"),
            self.common.keymap.section.clone().with_help("tab", "switch tab"),
        ]
    }

    pub fn short_help(&self) -> Vec<KeyBinding> {
        let mut help = self.common_help();
        if let Some(pane) = self.active_pane() {
            help.extend(pane.short_help());
        }
        help
    }

    pub fn full_help(&self) -> Vec<Vec<KeyBinding>> {
        let mut help = vec![self.common_help()];
        if let Some(pane) = self.active_pane() {
            help.extend(pane.full_help());
        }
        help
    }

    /// Back to loading on the first tab, with a fresh spinner.
    pub fn init(&mut self) -> Vec<Task> {
        self.state = ViewState::Loading;
        self.active_tab = 0;
        self.spinner = Spinner::new(self.common.config.spinner_interval());
        self.panes_ready.fill(false);

        let mut tasks = self.tabs.init();
        tasks.extend(self.statusbar.init());
        tasks.push(self.spinner.tick());
        tasks
    }

    pub fn update(&mut self, msg: &Message) -> Vec<Task> {
        let mut tasks = Vec::new();
        // Whether a branch below already handed `msg` to the panes it belongs to.
        let mut routed = false;

        match msg {
            Message::Repo(repo) => {
                self.repo = Some(repo.clone());
                tasks.extend(self.init());
                tasks.extend(self.broadcast(msg));
                routed = true;
                self.set_status_bar_info();
            }
            Message::Ref(reference) => {
                self.reference = Some(reference.clone());
                tasks.extend(self.broadcast(msg));
                routed = true;
                self.state = ViewState::Ready;
                self.set_status_bar_info();
            }
            Message::SelectTab(i) | Message::ActiveTab(i) => {
                if *i < self.panes.len() {
                    self.active_tab = *i;
                }
                tasks.extend(self.tabs.update(msg));
                self.set_status_bar_info();
            }
            Message::Key(_) | Message::Mouse(_) => {
                tasks.extend(self.tabs.update(msg));
                if let Message::Mouse(mouse) = msg {
                    match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => {
                            if let Some(repo) = &self.repo {
                                if self.common.zones.in_bounds(&url_zone(repo.name()), mouse) {
                                    tasks.push(Task::ready(Message::Copy {
                                        text: clone_cmd(
                                            &self.common.config.ssh.public_url,
                                            repo.name(),
                                        ),
                                        message: "Command copied to clipboard".to_string(),
                                    }));
                                }
                            }
                            if self.common.zones.in_bounds(HELP_ZONE, mouse) {
                                tasks.push(Task::ready(Message::ToggleFooter));
                            }
                        }
                        MouseEventKind::Down(MouseButton::Right) => {
                            if self.common.zones.in_bounds(MAIN_ZONE, mouse) {
                                tasks.push(Task::ready(Message::Back));
                            }
                        }
                        _ => {}
                    }
                }
                self.set_status_bar_info();
            }
            Message::Copy { text, message } => {
                self.common.clipboard.copy(text);
                self.statusbar.set_status("", message.as_str(), "", "");
            }
            Message::Content(content) => {
                tasks.extend(self.route_content(content, msg));
                routed = true;
            }
            Message::SpinnerTick(id) => {
                routed = true;
                if self.state == ViewState::Loading && *id == self.spinner.id() {
                    tasks.extend(self.spinner.update(msg));
                } else if let Some(pane) = self
                    .panes
                    .iter_mut()
                    .find(|p| p.spinner_id() == Some(*id))
                {
                    tasks.extend(pane.update(msg));
                } else {
                    debug!("dropping stale spinner tick {:?}", id);
                }
            }
            Message::Resize { width, height } => {
                self.set_size(*width, *height);
                tasks.extend(self.broadcast(msg));
                routed = true;
            }
            Message::EmptyRepo => {
                self.reference = None;
                self.state = ViewState::Ready;
                tasks.extend(self.broadcast(msg));
                routed = true;
            }
            Message::Error(e) => {
                debug!("showing ready state after error: {}", e);
                self.state = ViewState::Ready;
            }
            Message::SwitchTab(name) => {
                if let Some(i) = self.panes.iter().position(|p| p.tab_name() == name) {
                    tasks.push(Task::ready(Message::SelectTab(i)));
                }
            }
            Message::UpdateStatusBar => self.set_status_bar_info(),
            _ => {}
        }

        if !routed {
            if let Some(pane) = self.panes.get_mut(self.active_tab) {
                tasks.extend(pane.update(msg));
            }
        }
        tasks.extend(self.statusbar.update(msg));
        tasks
    }

    fn broadcast(&mut self, msg: &Message) -> Vec<Task> {
        self.panes
            .iter_mut()
            .flat_map(|pane| pane.update(msg))
            .collect()
    }

    fn route_content(&mut self, content: &Content, msg: &Message) -> Vec<Task> {
        let target = content.target();
        match self.panes.iter().position(|p| p.tab_name() == target) {
            Some(i) => {
                self.panes_ready[i] = true;
                self.panes[i].update(msg)
            }
            None => {
                debug!("no pane named {} for content result", target);
                Vec::new()
            }
        }
    }

    fn set_status_bar_info(&mut self) {
        let Some(repo) = &self.repo else {
            return;
        };
        let Some(active) = self.panes.get(self.active_tab) else {
            return;
        };

        let mut extra = "*".to_string();
        if let Some(reference) = &self.reference {
            extra.push(' ');
            extra.push_str(reference.short());
        }
        self.statusbar.set_status(
            repo.name(),
            active.status_bar_value(),
            active.status_bar_info(),
            extra,
        );
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Length(TABS_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(STATUS_BAR_HEIGHT),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.tabs.render(frame, chunks[1]);

        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray));
        let main = block.inner(chunks[2]);
        frame.render_widget(block, chunks[2]);
        self.common.zones.mark(MAIN_ZONE, chunks[2]);

        match self.state {
            ViewState::Loading => {
                let loading = format!("{} loading…", self.spinner.view());
                frame.render_widget(
                    Paragraph::new(loading).style(Style::default().fg(Color::Yellow)),
                    main,
                );
            }
            ViewState::Ready => {
                if let Some(pane) = self.active_pane() {
                    pane.render(frame, main);
                }
                self.statusbar.render(frame, chunks[3]);
            }
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let Some(repo) = &self.repo else {
            return;
        };

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height < 2 {
            return;
        }

        let mut name = repo.project_name().to_string();
        if name.is_empty() {
            name = repo.name().to_string();
        }
        let mut desc = repo.description().to_string();
        if desc.is_empty() {
            desc = name;
            name = String::new();
        }

        frame.render_widget(
            Paragraph::new(Span::styled(
                truncate(&name, inner.width as usize),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Rect::new(inner.x, inner.y, inner.width, 1),
        );

        let desc = truncate(&desc, inner.width as usize);
        let desc_width = (Span::raw(desc.as_str()).width() as u16).min(inner.width);
        frame.render_widget(
            Paragraph::new(Span::styled(desc, Style::default().fg(Color::Gray))),
            Rect::new(inner.x, inner.y + 1, desc_width, 1),
        );

        let url_width = inner.width.saturating_sub(desc_width + 1);
        if url_width == 0 {
            return;
        }
        let url = truncate(
            &clone_cmd(&self.common.config.ssh.public_url, repo.name()),
            url_width as usize,
        );
        let url_area = Rect::new(inner.x + desc_width + 1, inner.y + 1, url_width, 1);
        frame.render_widget(
            Paragraph::new(Span::styled(url, Style::default().fg(Color::DarkGray)))
                .alignment(ratatui::layout::Alignment::Right),
            url_area,
        );
        self.common.zones.mark(url_zone(repo.name()), url_area);
    }
}
