use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::event::Event;
use crate::git::Repository;
use crate::message::{Message, Task};
use crate::ui::repo::RepoView;
use crate::ui::Common;

pub struct App {
    pub common: Common,
    pub view: RepoView,
    pub show_full_help: bool,
    pub error: Option<String>,
    pub should_quit: bool,
    width: u16,
    height: u16,
}

impl App {
    pub fn new(common: Common) -> Self {
        Self {
            view: RepoView::with_default_panes(common.clone()),
            common,
            show_full_help: false,
            error: None,
            should_quit: false,
            width: 0,
            height: 0,
        }
    }

    /// Rows taken by the help footer under the view.
    pub fn footer_height(&self) -> u16 {
        if self.error.is_some() || !self.show_full_help {
            return 1;
        }
        let rows = self
            .view
            .full_help()
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(1);
        u16::try_from(rows).unwrap_or(u16::MAX).max(1)
    }

    /// Open a repository: hand it to the view, then resolve its HEAD.
    pub fn init(&mut self, repo: Arc<dyn Repository>) -> Vec<Task> {
        let mut tasks = self.update(Message::Repo(repo.clone()));
        tasks.push(Task::attempt(
            async move { repo.head().await },
            |head| match head {
                Some(reference) => Message::Ref(reference),
                None => Message::EmptyRepo,
            },
        ));
        tasks
    }

    pub fn handle_event(&mut self, event: Event) -> Message {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => Message::Mouse(mouse),
            Event::Resize(width, height) => Message::Resize { width, height },
            Event::Render => Message::None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Message {
        let keymap = &self.common.keymap;
        self.error = None;

        if keymap.force_quit.matches(&key) {
            return Message::Quit;
        }
        // While a filter is being typed every key belongs to it.
        if self.view.is_filtering() {
            return Message::Key(key);
        }
        if keymap.quit.matches(&key) {
            Message::Quit
        } else if keymap.help.matches(&key) {
            Message::ToggleFooter
        } else if keymap.back.matches(&key) && !self.view.consumes_back() {
            Message::Back
        } else {
            Message::Key(key)
        }
    }

    pub fn update(&mut self, msg: Message) -> Vec<Task> {
        match msg {
            Message::Quit | Message::Back => {
                self.should_quit = true;
                Vec::new()
            }
            Message::ToggleFooter => {
                self.show_full_help = !self.show_full_help;
                self.resize_view()
            }
            Message::Resize { width, height } => {
                self.width = width;
                self.height = height;
                self.resize_view()
            }
            Message::Error(e) => {
                self.error = Some(e.clone());
                self.view.update(&Message::Error(e))
            }
            Message::None => Vec::new(),
            msg => self.view.update(&msg),
        }
    }

    fn resize_view(&mut self) -> Vec<Task> {
        let height = self.height.saturating_sub(self.footer_height());
        self.view.update(&Message::Resize {
            width: self.width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::message::resolve_all;
    use crate::testing::{test_common, FakeRepo};
    use crate::ui::repo::ViewState;

    fn key_event(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn opened(repo: FakeRepo) -> App {
        let (common, _) = test_common();
        let mut app = App::new(common);
        app.update(Message::Resize {
            width: 80,
            height: 24,
        });
        let tasks = app.init(Arc::new(repo));
        drive(&mut app, tasks).await;
        app
    }

    /// Feed task results back until nothing is left to do. Spinner ticks are dropped.
    async fn drive(app: &mut App, mut pending: Vec<Task>) {
        for _ in 0..10 {
            if pending.is_empty() {
                break;
            }
            let msgs = resolve_all(std::mem::take(&mut pending)).await;
            for msg in msgs {
                if matches!(msg, Message::SpinnerTick(_)) {
                    continue;
                }
                pending.extend(app.update(msg));
            }
        }
    }

    async fn press(app: &mut App, code: KeyCode) -> Message {
        let msg = app.handle_event(key_event(code));
        let tasks = app.update(msg.clone());
        drive(app, tasks).await;
        msg
    }

    #[tokio::test]
    async fn init_resolves_head() {
        let app = opened(FakeRepo::new()).await;
        assert_eq!(app.view.state(), ViewState::Ready);
        assert_eq!(app.view.reference().map(|r| r.short()), Some("main"));
    }

    #[tokio::test]
    async fn empty_repo_is_ready_without_reference() {
        let app = opened(FakeRepo::empty()).await;
        assert_eq!(app.view.state(), ViewState::Ready);
        assert!(app.view.reference().is_none());
    }

    #[tokio::test]
    async fn esc_with_applied_commit_filter_stays_open() {
        let mut app = opened(FakeRepo::new()).await;
        let tasks = app.update(Message::SelectTab(2));
        drive(&mut app, tasks).await;
        assert_eq!(app.view.active_tab(), 2);

        for code in [KeyCode::Char('/'), KeyCode::Char('e'), KeyCode::Enter] {
            press(&mut app, code).await;
        }
        assert!(app.view.consumes_back());

        let msg = press(&mut app, KeyCode::Esc).await;
        assert!(matches!(msg, Message::Key(_)));
        assert!(!app.should_quit);
        // the filter is gone, so the next esc leaves
        assert!(!app.view.consumes_back());
        assert!(matches!(press(&mut app, KeyCode::Esc).await, Message::Back));
        assert!(app.should_quit);
    }

    #[test]
    fn keys_map_to_messages() {
        let (common, _) = test_common();
        let mut app = App::new(common);
        assert!(matches!(app.handle_event(key_event(KeyCode::Char('q'))), Message::Quit));
        assert!(matches!(
            app.handle_event(key_event(KeyCode::Char('?'))),
            Message::ToggleFooter
        ));
        assert!(matches!(app.handle_event(key_event(KeyCode::Esc)), Message::Back));
        assert!(matches!(
            app.handle_event(key_event(KeyCode::Char('j'))),
            Message::Key(_)
        ));
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(matches!(app.handle_event(ctrl_c), Message::Quit));
        assert!(matches!(app.handle_event(Event::Render), Message::None));
    }

    #[test]
    fn back_quits() {
        let (common, _) = test_common();
        let mut app = App::new(common);
        app.update(Message::Back);
        assert!(app.should_quit);
    }

    #[test]
    fn toggling_footer_grows_it() {
        let (common, _) = test_common();
        let mut app = App::new(common);
        assert_eq!(app.footer_height(), 1);
        app.update(Message::ToggleFooter);
        assert!(app.show_full_help);
        assert!(app.footer_height() > 1);
        app.update(Message::ToggleFooter);
        assert_eq!(app.footer_height(), 1);
    }

    #[test]
    fn error_is_shown_until_next_key() {
        let (common, _) = test_common();
        let mut app = App::new(common);
        app.update(Message::Error("boom".to_string()));
        assert_eq!(app.error.as_deref(), Some("boom"));
        app.handle_event(key_event(KeyCode::Char('j')));
        assert!(app.error.is_none());
    }

    #[tokio::test]
    async fn renders_header_tabs_and_footer() {
        let app = opened(FakeRepo::new()).await;
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| crate::ui::render(frame, &app)).unwrap();
        let text = crate::ui::buffer_text(terminal.backend().buffer()).join("\n");
        assert!(text.contains("rove"));
        assert!(text.contains("Readme"));
        assert!(text.contains("switch tab"));
    }
}
