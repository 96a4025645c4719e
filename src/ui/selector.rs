use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use parking_lot::RwLock;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::message::{Message, Task};
use crate::ui::keymap::KeyMap;
use crate::ui::Common;

/// Anything with a stable identity string.
pub trait Identifiable: Send + Sync + fmt::Debug + 'static {
    fn id(&self) -> String;

    /// Text matched by the filter.
    fn filter_value(&self) -> String {
        self.id()
    }

    fn as_any(&self) -> &dyn Any;
}

/// Item carried by selection messages.
pub type ItemRef = Arc<dyn Identifiable>;

pub trait Item: Identifiable {
    fn render(&self, active: bool, width: usize) -> Line<'static>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterState {
    #[default]
    Unfiltered,
    Filtering,
    FilterApplied,
}

/// Everything guarded by the list's lock. `cursor` indexes `visible`.
#[derive(Debug)]
struct ListState<T> {
    items: Vec<Arc<T>>,
    filter: String,
    filter_state: FilterState,
    visible: Vec<usize>,
    cursor: usize,
    per_page: usize,
}

impl<T: Item> ListState<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            filter: String::new(),
            filter_state: FilterState::Unfiltered,
            visible: Vec::new(),
            cursor: 0,
            per_page: 1,
        }
    }

    fn last(&self) -> usize {
        self.visible.len().saturating_sub(1)
    }

    fn refilter(&mut self) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                needle.is_empty() || item.filter_value().to_lowercase().contains(&needle)
            })
            .map(|(i, _)| i)
            .collect();
        self.cursor = self.cursor.min(self.last());
    }

    fn set_filter(&mut self, filter: String) {
        if filter != self.filter {
            self.filter = filter;
            self.cursor = 0;
        }
        self.refilter();
    }

    fn item_at(&self, pos: usize) -> Option<&Arc<T>> {
        self.visible.get(pos).map(|&i| &self.items[i])
    }

    fn selected(&self) -> Option<&Arc<T>> {
        self.item_at(self.cursor)
    }

    fn page(&self) -> usize {
        self.cursor / self.per_page.max(1)
    }

    fn total_pages(&self) -> usize {
        self.visible.len().div_ceil(self.per_page.max(1)).max(1)
    }

    fn handle_key(&mut self, key: &KeyEvent, keymap: &KeyMap) {
        if self.filter_state == FilterState::Filtering {
            self.handle_filter_key(key, keymap);
            return;
        }

        if keymap.up.matches(key) {
            self.cursor = self.cursor.saturating_sub(1);
        } else if keymap.down.matches(key) {
            self.cursor = (self.cursor + 1).min(self.last());
        } else if keymap.page_up.matches(key) {
            self.cursor = self.cursor.saturating_sub(self.per_page);
        } else if keymap.page_down.matches(key) {
            self.cursor = (self.cursor + self.per_page).min(self.last());
        } else if keymap.home.matches(key) {
            self.cursor = 0;
        } else if keymap.end.matches(key) {
            self.cursor = self.last();
        } else if keymap.filter.matches(key) {
            self.filter_state = FilterState::Filtering;
            self.set_filter(String::new());
        } else if keymap.back.matches(key) && self.filter_state == FilterState::FilterApplied {
            self.filter_state = FilterState::Unfiltered;
            self.set_filter(String::new());
        }
    }

    fn handle_filter_key(&mut self, key: &KeyEvent, keymap: &KeyMap) {
        if keymap.back.matches(key) {
            self.filter_state = FilterState::Unfiltered;
            self.set_filter(String::new());
            return;
        }
        if keymap.select.matches(key) {
            self.filter_state = if self.filter.is_empty() {
                FilterState::Unfiltered
            } else {
                FilterState::FilterApplied
            };
            return;
        }

        match key.code {
            KeyCode::Backspace => {
                let mut filter = self.filter.clone();
                filter.pop();
                self.set_filter(filter);
            }
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => self.cursor = (self.cursor + 1).min(self.last()),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let mut filter = self.filter.clone();
                filter.push(c);
                self.set_filter(filter);
            }
            _ => {}
        }
    }
}

fn item_ref<T: Item>(item: &Arc<T>) -> ItemRef {
    item.clone()
}

/// Paged, filterable list of identified items.
///
/// The state lives behind a lock shared with the tasks the list hands out, so a
/// task reads the selection as it is when the task completes, never a torn copy.
pub struct SelectableList<T> {
    common: Common,
    state: Arc<RwLock<ListState<T>>>,
    zone_prefix: String,
}

impl<T: Item> SelectableList<T> {
    /// Item zones are named `<zone_prefix><item id>`.
    pub fn new(common: Common, zone_prefix: impl Into<String>) -> Self {
        Self {
            common,
            state: Arc::new(RwLock::new(ListState::new())),
            zone_prefix: zone_prefix.into(),
        }
    }

    /// Replace the items. Returns a task only when an active filter had to be
    /// re-evaluated against the new items.
    pub fn set_items(&self, items: Vec<T>) -> Option<Task> {
        let filtered = {
            let mut state = self.state.write();
            state.items = items.into_iter().map(Arc::new).collect();
            state.refilter();
            state.filter_state != FilterState::Unfiltered
        };
        filtered.then(|| self.active_filter_task())
    }

    pub fn select(&self, index: usize) {
        let mut state = self.state.write();
        state.cursor = index.min(state.last());
    }

    pub fn cursor_up(&self) {
        let mut state = self.state.write();
        state.cursor = state.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&self) {
        let mut state = self.state.write();
        state.cursor = (state.cursor + 1).min(state.last());
    }

    pub fn set_size(&self, _width: u16, height: u16) {
        // one row is kept for the filter/pagination line
        self.state.write().per_page = (height as usize).saturating_sub(1).max(1);
    }

    pub fn index(&self) -> usize {
        self.state.read().cursor
    }

    /// Current index and visible length, read together.
    pub fn position(&self) -> (usize, usize) {
        let state = self.state.read();
        (state.cursor, state.visible.len())
    }

    pub fn page(&self) -> usize {
        self.state.read().page()
    }

    pub fn set_page(&self, page: usize) {
        let mut state = self.state.write();
        state.cursor = (page * state.per_page).min(state.last());
    }

    pub fn total_pages(&self) -> usize {
        self.state.read().total_pages()
    }

    pub fn per_page(&self) -> usize {
        self.state.read().per_page
    }

    pub fn filter_state(&self) -> FilterState {
        self.state.read().filter_state
    }

    pub fn is_filtering(&self) -> bool {
        self.filter_state() == FilterState::Filtering
    }

    pub fn items(&self) -> Vec<Arc<T>> {
        self.state.read().items.clone()
    }

    pub fn visible_items(&self) -> Vec<Arc<T>> {
        let state = self.state.read();
        state.visible.iter().map(|&i| state.items[i].clone()).collect()
    }

    pub fn selected_item(&self) -> Option<Arc<T>> {
        self.state.read().selected().cloned()
    }

    /// Confirms the current selection.
    pub fn select_task(&self) -> Task {
        let state = self.state.clone();
        Task::new(async move { Message::ItemSelected(state.read().selected().map(item_ref)) })
    }

    /// Announces the current selection.
    pub fn active_task(&self) -> Task {
        let state = self.state.clone();
        Task::new(async move { Message::ItemActive(state.read().selected().map(item_ref)) })
    }

    /// Announces the first item left visible by the filter.
    pub fn active_filter_task(&self) -> Task {
        let state = self.state.clone();
        Task::new(async move { Message::ItemActive(state.read().item_at(0).map(item_ref)) })
    }

    pub fn init(&self) -> Vec<Task> {
        vec![self.active_task()]
    }

    fn item_zone(&self, item: &T) -> String {
        format!("{}{}", self.zone_prefix, item.id())
    }

    fn hit(&self, mouse: &MouseEvent) -> Option<usize> {
        let state = self.state.read();
        state.visible.iter().position(|&i| {
            self.common
                .zones
                .in_bounds(&self.item_zone(&state.items[i]), mouse)
        })
    }

    pub fn update(&mut self, msg: &Message) -> Vec<Task> {
        let mut tasks = Vec::new();
        let (index_before, filter_before) = {
            let state = self.state.read();
            (state.cursor, state.filter_state)
        };

        match msg {
            Message::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => self.cursor_up(),
                MouseEventKind::ScrollDown => self.cursor_down(),
                MouseEventKind::Down(MouseButton::Left) => {
                    if let Some(hit) = self.hit(mouse) {
                        if hit == index_before {
                            tasks.push(self.select_task());
                        } else {
                            self.select(hit);
                        }
                    }
                }
                _ => {}
            },
            Message::Key(key) => {
                if self.common.keymap.select.matches(key)
                    && filter_before != FilterState::Filtering
                {
                    tasks.push(self.select_task());
                }
                self.state.write().handle_key(key, &self.common.keymap);
            }
            _ => {}
        }

        let (index_after, filter_after) = {
            let state = self.state.read();
            (state.cursor, state.filter_state)
        };
        // A filter change already announces the new active item.
        if filter_after != filter_before {
            tasks.push(self.active_filter_task());
        } else if index_after != index_before {
            tasks.push(self.active_task());
        }
        tasks
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if area.height == 0 {
            return;
        }
        let state = self.state.read();
        let rows = area.height.saturating_sub(1);

        if state.visible.is_empty() {
            if rows > 0 {
                frame.render_widget(
                    Paragraph::new("No items.").style(Style::default().fg(Color::DarkGray)),
                    Rect::new(area.x, area.y, area.width, 1),
                );
            }
        } else {
            let per_page = state.per_page.max(1);
            let start = state.page() * per_page;
            let end = (start + per_page.min(rows as usize)).min(state.visible.len());
            for (row, pos) in (start..end).enumerate() {
                let item = &state.items[state.visible[pos]];
                let rect = Rect::new(area.x, area.y + row as u16, area.width, 1);
                frame.render_widget(
                    Paragraph::new(item.render(pos == state.cursor, area.width as usize)),
                    rect,
                );
                self.common.zones.mark(self.item_zone(item), rect);
            }
        }

        let dim = Style::default().fg(Color::DarkGray);
        let status = match state.filter_state {
            FilterState::Filtering => Line::from(vec![
                Span::styled("/ ", Style::default().fg(Color::Yellow)),
                Span::raw(state.filter.clone()),
                Span::styled("▏", dim),
            ]),
            FilterState::FilterApplied => Line::from(Span::styled(
                format!(
                    "filter: {}  {}/{}",
                    state.filter,
                    state.visible.len(),
                    state.items.len()
                ),
                dim,
            )),
            FilterState::Unfiltered if !state.visible.is_empty() => Line::from(Span::styled(
                format!("page {}/{}", state.page() + 1, state.total_pages()),
                dim,
            )),
            FilterState::Unfiltered => Line::default(),
        };
        frame.render_widget(
            Paragraph::new(status),
            Rect::new(area.x, area.y + area.height - 1, area.width, 1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::message::resolve_all;
    use crate::testing::{click, key, test_common};

    #[derive(Debug)]
    struct Name(String);

    impl Identifiable for Name {
        fn id(&self) -> String {
            self.0.clone()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl Item for Name {
        fn render(&self, active: bool, _width: usize) -> Line<'static> {
            let marker = if active { "> " } else { "  " };
            Line::from(format!("{}{}", marker, self.0))
        }
    }

    fn names(names: &[&str]) -> Vec<Name> {
        names.iter().map(|n| Name(n.to_string())).collect()
    }

    fn list(items: &[&str]) -> SelectableList<Name> {
        let (common, _) = test_common();
        let list = SelectableList::new(common, "test-");
        list.set_items(names(items));
        list
    }

    fn payload_id(msg: &Message) -> Option<String> {
        match msg {
            Message::ItemActive(item) | Message::ItemSelected(item) => {
                item.as_ref().map(|i| i.id())
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn select_then_index_round_trips() {
        let list = list(&["a", "b", "c", "d"]);
        for i in 0..4 {
            list.select(i);
            assert_eq!(list.index(), i);
        }
    }

    #[test]
    fn select_clamps_to_last_item() {
        let list = list(&["a", "b", "c"]);
        list.select(99);
        assert_eq!(list.index(), 2);
    }

    #[test]
    fn cursor_saturates_at_both_ends() {
        let list = list(&["a", "b"]);
        list.cursor_up();
        assert_eq!(list.index(), 0);
        list.cursor_down();
        list.cursor_down();
        assert_eq!(list.index(), 1);
    }

    #[test]
    fn shrinking_items_clamps_cursor() {
        let list = list(&["a", "b", "c", "d"]);
        list.select(3);
        assert!(list.set_items(names(&["x", "y"])).is_none());
        assert_eq!(list.index(), 1);
        assert_eq!(list.selected_item().unwrap().id(), "y");
    }

    #[tokio::test]
    async fn index_change_yields_one_active_task() {
        let mut list = list(&["a", "b", "c"]);
        let tasks = list.update(&key(KeyCode::Down));
        assert_eq!(list.index(), 1);
        let msgs = resolve_all(tasks).await;
        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], Message::ItemActive(_)));
        assert_eq!(payload_id(&msgs[0]).as_deref(), Some("b"));
    }

    #[test]
    fn no_change_yields_no_task() {
        let mut list = list(&["a", "b"]);
        assert!(list.update(&key(KeyCode::Up)).is_empty());
        assert!(list.update(&Message::UpdateStatusBar).is_empty());
        assert!(list.update(&key(KeyCode::Char('x'))).is_empty());
    }

    #[tokio::test]
    async fn enter_confirms_selection() {
        let mut list = list(&["a", "b"]);
        list.select(1);
        let msgs = resolve_all(list.update(&key(KeyCode::Enter))).await;
        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], Message::ItemSelected(_)));
        assert_eq!(payload_id(&msgs[0]).as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn empty_list_confirms_with_empty_payload() {
        let mut list = list(&[]);
        let msgs = resolve_all(list.update(&key(KeyCode::Enter))).await;
        assert_eq!(msgs.len(), 1);
        assert_eq!(payload_id(&msgs[0]), None);
        assert!(list.selected_item().is_none());
    }

    #[tokio::test]
    async fn filter_lifecycle() {
        let mut list = list(&["alpha", "beta", "gamma", "bet"]);

        let tasks = list.update(&key(KeyCode::Char('/')));
        assert_eq!(list.filter_state(), FilterState::Filtering);
        assert_eq!(tasks.len(), 1);

        for c in "BET".chars() {
            assert!(list.update(&key(KeyCode::Char(c))).is_empty());
        }
        let visible: Vec<String> = list.visible_items().iter().map(|i| i.id()).collect();
        assert_eq!(visible, vec!["beta", "bet"]);

        // enter applies the filter instead of confirming
        let msgs = resolve_all(list.update(&key(KeyCode::Enter))).await;
        assert_eq!(list.filter_state(), FilterState::FilterApplied);
        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], Message::ItemActive(_)));
        assert_eq!(payload_id(&msgs[0]).as_deref(), Some("beta"));

        let msgs = resolve_all(list.update(&key(KeyCode::Esc))).await;
        assert_eq!(list.filter_state(), FilterState::Unfiltered);
        assert_eq!(list.visible_items().len(), 4);
        assert_eq!(payload_id(&msgs[0]).as_deref(), Some("alpha"));
    }

    #[test]
    fn empty_filter_does_not_apply() {
        let mut list = list(&["a", "b"]);
        list.update(&key(KeyCode::Char('/')));
        list.update(&key(KeyCode::Enter));
        assert_eq!(list.filter_state(), FilterState::Unfiltered);
    }

    #[test]
    fn set_items_refilters_when_filter_active() {
        let mut list = list(&["alpha", "beta"]);
        list.update(&key(KeyCode::Char('/')));
        list.update(&key(KeyCode::Char('a')));
        list.update(&key(KeyCode::Char('l')));
        assert!(list.set_items(names(&["alps", "bravo", "salt"])).is_some());
        let visible: Vec<String> = list.visible_items().iter().map(|i| i.id()).collect();
        assert_eq!(visible, vec!["alps", "salt"]);
        assert_eq!(list.items().len(), 3);
    }

    #[test]
    fn pagination_follows_per_page() {
        let list = list(&["a", "b", "c", "d", "e"]);
        list.set_size(20, 3);
        assert_eq!(list.per_page(), 2);
        assert_eq!(list.total_pages(), 3);
        list.select(3);
        assert_eq!(list.page(), 1);
        list.set_page(2);
        assert_eq!(list.index(), 4);
    }

    #[test]
    fn wheel_moves_selection() {
        let mut list = list(&["a", "b", "c"]);
        list.update(&Message::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        }));
        assert_eq!(list.index(), 1);
    }

    #[tokio::test]
    async fn click_moves_then_confirms() {
        let mut list = list(&["a", "b", "c"]);
        list.set_size(20, 4);
        let mut terminal = Terminal::new(TestBackend::new(20, 4)).unwrap();
        terminal.draw(|f| list.render(f, f.area())).unwrap();

        let zone = list.common.zones.get("test-b").unwrap();
        let first = resolve_all(list.update(&click(zone.x, zone.y))).await;
        assert_eq!(list.index(), 1);
        assert_eq!(first.len(), 1);
        assert!(matches!(first[0], Message::ItemActive(_)));

        let second = resolve_all(list.update(&click(zone.x, zone.y))).await;
        assert_eq!(second.len(), 1);
        assert!(matches!(second[0], Message::ItemSelected(_)));
        assert_eq!(payload_id(&second[0]).as_deref(), Some("b"));
    }

    #[test]
    fn renders_empty_placeholder() {
        let list = list(&[]);
        let mut terminal = Terminal::new(TestBackend::new(20, 3)).unwrap();
        terminal.draw(|f| list.render(f, f.area())).unwrap();
        let text = crate::ui::buffer_text(terminal.backend().buffer()).join("\n");
        assert!(text.contains("No items."));
    }

    #[test]
    fn concurrent_readers_never_see_a_torn_selection() {
        let list = list(&["a", "b", "c"]);
        let short: Vec<String> = (0..3).map(|i| format!("s{}", i)).collect();
        let long: Vec<String> = (0..40).map(|i| format!("l{}", i)).collect();

        std::thread::scope(|s| {
            s.spawn(|| {
                for round in 0..500 {
                    let source = if round % 2 == 0 { &short } else { &long };
                    list.set_items(source.iter().map(|n| Name(n.clone())).collect());
                    list.select(source.len() - 1);
                }
            });
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..500 {
                        let (index, len) = list.position();
                        assert!(index < len);
                        assert!(list.selected_item().is_some());
                    }
                });
            }
        });
    }
}
