use ratatui::layout::Rect;
use ratatui::Frame;

use crate::message::{Message, Task};
use crate::ui::keymap::KeyBinding;
use crate::ui::spinner::SpinnerId;

/// A content view living behind one tab of the repository view.
///
/// The view only talks to panes through this trait. Payloads are routed by
/// [`Pane::tab_name`], so it must be unique among the view's panes.
pub trait Pane: Send {
    /// Tab label, also the routing key for content results.
    fn tab_name(&self) -> &str;

    fn set_size(&mut self, width: u16, height: u16);

    fn update(&mut self, msg: &Message) -> Vec<Task>;

    fn render(&self, frame: &mut Frame, area: Rect);

    fn short_help(&self) -> Vec<KeyBinding>;

    fn full_help(&self) -> Vec<Vec<KeyBinding>>;

    fn status_bar_value(&self) -> String;

    fn status_bar_info(&self) -> String;

    /// Identity of the spinner this pane is running, `None` when not loading.
    fn spinner_id(&self) -> Option<SpinnerId> {
        None
    }

    /// Whether the pane handles `esc` itself in its current state.
    fn consumes_back(&self) -> bool {
        false
    }

    /// Whether the pane is capturing text input.
    fn is_filtering(&self) -> bool {
        false
    }
}
