use std::collections::HashMap;
use std::sync::Arc;

use crossterm::event::MouseEvent;
use parking_lot::RwLock;
use ratatui::layout::Rect;

/// Named screen regions recorded during render, queried when the mouse arrives.
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    zones: Arc<RwLock<HashMap<String, Rect>>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, id: impl Into<String>, area: Rect) {
        self.zones.write().insert(id.into(), area);
    }

    pub fn get(&self, id: &str) -> Option<Rect> {
        self.zones.read().get(id).copied()
    }

    pub fn in_bounds(&self, id: &str, mouse: &MouseEvent) -> bool {
        self.get(id)
            .is_some_and(|area| contains(area, mouse.column, mouse.row))
    }

    /// Forget every zone. Called at the start of each frame.
    pub fn clear(&self) {
        self.zones.write().clear();
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && row >= area.y
        && u32::from(column) < u32::from(area.x) + u32::from(area.width)
        && u32::from(row) < u32::from(area.y) + u32::from(area.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyModifiers, MouseButton, MouseEventKind};

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn hit_inside_and_on_edges() {
        let zones = ZoneRegistry::new();
        zones.mark("main", Rect::new(2, 3, 4, 2));
        assert!(zones.in_bounds("main", &click(2, 3)));
        assert!(zones.in_bounds("main", &click(5, 4)));
        assert!(!zones.in_bounds("main", &click(6, 4)));
        assert!(!zones.in_bounds("main", &click(5, 5)));
        assert!(!zones.in_bounds("main", &click(1, 3)));
    }

    #[test]
    fn unknown_zone_never_hits() {
        let zones = ZoneRegistry::new();
        assert!(!zones.in_bounds("missing", &click(0, 0)));
    }

    #[test]
    fn clones_share_state_and_clear_forgets() {
        let zones = ZoneRegistry::new();
        let other = zones.clone();
        other.mark("a", Rect::new(0, 0, 1, 1));
        assert_eq!(zones.get("a"), Some(Rect::new(0, 0, 1, 1)));
        zones.clear();
        assert_eq!(other.get("a"), None);
    }

    #[test]
    fn remark_replaces_area() {
        let zones = ZoneRegistry::new();
        zones.mark("a", Rect::new(0, 0, 1, 1));
        zones.mark("a", Rect::new(10, 10, 1, 1));
        assert!(!zones.in_bounds("a", &click(0, 0)));
        assert!(zones.in_bounds("a", &click(10, 10)));
    }
}
