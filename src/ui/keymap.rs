use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A set of keys that trigger the same action, plus the text shown in help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    keys: Vec<(KeyCode, KeyModifiers)>,
    help_key: String,
    help_desc: String,
}

impl KeyBinding {
    pub fn new(codes: impl IntoIterator<Item = KeyCode>, key: &str, desc: &str) -> Self {
        Self {
            keys: codes
                .into_iter()
                .map(|code| (code, KeyModifiers::NONE))
                .collect(),
            help_key: key.to_string(),
            help_desc: desc.to_string(),
        }
    }

    /// Binding for `ctrl+<c>`.
    pub fn ctrl(c: char, key: &str, desc: &str) -> Self {
        Self {
            keys: vec![(KeyCode::Char(c), KeyModifiers::CONTROL)],
            help_key: key.to_string(),
            help_desc: desc.to_string(),
        }
    }

    pub fn with_help(mut self, key: &str, desc: &str) -> Self {
        self.help_key = key.to_string();
        self.help_desc = desc.to_string();
        self
    }

    pub fn help_key(&self) -> &str {
        &self.help_key
    }

    pub fn help_desc(&self) -> &str {
        &self.help_desc
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        // Terminals report shifted characters with SHIFT set; the char already says it.
        let modifiers = match event.code {
            KeyCode::Char(_) | KeyCode::BackTab => event.modifiers.difference(KeyModifiers::SHIFT),
            _ => event.modifiers,
        };
        self.keys
            .iter()
            .any(|(code, mods)| *code == event.code && *mods == modifiers)
    }
}

#[derive(Debug, Clone)]
pub struct KeyMap {
    pub back: KeyBinding,
    pub section: KeyBinding,
    pub prev_section: KeyBinding,
    pub select: KeyBinding,
    pub up: KeyBinding,
    pub down: KeyBinding,
    pub page_up: KeyBinding,
    pub page_down: KeyBinding,
    pub home: KeyBinding,
    pub end: KeyBinding,
    pub parent: KeyBinding,
    pub filter: KeyBinding,
    pub help: KeyBinding,
    pub quit: KeyBinding,
    pub force_quit: KeyBinding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            back: KeyBinding::new([KeyCode::Esc], "esc", "back"),
            section: KeyBinding::new([KeyCode::Tab], "tab", "switch tab"),
            prev_section: KeyBinding::new([KeyCode::BackTab], "shift+tab", "previous tab"),
            select: KeyBinding::new([KeyCode::Enter], "enter", "select"),
            up: KeyBinding::new([KeyCode::Up, KeyCode::Char('k')], "↑/k", "up"),
            down: KeyBinding::new([KeyCode::Down, KeyCode::Char('j')], "↓/j", "down"),
            page_up: KeyBinding::new([KeyCode::PageUp, KeyCode::Char('b')], "pgup/b", "page up"),
            page_down: KeyBinding::new(
                [KeyCode::PageDown, KeyCode::Char('f')],
                "pgdn/f",
                "page down",
            ),
            home: KeyBinding::new([KeyCode::Home, KeyCode::Char('g')], "g/home", "go to start"),
            end: KeyBinding::new([KeyCode::End, KeyCode::Char('G')], "G/end", "go to end"),
            parent: KeyBinding::new(
                [KeyCode::Left, KeyCode::Char('h'), KeyCode::Backspace],
                "←/h",
                "go back",
            ),
            filter: KeyBinding::new([KeyCode::Char('/')], "/", "filter"),
            help: KeyBinding::new([KeyCode::Char('?')], "?", "toggle help"),
            quit: KeyBinding::new([KeyCode::Char('q')], "q", "quit"),
            force_quit: KeyBinding::ctrl('c', "ctrl+c", "quit"),
        }
    }
}
