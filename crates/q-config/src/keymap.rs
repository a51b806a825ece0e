//! Keybindings: editor actions and the keys they are bound to.

use q_keys::{KeyCode, KeyEvent, Modifiers};

/// A bindable editor action. The string form is the config-file key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Open,
    Save,
    Find,
    Undo,
    DelLine,
    PrevTab,
    NextTab,
    CloseTab,
    Terminal,
    LineNum,
    Layout,
    Config,
    Exit,
    Help,
}

impl Action {
    /// Every action, in the order bindings are listed in help output.
    pub const ALL: [Self; 14] = [
        Self::Open,
        Self::Save,
        Self::Find,
        Self::Undo,
        Self::DelLine,
        Self::PrevTab,
        Self::NextTab,
        Self::CloseTab,
        Self::Terminal,
        Self::LineNum,
        Self::Layout,
        Self::Config,
        Self::Exit,
        Self::Help,
    ];

    /// Config-file name of the action.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Save => "save",
            Self::Find => "find",
            Self::Undo => "undo",
            Self::DelLine => "delline",
            Self::PrevTab => "prevtab",
            Self::NextTab => "nexttab",
            Self::CloseTab => "closetab",
            Self::Terminal => "terminal",
            Self::LineNum => "linenum",
            Self::Layout => "layout",
            Self::Config => "config",
            Self::Exit => "exit",
            Self::Help => "help",
        }
    }

    /// Look up an action by its config-file name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Key bound to the action when the config file says nothing.
    #[must_use]
    pub const fn default_key(self) -> KeyEvent {
        match self {
            Self::Open => KeyEvent::ctrl('o'),
            Self::Save => KeyEvent::ctrl('s'),
            Self::Find => KeyEvent::ctrl('f'),
            Self::Undo => KeyEvent::ctrl('q'),
            Self::DelLine => KeyEvent::ctrl('d'),
            Self::PrevTab => KeyEvent::new(KeyCode::PageUp, Modifiers::META),
            Self::NextTab => KeyEvent::new(KeyCode::PageDown, Modifiers::META),
            Self::CloseTab => KeyEvent::ctrl('w'),
            Self::Terminal => KeyEvent::ctrl('g'),
            Self::LineNum => KeyEvent::ctrl('n'),
            Self::Layout => KeyEvent::plain(KeyCode::F(1)),
            Self::Config => KeyEvent::plain(KeyCode::F(5)),
            Self::Exit => KeyEvent::ctrl('x'),
            Self::Help => KeyEvent::plain(KeyCode::Escape),
        }
    }
}

/// Action → key table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: Vec<(Action, KeyEvent)>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            bindings: Action::ALL.iter().map(|&a| (a, a.default_key())).collect(),
        }
    }
}

impl Keymap {
    /// Key currently bound to `action`.
    #[must_use]
    pub fn key_for(&self, action: Action) -> KeyEvent {
        self.bindings
            .iter()
            .find(|(a, _)| *a == action)
            .map_or_else(|| action.default_key(), |(_, k)| *k)
    }

    /// Action bound to `key`, if any. When two actions share a key the one
    /// listed first in [`Action::ALL`] wins.
    #[must_use]
    pub fn action_for(&self, key: KeyEvent) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(a, _)| *a)
    }

    /// Rebind `action` to `key`.
    pub fn bind(&mut self, action: Action, key: KeyEvent) {
        if let Some(slot) = self.bindings.iter_mut().find(|(a, _)| *a == action) {
            slot.1 = key;
        }
    }

    /// Iterate bindings in [`Action::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Action, KeyEvent)> + '_ {
        self.bindings.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::from_name(action.name()), Some(action));
        }
        assert_eq!(Action::from_name("style"), None);
    }

    #[test]
    fn defaults() {
        let km = Keymap::default();
        assert_eq!(km.key_for(Action::Save), KeyEvent::ctrl('s'));
        assert_eq!(km.key_for(Action::Undo), KeyEvent::ctrl('q'));
        assert_eq!(km.action_for(KeyEvent::ctrl('f')), Some(Action::Find));
        assert_eq!(
            km.action_for(KeyEvent::new(KeyCode::PageDown, Modifiers::META)),
            Some(Action::NextTab)
        );
        assert_eq!(km.action_for(KeyEvent::char('a')), None);
    }

    #[test]
    fn default_keys_are_distinct() {
        let km = Keymap::default();
        for action in Action::ALL {
            assert_eq!(km.action_for(km.key_for(action)), Some(action));
        }
    }

    #[test]
    fn rebind() {
        let mut km = Keymap::default();
        km.bind(Action::Save, KeyEvent::plain(KeyCode::F(2)));
        assert_eq!(km.action_for(KeyEvent::plain(KeyCode::F(2))), Some(Action::Save));
        assert_eq!(km.action_for(KeyEvent::ctrl('s')), None);
    }
}
