//! # q-keys: key events for quire
//!
//! Front ends decode raw terminal input into [`KeyEvent`]s and hand them to
//! the editor core. The same type is what keybindings in the config file
//! resolve to, so this crate also owns the textual key-name grammar:
//!
//! | Name              | Event                              |
//! |-------------------|------------------------------------|
//! | `a`, `Z`, `%`     | `Char(c)`                          |
//! | `space`           | `Char(' ')`                        |
//! | `enter`, `tab`    | `Enter`, `Tab`                     |
//! | `esc`             | `Escape`                           |
//! | `page up`         | `PageUp`                           |
//! | `f5`              | `F(5)`                             |
//! | `ctrl s`          | `Char('s')` + `CTRL`               |
//! | `meta page down`  | `PageDown` + `META`                |
//!
//! Modifier words come first and may be stacked (`ctrl shift up`). Names are
//! case-insensitive except for single printable characters.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

// ─── Event Types ────────────────────────────────────────────────────────────

/// A keyboard event: key identity plus active modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Which key was pressed.
    pub code: KeyCode,
    /// Active modifier keys (Shift, Alt, Ctrl, etc.).
    pub modifiers: Modifiers,
}

/// Identity of a key.
///
/// Named keys have dedicated variants; printable characters use
/// [`Char`](KeyCode::Char). Function keys F1–F35 use [`F`](KeyCode::F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A Unicode character (printable).
    Char(char),
    // ── Named keys ──────────────────────────────────────────────
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Insert,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    // ── Function keys ───────────────────────────────────────────
    /// F1 through F35.
    F(u8),
}

bitflags! {
    /// Keyboard modifier flags.
    ///
    /// Same bit layout as the Kitty keyboard protocol so a terminal decoder
    /// can copy the reported mask straight in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
        const SUPER = 0b0000_1000;
        const META  = 0b0010_0000;
    }
}

/// Error from parsing a key name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("empty key name")]
    Empty,
    #[error("unknown key name: {0:?}")]
    Unknown(String),
}

// ─── Construction ───────────────────────────────────────────────────────────

impl KeyEvent {
    /// A key event with explicit modifiers.
    #[inline]
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// A key event with no modifiers.
    #[inline]
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }

    /// An unmodified printable character.
    #[inline]
    #[must_use]
    pub const fn char(ch: char) -> Self {
        Self::plain(KeyCode::Char(ch))
    }

    /// Ctrl + character.
    #[inline]
    #[must_use]
    pub const fn ctrl(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), Modifiers::CTRL)
    }

    /// True when this event types a character into the document: a `Char`
    /// with no modifier other than Shift, and not a control character.
    #[must_use]
    pub fn printable(self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch)
                if !ch.is_control()
                    && (self.modifiers - Modifiers::SHIFT).is_empty() =>
            {
                Some(ch)
            }
            _ => None,
        }
    }

    /// True when Ctrl or Meta/Alt is held, the modifiers that turn arrow
    /// keys and backspace into word-wise operations.
    #[inline]
    #[must_use]
    pub const fn is_word_modified(self) -> bool {
        self.modifiers
            .intersects(Modifiers::CTRL.union(Modifiers::META).union(Modifiers::ALT))
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::plain(code)
    }
}

// ─── Key names ──────────────────────────────────────────────────────────────

/// Modifier words, in the order they are printed.
const MODIFIER_WORDS: [(&str, Modifiers); 5] = [
    ("ctrl", Modifiers::CTRL),
    ("meta", Modifiers::META),
    ("alt", Modifiers::ALT),
    ("super", Modifiers::SUPER),
    ("shift", Modifiers::SHIFT),
];

impl KeyCode {
    /// Parse the key part of a name (without modifiers).
    fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Some(Self::Char(ch));
        }

        let lower = name.to_ascii_lowercase();
        let code = match lower.as_str() {
            "space" => Self::Char(' '),
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "backspace" => Self::Backspace,
            "esc" | "escape" => Self::Escape,
            "delete" | "del" => Self::Delete,
            "insert" => Self::Insert,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "home" => Self::Home,
            "end" => Self::End,
            "page up" | "pageup" => Self::PageUp,
            "page down" | "pagedown" => Self::PageDown,
            other => {
                let n: u8 = other.strip_prefix('f')?.parse().ok()?;
                if (1..=35).contains(&n) {
                    Self::F(n)
                } else {
                    return None;
                }
            }
        };
        Some(code)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(' ') => f.write_str("space"),
            Self::Char(ch) => write!(f, "{ch}"),
            Self::Enter => f.write_str("enter"),
            Self::Tab => f.write_str("tab"),
            Self::Backspace => f.write_str("backspace"),
            Self::Escape => f.write_str("esc"),
            Self::Delete => f.write_str("delete"),
            Self::Insert => f.write_str("insert"),
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
            Self::Home => f.write_str("home"),
            Self::End => f.write_str("end"),
            Self::PageUp => f.write_str("page up"),
            Self::PageDown => f.write_str("page down"),
            Self::F(n) => write!(f, "f{n}"),
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (word, flag) in MODIFIER_WORDS {
            if self.modifiers.contains(flag) {
                write!(f, "{word} ")?;
            }
        }
        write!(f, "{}", self.code)
    }
}

impl FromStr for KeyEvent {
    type Err = KeyParseError;

    /// Parse a key name such as `"ctrl s"` or `"meta page up"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A lone space is the space key, not an empty name.
        if s == " " {
            return Ok(Self::char(' '));
        }
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut modifiers = Modifiers::empty();
        let mut rest = trimmed;
        loop {
            let Some((word, tail)) = rest.split_once(' ') else {
                break;
            };
            let Some(flag) = MODIFIER_WORDS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(word))
                .map(|(_, flag)| *flag)
            else {
                break;
            };
            modifiers |= flag;
            rest = tail.trim_start();
        }

        let code =
            KeyCode::from_name(rest).ok_or_else(|| KeyParseError::Unknown(trimmed.to_string()))?;
        Ok(Self::new(code, modifiers))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
