//! Palette entries: `item:fg,bg,attr` lines from the config file.
//!
//! Colors use the names terminal UIs conventionally accept: the sixteen
//! ANSI names (`"dark blue"`, `"light gray"`, ...), `"default"`, `hN` for a
//! 256-color index and `#rgb` / `#rrggbb` for true color. The core never
//! paints anything; it only validates entries so a broken line can be
//! reported with its line number and skipped.

use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// ANSI color names, indexed by their 16-color palette number.
const ANSI_NAMES: [&str; 16] = [
    "black",
    "dark red",
    "dark green",
    "brown",
    "dark blue",
    "dark magenta",
    "dark cyan",
    "light gray",
    "dark gray",
    "light red",
    "light green",
    "yellow",
    "light blue",
    "light magenta",
    "light cyan",
    "white",
];

/// A palette color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    /// Terminal default color.
    #[default]
    Default,
    /// One of the 16 ANSI colors (0–15).
    Ansi(u8),
    /// 256-color palette index.
    Indexed(u8),
    /// 24-bit color.
    Rgb(u8, u8, u8),
}

impl Color {
    /// Parse a color name. Returns `None` for anything unrecognized.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("default") {
            return Some(Self::Default);
        }
        // Accept both "light gray" and "light grey".
        let normalized = name.to_ascii_lowercase().replace("grey", "gray");
        if let Some(idx) = ANSI_NAMES.iter().position(|n| *n == normalized) {
            return u8::try_from(idx).ok().map(Self::Ansi);
        }
        if let Some(num) = normalized.strip_prefix('h') {
            return num.parse().ok().map(Self::Indexed);
        }
        if let Some(hex) = normalized.strip_prefix('#') {
            return parse_hex(hex);
        }
        None
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Default => f.write_str("default"),
            Self::Ansi(idx) => f.write_str(ANSI_NAMES[usize::from(idx & 0x0f)]),
            Self::Indexed(idx) => write!(f, "h{idx}"),
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

/// Parse `rgb` or `rrggbb` hex digits.
fn parse_hex(hex: &str) -> Option<Color> {
    let digit = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut it = hex.chars().map(|c| c.to_digit(16));
            let r = u8::try_from(it.next()??).ok()?;
            let g = u8::try_from(it.next()??).ok()?;
            let b = u8::try_from(it.next()??).ok()?;
            Some(Color::Rgb(r * 17, g * 17, b * 17))
        }
        6 if hex.is_ascii() => Some(Color::Rgb(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// Text attribute of a palette entry. Unknown attribute words mean `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attr {
    #[default]
    None,
    Bold,
    Underline,
    Standout,
}

impl Attr {
    fn parse(word: &str) -> Self {
        match word.trim().to_ascii_lowercase().as_str() {
            "bold" => Self::Bold,
            "underline" => Self::Underline,
            "standout" => Self::Standout,
            _ => Self::None,
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Bold => "bold",
            Self::Underline => "underline",
            Self::Standout => "standout",
        })
    }
}

// ---------------------------------------------------------------------------
// PaletteEntry / Palette
// ---------------------------------------------------------------------------

/// Foreground, background and attribute for one UI element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaletteEntry {
    pub fg: Color,
    pub bg: Color,
    pub attr: Attr,
}

impl PaletteEntry {
    #[must_use]
    pub const fn new(fg: Color, bg: Color, attr: Attr) -> Self {
        Self { fg, bg, attr }
    }

    /// Parse `fg,bg[,attr]`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when a color is missing or unknown.
    pub fn parse(value: &str) -> Result<Self, String> {
        let mut parts = value.split(',');
        let fg_name = parts.next().unwrap_or_default().trim();
        let Some(bg_name) = parts.next().map(str::trim) else {
            return Err(format!("expected fg,bg[,attr], got {value:?}"));
        };
        let fg = Color::parse(fg_name).ok_or_else(|| format!("unknown color {fg_name:?}"))?;
        let bg = Color::parse(bg_name).ok_or_else(|| format!("unknown color {bg_name:?}"))?;
        let attr = parts.next().map_or(Attr::None, Attr::parse);
        Ok(Self { fg, bg, attr })
    }
}

/// `fg,bg` or `fg,bg,attr`, the form [`PaletteEntry::parse`] reads.
impl fmt::Display for PaletteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.fg, self.bg)?;
        if self.attr != Attr::None {
            write!(f, ",{}", self.attr)?;
        }
        Ok(())
    }
}

/// The UI elements a palette line may configure.
pub const PALETTE_ITEMS: [&str; 8] = [
    "header",
    "flagged focus",
    "key",
    "footer",
    "focus",
    "selected",
    "flagged",
    "browse",
];

/// Palette: UI element name → entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: BTreeMap<&'static str, PaletteEntry>,
}

impl Palette {
    /// True if `item` is one of [`PALETTE_ITEMS`].
    #[must_use]
    pub fn is_item(item: &str) -> bool {
        PALETTE_ITEMS.contains(&item)
    }

    /// Look up the entry for a UI element.
    #[must_use]
    pub fn get(&self, item: &str) -> Option<&PaletteEntry> {
        self.entries.get(item)
    }

    /// Replace the entry for a known UI element. Unknown names are ignored
    /// and return `false`.
    pub fn set(&mut self, item: &str, entry: PaletteEntry) -> bool {
        match PALETTE_ITEMS.iter().find(|name| **name == item) {
            Some(name) => {
                self.entries.insert(name, entry);
                true
            }
            None => false,
        }
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PaletteEntry)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

impl Default for Palette {
    fn default() -> Self {
        use Color::Ansi;
        let white = Ansi(15);
        let black = Ansi(0);
        let dark_gray = Ansi(8);
        let light_gray = Ansi(7);
        let dark_blue = Ansi(4);

        let entries = BTreeMap::from([
            ("header", PaletteEntry::new(white, dark_gray, Attr::Bold)),
            ("browse", PaletteEntry::new(black, light_gray, Attr::None)),
            ("footer", PaletteEntry::new(white, dark_gray, Attr::Bold)),
            ("key", PaletteEntry::new(white, dark_blue, Attr::None)),
            ("selected", PaletteEntry::new(white, dark_blue, Attr::Bold)),
            ("flagged", PaletteEntry::new(black, Ansi(2), Attr::Bold)),
            ("focus", PaletteEntry::new(light_gray, dark_blue, Attr::Standout)),
            ("flagged focus", PaletteEntry::new(Ansi(11), Ansi(6), Attr::Standout)),
        ]);
        Self { entries }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
