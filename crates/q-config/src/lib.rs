//! # q-config: the quire configuration file
//!
//! A config file is a list of `key:value` lines:
//!
//! ```text
//! # keybindings
//! save:ctrl s
//! nexttab:meta page down
//!
//! # palette: item:fg,bg,attr
//! header:white,dark gray,bold
//! flagged focus:yellow,dark cyan,standout
//!
//! style:monokai
//! tabsize:4
//! ```
//!
//! Blank lines and `#` comments are skipped. Unknown keys are ignored.
//! A malformed value does not abort parsing: it produces a [`Diagnostic`]
//! carrying the 1-based line number and the previous value is kept.
//!
//! [`Config`] is a plain struct. The editor owns one and re-applies it when
//! the config file is saved; there is no global configuration state.

pub mod keymap;
pub mod palette;

use std::fmt;
use std::path::{Path, PathBuf};

use q_keys::KeyEvent;
use tracing::{debug, warn};

pub use keymap::{Action, Keymap};
pub use palette::{Attr, Color, Palette, PaletteEntry};

/// Tab width used when the config file does not set one.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Largest accepted `tabsize`.
pub const MAX_TAB_WIDTH: usize = 16;

/// Style name used when the config file does not set one.
pub const DEFAULT_STYLE: &str = "monokai";

// ---------------------------------------------------------------------------
// Errors and diagnostics
// ---------------------------------------------------------------------------

/// Error loading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A problem with one line of the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error on line {}: {}", self.line, self.message)
    }
}

/// Result of parsing: the config plus any line diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub config: Config,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub keymap: Keymap,
    pub palette: Palette,
    /// Highlight style name. Passed through to the front end.
    pub style: String,
    /// Columns per tab stop.
    pub tab_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keymap: Keymap::default(),
            palette: Palette::default(),
            style: DEFAULT_STYLE.to_string(),
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

impl Config {
    /// Parse config text on top of the defaults.
    #[must_use]
    pub fn parse(text: &str) -> Parsed {
        let mut config = Self::default();
        let mut diagnostics = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(message) = config.apply_line(line) {
                diagnostics.push(Diagnostic { line: idx + 1, message });
            }
        }

        for diag in &diagnostics {
            warn!("config {diag}");
        }
        Parsed { config, diagnostics }
    }

    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read. Malformed
    /// lines are not errors; they are reported in [`Parsed::diagnostics`].
    pub fn load(path: &Path) -> Result<Parsed, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading config");
        Ok(Self::parse(&text))
    }

    /// Config file text that parses back to `self`: every palette item,
    /// every binding, then style and tab size.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("# quire configuration\n");
        for (item, entry) in self.palette.iter() {
            out.push_str(&format!("{item}:{entry}\n"));
        }
        for (action, key) in self.keymap.iter() {
            out.push_str(&format!("{}:{key}\n", action.name()));
        }
        out.push_str(&format!("style:{}\n", self.style));
        out.push_str(&format!("tabsize:{}\n", self.tab_width));
        out
    }

    /// Apply one non-blank, non-comment line.
    fn apply_line(&mut self, line: &str) -> Result<(), String> {
        let Some((key, value)) = line.split_once(':') else {
            return Err(format!("expected key:value, got {line:?}"));
        };
        let key = key.trim();
        let value = value.trim();

        if Palette::is_item(key) {
            let entry = PaletteEntry::parse(value)?;
            self.palette.set(key, entry);
            return Ok(());
        }
        if let Some(action) = Action::from_name(key) {
            let event: KeyEvent = value
                .parse()
                .map_err(|e| format!("{key}: {e}"))?;
            self.keymap.bind(action, event);
            return Ok(());
        }
        match key {
            "style" => {
                if value.is_empty() {
                    return Err("style: empty value".to_string());
                }
                self.style = value.to_string();
            }
            "tabsize" => {
                self.tab_width = parse_tab_width(value)?;
            }
            _ => debug!(key, "ignoring unknown config key"),
        }
        Ok(())
    }
}

fn parse_tab_width(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if (1..=MAX_TAB_WIDTH).contains(&n) => Ok(n),
        _ => Err(format!("tabsize: expected 1..={MAX_TAB_WIDTH}, got {value:?}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use q_keys::{KeyCode, Modifiers};

    // ── Defaults ─────────────────────────────────────────────────────────

    #[test]
    fn empty_text_gives_defaults() {
        let parsed = Config::parse("");
        assert_eq!(parsed.config, Config::default());
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn comments_and_blanks_skipped() {
        let parsed = Config::parse("# a comment\n\n   \n#save:ctrl z\n");
        assert_eq!(parsed.config, Config::default());
        assert!(parsed.diagnostics.is_empty());
    }

    // ── Keybindings ──────────────────────────────────────────────────────

    #[test]
    fn rebinds_actions() {
        let parsed = Config::parse("save:f2\nprevtab: meta page up\nfind:ctrl shift f");
        let km = &parsed.config.keymap;
        assert_eq!(km.key_for(Action::Save), KeyEvent::plain(KeyCode::F(2)));
        assert_eq!(
            km.key_for(Action::Find),
            KeyEvent::new(KeyCode::Char('f'), Modifiers::CTRL | Modifiers::SHIFT)
        );
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn bad_key_keeps_previous_binding() {
        let parsed = Config::parse("save:f2\nsave:ctrl banana");
        assert_eq!(parsed.config.keymap.key_for(Action::Save), KeyEvent::plain(KeyCode::F(2)));
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].line, 2);
    }

    // ── Palette ──────────────────────────────────────────────────────────

    #[test]
    fn palette_lines() {
        let parsed = Config::parse("flagged focus:h33,default,underline\n");
        assert_eq!(
            parsed.config.palette.get("flagged focus"),
            Some(&PaletteEntry::new(Color::Indexed(33), Color::Default, Attr::Underline))
        );
    }

    #[test]
    fn bad_palette_line_reports_line_number() {
        let text = "# palette\nheader:white,dark gray,bold\nfooter:white,plaid,bold\n";
        let parsed = Config::parse(text);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].line, 3);
        assert_eq!(
            parsed.config.palette.get("footer"),
            Palette::default().get("footer")
        );
        assert!(parsed.diagnostics[0].to_string().starts_with("error on line 3"));
    }

    // ── Scalars ──────────────────────────────────────────────────────────

    #[test]
    fn style_and_tabsize() {
        let parsed = Config::parse("style: solarized\ntabsize:8");
        assert_eq!(parsed.config.style, "solarized");
        assert_eq!(parsed.config.tab_width, 8);
    }

    #[test]
    fn tabsize_out_of_range() {
        let parsed = Config::parse("tabsize:0\ntabsize:99\ntabsize:two");
        assert_eq!(parsed.config.tab_width, DEFAULT_TAB_WIDTH);
        assert_eq!(parsed.diagnostics.len(), 3);
    }

    // ── Malformed / unknown ──────────────────────────────────────────────

    #[test]
    fn unknown_key_is_ignored() {
        let parsed = Config::parse("wordwrap:yes");
        assert_eq!(parsed.config, Config::default());
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn missing_colon_is_diagnosed() {
        let parsed = Config::parse("save ctrl s");
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].line, 1);
    }

    // ── render ───────────────────────────────────────────────────────────

    #[test]
    fn rendered_default_parses_cleanly() {
        let parsed = Config::parse(&Config::default().render());
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        assert_eq!(parsed.config, Config::default());
    }

    #[test]
    fn rendered_custom_config_keeps_changes() {
        let custom = Config::parse("tabsize:8\nsave:ctrl e\nheader:h200,#102030,bold\n").config;
        let text = custom.render();
        assert!(text.contains("save:ctrl e\n"));
        assert!(text.contains("header:h200,#102030,bold\n"));
        assert_eq!(Config::parse(&text).config, custom);
    }

    // ── load ─────────────────────────────────────────────────────────────

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        std::fs::write(&path, "tabsize:2\n").unwrap();
        let parsed = Config::load(&path).unwrap();
        assert_eq!(parsed.config.tab_width, 2);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
