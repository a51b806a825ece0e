//! Document buffer: the lines of one open file.
//!
//! A `Document` owns a `Vec<Line>` plus the index of the focused line. The
//! cursor column lives on each [`Line`], so moving between lines keeps each
//! line's own column until it is clamped on arrival.
//!
//! # Design choices
//!
//! - **Never empty.** Every constructor produces at least one line, and
//!   [`Document::delete_line`] clears the last remaining line instead of
//!   removing it. The focus index is always a valid index.
//!
//! - **Edits report what they did.** Each edit returns the removed char, the
//!   join point or the removed line, or `None` when it was a structural
//!   no-op. The caller turns that into an undo record; the document itself
//!   knows nothing about history.
//!
//! - **Lossy save.** Files are written as trailing-whitespace-stripped lines,
//!   each followed by `\n`. The original line-ending style is not kept.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::line::Line;
use crate::position::Position;
use crate::tokenize::{Token, Tokenizer, TokenizerRegistry};
use crate::word;

/// A line removed by [`Document::delete_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedLine {
    /// Index the line occupied.
    pub index: usize,
    /// Its text.
    pub text: String,
    /// True when it was the only line, which was cleared rather than removed.
    pub sole: bool,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The editable content of one file.
pub struct Document {
    lines: Vec<Line>,
    focus: usize,
    path: PathBuf,
    tab_width: usize,
    tokenizer: Option<Box<dyn Tokenizer>>,
}

impl Document {
    // -- Construction -------------------------------------------------------

    /// An empty document (one blank line) for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, tab_width: usize) -> Self {
        Self {
            lines: vec![Line::empty()],
            focus: 0,
            path: path.into(),
            tab_width,
            tokenizer: None,
        }
    }

    /// A document from in-memory text, split on `\n` (a trailing `\r` on
    /// each line is dropped).
    #[must_use]
    pub fn from_text(path: impl Into<PathBuf>, text: &str, tab_width: usize) -> Self {
        let mut lines: Vec<Line> = text.lines().map(|l| Line::new(l, tab_width)).collect();
        if lines.is_empty() {
            lines.push(Line::empty());
        }
        Self {
            lines,
            focus: 0,
            path: path.into(),
            tab_width,
            tokenizer: None,
        }
    }

    /// Read a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or is not UTF-8.
    pub fn open(path: &Path, tab_width: usize) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::from_text(path, &text, tab_width))
    }

    // -- Queries ------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines (always at least 1).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Char length of line `index`.
    #[must_use]
    pub fn line_len(&self, index: usize) -> Option<usize> {
        self.lines.get(index).map(Line::len)
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    /// All lines joined with `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(line.text());
        }
        out
    }

    #[inline]
    #[must_use]
    pub const fn tab_width(&self) -> usize {
        self.tab_width
    }

    pub const fn set_tab_width(&mut self, width: usize) {
        self.tab_width = width;
    }

    // -- Cursor -------------------------------------------------------------

    /// Focused line and its cursor column.
    #[must_use]
    pub fn cursor(&self) -> Position {
        Position::new(self.focus, self.focused().cursor())
    }

    /// Move the cursor, clamping line and column to valid values.
    pub fn set_cursor(&mut self, pos: Position) {
        self.focus = pos.line.min(self.lines.len() - 1);
        self.focused_mut().set_cursor(pos.col);
    }

    fn focused(&self) -> &Line {
        &self.lines[self.focus]
    }

    fn focused_mut(&mut self) -> &mut Line {
        &mut self.lines[self.focus]
    }

    /// Focus `line`, carrying `col` over (clamped to the line's length).
    fn focus_line(&mut self, line: usize, col: usize) {
        self.set_cursor(Position::new(line, col));
    }

    // -- Motion -------------------------------------------------------------

    /// Move up one line, keeping the column. Returns false on the first line.
    pub fn move_up(&mut self) -> bool {
        if self.focus == 0 {
            return false;
        }
        let col = self.focused().cursor();
        self.focus_line(self.focus - 1, col);
        true
    }

    /// Move down one line, keeping the column. Returns false on the last line.
    pub fn move_down(&mut self) -> bool {
        if self.focus + 1 >= self.lines.len() {
            return false;
        }
        let col = self.focused().cursor();
        self.focus_line(self.focus + 1, col);
        true
    }

    /// Move left; at column 0 wrap to the end of the previous line.
    pub fn move_left(&mut self) -> bool {
        let col = self.focused().cursor();
        if col > 0 {
            self.focused_mut().set_cursor(col - 1);
            true
        } else if self.focus > 0 {
            self.focus_line(self.focus - 1, usize::MAX);
            true
        } else {
            false
        }
    }

    /// Move right; at end of line wrap to the start of the next line.
    pub fn move_right(&mut self) -> bool {
        let line = self.focused();
        if line.cursor() < line.len() {
            let col = line.cursor() + 1;
            self.focused_mut().set_cursor(col);
            true
        } else if self.focus + 1 < self.lines.len() {
            self.focus_line(self.focus + 1, 0);
            true
        } else {
            false
        }
    }

    pub fn move_home(&mut self) {
        self.focused_mut().set_cursor(0);
    }

    pub fn move_end(&mut self) {
        self.focused_mut().set_cursor(usize::MAX);
    }

    /// Move up `rows` lines (stopping at the first).
    pub fn page_up(&mut self, rows: usize) {
        let col = self.focused().cursor();
        self.focus_line(self.focus.saturating_sub(rows.max(1)), col);
    }

    /// Move down `rows` lines (stopping at the last).
    pub fn page_down(&mut self, rows: usize) {
        let col = self.focused().cursor();
        self.focus_line(self.focus.saturating_add(rows.max(1)), col);
    }

    /// Jump to the start of the previous word. At column 0 move to the end
    /// of the previous line instead.
    pub fn word_left(&mut self) {
        let line = self.focused();
        let col = line.cursor();
        if col == 0 {
            if self.focus > 0 {
                self.focus_line(self.focus - 1, usize::MAX);
            }
            return;
        }
        let target = word::prev_word_start(line.text(), col);
        self.focused_mut().set_cursor(target);
    }

    /// Jump past the end of the next word. At end of line move to the start
    /// of the next line instead.
    pub fn word_right(&mut self) {
        let line = self.focused();
        let col = line.cursor();
        if col == line.len() {
            if self.focus + 1 < self.lines.len() {
                self.focus_line(self.focus + 1, 0);
            }
            return;
        }
        let target = word::next_word_end(line.text(), col);
        self.focused_mut().set_cursor(target);
    }

    // -- Editing ------------------------------------------------------------

    /// Insert `text` (no newlines) at the cursor and move past it. Returns
    /// the cursor after the insert.
    pub fn insert_at_cursor(&mut self, text: &str) -> Position {
        let line = self.focused_mut();
        let col = line.cursor();
        let n = line.insert_str(col, text);
        line.set_cursor(col + n);
        self.cursor()
    }

    /// Remove the char before the cursor. `None` at column 0.
    pub fn delete_before_cursor(&mut self) -> Option<char> {
        let line = self.focused_mut();
        let col = line.cursor();
        if col == 0 {
            return None;
        }
        let ch = line.remove_at(col - 1)?;
        line.set_cursor(col - 1);
        Some(ch)
    }

    /// Remove the char under the cursor. `None` at end of line.
    pub fn delete_after_cursor(&mut self) -> Option<char> {
        let line = self.focused_mut();
        let col = line.cursor();
        line.remove_at(col)
    }

    /// Remove from the start of the previous word up to the cursor. Returns
    /// where the removal started and the removed text; `None` at column 0.
    pub fn delete_word_before_cursor(&mut self) -> Option<(Position, String)> {
        let line = self.focused_mut();
        let col = line.cursor();
        if col == 0 {
            return None;
        }
        let start = word::prev_word_start(line.text(), col);
        let removed = line.remove_before(col, col - start);
        line.set_cursor(start);
        Some((Position::new(self.focus, start), removed))
    }

    /// Cut the focused line at the cursor; the tail becomes a new line below
    /// and the cursor moves to its start. Returns the cursor before the split.
    pub fn split_at_cursor(&mut self) -> Position {
        let at = self.cursor();
        let tail = self.focused_mut().split_off(at.col);
        let mut below = Line::empty();
        below.append(&tail);
        self.lines.insert(at.line + 1, below);
        self.focus_line(at.line + 1, 0);
        at
    }

    /// Append the focused line to the previous one and remove it. The cursor
    /// lands on the join point, which is returned. `None` on the first line.
    pub fn join_with_previous(&mut self) -> Option<Position> {
        if self.focus == 0 {
            return None;
        }
        let removed = self.lines.remove(self.focus);
        self.focus -= 1;
        let prev = self.focused_mut();
        let join = prev.len();
        prev.append(removed.text());
        prev.set_cursor(join);
        Some(Position::new(self.focus, join))
    }

    /// Append the next line to the focused one and remove it. The cursor does
    /// not move. Returns the join point; `None` on the last line.
    pub fn join_with_next(&mut self) -> Option<Position> {
        if self.focus + 1 >= self.lines.len() {
            return None;
        }
        let removed = self.lines.remove(self.focus + 1);
        let line = self.focused_mut();
        let join = line.len();
        line.append(removed.text());
        Some(Position::new(self.focus, join))
    }

    /// Remove the focused line. The only line is cleared instead.
    pub fn delete_line(&mut self) -> RemovedLine {
        let index = self.focus;
        if self.lines.len() == 1 {
            let text = self.lines[0].text().to_string();
            self.lines[0].set_content("");
            return RemovedLine {
                index,
                text,
                sole: true,
            };
        }
        let removed = self.lines.remove(index);
        self.focus_line(index.min(self.lines.len() - 1), 0);
        RemovedLine {
            index,
            text: removed.text().to_string(),
            sole: false,
        }
    }

    /// Insert a new line with `text` at `index` (clamped to the end) and focus
    /// it at column 0.
    pub fn insert_line(&mut self, index: usize, text: &str) {
        let index = index.min(self.lines.len());
        let mut line = Line::empty();
        line.append(text);
        self.lines.insert(index, line);
        self.focus_line(index, 0);
    }

    /// Replace the text of line `index`. Returns false if it does not exist.
    pub fn set_line_content(&mut self, index: usize, text: &str) -> bool {
        match self.lines.get_mut(index) {
            Some(line) => {
                line.set_content(text);
                true
            }
            None => false,
        }
    }

    // -- Tokens -------------------------------------------------------------

    /// Tokens for line `index`, resolving the tokenizer on first use.
    pub fn line_tokens(&mut self, index: usize) -> Option<&[Token]> {
        let line = self.lines.get_mut(index)?;
        let tokenizer = self
            .tokenizer
            .get_or_insert_with(|| TokenizerRegistry::default().resolve(&self.path));
        Some(line.tokens(tokenizer.as_mut()))
    }

    /// Resolve the tokenizer from `registry` if none is cached yet.
    pub fn ensure_tokenizer(&mut self, registry: &TokenizerRegistry) {
        if self.tokenizer.is_none() {
            self.set_tokenizer(registry.resolve(&self.path));
        }
    }

    /// Replace the tokenizer and drop every line's token cache.
    pub fn set_tokenizer(&mut self, tokenizer: Box<dyn Tokenizer>) {
        tracing::debug!(path = %self.path.display(), tokenizer = tokenizer.name(), "tokenizer set");
        self.tokenizer = Some(tokenizer);
        for line in &mut self.lines {
            line.invalidate();
        }
    }

    /// Name of the cached tokenizer, if resolved.
    #[must_use]
    pub fn tokenizer_name(&self) -> Option<&'static str> {
        self.tokenizer.as_ref().map(|t| t.name())
    }

    // -- File I/O -----------------------------------------------------------

    /// Write every line, trailing whitespace stripped, each followed by `\n`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line.text().trim_end());
            out.push('\n');
        }
        fs::write(&self.path, out).map_err(|e| Error::io(&self.path, e))
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("lines", &self.lines.len())
            .field("cursor", &self.cursor())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
