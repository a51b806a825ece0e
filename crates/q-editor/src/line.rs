//! One editable line with a lazily computed token cache.
//!
//! # Design choices
//!
//! - **Tabs are expanded on load.** Literal tab characters become spaces at
//!   construction time, so every column is one char and cursor math never
//!   has to consult the tab width again. The tab *key* inserts the number of
//!   spaces returned by [`tab_spaces`].
//! - **Char columns.** All offsets are char indices. Byte offsets stay
//!   private to this module.
//! - **Dirty flag.** Every content mutation sets `dirty`. [`Line::tokens`]
//!   reuses the cache when the line is clean, and also when the text is back
//!   to what was last tokenized (type a char, then undo it).

use std::fmt;

use unicode_width::UnicodeWidthStr;

use crate::tokenize::{Token, Tokenizer};

/// Spaces the tab key inserts at `col` to reach the next tab stop.
#[must_use]
pub const fn tab_spaces(col: usize, width: usize) -> usize {
    let width = if width == 0 { 1 } else { width };
    match width - (col % width) {
        0 => width,
        n => n,
    }
}

/// Replace each tab in `text` with spaces up to the next tab stop.
#[must_use]
pub fn expand_tabs(text: &str, width: usize) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + width * 2);
    let mut col = 0;
    for ch in text.chars() {
        if ch == '\t' {
            let n = tab_spaces(col, width);
            out.extend(std::iter::repeat_n(' ', n));
            col += n;
        } else {
            out.push(ch);
            col += 1;
        }
    }
    out
}

/// Byte offset of char index `col` in `s` (clamped to the end).
fn char_to_byte(s: &str, col: usize) -> usize {
    s.char_indices().nth(col).map_or(s.len(), |(b, _)| b)
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// A line of text plus its cursor column and token cache.
#[derive(Clone)]
pub struct Line {
    text: String,
    /// Char length of `text`, kept in step with every mutation.
    len: usize,
    cursor: usize,
    dirty: bool,
    /// Text the cached tokens were computed from.
    snapshot: String,
    tokens: Vec<Token>,
}

impl Line {
    // -- Construction -------------------------------------------------------

    /// A line from raw file text, expanding tabs at `tab_width`.
    #[must_use]
    pub fn new(text: &str, tab_width: usize) -> Self {
        Self::from_expanded(expand_tabs(text, tab_width))
    }

    /// An empty line.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_expanded(String::new())
    }

    fn from_expanded(text: String) -> Self {
        let len = text.chars().count();
        Self {
            text,
            len,
            cursor: 0,
            dirty: true,
            snapshot: String::new(),
            tokens: Vec::new(),
        }
    }

    // -- Queries ------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in chars.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cursor column, always in `0..=len`.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// True when the token cache may be stale.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Terminal cell width of the text.
    #[must_use]
    pub fn display_width(&self) -> usize {
        self.text.width()
    }

    /// Leading spaces and tabs.
    #[must_use]
    pub fn leading_whitespace(&self) -> &str {
        let trimmed = self.text.trim_start_matches([' ', '\t']);
        &self.text[..self.text.len() - trimmed.len()]
    }

    /// Char at column `col`, if any.
    #[must_use]
    pub fn char_at(&self, col: usize) -> Option<char> {
        self.text.chars().nth(col)
    }

    // -- Cursor -------------------------------------------------------------

    /// Move the cursor, clamped to `0..=len`.
    pub fn set_cursor(&mut self, col: usize) {
        self.cursor = col.min(self.len);
    }

    // -- Mutation -----------------------------------------------------------

    /// Replace the whole content. The cursor is clamped to the new length.
    pub fn set_content(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.len = self.text.chars().count();
        self.cursor = self.cursor.min(self.len);
        self.dirty = true;
    }

    /// Insert `s` at column `col` (clamped). Returns the char count
    /// inserted. The cursor is not moved.
    pub fn insert_str(&mut self, col: usize, s: &str) -> usize {
        let n = s.chars().count();
        if n == 0 {
            return 0;
        }
        let at = char_to_byte(&self.text, col.min(self.len));
        self.text.insert_str(at, s);
        self.len += n;
        self.dirty = true;
        n
    }

    /// Remove up to `n` chars immediately before column `col`. Returns the
    /// removed text.
    pub fn remove_before(&mut self, col: usize, n: usize) -> String {
        let end_col = col.min(self.len);
        let start_col = end_col.saturating_sub(n);
        self.remove_range(start_col, end_col)
    }

    /// Remove the char at column `col`.
    pub fn remove_at(&mut self, col: usize) -> Option<char> {
        if col >= self.len {
            return None;
        }
        self.remove_range(col, col + 1).chars().next()
    }

    /// Truncate at column `col` and return the tail.
    pub fn split_off(&mut self, col: usize) -> String {
        let col = col.min(self.len);
        let at = char_to_byte(&self.text, col);
        let tail = self.text.split_off(at);
        self.len = col;
        self.cursor = self.cursor.min(col);
        self.dirty = true;
        tail
    }

    /// Append `s` at the end.
    pub fn append(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.text.push_str(s);
        self.len += s.chars().count();
        self.dirty = true;
    }

    fn remove_range(&mut self, start_col: usize, end_col: usize) -> String {
        if start_col >= end_col {
            return String::new();
        }
        let start = char_to_byte(&self.text, start_col);
        let end = char_to_byte(&self.text, end_col);
        let removed: String = self.text.drain(start..end).collect();
        self.len -= end_col - start_col;
        self.cursor = self.cursor.min(self.len);
        self.dirty = true;
        removed
    }

    // -- Tokens -------------------------------------------------------------

    /// Tokens for the current text, tokenizing only when needed.
    pub fn tokens(&mut self, tokenizer: &mut dyn Tokenizer) -> &[Token] {
        if self.dirty {
            if self.text != self.snapshot {
                self.tokens = tokenizer.tokens(&self.text);
                self.snapshot.clone_from(&self.text);
            }
            self.dirty = false;
        }
        &self.tokens
    }

    /// Drop the token cache, e.g. after the tokenizer changed.
    pub fn invalidate(&mut self) {
        self.dirty = true;
        self.snapshot.clear();
        self.tokens.clear();
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Line")
            .field("text", &self.text)
            .field("cursor", &self.cursor)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::{Category, PlainText};
    use pretty_assertions::assert_eq;

    /// Counts how often it is invoked.
    struct Counting(usize);

    impl Tokenizer for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn tokens(&mut self, text: &str) -> Vec<Token> {
            self.0 += 1;
            PlainText.tokens(text)
        }
    }

    // -- Tabs ---------------------------------------------------------------

    #[test]
    fn tab_spaces_reach_next_stop() {
        assert_eq!(tab_spaces(0, 4), 4);
        assert_eq!(tab_spaces(1, 4), 3);
        assert_eq!(tab_spaces(3, 4), 1);
        assert_eq!(tab_spaces(4, 4), 4);
        assert_eq!(tab_spaces(5, 8), 3);
    }

    #[test]
    fn expand_tabs_relative_to_column() {
        assert_eq!(expand_tabs("\tx", 4), "    x");
        assert_eq!(expand_tabs("ab\tc", 4), "ab  c");
        assert_eq!(expand_tabs("abcd\te", 4), "abcd    e");
        assert_eq!(expand_tabs("no tabs", 4), "no tabs");
    }

    #[test]
    fn new_expands_tabs() {
        let line = Line::new("\tfn x", 4);
        assert_eq!(line.text(), "    fn x");
        assert_eq!(line.len(), 8);
    }

    // -- Editing ------------------------------------------------------------

    #[test]
    fn insert_and_remove() {
        let mut line = Line::new("hllo", 4);
        assert_eq!(line.insert_str(1, "e"), 1);
        assert_eq!(line.text(), "hello");
        assert_eq!(line.remove_before(5, 2), "lo");
        assert_eq!(line.text(), "hel");
        assert_eq!(line.remove_at(0), Some('h'));
        assert_eq!(line.remove_at(9), None);
        assert_eq!(line.text(), "el");
    }

    #[test]
    fn multibyte_columns() {
        let mut line = Line::new("café", 4);
        assert_eq!(line.len(), 4);
        line.insert_str(4, "!");
        assert_eq!(line.text(), "café!");
        assert_eq!(line.remove_before(4, 1), "é");
        assert_eq!(line.char_at(2), Some('f'));
    }

    #[test]
    fn split_off_and_append() {
        let mut line = Line::new("hello world", 4);
        line.set_cursor(8);
        let tail = line.split_off(5);
        assert_eq!(tail, " world");
        assert_eq!(line.text(), "hello");
        assert_eq!(line.cursor(), 5);
        line.append(tail.as_str());
        assert_eq!(line.text(), "hello world");
        assert_eq!(line.len(), 11);
    }

    #[test]
    fn set_content_clamps_cursor() {
        let mut line = Line::new("abcdef", 4);
        line.set_cursor(6);
        line.set_content("ab");
        assert_eq!(line.cursor(), 2);
        assert!(line.is_dirty());
    }

    #[test]
    fn set_cursor_clamps() {
        let mut line = Line::new("abc", 4);
        line.set_cursor(99);
        assert_eq!(line.cursor(), 3);
    }

    #[test]
    fn leading_whitespace_and_width() {
        let line = Line::new("    x = 1", 4);
        assert_eq!(line.leading_whitespace(), "    ");
        assert_eq!(Line::new("日本", 4).display_width(), 4);
    }

    // -- Token cache --------------------------------------------------------

    #[test]
    fn tokens_cached_until_mutation() {
        let mut tk = Counting(0);
        let mut line = Line::new("abc", 4);

        let first = line.tokens(&mut tk).to_vec();
        let second = line.tokens(&mut tk).to_vec();
        assert_eq!(first, second);
        assert_eq!(tk.0, 1);

        line.set_content("abcdef");
        assert_eq!(line.tokens(&mut tk), &[Token::new(Category::Text, 6)]);
        assert_eq!(tk.0, 2);
    }

    #[test]
    fn restoring_old_text_reuses_cache() {
        let mut tk = Counting(0);
        let mut line = Line::new("abc", 4);
        line.tokens(&mut tk);
        line.insert_str(3, "d");
        line.remove_at(3);
        assert!(line.is_dirty());
        line.tokens(&mut tk);
        assert_eq!(tk.0, 1);
        assert!(!line.is_dirty());
    }

    #[test]
    fn invalidate_forces_retokenize() {
        let mut tk = Counting(0);
        let mut line = Line::new("abc", 4);
        line.tokens(&mut tk);
        line.invalidate();
        line.tokens(&mut tk);
        assert_eq!(tk.0, 2);
    }
}
