//! Word motions within a line.
//!
//! A word is a run of `\w` characters (letters, digits, underscore, Unicode
//! aware). Punctuation and whitespace are skipped over, never stopped on.
//!
//! | Function            | Key          | Lands on                               |
//! |---------------------|--------------|----------------------------------------|
//! | [`next_word_end`]   | ctrl right   | end of the word at or after the cursor |
//! | [`prev_word_start`] | ctrl left    | start of the word before the cursor    |
//!
//! Crossing line boundaries is the document's job; these functions work on
//! one line's text and char columns.

use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\w+").ok());

fn char_to_byte(s: &str, col: usize) -> usize {
    s.char_indices().nth(col).map_or(s.len(), |(b, _)| b)
}

fn byte_to_char(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}

/// Column just past the first word that ends after `col`. Returns the line
/// length when no word follows.
#[must_use]
pub fn next_word_end(text: &str, col: usize) -> usize {
    let start = char_to_byte(text, col);
    WORD.as_ref()
        .and_then(|re| re.find_at(text, start))
        .map_or_else(|| text.chars().count(), |m| byte_to_char(text, m.end()))
}

/// Column of the start of the last word beginning before `col`, cut off at
/// `col`. Returns 0 when there is none.
#[must_use]
pub fn prev_word_start(text: &str, col: usize) -> usize {
    let head = &text[..char_to_byte(text, col)];
    WORD.as_ref()
        .and_then(|re| re.find_iter(head).last())
        .map_or(0, |m| byte_to_char(text, m.start()))
}
