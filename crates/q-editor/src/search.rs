//! Incremental search over a document.
//!
//! The cursor walks matches of a literal term top to bottom without wrapping
//! around. Matches on the current line are queued, so stepping forward stays
//! on the line until its matches run out, then scans the lines below.
//! Every forward step pushes the position it left onto a history stack, and
//! [`SearchCursor::retreat`] walks that stack back.
//!
//! Columns are char indices. Matching is case-sensitive and
//! non-overlapping (`"aa"` in `"aaaa"` matches at 0 and 2).

use std::collections::VecDeque;

use crate::buffer::Document;
use crate::position::Position;

/// Where the new position sits relative to the old one, for front ends that
/// redraw a line-number gutter incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Moved down: the gutter scrolls from above.
    Above,
    /// Moved up: the gutter scrolls from below.
    Below,
}

/// A successful search move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub pos: Position,
    pub origin: Origin,
}

/// Search state for the find bar.
#[derive(Debug, Default, Clone)]
pub struct SearchCursor {
    term: String,
    /// Current match. `None` until the first hit.
    current: Option<Position>,
    /// Remaining match columns on `current.line`.
    queue: VecDeque<usize>,
    history: Vec<Position>,
}

impl SearchCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub const fn current(&self) -> Option<Position> {
        self.current
    }

    #[must_use]
    pub fn history(&self) -> &[Position] {
        &self.history
    }

    /// Forget the term and all positions.
    pub fn clear(&mut self) {
        self.term.clear();
        self.reset();
    }

    fn reset(&mut self) {
        self.current = None;
        self.queue.clear();
        self.history.clear();
    }

    /// Start over with a new term: clears the queue and history and searches
    /// from the top of the document.
    pub fn set_term(&mut self, doc: &mut Document, term: &str) -> Option<SearchHit> {
        term.clone_into(&mut self.term);
        self.restart(doc)
    }

    fn restart(&mut self, doc: &mut Document) -> Option<SearchHit> {
        self.reset();
        self.search(doc, Position::ZERO)
    }

    /// Next match: the next queued column on the current line, or the first
    /// line at or below `from.line` that contains the term.
    ///
    /// On success the document cursor moves to the match and the position
    /// left behind is pushed to history. On failure nothing changes.
    pub fn search(&mut self, doc: &mut Document, from: Position) -> Option<SearchHit> {
        if self.term.is_empty() {
            return None;
        }
        let pushed = self.push_history();

        let found = self.next_queued().or_else(|| self.scan(doc, from.line));
        let Some(pos) = found else {
            if pushed {
                self.history.pop();
            }
            return None;
        };

        self.current = Some(pos);
        doc.set_cursor(pos);
        Some(SearchHit {
            pos,
            origin: Origin::Above,
        })
    }

    /// Step to the match after the current one.
    pub fn advance(&mut self, doc: &mut Document) -> Option<SearchHit> {
        let next_line = self.current.map_or(0, |p| p.line + 1);
        self.search(doc, Position::new(next_line, 0))
    }

    /// Step back to the previous position in history. With no history the
    /// search restarts from the top.
    pub fn retreat(&mut self, doc: &mut Document) -> Option<SearchHit> {
        let Some(prev) = self.history.pop() else {
            return self.restart(doc);
        };
        self.current = Some(prev);
        self.queue = match_columns(doc, prev.line, &self.term)
            .into_iter()
            .filter(|&c| c > prev.col)
            .collect();
        doc.set_cursor(prev);
        Some(SearchHit {
            pos: prev,
            origin: Origin::Below,
        })
    }

    /// Push `current` unless it is already on top. Returns whether it pushed.
    fn push_history(&mut self) -> bool {
        let Some(pos) = self.current else {
            return false;
        };
        if self.history.last() == Some(&pos) {
            return false;
        }
        self.history.push(pos);
        true
    }

    fn next_queued(&mut self) -> Option<Position> {
        let line = self.current?.line;
        self.queue.pop_front().map(|col| Position::new(line, col))
    }

    /// Scan from `start` downwards; fill the queue from the first hit line.
    fn scan(&mut self, doc: &Document, start: usize) -> Option<Position> {
        for line in start..doc.len() {
            let mut cols: VecDeque<usize> = match_columns(doc, line, &self.term).into();
            if let Some(first) = cols.pop_front() {
                self.queue = cols;
                return Some(Position::new(line, first));
            }
        }
        None
    }
}

/// Char columns of non-overlapping matches of `term` on line `line`.
fn match_columns(doc: &Document, line: usize, term: &str) -> Vec<usize> {
    let Some(text) = doc.line(line).map(crate::line::Line::text) else {
        return Vec::new();
    };
    if term.is_empty() {
        return Vec::new();
    }
    text.match_indices(term)
        .map(|(byte, _)| text[..byte].chars().count())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
