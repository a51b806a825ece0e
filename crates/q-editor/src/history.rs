//! Undo log: a per-document stack of reversible edits.
//!
//! Every content-changing keystroke pushes exactly one [`Edit`], and one
//! [`UndoLog::undo`] pops exactly one and reverts it. There is no redo and
//! no grouping: holding backspace for ten chars takes ten undos.
//!
//! Each record carries everything needed to reverse it, so records never
//! depend on their neighbors. Backspace at column 0 is a single
//! [`Edit::JoinLine`], not a join plus a char removal.
//!
//! # Usage
//!
//! ```text
//! let ch = doc.delete_before_cursor()?;
//! log.log(Edit::DeleteChar { at: doc.cursor(), ch, direction: Direction::Backward });
//! // later
//! log.undo(&mut doc);
//! ```
//!
//! A record whose position no longer exists in the document (the file was
//! reloaded underneath it) is dropped with a warning instead of applied.

use tracing::{trace, warn};

use crate::buffer::Document;
use crate::position::Position;

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// Which side of the cursor an edit happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Backspace: before the cursor.
    Backward,
    /// Delete: at/after the cursor.
    Forward,
}

/// One reversible edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// `ch` was typed; `at` is the cursor after it.
    InsertChar { at: Position, ch: char },

    /// `text` (no newlines) was inserted; `at` is the cursor after it.
    InsertText { at: Position, text: String },

    /// `ch` was removed; `at` is where it sat.
    DeleteChar {
        at: Position,
        ch: char,
        direction: Direction,
    },

    /// `text` was removed starting at `at`.
    DeleteText { at: Position, text: String },

    /// Enter was pressed with the cursor at `at`.
    SplitLine { at: Position },

    /// Two lines were joined; `at` is the join point on the upper line.
    JoinLine { at: Position, direction: Direction },

    /// Line `line` holding `text` was deleted. `sole` marks the only line
    /// of the document, which was cleared instead of removed.
    DeleteLine {
        line: usize,
        text: String,
        sole: bool,
    },
}

impl Edit {
    /// True when the edit removed content.
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        matches!(
            self,
            Self::DeleteChar { .. }
                | Self::DeleteText { .. }
                | Self::JoinLine { .. }
                | Self::DeleteLine { .. }
        )
    }

    /// Revert this edit. Returns the cursor afterwards, or `None` if the
    /// recorded position is gone.
    fn revert(&self, doc: &mut Document) -> Option<Position> {
        match self {
            Self::InsertChar { at, ch } => {
                let mut buf = [0u8; 4];
                remove_inserted(doc, *at, ch.encode_utf8(&mut buf))
            }
            Self::InsertText { at, text } => remove_inserted(doc, *at, text),

            Self::DeleteChar { at, ch, direction } => {
                let mut buf = [0u8; 4];
                let after = reinsert(doc, *at, ch.encode_utf8(&mut buf))?;
                if *direction == Direction::Forward {
                    doc.set_cursor(*at);
                }
                Some(after)
            }
            Self::DeleteText { at, text } => reinsert(doc, *at, text),

            Self::SplitLine { at } => {
                if at.line + 1 >= doc.len() || doc.line_len(at.line)? != at.col {
                    return None;
                }
                doc.set_cursor(Position::new(at.line + 1, 0));
                doc.join_with_previous()
            }

            Self::JoinLine { at, direction } => {
                if doc.line_len(at.line)? < at.col {
                    return None;
                }
                doc.set_cursor(*at);
                doc.split_at_cursor();
                if *direction == Direction::Forward {
                    doc.set_cursor(*at);
                }
                Some(doc.cursor())
            }

            Self::DeleteLine { line, text, sole } => {
                if *sole {
                    if doc.len() != 1 || !doc.set_line_content(0, text) {
                        return None;
                    }
                    doc.set_cursor(Position::ZERO);
                } else {
                    if *line > doc.len() {
                        return None;
                    }
                    doc.insert_line(*line, text);
                }
                Some(doc.cursor())
            }
        }
    }
}

/// Remove `text` just before `at`, checking it is still there.
fn remove_inserted(doc: &mut Document, at: Position, text: &str) -> Option<Position> {
    let n = text.chars().count();
    let line = doc.line(at.line)?;
    if at.col < n || at.col > line.len() {
        return None;
    }
    let start = at.col - n;
    let present: String = line.text().chars().skip(start).take(n).collect();
    if present != text {
        return None;
    }
    doc.set_cursor(at);
    for _ in 0..n {
        doc.delete_before_cursor();
    }
    Some(doc.cursor())
}

/// Put `text` back at `at`; the cursor ends after it.
fn reinsert(doc: &mut Document, at: Position, text: &str) -> Option<Position> {
    if doc.line_len(at.line)? < at.col {
        return None;
    }
    doc.set_cursor(at);
    Some(doc.insert_at_cursor(text))
}

// ---------------------------------------------------------------------------
// UndoLog
// ---------------------------------------------------------------------------

/// LIFO stack of edits for one document.
#[derive(Debug, Default)]
pub struct UndoLog {
    records: Vec<Edit>,
}

impl UndoLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Push a record. The caller has already performed the edit.
    pub fn log(&mut self, edit: Edit) {
        self.records.push(edit);
    }

    /// Pop the most recent record and revert it. Returns the cursor after the
    /// undo, or `None` when there was nothing to undo (or the record was
    /// stale and dropped).
    pub fn undo(&mut self, doc: &mut Document) -> Option<Position> {
        let edit = self.records.pop()?;
        trace!(?edit, "undo");
        let cursor = edit.revert(doc);
        if cursor.is_none() {
            warn!(?edit, path = %doc.path().display(), "dropping stale undo record");
        }
        cursor
    }

    /// Most recent record.
    #[must_use]
    pub fn last(&self) -> Option<&Edit> {
        self.records.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
