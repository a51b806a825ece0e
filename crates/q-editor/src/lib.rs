//! # q-editor: editor core for quire
//!
//! Everything that edits text, independent of any terminal:
//!
//! - **[`position`]**: `Position` (line, col), 0-indexed
//! - **[`line`]**: one editable line with a cursor and a cached token run
//! - **[`buffer`]**: `Document`, an ordered list of lines with a focused line
//! - **[`history`]**: per-document undo log of self-contained edit records
//! - **[`search`]**: incremental literal search with a back-step history
//! - **[`tokenize`]**: pluggable syntax tokenizers and the registry that picks one
//! - **[`session`]**: the open tabs and the active one
//! - **[`persist`]**: the open-tabs file
//! - **[`editor`]**: key dispatch tying the above together

pub mod buffer;
pub mod editor;
pub mod error;
pub mod history;
pub mod line;
pub mod persist;
pub mod position;
pub mod search;
pub mod session;
pub mod tokenize;
pub mod word;

pub use buffer::Document;
pub use editor::{Editor, Request, Response};
pub use error::{Error, Result};
pub use history::{Direction, Edit, UndoLog};
pub use line::Line;
pub use persist::TabsFile;
pub use position::Position;
pub use search::{Origin, SearchCursor, SearchHit};
pub use session::{Session, Tab};
pub use tokenize::{Category, Language, Token, Tokenizer, TokenizerRegistry};
