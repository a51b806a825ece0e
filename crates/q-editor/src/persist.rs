//! The open-tabs file.
//!
//! One path per line. While the editor runs the file holds only paths; on a
//! clean exit a final `True` or `False` line records the layout flag:
//!
//! ```text
//! /home/me/notes.txt
//! /home/me/src/main.rs
//! True
//! ```
//!
//! A last line other than exactly `True`/`False` is a path, and the flag
//! reads as `False`. Blank lines are skipped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Contents of a tabs file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabsFile {
    pub paths: Vec<PathBuf>,
    pub layout: bool,
}

impl TabsFile {
    /// Parse tabs-file text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut lines: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();
        let layout = match lines.last() {
            Some(&"True") => Some(true),
            Some(&"False") => Some(false),
            _ => None,
        };
        if layout.is_some() {
            lines.pop();
        }
        Self {
            paths: lines.into_iter().map(PathBuf::from).collect(),
            layout: layout.unwrap_or(false),
        }
    }

    /// Read a tabs file. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] for any read failure other than not-found.
    pub fn read(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::io(path, e)),
        }
    }
}

fn render_paths<'a>(paths: impl IntoIterator<Item = &'a Path>) -> String {
    let mut out = String::new();
    for p in paths {
        out.push_str(&p.to_string_lossy());
        out.push('\n');
    }
    out
}

/// Truncate `file` and write `paths`, one per line, without a layout flag.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be written.
pub fn write_paths<'a>(file: &Path, paths: impl IntoIterator<Item = &'a Path>) -> Result<()> {
    fs::write(file, render_paths(paths)).map_err(|e| Error::io(file, e))
}

/// Truncate `file` and write `paths` followed by the layout flag.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be written.
pub fn write_with_layout<'a>(
    file: &Path,
    paths: impl IntoIterator<Item = &'a Path>,
    layout: bool,
) -> Result<()> {
    let mut out = render_paths(paths);
    out.push_str(if layout { "True" } else { "False" });
    fs::write(file, out).map_err(|e| Error::io(file, e))
}

/// Reset `file` to the single default document with layout off. Used when
/// the editor dies so the next launch starts clean.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be written.
pub fn write_fallback(file: &Path, default_doc: &Path) -> Result<()> {
    write_with_layout(file, [default_doc], false)
}
