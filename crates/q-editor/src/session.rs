//! Open tabs: documents with their undo logs, in tab order.
//!
//! Each [`Tab`] owns its [`Document`] and [`UndoLog`] outright; the active
//! tab is an index. Switching tabs never copies lines around, so a tab's
//! cursor and history stay exactly as they were left.
//!
//! When a tabs file is attached (see [`Session::restore`]) the ordered path
//! list is rewritten after every open and close.

use std::path::{Path, PathBuf};

use q_config::Config;
use tracing::{debug, warn};

use crate::buffer::Document;
use crate::error::{Error, Result};
use crate::history::UndoLog;
use crate::persist::{self, TabsFile};
use crate::tokenize::TokenizerRegistry;

/// One open document and its undo history.
#[derive(Debug)]
pub struct Tab {
    pub doc: Document,
    pub undo: UndoLog,
}

impl Tab {
    #[must_use]
    pub const fn new(doc: Document) -> Self {
        Self {
            doc,
            undo: UndoLog::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.doc.path()
    }
}

/// The tab registry.
#[derive(Debug)]
pub struct Session {
    tabs: Vec<Tab>,
    active: usize,
    tab_width: usize,
    registry: TokenizerRegistry,
    tabs_file: Option<PathBuf>,
}

impl Session {
    // -- Construction -------------------------------------------------------

    /// An empty session using the config's tab width.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_registry(config, TokenizerRegistry::default())
    }

    #[must_use]
    pub fn with_registry(config: &Config, registry: TokenizerRegistry) -> Self {
        Self {
            tabs: Vec::new(),
            active: 0,
            tab_width: config.tab_width,
            registry,
            tabs_file: None,
        }
    }

    /// Reopen the tabs listed in `tabs_file`, in order, and attach the file
    /// for later rewrites. Unreadable paths are skipped. If nothing opens,
    /// `default_doc` is opened (or started empty if it cannot be read).
    /// Returns the stored layout flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the tabs file exists but cannot be read, or
    /// cannot be rewritten afterwards.
    pub fn restore(&mut self, tabs_file: &Path, default_doc: &Path) -> Result<bool> {
        let stored = TabsFile::read(tabs_file)?;
        for path in &stored.paths {
            if let Err(e) = self.open(path) {
                warn!(error = %e, "skipping tab");
            }
        }
        if self.tabs.is_empty() {
            if let Err(e) = self.open(default_doc) {
                warn!(error = %e, "default document unreadable, starting empty");
                self.push_tab(Document::new(normalize(default_doc), self.tab_width));
            }
        }
        self.tabs_file = Some(tabs_file.to_path_buf());
        self.persist()?;
        debug!(tabs = self.tabs.len(), layout = stored.layout, "session restored");
        Ok(stored.layout)
    }

    // -- Queries ------------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Open paths in tab order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.tabs.iter().map(Tab::path)
    }

    #[must_use]
    pub fn active_path(&self) -> Option<&Path> {
        self.active().map(Tab::path)
    }

    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn active(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(self.active)
    }

    #[must_use]
    pub fn tab(&self, path: &Path) -> Option<&Tab> {
        self.index_of(path).map(|i| &self.tabs[i])
    }

    #[must_use]
    pub const fn tabs_file(&self) -> Option<&PathBuf> {
        self.tabs_file.as_ref()
    }

    fn index_of(&self, path: &Path) -> Option<usize> {
        let path = normalize(path);
        self.tabs.iter().position(|t| t.path() == path)
    }

    // -- Tab lifecycle ------------------------------------------------------

    /// Open `path` in a new tab and make it active. An already-open path is
    /// just re-selected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read. No tab is created.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        if let Some(idx) = self.index_of(path) {
            self.activate(idx);
            return Ok(());
        }
        let path = normalize(path);
        let doc = Document::open(&path, self.tab_width)?;
        debug!(path = %path.display(), lines = doc.len(), "opened tab");
        self.push_tab(doc);
        self.persist_or_warn();
        Ok(())
    }

    fn push_tab(&mut self, doc: Document) {
        self.tabs.push(Tab::new(doc));
        self.activate(self.tabs.len() - 1);
    }

    /// Close the tab for `path`. The tab after it becomes active (the one
    /// before it when it was last). Closing the only tab or an unknown path
    /// does nothing. Returns whether a tab was closed.
    pub fn close(&mut self, path: &Path) -> bool {
        let Some(idx) = self.index_of(path) else {
            return false;
        };
        if self.tabs.len() <= 1 {
            return false;
        }
        let closed = self.tabs.remove(idx);
        debug!(path = %closed.path().display(), "closed tab");
        let next = if idx < self.tabs.len() { idx } else { idx - 1 };
        self.activate(next);
        self.persist_or_warn();
        true
    }

    /// Make `path` the active tab.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchTab`] if `path` is not open.
    pub fn switch(&mut self, path: &Path) -> Result<()> {
        let idx = self
            .index_of(path)
            .ok_or_else(|| Error::NoSuchTab(path.to_path_buf()))?;
        if idx != self.active {
            self.activate(idx);
        }
        Ok(())
    }

    /// Activate the next tab, wrapping to the first.
    pub fn next(&mut self) {
        if !self.tabs.is_empty() {
            self.activate((self.active + 1) % self.tabs.len());
        }
    }

    /// Activate the previous tab, wrapping to the last.
    pub fn previous(&mut self) {
        if !self.tabs.is_empty() {
            let n = self.tabs.len();
            self.activate((self.active + n - 1) % n);
        }
    }

    fn activate(&mut self, idx: usize) {
        self.active = idx;
        if let Some(tab) = self.tabs.get_mut(idx) {
            tab.doc.ensure_tokenizer(&self.registry);
            debug!(path = %tab.path().display(), "active tab");
        }
    }

    // -- Saving and config --------------------------------------------------

    /// Write the active document to disk. Returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the write fails.
    pub fn save_active(&self) -> Result<PathBuf> {
        let tab = self
            .active()
            .ok_or_else(|| Error::NoSuchTab(PathBuf::new()))?;
        tab.doc.save()?;
        Ok(tab.path().to_path_buf())
    }

    /// Apply a new config to every open document.
    pub fn reconfigure(&mut self, config: &Config) {
        self.tab_width = config.tab_width;
        for tab in &mut self.tabs {
            tab.doc.set_tab_width(config.tab_width);
        }
    }

    // -- Persistence --------------------------------------------------------

    /// Rewrite the attached tabs file with the current paths (no layout
    /// flag). Does nothing without a tabs file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the write fails.
    pub fn persist(&self) -> Result<()> {
        match &self.tabs_file {
            Some(file) => persist::write_paths(file, self.paths()),
            None => Ok(()),
        }
    }

    fn persist_or_warn(&self) {
        if let Err(e) = self.persist() {
            warn!(error = %e, "could not write tabs file");
        }
    }

    /// Write the paths and the layout flag, for a clean exit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the write fails.
    pub fn persist_with_layout(&self, layout: bool) -> Result<()> {
        match &self.tabs_file {
            Some(file) => persist::write_with_layout(file, self.paths(), layout),
            None => Ok(()),
        }
    }
}

/// Absolute form of `path` (not canonicalized; symlinks are kept).
fn normalize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
