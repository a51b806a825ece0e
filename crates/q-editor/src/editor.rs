//! Keystroke dispatcher.
//!
//! [`Editor::handle_key`] takes one key event and turns it into at most one
//! document operation plus the matching undo record. Keys bound in the
//! config's keymap run editor actions (save, switch tab, find...); the rest
//! edit or move within the active document. While the find bar is open,
//! keys drive the [`SearchCursor`] instead.
//!
//! The editor owns no terminal. Everything a front end needs to react to
//! comes back in the [`Response`]: a gutter refresh hint, a request it must
//! service (file browser, terminal, help), a status message, or quit.

use std::path::{Path, PathBuf};

use q_config::{Action, Config};
use q_keys::{KeyCode, KeyEvent};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::history::{Direction, Edit};
use crate::line::tab_spaces;
use crate::search::{Origin, SearchCursor};
use crate::session::{Session, Tab};

/// Rows moved by page up / page down when the front end has not said.
pub const DEFAULT_PAGE_ROWS: usize = 20;

/// Work the front end must do on the editor's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Show a file browser and call `Session::open` with the choice.
    Open,
    /// Hand the screen to a terminal.
    Terminal,
    /// Show the keybinding help.
    Help,
}

/// What happened as a result of one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// The cursor row moved; redraw the line-number gutter scrolling from
    /// this side.
    pub gutter: Option<Origin>,
    pub request: Option<Request>,
    /// Status-line message.
    pub message: Option<String>,
    /// The exit key was pressed.
    pub quit: bool,
}

impl Response {
    fn gutter(origin: Origin) -> Self {
        Self {
            gutter: Some(origin),
            ..Self::default()
        }
    }

    fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            ..Self::default()
        }
    }

    fn request(request: Request) -> Self {
        Self {
            request: Some(request),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Session, configuration and UI flags, driven one key at a time.
#[derive(Debug)]
pub struct Editor {
    session: Session,
    config: Config,
    config_path: Option<PathBuf>,
    search: SearchCursor,
    searching: bool,
    layout: bool,
    line_numbers: bool,
    page_rows: usize,
}

impl Editor {
    #[must_use]
    pub fn new(session: Session, config: Config, layout: bool) -> Self {
        Self {
            session,
            config,
            config_path: None,
            search: SearchCursor::new(),
            searching: false,
            layout,
            line_numbers: true,
            page_rows: DEFAULT_PAGE_ROWS,
        }
    }

    /// Config file opened by the `config` key. Saving a tab with this path
    /// reloads the configuration.
    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn search(&self) -> &SearchCursor {
        &self.search
    }

    #[must_use]
    pub const fn is_searching(&self) -> bool {
        self.searching
    }

    /// Tab bar at the top instead of the bottom.
    #[must_use]
    pub const fn layout(&self) -> bool {
        self.layout
    }

    #[must_use]
    pub const fn line_numbers(&self) -> bool {
        self.line_numbers
    }

    /// Rows moved by page up / page down (the visible height).
    pub const fn set_page_rows(&mut self, rows: usize) {
        self.page_rows = rows;
    }

    /// Write the tabs file with the layout flag, for a clean exit.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error.
    pub fn shutdown(&self) -> Result<()> {
        self.session.persist_with_layout(self.layout)
    }

    // -- Dispatch -----------------------------------------------------------

    /// Handle one key event.
    pub fn handle_key(&mut self, key: KeyEvent) -> Response {
        if self.searching {
            return self.handle_search_key(key);
        }
        if let Some(action) = self.config.keymap.action_for(key) {
            return self.run_action(action);
        }
        let page_rows = self.page_rows;
        let Some(tab) = self.session.active_mut() else {
            return Response::default();
        };
        edit_key(tab, key, page_rows)
    }

    fn run_action(&mut self, action: Action) -> Response {
        debug!(action = action.name(), "action");
        match action {
            Action::Undo => {
                let Some(Tab { doc, undo }) = self.session.active_mut() else {
                    return Response::default();
                };
                if undo.is_empty() {
                    return Response::message("nothing to undo");
                }
                // A None here means the record no longer fit the text and was dropped.
                match undo.undo(doc) {
                    Some(_) => Response::gutter(Origin::Above),
                    None => Response::message("undo record no longer applies, dropped"),
                }
            }
            Action::DelLine => {
                let Some(tab) = self.session.active_mut() else {
                    return Response::default();
                };
                let removed = tab.doc.delete_line();
                tab.undo.log(Edit::DeleteLine {
                    line: removed.index,
                    text: removed.text,
                    sole: removed.sole,
                });
                Response::gutter(Origin::Below)
            }
            Action::Save => self.save(),
            Action::NextTab => {
                self.session.next();
                Response::gutter(Origin::Above)
            }
            Action::PrevTab => {
                self.session.previous();
                Response::gutter(Origin::Above)
            }
            Action::CloseTab => {
                let Some(path) = self.session.active_path().map(Path::to_path_buf) else {
                    return Response::default();
                };
                if self.session.close(&path) {
                    Response::gutter(Origin::Above)
                } else {
                    Response::message("cannot close the last tab")
                }
            }
            Action::Find => {
                self.searching = true;
                self.search.clear();
                Response::default()
            }
            Action::Layout => {
                self.layout = !self.layout;
                Response::default()
            }
            Action::LineNum => {
                self.line_numbers = !self.line_numbers;
                Response::default()
            }
            Action::Exit => Response {
                quit: true,
                ..Response::default()
            },
            Action::Config => {
                let Some(path) = self.config_path.clone() else {
                    return Response::message("no config file");
                };
                match self.session.open(&path) {
                    Ok(()) => Response::gutter(Origin::Above),
                    Err(e) => Response::message(e.to_string()),
                }
            }
            Action::Open => Response::request(Request::Open),
            Action::Terminal => Response::request(Request::Terminal),
            Action::Help => Response::request(Request::Help),
        }
    }

    fn save(&mut self) -> Response {
        let saved = match self.session.save_active() {
            Ok(path) => path,
            Err(e) => return Response::message(e.to_string()),
        };
        info!(path = %saved.display(), "saved");
        let is_config = self
            .config_path
            .as_deref()
            .is_some_and(|cfg| std::path::absolute(cfg).is_ok_and(|abs| abs == saved));
        if is_config {
            return self.reload_config(&saved);
        }
        Response::message(format!("saved {}", saved.display()))
    }

    /// Re-read the config file and apply it.
    fn reload_config(&mut self, path: &Path) -> Response {
        match Config::load(path) {
            Ok(parsed) => {
                self.config = parsed.config;
                self.session.reconfigure(&self.config);
                debug!(tab_width = self.config.tab_width, "config reloaded");
                match parsed.diagnostics.first() {
                    Some(first) => Response::message(format!(
                        "config reloaded with {} error(s); {first}",
                        parsed.diagnostics.len()
                    )),
                    None => Response::message("config reloaded"),
                }
            }
            Err(e) => {
                warn!(error = %e, "config reload failed");
                Response::message(e.to_string())
            }
        }
    }

    // -- Search mode --------------------------------------------------------

    fn handle_search_key(&mut self, key: KeyEvent) -> Response {
        if self.config.keymap.action_for(key) == Some(Action::Find) {
            self.searching = false;
            self.search.clear();
            return Response::default();
        }
        let Some(tab) = self.session.active_mut() else {
            return Response::default();
        };
        let doc = &mut tab.doc;

        let hit = if let Some(ch) = key.printable() {
            let mut term = self.search.term().to_string();
            term.push(ch);
            self.search.set_term(doc, &term)
        } else {
            match key.code {
                KeyCode::Backspace => {
                    let mut term = self.search.term().to_string();
                    term.pop();
                    self.search.set_term(doc, &term)
                }
                KeyCode::Right => self.search.advance(doc),
                KeyCode::Left => self.search.retreat(doc),
                _ => return Response::default(),
            }
        };

        match hit {
            Some(hit) => Response::gutter(hit.origin),
            None if self.search.term().is_empty() => Response::default(),
            None => Response::message(format!("no more matches for {:?}", self.search.term())),
        }
    }
}

// ---------------------------------------------------------------------------
// Editing keys
// ---------------------------------------------------------------------------

/// Apply a non-bound key to the active tab.
fn edit_key(tab: &mut Tab, key: KeyEvent, page_rows: usize) -> Response {
    let Tab { doc, undo } = tab;

    if let Some(ch) = key.printable() {
        let mut buf = [0u8; 4];
        let at = doc.insert_at_cursor(ch.encode_utf8(&mut buf));
        undo.log(Edit::InsertChar { at, ch });
        return Response::default();
    }

    match key.code {
        KeyCode::Tab => {
            let spaces = " ".repeat(tab_spaces(doc.cursor().col, doc.tab_width()));
            let at = doc.insert_at_cursor(&spaces);
            undo.log(Edit::InsertText { at, text: spaces });
        }
        KeyCode::Backspace if key.is_word_modified() => {
            if let Some((at, text)) = doc.delete_word_before_cursor() {
                undo.log(Edit::DeleteText { at, text });
            }
        }
        KeyCode::Backspace => {
            if let Some(ch) = doc.delete_before_cursor() {
                undo.log(Edit::DeleteChar {
                    at: doc.cursor(),
                    ch,
                    direction: Direction::Backward,
                });
            } else if let Some(at) = doc.join_with_previous() {
                undo.log(Edit::JoinLine {
                    at,
                    direction: Direction::Backward,
                });
                return Response::gutter(Origin::Below);
            }
        }
        KeyCode::Delete => {
            if let Some(ch) = doc.delete_after_cursor() {
                undo.log(Edit::DeleteChar {
                    at: doc.cursor(),
                    ch,
                    direction: Direction::Forward,
                });
            } else if let Some(at) = doc.join_with_next() {
                undo.log(Edit::JoinLine {
                    at,
                    direction: Direction::Forward,
                });
                return Response::gutter(Origin::Above);
            }
        }
        KeyCode::Enter => {
            let at = doc.split_at_cursor();
            undo.log(Edit::SplitLine { at });
            return Response::gutter(Origin::Above);
        }
        KeyCode::Up => {
            doc.move_up();
            return Response::gutter(Origin::Below);
        }
        KeyCode::Down => {
            doc.move_down();
            return Response::gutter(Origin::Above);
        }
        KeyCode::PageUp => {
            doc.page_up(page_rows);
            return Response::gutter(Origin::Below);
        }
        KeyCode::PageDown => {
            doc.page_down(page_rows);
            return Response::gutter(Origin::Above);
        }
        KeyCode::Left if key.is_word_modified() => doc.word_left(),
        KeyCode::Right if key.is_word_modified() => doc.word_right(),
        KeyCode::Left => {
            doc.move_left();
        }
        KeyCode::Right => {
            doc.move_right();
        }
        KeyCode::Home => doc.move_home(),
        KeyCode::End => doc.move_end(),
        _ => {}
    }
    Response::default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;
    use pretty_assertions::assert_eq;
    use q_keys::Modifiers;
    use std::fs;

    struct Fixture {
        dir: tempfile::TempDir,
        editor: Editor,
    }

    impl Fixture {
        /// Editor with one tab holding `text`.
        fn new(text: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("doc.txt");
            fs::write(&path, text).unwrap();
            let config = Config::default();
            let mut session = Session::new(&config);
            session.open(&path).unwrap();
            let editor = Editor::new(session, config, false);
            Self { dir, editor }
        }

        fn keys(&mut self, names: &[&str]) -> Response {
            let mut last = Response::default();
            for name in names {
                last = self.editor.handle_key(name.parse().unwrap());
            }
            last
        }

        fn typed(&mut self, text: &str) {
            for ch in text.chars() {
                self.editor.handle_key(KeyEvent::char(ch));
            }
        }

        fn text(&self) -> String {
            self.editor.session().active().unwrap().doc.text()
        }

        fn cursor(&self) -> Position {
            self.editor.session().active().unwrap().doc.cursor()
        }

        fn undo_len(&self) -> usize {
            self.editor.session().active().unwrap().undo.len()
        }
    }

    // -- Typing -------------------------------------------------------------

    #[test]
    fn typing_logs_one_record_per_char() {
        let mut fx = Fixture::new("");
        fx.typed("hi!");
        assert_eq!(fx.text(), "hi!");
        assert_eq!(fx.undo_len(), 3);
        fx.keys(&["ctrl q"]);
        assert_eq!(fx.text(), "hi");
    }

    #[test]
    fn tab_key_inserts_to_next_stop_as_one_record() {
        let mut fx = Fixture::new("");
        fx.typed("ab");
        fx.keys(&["tab"]);
        assert_eq!(fx.text(), "ab  ");
        assert_eq!(fx.cursor(), Position::new(0, 4));
        fx.keys(&["tab"]);
        assert_eq!(fx.text(), "ab      ");
        fx.keys(&["ctrl q"]);
        assert_eq!(fx.text(), "ab  ");
    }

    #[test]
    fn tab_key_uses_document_tab_width() {
        let mut fx = Fixture::new("");
        fx.editor.session_mut().active_mut().unwrap().doc.set_tab_width(2);
        fx.keys(&["tab"]);
        assert_eq!(fx.text(), "  ");
        assert_eq!(fx.editor.config().tab_width, 4);
    }

    #[test]
    fn shifted_char_is_typed() {
        let mut fx = Fixture::new("");
        fx.editor
            .handle_key(KeyEvent::new(KeyCode::Char('A'), Modifiers::SHIFT));
        assert_eq!(fx.text(), "A");
    }

    // -- Deletion and structure ---------------------------------------------

    #[test]
    fn backspace_at_line_start_joins_and_undoes_in_one_step() {
        let mut fx = Fixture::new("foo\nbar");
        fx.keys(&["down", "home"]);
        let r = fx.keys(&["backspace"]);
        assert_eq!(r.gutter, Some(Origin::Below));
        assert_eq!(fx.text(), "foobar");
        assert_eq!(fx.cursor(), Position::new(0, 3));
        fx.keys(&["ctrl q"]);
        assert_eq!(fx.text(), "foo\nbar");
        assert_eq!(fx.cursor(), Position::new(1, 0));
        assert_eq!(fx.undo_len(), 0);
    }

    #[test]
    fn backspace_at_document_start_is_noop() {
        let mut fx = Fixture::new("abc");
        fx.keys(&["backspace"]);
        assert_eq!(fx.text(), "abc");
        assert_eq!(fx.undo_len(), 0);
    }

    #[test]
    fn delete_at_line_end_joins_next() {
        let mut fx = Fixture::new("ab\ncd");
        fx.keys(&["end", "delete"]);
        assert_eq!(fx.text(), "abcd");
        fx.keys(&["ctrl q"]);
        assert_eq!(fx.text(), "ab\ncd");
        assert_eq!(fx.cursor(), Position::new(0, 2));
    }

    #[test]
    fn enter_splits_and_undo_rejoins() {
        let mut fx = Fixture::new("hello world");
        fx.keys(&["ctrl right"]);
        let r = fx.keys(&["enter"]);
        assert_eq!(r.gutter, Some(Origin::Above));
        assert_eq!(fx.text(), "hello\n world");
        fx.keys(&["ctrl q"]);
        assert_eq!(fx.text(), "hello world");
    }

    #[test]
    fn ctrl_backspace_deletes_word() {
        let mut fx = Fixture::new("say hello");
        fx.keys(&["end", "ctrl backspace"]);
        assert_eq!(fx.text(), "say ");
        fx.keys(&["ctrl q"]);
        assert_eq!(fx.text(), "say hello");
    }

    #[test]
    fn delline_and_undo() {
        let mut fx = Fixture::new("one\ntwo\nthree");
        fx.keys(&["down", "ctrl d"]);
        assert_eq!(fx.text(), "one\nthree");
        fx.keys(&["ctrl q"]);
        assert_eq!(fx.text(), "one\ntwo\nthree");
    }

    #[test]
    fn delline_on_sole_line_clears_it() {
        let mut fx = Fixture::new("only");
        fx.keys(&["ctrl d", "ctrl d"]);
        assert_eq!(fx.text(), "");
        fx.keys(&["ctrl q", "ctrl q"]);
        assert_eq!(fx.text(), "only");
    }

    #[test]
    fn undo_on_empty_log_reports() {
        let mut fx = Fixture::new("x");
        let r = fx.keys(&["ctrl q"]);
        assert_eq!(r.message.as_deref(), Some("nothing to undo"));
    }

    #[test]
    fn undo_of_stale_record_reports_drop() {
        let mut fx = Fixture::new("abc");
        let tab = fx.editor.session_mut().active_mut().unwrap();
        tab.undo.log(Edit::InsertChar { at: Position::new(5, 1), ch: 'x' });
        let r = fx.keys(&["ctrl q"]);
        assert_eq!(
            r.message.as_deref(),
            Some("undo record no longer applies, dropped")
        );
        assert_eq!(fx.undo_len(), 0);
        assert_eq!(fx.text(), "abc");
    }

    // -- Motion -------------------------------------------------------------

    #[test]
    fn arrows_wrap_lines() {
        let mut fx = Fixture::new("ab\ncd");
        fx.keys(&["end", "right"]);
        assert_eq!(fx.cursor(), Position::new(1, 0));
        fx.keys(&["left"]);
        assert_eq!(fx.cursor(), Position::new(0, 2));
    }

    #[test]
    fn meta_word_motion() {
        let mut fx = Fixture::new("foo bar");
        fx.keys(&["meta right", "meta right"]);
        assert_eq!(fx.cursor(), Position::new(0, 7));
        fx.keys(&["meta left"]);
        assert_eq!(fx.cursor(), Position::new(0, 4));
    }

    #[test]
    fn page_keys_use_page_rows() {
        let text = (0..10).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let mut fx = Fixture::new(&text);
        fx.editor.set_page_rows(4);
        fx.keys(&["page down"]);
        assert_eq!(fx.cursor().line, 4);
        fx.keys(&["page up"]);
        assert_eq!(fx.cursor().line, 0);
    }

    // -- Actions ------------------------------------------------------------

    #[test]
    fn save_writes_active_file() {
        let mut fx = Fixture::new("x");
        fx.typed("y  ");
        let r = fx.keys(&["ctrl s"]);
        assert!(r.message.unwrap().starts_with("saved"));
        let saved = fs::read_to_string(fx.dir.path().join("doc.txt")).unwrap();
        assert_eq!(saved, "y  x\n");
    }

    #[test]
    fn toggles_and_requests() {
        let mut fx = Fixture::new("");
        assert!(!fx.editor.layout());
        fx.keys(&["f1"]);
        assert!(fx.editor.layout());
        fx.keys(&["ctrl n"]);
        assert!(!fx.editor.line_numbers());
        assert_eq!(fx.keys(&["ctrl o"]).request, Some(Request::Open));
        assert_eq!(fx.keys(&["ctrl g"]).request, Some(Request::Terminal));
        assert_eq!(fx.keys(&["esc"]).request, Some(Request::Help));
        assert!(fx.keys(&["ctrl x"]).quit);
    }

    #[test]
    fn tab_navigation_and_close() {
        let mut fx = Fixture::new("first");
        let second = fx.dir.path().join("second.txt");
        fs::write(&second, "second").unwrap();
        fx.editor.session_mut().open(&second).unwrap();

        fx.keys(&["meta page down"]);
        assert_eq!(fx.text(), "first");
        fx.keys(&["meta page up"]);
        assert_eq!(fx.text(), "second");
        fx.keys(&["ctrl w"]);
        assert_eq!(fx.editor.session().len(), 1);
        assert_eq!(fx.text(), "first");
        let r = fx.keys(&["ctrl w"]);
        assert_eq!(r.message.as_deref(), Some("cannot close the last tab"));
    }

    #[test]
    fn config_tab_reloads_on_save() {
        let mut fx = Fixture::new("");
        let cfg = fx.dir.path().join("config.txt");
        fs::write(&cfg, "tabsize:4\n").unwrap();
        fx.editor = std::mem::replace(
            &mut fx.editor,
            Editor::new(Session::new(&Config::default()), Config::default(), false),
        )
        .with_config_path(&cfg);

        fx.keys(&["f5"]);
        assert_eq!(fx.editor.session().active_path(), Some(cfg.as_path()));
        // Rewrite the line as "tabsize:2" and save.
        fx.keys(&["ctrl d"]);
        fx.typed("tabsize:2");
        let r = fx.keys(&["ctrl s"]);
        assert_eq!(r.message.as_deref(), Some("config reloaded"));
        assert_eq!(fx.editor.config().tab_width, 2);

        fx.keys(&["ctrl d", "tab"]);
        assert_eq!(fx.text(), "  ");
    }

    #[test]
    fn config_reload_reports_diagnostics() {
        let mut fx = Fixture::new("");
        let cfg = fx.dir.path().join("config.txt");
        fs::write(&cfg, "header:white,plaid\n").unwrap();
        fx.editor = std::mem::replace(
            &mut fx.editor,
            Editor::new(Session::new(&Config::default()), Config::default(), false),
        )
        .with_config_path(&cfg);
        fx.keys(&["f5"]);
        let r = fx.keys(&["ctrl s"]);
        assert!(r.message.unwrap().contains("error on line 1"));
    }

    // -- Search mode --------------------------------------------------------

    #[test]
    fn search_mode_keys() {
        let mut fx = Fixture::new("foo bar\nbaz foo");
        fx.keys(&["ctrl f"]);
        assert!(fx.editor.is_searching());

        fx.typed("fo");
        assert_eq!(fx.cursor(), Position::new(0, 0));
        assert_eq!(fx.text(), "foo bar\nbaz foo", "typing goes to the find bar");

        let r = fx.keys(&["right"]);
        assert_eq!(r.gutter, Some(Origin::Above));
        assert_eq!(fx.cursor(), Position::new(1, 4));

        let r = fx.keys(&["left"]);
        assert_eq!(r.gutter, Some(Origin::Below));
        assert_eq!(fx.cursor(), Position::new(0, 0));

        fx.keys(&["backspace"]);
        assert_eq!(fx.editor.search().term(), "f");

        fx.keys(&["ctrl f"]);
        assert!(!fx.editor.is_searching());
        assert_eq!(fx.editor.search().term(), "");
    }

    #[test]
    fn search_reports_exhaustion() {
        let mut fx = Fixture::new("foo");
        fx.keys(&["ctrl f"]);
        fx.typed("foo");
        let r = fx.keys(&["right"]);
        assert!(r.message.unwrap().starts_with("no more matches"));
        assert_eq!(fx.cursor(), Position::new(0, 0));
    }

    // -- Shutdown -----------------------------------------------------------

    #[test]
    fn shutdown_writes_layout_flag() {
        let dir = tempfile::tempdir().unwrap();
        let start = dir.path().join("start.txt");
        fs::write(&start, "").unwrap();
        let tabs = dir.path().join("tabs.txt");
        let config = Config::default();
        let mut session = Session::new(&config);
        session.restore(&tabs, &start).unwrap();

        let mut editor = Editor::new(session, config, false);
        editor.handle_key("f1".parse().unwrap());
        editor.shutdown().unwrap();
        let written = fs::read_to_string(&tabs).unwrap();
        assert!(written.ends_with("\nTrue"));
    }
}
