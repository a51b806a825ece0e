// SPDX-License-Identifier: MIT
//
// quire: a multi-tab text editor core, driven headlessly.
//
// This binary wires the crates together:
//
//   q-keys   → key events and key names
//   q-config → config file: keybindings, palette, tab width
//   q-editor → documents, undo, tabs, search, key dispatch
//
// Instead of a terminal UI it replays key names read from stdin, one per
// line, through the editor. Each key flows through:
//
//   stdin → KeyEvent::from_str → Editor::handle_key → Response → stdout
//
// Files:
//
//   <config>/config.txt     created with the defaults when missing
//   <state>/start_up.txt    default document when no tabs survive
//   <state>/tabs.txt        open tabs, rewritten on every open/close
//   <state>/quire.log       tracing output (RUST_LOG, default info)
//
// If the loop fails or panics, tabs.txt is reset to the start document so
// the next launch begins clean.

use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process;

use q_config::{Action, Config};
use q_editor::{Editor, Request, Session, persist};
use q_keys::KeyEvent;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

const CONFIG_FILE: &str = "config.txt";
const START_FILE: &str = "start_up.txt";
const TABS_FILE: &str = "tabs.txt";
const LOG_FILE: &str = "quire.log";

const USAGE: &str = "usage: quire [--config FILE] [--state DIR] [FILE...]";

// ─── Arguments ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    state: Option<PathBuf>,
    files: Vec<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut out = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().ok_or("--config needs a file")?;
                out.config = Some(PathBuf::from(value));
            }
            "--state" => {
                let value = args.next().ok_or("--state needs a directory")?;
                out.state = Some(PathBuf::from(value));
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ => out.files.push(PathBuf::from(arg)),
        }
    }
    Ok(out)
}

/// Resolved file locations.
#[derive(Debug)]
struct Paths {
    config: PathBuf,
    start: PathBuf,
    tabs: PathBuf,
    state: PathBuf,
}

impl Paths {
    fn resolve(args: &Args) -> Self {
        let base = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quire");
        let state = args.state.clone().unwrap_or_else(|| base.clone());
        let config = args.config.clone().unwrap_or_else(|| base.join(CONFIG_FILE));
        Self {
            config,
            start: state.join(START_FILE),
            tabs: state.join(TABS_FILE),
            state,
        }
    }
}

// ─── Setup ──────────────────────────────────────────────────────────────────

/// Log to `<state>/quire.log`. The guard flushes on drop.
///
/// Fails if a global subscriber is already installed.
fn init_tracing(state: &Path) -> Result<WorkerGuard, TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let appender = tracing_appender::rolling::never(state, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;
    Ok(guard)
}

/// Create the config file with the defaults if it does not exist.
fn ensure_config(path: &Path) -> io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, Config::default().render())
}

/// Create the start document if it does not exist.
fn ensure_start(path: &Path, config: &Config) -> io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, welcome_text(config))
}

fn welcome_text(config: &Config) -> String {
    let mut text = String::from("Welcome to quire.\n\n");
    for action in Action::ALL {
        let key = config.keymap.key_for(action);
        text.push_str(&format!("{:<10}{key}\n", action.name()));
    }
    text
}

// ─── Replay loop ────────────────────────────────────────────────────────────

/// Feed key names from `input` to the editor until EOF or the exit key.
/// Blank lines and `#` comments are skipped. Returns whether exit was
/// pressed.
fn replay(editor: &mut Editor, input: impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    for line in input.lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        let key: KeyEvent = match name.parse() {
            Ok(key) => key,
            Err(e) => {
                warn!(name, "bad key name");
                writeln!(out, "{e}")?;
                continue;
            }
        };

        let response = editor.handle_key(key);
        if let Some(message) = &response.message {
            writeln!(out, "{message}")?;
        }
        if let Some(request) = response.request {
            // No file browser, terminal or help screen here.
            debug!(?request, "request ignored");
            writeln!(out, "{}", request_name(request))?;
        }
        if response.quit {
            return Ok(true);
        }
    }
    Ok(false)
}

const fn request_name(request: Request) -> &'static str {
    match request {
        Request::Open => "open: not available",
        Request::Terminal => "terminal: not available",
        Request::Help => "help: not available",
    }
}

/// Load the config, restore the session and replay `input`. Problems with
/// the config file or the files named on the command line are reported and
/// skipped; only a broken session or I/O failure ends the run.
fn run(
    args: &Args,
    paths: &Paths,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let config = match Config::load(&paths.config) {
        Ok(parsed) => {
            for diag in &parsed.diagnostics {
                eprintln!("quire: {}: {diag}", paths.config.display());
            }
            parsed.config
        }
        Err(e) => {
            warn!(error = %e, "using default config");
            eprintln!("quire: {e}; using defaults");
            Config::default()
        }
    };
    ensure_start(&paths.start, &config)?;

    let mut session = Session::new(&config);
    let layout = session.restore(&paths.tabs, &paths.start)?;
    for file in &args.files {
        if let Err(e) = session.open(file) {
            warn!(error = %e, "skipping file");
            eprintln!("quire: {e}");
        }
    }
    info!(tabs = session.len(), "session ready");

    let mut editor = Editor::new(session, config, layout).with_config_path(&paths.config);
    let quit = replay(&mut editor, input, out)?;
    debug!(quit, "replay finished");

    editor.shutdown()?;
    Ok(())
}

/// [`run`], with errors and panics caught. On failure the tabs file is reset
/// to the start document and the reason is returned.
fn run_guarded(
    args: &Args,
    paths: &Paths,
    input: impl BufRead,
    out: &mut impl Write,
) -> Option<String> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(args, paths, input, out)));
    let reason = match outcome {
        Ok(Ok(())) => return None,
        Ok(Err(e)) => e.to_string(),
        Err(_) => "panicked".to_string(),
    };
    tracing::error!(reason = %reason, "editor failed, resetting tabs");
    if let Err(e) = persist::write_fallback(&paths.tabs, &paths.start) {
        eprintln!("quire: {e}");
    }
    Some(reason)
}

fn main() {
    let args = parse_args(env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("quire: {e}");
        process::exit(2);
    });
    let paths = Paths::resolve(&args);

    if let Err(e) = fs::create_dir_all(&paths.state).and_then(|()| ensure_config(&paths.config)) {
        eprintln!("quire: failed to prepare {}: {e}", paths.state.display());
        process::exit(1);
    }
    let guard = match init_tracing(&paths.state) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("quire: could not initialize logging: {e}");
            None
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    if let Some(reason) = run_guarded(&args, &paths, stdin.lock(), &mut stdout) {
        eprintln!("quire: {reason}");
        drop(guard);
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
