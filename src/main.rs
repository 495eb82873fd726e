mod app;
mod audio;
mod browser;
mod dialog;
mod error;
mod list;
mod player;
mod playlist;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use app::{App, Flow};
use audio::AudioEngine;
use browser::FileBrowser;
use clap::Parser;
use crossbeam_channel::{unbounded, Receiver};
use crossterm::event::{self, Event, KeyEventKind};
use dialog::TerminalPrompter;
use error::AppError;
use player::Notice;
use ratatui::symbols::border;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use ui::Tui;

/// How long the UI waits for a key before checking for player notices.
const INPUT_POLL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "playq", version)]
#[command(about = "Build a playlist from the file tree and play it")]
struct Args {
    /// Playlist file to load at startup
    playlist: Option<PathBuf>,

    /// Draw borders with ASCII characters instead of box drawing
    #[arg(short, long)]
    ascii: bool,
}

fn init_logging() -> Result<WorkerGuard> {
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playq");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::never(&log_dir, "playq.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_logging()?;
    info!("playq starting");

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let browser = FileBrowser::open(&cwd).map_err(|source| AppError::UnreadableDirectory {
        path: cwd.clone(),
        source,
    })?;

    let (engine, events) = AudioEngine::spawn()?;
    let (notice_tx, notice_rx) = unbounded();
    // Detached: it ends with the process, or earlier once the engine is gone.
    player::spawn_listener(events, notice_tx).context("cannot start listener thread")?;

    let mut app = App::new(browser, Box::new(engine));
    let borders = ui::borders(args.ascii);

    ui::set_panic_hook();
    let mut terminal = ui::init()?;
    let result = run(&mut terminal, &mut app, &notice_rx, borders, args.playlist.as_deref());
    let result = settle(result, ui::restore());

    if let Err(e) = &result {
        error!(error = %e, "fatal");
    }
    info!("playq stopped");
    result.map_err(Into::into)
}

/// Folds the terminal restore into the run result. An error from the run
/// itself is what gets reported.
fn settle(result: Result<(), AppError>, restored: io::Result<()>) -> Result<(), AppError> {
    if let Err(e) = &restored {
        warn!(error = %e, "cannot restore terminal");
    }
    result.and(restored.map_err(AppError::from))
}

fn run(
    terminal: &mut Tui,
    app: &mut App,
    notices: &Receiver<Notice>,
    borders: border::Set,
    startup_playlist: Option<&Path>,
) -> Result<(), AppError> {
    ui::ensure_min_size(terminal.size()?)?;
    if let Some(path) = startup_playlist {
        app.load_playlist(path, &mut TerminalPrompter { terminal: &mut *terminal, borders })?;
    }

    let mut needs_redraw = true;
    loop {
        for notice in notices.try_iter() {
            app.apply(notice);
            needs_redraw = true;
        }

        if needs_redraw {
            ui::ensure_min_size(terminal.size()?)?;
            terminal.draw(|f| ui::draw(f, app, borders))?;
            needs_redraw = false;
        }

        if !event::poll(INPUT_POLL)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                needs_redraw = true;
                let mut prompt = TerminalPrompter { terminal: &mut *terminal, borders };
                if app.handle_key(key, &mut prompt)? == Flow::Quit {
                    break;
                }
            }
            Event::Resize(..) => {
                terminal.autoresize()?;
                needs_redraw = true;
            }
            _ => {}
        }
    }
    Ok(())
}
