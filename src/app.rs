use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::audio::PlaybackEngine;
use crate::browser::FileBrowser;
use crate::dialog::Prompter;
use crate::error::AppError;
use crate::list::ScrollableList;
use crate::player::{Notice, Player};
use crate::playlist::Playlist;

const HELP: &str = "tab: switch pane | space: play/pause | n/N: next/previous | \
s: save playlist | q: quit | j/k/g/G: move | \
files: l descend, a add, r load playlist | \
playlist: l play, J/K move track, R shuffle";

/// Which pane receives list keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    FileExplorer,
    Playlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything the UI thread owns: both panes, the focus and the player.
pub struct App {
    pub mode: Mode,
    pub browser: FileBrowser,
    pub playlist: Playlist,
    pub player: Player,
}

impl App {
    pub fn new(browser: FileBrowser, engine: Box<dyn PlaybackEngine>) -> Self {
        Self {
            mode: Mode::default(),
            browser,
            playlist: Playlist::new(),
            player: Player::new(engine),
        }
    }

    pub fn apply(&mut self, notice: Notice) {
        self.player.apply(notice, &self.playlist);
    }

    pub fn handle_key(&mut self, key: KeyEvent, prompt: &mut dyn Prompter) -> Result<Flow, AppError> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('c') {
                return Ok(Flow::Quit);
            }
            return Ok(Flow::Continue);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(Flow::Quit),
            KeyCode::Tab => {
                self.mode = match self.mode {
                    Mode::FileExplorer => Mode::Playlist,
                    Mode::Playlist => Mode::FileExplorer,
                };
            }
            KeyCode::Char(' ') => self.player.toggle(&self.playlist),
            KeyCode::Char('n') => self.player.next(&self.playlist),
            KeyCode::Char('N') => self.player.previous(&self.playlist),
            KeyCode::Char('s') => self.save_playlist(prompt)?,
            KeyCode::Char('?') => prompt.alert("keys", HELP)?,
            _ => match self.mode {
                Mode::FileExplorer => self.handle_browser_key(key.code, prompt)?,
                Mode::Playlist => self.handle_playlist_key(key.code),
            },
        }
        Ok(Flow::Continue)
    }

    fn handle_browser_key(&mut self, code: KeyCode, prompt: &mut dyn Prompter) -> Result<(), AppError> {
        if move_cursor(self.browser.list_mut(), code) {
            return Ok(());
        }
        match code {
            KeyCode::Char('l') | KeyCode::Enter | KeyCode::Right => {
                let target = self.browser.selected_path();
                if let Err(source) = self.browser.enter_selected() {
                    return Err(AppError::UnreadableDirectory {
                        path: target.unwrap_or_else(|| self.browser.current_dir().to_path_buf()),
                        source,
                    });
                }
            }
            KeyCode::Char('a') => self.add_selected(prompt)?,
            KeyCode::Char('r') => self.load_selected(prompt)?,
            _ => {}
        }
        Ok(())
    }

    fn handle_playlist_key(&mut self, code: KeyCode) {
        if move_cursor(self.playlist.list_mut(), code) {
            return;
        }
        match code {
            KeyCode::Char('l') | KeyCode::Enter => {
                let index = self.playlist.list().cursor();
                self.player.play(&self.playlist, index);
            }
            KeyCode::Char('K') => self.move_track(-1),
            KeyCode::Char('J') => self.move_track(1),
            KeyCode::Char('R') => {
                self.playlist.shuffle();
                info!(tracks = self.playlist.len(), "playlist shuffled");
            }
            _ => {}
        }
    }

    fn move_track(&mut self, delta: isize) {
        if let Some((from, to)) = self.playlist.move_selected(delta) {
            self.player.track_moved(from, to);
        }
    }

    /// Queues the selected file, or every playable file under the selected
    /// directory. Anything else is ignored.
    fn add_selected(&mut self, prompt: &mut dyn Prompter) -> Result<(), AppError> {
        match self.browser.collect_selected() {
            Ok(found) => {
                let added = found.into_iter().filter(|path| self.playlist.add(path.clone())).count();
                if added > 0 {
                    info!(added, "tracks queued");
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "cannot collect tracks");
                prompt.alert("error", &format!("file error: {e}"))
            }
        }
    }

    fn load_selected(&mut self, prompt: &mut dyn Prompter) -> Result<(), AppError> {
        let Some(path) = self.browser.selected_path() else {
            return Ok(());
        };
        if !self.playlist.is_empty() {
            let question = format!(
                "are you sure you want to read {} and overwrite the current playlist?",
                path.display()
            );
            if !prompt.confirm("are you sure?", &question)? {
                return Ok(());
            }
        }
        self.load_playlist(&path, prompt)
    }

    /// Replaces the playlist with the one stored at `path`. On failure the
    /// current playlist is kept and the reason is shown.
    pub fn load_playlist(&mut self, path: &Path, prompt: &mut dyn Prompter) -> Result<(), AppError> {
        match Playlist::read_file(path) {
            Ok(tracks) => {
                info!(path = %path.display(), tracks = tracks.len(), "playlist loaded");
                self.playlist = Playlist::from_tracks(tracks);
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "playlist not loaded");
                prompt.alert("error", &e.to_string())
            }
        }
    }

    fn save_playlist(&mut self, prompt: &mut dyn Prompter) -> Result<(), AppError> {
        let seed = self.browser.current_dir().display().to_string();
        let Some(target) = prompt.input(
            "save playlist to file",
            "enter the desired playlist location:",
            &seed,
        )?
        else {
            return Ok(());
        };
        if let Err(e) = self.playlist.save(Path::new(&target)) {
            warn!(path = %target, error = %e, "playlist not saved");
            prompt.alert("error", &e.to_string())?;
        }
        Ok(())
    }
}

/// Shared list movement keys. Returns whether the key was one of them.
fn move_cursor<T>(list: &mut ScrollableList<T>, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('j') | KeyCode::Down => list.move_down(),
        KeyCode::Char('k') | KeyCode::Up => list.move_up(),
        KeyCode::Char('g') | KeyCode::Home => list.jump_first(),
        KeyCode::Char('G') | KeyCode::End => list.jump_last(),
        _ => return false,
    }
    true
}
