use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use crate::audio::{EndReason, EngineEvent, PlaybackEngine};
use crate::playlist::Playlist;

/// Bounded wait of the listener on the engine's event stream.
pub const LISTENER_POLL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Playing,
    Paused,
    Idle,
}

/// Transition requests posted by the listener thread and applied by the UI
/// loop, which is the only code that touches the playlist and player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    TrackFinished,
}

/// Which track is current and whether it is sounding. Every command to the
/// engine is sent optimistically; the state is only corrected by a later
/// [`Notice`].
pub struct Player {
    state: PlayerState,
    current: usize,
    engine: Box<dyn PlaybackEngine>,
}

impl Player {
    pub fn new(engine: Box<dyn PlaybackEngine>) -> Self {
        Self {
            state: PlayerState::Idle,
            current: 0,
            engine,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Starts the track at `index`, whatever the current state.
    pub fn play(&mut self, playlist: &Playlist, index: usize) {
        let Some(track) = playlist.get(index) else {
            return;
        };
        self.current = index;
        self.state = PlayerState::Playing;
        info!(index, track = %track.display(), "playing");
        self.engine.load_and_play(track);
    }

    pub fn toggle(&mut self, playlist: &Playlist) {
        match self.state {
            PlayerState::Playing => {
                self.state = PlayerState::Paused;
                self.engine.pause();
            }
            PlayerState::Paused => {
                self.state = PlayerState::Playing;
                self.engine.resume();
            }
            PlayerState::Idle => {
                if playlist.is_empty() {
                    return;
                }
                let start = if self.current < playlist.len() { self.current } else { 0 };
                self.play(playlist, start);
            }
        }
    }

    pub fn next(&mut self, playlist: &Playlist) {
        if self.current + 1 < playlist.len() {
            self.play(playlist, self.current + 1);
        }
    }

    pub fn previous(&mut self, playlist: &Playlist) {
        if let Some(prev) = self.current.checked_sub(1) {
            if prev < playlist.len() {
                self.play(playlist, prev);
            }
        }
    }

    /// Advances after a track played out, or goes idle at the end.
    pub fn track_finished(&mut self, playlist: &Playlist) {
        if self.state == PlayerState::Idle {
            debug!("end of track while idle, ignored");
            return;
        }
        if self.current + 1 < playlist.len() {
            self.play(playlist, self.current + 1);
        } else {
            info!("end of playlist");
            self.state = PlayerState::Idle;
            self.current = 0;
        }
    }

    /// Keeps the current index on the same track after the playlist swapped
    /// the items at `from` and `to`.
    pub fn track_moved(&mut self, from: usize, to: usize) {
        if self.state == PlayerState::Idle {
            return;
        }
        if self.current == from {
            self.current = to;
        } else if self.current == to {
            self.current = from;
        }
    }

    pub fn apply(&mut self, notice: Notice, playlist: &Playlist) {
        match notice {
            Notice::TrackFinished => self.track_finished(playlist),
        }
    }
}

/// Starts the thread that waits on engine events and forwards natural
/// end-of-track events as [`Notice`]s. It runs until either channel closes.
pub fn spawn_listener(
    events: Receiver<EngineEvent>,
    notices: Sender<Notice>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("listener".into())
        .spawn(move || listen(&events, &notices, LISTENER_POLL))
}

fn listen(events: &Receiver<EngineEvent>, notices: &Sender<Notice>, poll: Duration) {
    loop {
        match events.recv_timeout(poll) {
            Ok(EngineEvent::EndOfFile(EndReason::Eof)) => {
                if notices.send(Notice::TrackFinished).is_err() {
                    return;
                }
            }
            Ok(EngineEvent::EndOfFile(reason)) => debug!(?reason, "end of file ignored"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
