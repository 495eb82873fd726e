use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How often the engine thread checks whether the current track drained.
const DRAIN_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no audio output device: {0}")]
    NoOutput(String),

    #[error("failed to create sink: {0}")]
    Sink(String),

    #[error("audio thread exited during startup")]
    ThreadGone,
}

/// Why a track stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Played through to the end.
    Eof,
    /// Replaced by another track.
    Stop,
    /// Could not be opened or decoded.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    EndOfFile(EndReason),
}

/// Fire-and-forget playback commands. Failures surface only as
/// [`EngineEvent::EndOfFile`] with [`EndReason::Error`].
pub trait PlaybackEngine {
    fn load_and_play(&self, path: &Path);
    fn pause(&self);
    fn resume(&self);
}

#[derive(Debug)]
enum Command {
    Load(PathBuf),
    Pause,
    Resume,
}

/// Handle to a rodio output running on its own thread.
pub struct AudioEngine {
    commands: Sender<Command>,
}

impl AudioEngine {
    /// Opens the default output device and returns the engine together with
    /// its event stream.
    pub fn spawn() -> Result<(Self, Receiver<EngineEvent>), EngineError> {
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);

        thread::Builder::new()
            .name("audio".into())
            .spawn(move || {
                // OutputStream is not Send, so it has to be opened here.
                let (stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(EngineError::NoOutput(e.to_string())));
                        return;
                    }
                };
                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = ready_tx.send(Err(EngineError::Sink(e.to_string())));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                run_output(stream, handle, sink, command_rx, event_tx);
            })
            .map_err(|_| EngineError::ThreadGone)?;

        ready_rx.recv().map_err(|_| EngineError::ThreadGone)??;
        info!("audio output ready");
        Ok((Self { commands: command_tx }, event_rx))
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("audio thread is gone, command dropped");
        }
    }
}

impl PlaybackEngine for AudioEngine {
    fn load_and_play(&self, path: &Path) {
        self.send(Command::Load(path.to_path_buf()));
    }

    fn pause(&self) {
        self.send(Command::Pause);
    }

    fn resume(&self) {
        self.send(Command::Resume);
    }
}

fn run_output(
    _stream: OutputStream,
    handle: OutputStreamHandle,
    mut sink: Sink,
    commands: Receiver<Command>,
    events: Sender<EngineEvent>,
) {
    let mut loaded = false;
    loop {
        match commands.recv_timeout(DRAIN_POLL) {
            Ok(Command::Load(path)) => {
                if loaded {
                    let _ = events.send(EngineEvent::EndOfFile(EndReason::Stop));
                }
                // A fresh sink per track; dropping the old one stops it.
                sink = match Sink::try_new(&handle) {
                    Ok(fresh) => fresh,
                    Err(e) => {
                        warn!(error = %e, "failed to create sink");
                        loaded = false;
                        let _ = events.send(EngineEvent::EndOfFile(EndReason::Error));
                        continue;
                    }
                };
                match open_source(&path) {
                    Ok(source) => {
                        sink.append(source);
                        sink.play();
                        loaded = true;
                        debug!(track = %path.display(), "loaded");
                    }
                    Err(e) => {
                        warn!(track = %path.display(), error = %e, "cannot play file");
                        loaded = false;
                        let _ = events.send(EngineEvent::EndOfFile(EndReason::Error));
                    }
                }
            }
            Ok(Command::Pause) => sink.pause(),
            Ok(Command::Resume) => sink.play(),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if loaded && sink.empty() {
            loaded = false;
            if events.send(EngineEvent::EndOfFile(EndReason::Eof)).is_err() {
                break;
            }
        }
    }
    debug!("audio thread stopped");
}

fn open_source(path: &Path) -> Result<Decoder<BufReader<File>>, String> {
    let file = File::open(path).map_err(|e| format!("failed to open file: {e}"))?;
    Decoder::new(BufReader::new(file)).map_err(|e| format!("failed to decode audio: {e}"))
}
