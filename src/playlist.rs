use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::list::ScrollableList;

/// First line of every playlist file.
pub const HEADER: &str = "_MPVQ_PLIST_";

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("file error: {0}")]
    Io(#[from] io::Error),

    #[error("this file is not a playlist")]
    NotAPlaylist,

    #[error("this playlist file is corrupted (declares {declared} tracks, found {found})")]
    Corrupted { declared: usize, found: usize },

    #[error("this playlist file is corrupted (bad track count {0:?})")]
    BadCount(String),
}

/// Ordered, duplicate-free track paths, scrolled as the playlist pane.
#[derive(Debug, Default)]
pub struct Playlist {
    tracks: ScrollableList<PathBuf>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a playlist from `tracks`, keeping only the first occurrence of
    /// a repeated path.
    pub fn from_tracks(tracks: Vec<PathBuf>) -> Self {
        let total = tracks.len();
        let mut seen = HashSet::with_capacity(total);
        let tracks: Vec<PathBuf> = tracks
            .into_iter()
            .filter(|track| seen.insert(track.clone()))
            .collect();
        if tracks.len() < total {
            debug!(dropped = total - tracks.len(), "duplicate tracks dropped");
        }
        Self {
            tracks: ScrollableList::from_items(tracks),
        }
    }

    /// Appends `path` unless it is already queued. Returns whether it was added.
    pub fn add(&mut self, path: PathBuf) -> bool {
        if self.tracks.items().contains(&path) {
            return false;
        }
        info!(track = %path.display(), "added to playlist");
        self.tracks.push(path);
        true
    }

    /// Moves the selected track one slot up (`-1`) or down (`+1`) and keeps
    /// the cursor on it. Returns the `(from, to)` slots when something moved.
    pub fn move_selected(&mut self, delta: isize) -> Option<(usize, usize)> {
        let from = self.tracks.shift_selected(delta)?;
        Some((from, self.tracks.cursor()))
    }

    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    /// Uniform permutation of all tracks. Cursor and scroll are left alone.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.tracks.items_mut().shuffle(rng);
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.tracks.items().get(index).map(PathBuf::as_path)
    }

    pub fn tracks(&self) -> &[PathBuf] {
        self.tracks.items()
    }

    pub fn list(&self) -> &ScrollableList<PathBuf> {
        &self.tracks
    }

    pub fn list_mut(&mut self) -> &mut ScrollableList<PathBuf> {
        &mut self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Reads the track list stored at `path`. The playlist itself is not
    /// touched; callers build a new playlist from the result.
    pub fn read_file(path: &Path) -> Result<Vec<PathBuf>, PlaylistError> {
        let file = File::open(path)?;
        read_tracks(BufReader::new(file))
    }

    pub fn save(&self, path: &Path) -> Result<(), PlaylistError> {
        let mut out = BufWriter::new(File::create(path)?);
        write_tracks(&mut out, self.tracks())?;
        out.flush()?;
        info!(path = %path.display(), tracks = self.len(), "playlist saved");
        Ok(())
    }
}

/// Parses the header line, the decimal count and that many path lines.
/// Paths are raw bytes up to the newline. Lines past the declared count are
/// ignored.
pub fn read_tracks<R: BufRead>(reader: R) -> Result<Vec<PathBuf>, PlaylistError> {
    let mut lines = reader.split(b'\n');

    match lines.next().transpose()? {
        Some(line) if strip_cr(&line) == HEADER.as_bytes() => {}
        _ => return Err(PlaylistError::NotAPlaylist),
    }

    let declared = match lines.next().transpose()? {
        Some(line) => {
            let count = String::from_utf8_lossy(strip_cr(&line)).trim().to_string();
            match count.parse::<usize>() {
                Ok(n) => n,
                Err(_) => return Err(PlaylistError::BadCount(count)),
            }
        }
        None => return Err(PlaylistError::BadCount(String::new())),
    };

    let mut tracks = Vec::with_capacity(declared.min(4096));
    for line in lines.take(declared) {
        let line = line?;
        tracks.push(PathBuf::from(OsStr::from_bytes(strip_cr(&line))));
    }
    if tracks.len() < declared {
        return Err(PlaylistError::Corrupted {
            declared,
            found: tracks.len(),
        });
    }
    Ok(tracks)
}

pub fn write_tracks<W: Write>(out: &mut W, tracks: &[PathBuf]) -> io::Result<()> {
    writeln!(out, "{HEADER}")?;
    writeln!(out, "{}", tracks.len())?;
    for track in tracks {
        out.write_all(track.as_os_str().as_bytes())?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
