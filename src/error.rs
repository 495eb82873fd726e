use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Conditions that end the program. Everything else is shown in an alert.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal too small ({width}x{height}, need at least {min_width}x{min_height})")]
    TerminalTooSmall {
        width: u16,
        height: u16,
        min_width: u16,
        min_height: u16,
    },

    #[error("cannot read directory {}: {source}", path.display())]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("terminal i/o: {0}")]
    Io(#[from] io::Error),
}
