use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort the program before the session loop starts.
///
/// Everything recoverable (a garbled sidecar file, a failed checkpoint
/// write) is absorbed where it happens and never reaches this type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot open practice text {}: {source}", path.display())]
    OpenSource { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}
