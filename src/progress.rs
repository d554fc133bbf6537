use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resume-offset store backed by a sidecar file next to the practice text.
///
/// The sidecar is named `~<basename>` and holds a single decimal byte
/// offset: the end of the last logical line the user fully passed. A
/// missing or garbled sidecar reads as offset 0 (fresh start).
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
    last_saved: u64,
}

impl ProgressStore {
    /// Sidecar path convention: same directory, `~` prepended to the name.
    pub fn sidecar_path(source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        source.with_file_name(format!("~{name}"))
    }

    pub fn for_source(source: &Path) -> Self {
        Self::with_path(Self::sidecar_path(source))
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let last_saved = read_offset(&path);
        Self { path, last_saved }
    }

    /// Offset read at construction, or written by the latest successful
    /// `save`.
    pub fn last_saved(&self) -> u64 {
        self.last_saved
    }

    /// Re-read the sidecar from disk. Missing file or non-numeric content
    /// yields 0.
    pub fn load(&self) -> u64 {
        read_offset(&self.path)
    }

    /// Overwrite the sidecar with `offset`. Offsets at or below the last
    /// saved value are ignored; the resume position never regresses.
    pub fn save(&mut self, offset: u64) -> io::Result<()> {
        if offset <= self.last_saved {
            return Ok(());
        }
        fs::write(&self.path, offset.to_string())?;
        self.last_saved = offset;
        Ok(())
    }
}

fn read_offset(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0)
}
