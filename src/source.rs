use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use itertools::Itertools;

use crate::error::AppError;
use crate::progress::ProgressStore;

/// One wrapped, viewport-width-bounded piece of a logical source line.
///
/// `end_offset` is the byte position just past the logical line this piece
/// came from; every piece wrapped from the same logical line carries the
/// same offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub text: String,
    pub end_offset: u64,
}

/// Streams the practice text, producing wrapped display lines on demand.
///
/// Lines are appended to a growing buffer and never mutated or dropped;
/// the session indexes into it by row. Reading stops permanently once the
/// file is exhausted.
#[derive(Debug)]
pub struct LineSource {
    reader: BufReader<File>,
    lines: Vec<DisplayLine>,
    width: usize,
    pos: u64,
    total_len: u64,
    exhausted: bool,
}

impl LineSource {
    /// Open `path` and position the stream at `start` (clamped to the file
    /// length), typically the offset loaded from the progress sidecar.
    pub fn open(path: &Path, width: usize, start: u64) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|source| AppError::OpenSource {
            path: path.to_path_buf(),
            source,
        })?;
        let total_len = file.metadata()?.len();
        let start = start.min(total_len);
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(start))?;
        Ok(Self {
            reader,
            lines: Vec::new(),
            width: width.max(1),
            pos: start,
            total_len,
            exhausted: false,
        })
    }

    /// Total size of the backing file in bytes.
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    pub fn line(&self, row: usize) -> Option<&DisplayLine> {
        self.lines.get(row)
    }

    pub fn lines(&self) -> &[DisplayLine] {
        &self.lines
    }

    /// Number of display lines buffered so far.
    pub fn buffered(&self) -> usize {
        self.lines.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Top up the buffer so at least `capacity` display lines exist beyond
    /// `through_row`, reading further logical lines as needed.
    ///
    /// Entering a row is what marks the one above it as passed, so the
    /// checkpoint for `through_row - 1` happens here before any reading.
    /// A failed sidecar write is dropped; the same offset is offered again
    /// on the next call.
    pub fn ensure_buffered(
        &mut self,
        through_row: usize,
        capacity: usize,
        progress: &mut ProgressStore,
    ) {
        if through_row >= 1 {
            if let Some(passed) = self.lines.get(through_row - 1) {
                if passed.end_offset > progress.last_saved() {
                    let _ = progress.save(passed.end_offset);
                }
            }
        }
        while !self.exhausted && self.lines.len().saturating_sub(through_row) < capacity {
            self.read_logical_line();
        }
    }

    fn read_logical_line(&mut self) {
        let mut raw = String::new();
        match self.reader.read_line(&mut raw) {
            Ok(0) | Err(_) => {
                self.exhausted = true;
            }
            Ok(consumed) => {
                self.pos += consumed as u64;
                let normalized = normalize(&raw);
                if normalized.is_empty() {
                    return;
                }
                let end_offset = self.pos;
                for piece in textwrap::wrap(&normalized, self.width) {
                    self.lines.push(DisplayLine {
                        text: piece.into_owned(),
                        end_offset,
                    });
                }
            }
        }
    }
}

/// Collapse runs of spaces and trim token edges. Tabs inside a token are
/// left alone.
fn normalize(line: &str) -> String {
    line.split(' ')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .join(" ")
}
