use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::metrics::{self, Metrics, Snapshot};
use crate::progress::ProgressStore;
use crate::source::LineSource;

/// A typing session over one practice text.
///
/// Owns the cursor, the transcript of typed rows, and the in-progress
/// input buffer, and drives the line source, the metrics engine, and the
/// progress store as the user types. All state lives on the calling
/// thread; the event loop feeds `write`/`backspace`/`skip` and renders
/// between events.
#[derive(Debug)]
pub struct Session {
    source: LineSource,
    progress: ProgressStore,
    metrics: Metrics,
    /// Completed rows; element 0 is a sentinel so `transcript[i + 1]`
    /// pairs with display row `i`.
    transcript: Vec<String>,
    /// The row currently being typed, not yet part of the transcript.
    typed: String,
    row: usize,
    col: usize,
    /// One-shot swallow of the key event that trails a skip.
    suppress_next: bool,
    started_at: Option<Instant>,
    finished: bool,
    viewport_rows: usize,
}

impl Session {
    /// Open a session over `path`, wrapping at `cols` and resuming from the
    /// offset recorded in the progress sidecar, if any.
    pub fn open(path: &Path, rows: u16, cols: u16) -> Result<Self, AppError> {
        let progress = ProgressStore::for_source(path);
        let source = LineSource::open(path, cols as usize, progress.last_saved())?;
        let mut session = Self {
            source,
            progress,
            metrics: Metrics::new(),
            transcript: vec![String::new()],
            typed: String::new(),
            row: 0,
            col: 0,
            suppress_next: false,
            started_at: None,
            finished: false,
            viewport_rows: rows as usize,
        };
        let capacity = session.buffer_capacity();
        session
            .source
            .ensure_buffered(0, capacity, &mut session.progress);
        session.finished = session.source.buffered() == 0;
        Ok(session)
    }

    /// Printable character typed at the cursor.
    pub fn write(&mut self, c: char) {
        if self.finished || self.suppressed() {
            return;
        }
        self.start_timer();
        self.typed.push(c);
        self.col += 1;
        let target_len = self
            .source
            .line(self.row)
            .map(|line| line.text.chars().count())
            .unwrap_or(0);
        if self.col == target_len {
            self.complete_row();
        }
    }

    /// Single-character undo; crossing the start of a row restores the
    /// previous row minus its last character. At the origin the cursor
    /// stays clamped.
    pub fn backspace(&mut self) {
        if self.finished || self.suppressed() {
            return;
        }
        self.start_timer();
        if self.col == 0 {
            if self.row > 0 {
                self.row -= 1;
                self.metrics.pop_row();
                let mut restored = self.transcript.pop().unwrap_or_default();
                restored.pop();
                self.col = restored.chars().count();
                self.typed = restored;
            }
        } else {
            self.col -= 1;
            self.typed.pop();
        }
    }

    /// Give up on the current row, advancing with whatever was typed. The
    /// next raw key event is swallowed so a skip never double-advances.
    pub fn skip(&mut self) {
        if self.finished || self.suppressed() {
            return;
        }
        self.start_timer();
        self.complete_row();
        self.suppress_next = true;
    }

    /// Shared row-complete transition for typing the final character and
    /// for an explicit skip.
    fn complete_row(&mut self) {
        let target = self
            .source
            .line(self.row)
            .map(|line| line.text.clone())
            .unwrap_or_default();
        self.metrics.push_row(&self.typed, &target);
        self.transcript.push(std::mem::take(&mut self.typed));
        self.row += 1;
        self.col = 0;
        let capacity = self.buffer_capacity();
        self.source
            .ensure_buffered(self.row, capacity, &mut self.progress);
        if self.row == self.source.buffered() {
            self.finished = true;
        }
    }

    fn suppressed(&mut self) -> bool {
        if self.suppress_next {
            self.suppress_next = false;
            return true;
        }
        false
    }

    fn start_timer(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Display lines kept ready beyond the cursor; one viewport row is
    /// reserved for the status line.
    fn buffer_capacity(&self) -> usize {
        self.viewport_rows.saturating_sub(1).max(1)
    }

    pub fn set_viewport_rows(&mut self, rows: u16) {
        self.viewport_rows = rows as usize;
        let capacity = self.buffer_capacity();
        self.source
            .ensure_buffered(self.row, capacity, &mut self.progress);
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// The in-progress input for the current row.
    pub fn typed(&self) -> &str {
        &self.typed
    }

    /// What the user typed for a completed display row.
    pub fn transcript_row(&self, row: usize) -> &str {
        self.transcript
            .get(row + 1)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn line_text(&self, row: usize) -> Option<&str> {
        self.source.line(row).map(|line| line.text.as_str())
    }

    pub fn buffered_lines(&self) -> usize {
        self.source.buffered()
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_finished(&self) -> bool {
        self.finished
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.metrics.snapshot()
    }

    pub fn wpm_now(&self) -> f64 {
        metrics::wpm(self.metrics.snapshot().effective_words, self.elapsed())
    }

    /// Last checkpointed byte offset into the source file.
    pub fn resume_offset(&self) -> u64 {
        self.progress.last_saved()
    }

    /// How far through the whole file the resume offset has advanced.
    pub fn completed_pct(&self) -> f64 {
        let total = self.source.total_len();
        if total == 0 {
            return 0.0;
        }
        self.resume_offset() as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn session_from(content: &str, rows: u16, cols: u16) -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.txt");
        fs::write(&path, content).unwrap();
        let session = Session::open(&path, rows, cols).unwrap();
        (dir, session)
    }

    fn type_str(session: &mut Session, text: &str) {
        for c in text.chars() {
            session.write(c);
        }
    }

    #[test]
    fn empty_source_is_finished_before_any_keystroke() {
        let (_dir, session) = session_from("", 24, 80);

        assert!(session.has_finished());
        assert!(!session.has_started());
        assert_eq!(session.buffered_lines(), 0);
    }

    #[test]
    fn typing_the_only_line_ends_the_session() {
        let (_dir, mut session) = session_from("hi\n", 24, 80);

        type_str(&mut session, "hi");

        assert!(session.has_finished());
        assert_eq!(session.transcript_row(0), "hi");
    }

    #[test]
    fn perfect_hello_world_run_scores_full_marks() {
        let (_dir, mut session) = session_from("hello world", 24, 80);

        type_str(&mut session, "hello world");

        assert!(session.has_finished());
        let snap = session.snapshot();
        assert_eq!(snap.accuracy, 1.0);
        assert_eq!(snap.effective_words, 2.0);
    }

    #[test]
    fn wrong_characters_advance_but_cost_accuracy() {
        let (_dir, mut session) = session_from("abc\nnext\n", 24, 80);

        type_str(&mut session, "axc");

        assert_eq!(session.row(), 1);
        let snap = session.snapshot();
        assert!(snap.accuracy < 1.0);
        assert!(snap.accuracy > 0.0);
    }

    #[test]
    fn first_write_starts_the_clock() {
        let (_dir, mut session) = session_from("abc\n", 24, 80);

        assert!(!session.has_started());
        session.write('a');
        assert!(session.has_started());
    }

    #[test]
    fn backspace_at_the_origin_clamps() {
        let (_dir, mut session) = session_from("abc\n", 24, 80);

        for _ in 0..3 {
            session.backspace();
        }

        assert_eq!(session.row(), 0);
        assert_eq!(session.col(), 0);
        assert_eq!(session.typed(), "");

        // still usable afterwards
        session.write('a');
        assert_eq!(session.col(), 1);
    }

    #[test]
    fn backspace_inside_a_row_drops_one_character() {
        let (_dir, mut session) = session_from("abc\n", 24, 80);

        session.write('a');
        session.write('x');
        session.backspace();

        assert_eq!(session.col(), 1);
        assert_eq!(session.typed(), "a");
    }

    #[test]
    fn backspace_across_a_row_boundary_restores_the_previous_row() {
        let (_dir, mut session) = session_from("alpha\nbeta\n", 24, 80);

        type_str(&mut session, "alpha");
        assert_eq!(session.row(), 1);
        assert_eq!(session.snapshot().accuracy, 1.0);

        session.backspace();

        assert_eq!(session.row(), 0);
        assert_eq!(session.col(), 4);
        assert_eq!(session.typed(), "alph");
        // the popped row no longer counts toward metrics
        assert_eq!(session.snapshot().accuracy, 0.0);
    }

    #[test]
    fn skip_completes_the_row_and_swallows_one_event() {
        let (_dir, mut session) = session_from("alpha\nbeta\n", 24, 80);

        session.skip();
        assert_eq!(session.row(), 1);
        assert_eq!(session.transcript_row(0), "");

        session.write('b');
        assert_eq!(session.col(), 0, "event right after a skip is swallowed");

        session.write('b');
        assert_eq!(session.col(), 1);
    }

    #[test]
    fn typing_and_skipping_produce_the_same_transition() {
        let (_dir, mut typed_session) = session_from("ab\ncd\n", 24, 80);
        let (_dir2, mut skipped_session) = session_from("ab\ncd\n", 24, 80);

        type_str(&mut typed_session, "ab");
        skipped_session.skip();

        assert_eq!(typed_session.row(), skipped_session.row());
        assert_eq!(typed_session.col(), skipped_session.col());
        assert_eq!(typed_session.transcript_row(0), "ab");
        assert_eq!(skipped_session.transcript_row(0), "");
    }

    #[test]
    fn passing_a_line_checkpoints_its_end_offset() {
        let (_dir, mut session) = session_from("alpha\nbeta\n", 24, 80);

        assert_eq!(session.resume_offset(), 0);
        type_str(&mut session, "alpha");

        // "alpha\n" is 6 bytes
        assert_eq!(session.resume_offset(), 6);
    }

    #[test]
    fn finishing_the_file_checkpoints_the_last_line() {
        let (_dir, mut session) = session_from("a\nb\n", 24, 80);

        session.skip();
        session.skip(); // swallowed
        session.skip();

        assert!(session.has_finished());
        assert_eq!(session.resume_offset(), 4);
        assert_eq!(session.completed_pct(), 100.0);
    }

    #[test]
    fn input_after_the_end_is_ignored() {
        let (_dir, mut session) = session_from("a\n", 24, 80);

        session.write('a');
        assert!(session.has_finished());

        session.write('z');
        session.backspace();
        session.skip();

        assert!(session.has_finished());
        assert_eq!(session.row(), 1);
    }

    #[test]
    fn lines_buffer_lazily_as_rows_advance() {
        let content = "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\n";
        let (_dir, mut session) = session_from(content, 4, 80);

        // viewport of 4 rows keeps 3 lines buffered past the cursor
        assert_eq!(session.buffered_lines(), 3);

        type_str(&mut session, "l1");
        assert_eq!(session.buffered_lines(), 4);
    }

    #[test]
    fn resuming_skips_passed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.txt");
        fs::write(&path, "alpha\nbeta\n").unwrap();

        let mut first = Session::open(&path, 24, 80).unwrap();
        type_str(&mut first, "alpha");
        drop(first);

        let second = Session::open(&path, 24, 80).unwrap();
        assert_eq!(second.line_text(0), Some("beta"));
    }

    #[test]
    fn garbled_sidecar_starts_from_the_top() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.txt");
        fs::write(&path, "alpha\nbeta\n").unwrap();
        fs::write(ProgressStore::sidecar_path(&path), "abc").unwrap();

        let session = Session::open(&path, 24, 80).unwrap();
        assert_eq!(session.line_text(0), Some("alpha"));
    }

    #[test]
    fn viewport_resize_only_grows_the_buffer() {
        let content = "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\n";
        let (_dir, mut session) = session_from(content, 4, 80);
        assert_eq!(session.buffered_lines(), 3);

        session.set_viewport_rows(6);
        assert_eq!(session.buffered_lines(), 5);

        session.set_viewport_rows(2);
        assert_eq!(session.buffered_lines(), 5, "shrinking never drops lines");
    }
}
