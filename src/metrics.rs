use regex::Regex;
use std::time::Duration;

/// Comparison sums for one completed row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowTally {
    /// Characters that matched the target, position by position.
    pub correct: usize,
    /// Full length of the target line.
    pub total: usize,
    /// `\w+` words found in the typed text, right or wrong.
    pub words: usize,
}

/// Cumulative figures derived from the transcript so far.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    /// Accuracy-discounted word count, the basis for wpm.
    pub effective_words: f64,
    /// Matched characters over all target characters compared, in `0..=1`.
    pub accuracy: f64,
}

/// Accuracy and word-count engine over completed rows.
///
/// One tally is kept per completed row, pushed at row-complete and popped
/// when the user backspaces across a row boundary, so `snapshot` folds a
/// short vector instead of re-diffing the whole transcript. The result is
/// identical to recomputing from scratch every key event.
#[derive(Debug)]
pub struct Metrics {
    word_re: Regex,
    tallies: Vec<RowTally>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            word_re: Regex::new(r"\w+").expect("word pattern is valid"),
            tallies: Vec::new(),
        }
    }

    /// Diff one typed row against its target line.
    ///
    /// Characters are compared only up to the shorter of the two lengths;
    /// `total` always counts the full target. Overlong typed text therefore
    /// still grows the raw word count while the comparison stops early.
    pub fn row_tally(&self, typed: &str, target: &str) -> RowTally {
        let correct = typed
            .chars()
            .zip(target.chars())
            .filter(|(typed_char, target_char)| typed_char == target_char)
            .count();
        RowTally {
            correct,
            total: target.chars().count(),
            words: self.word_re.find_iter(typed).count(),
        }
    }

    /// Record the tally for a row that just completed.
    pub fn push_row(&mut self, typed: &str, target: &str) {
        let tally = self.row_tally(typed, target);
        self.tallies.push(tally);
    }

    /// Forget the most recent row (backspace across a row boundary).
    pub fn pop_row(&mut self) {
        self.tallies.pop();
    }

    pub fn completed_rows(&self) -> usize {
        self.tallies.len()
    }

    /// Fold the tallies into accuracy and effective word count.
    ///
    /// Both are 0.0 until at least one target character has been compared.
    pub fn snapshot(&self) -> Snapshot {
        let (correct, total, words) =
            self.tallies
                .iter()
                .fold((0usize, 0usize, 0usize), |(c, t, w), tally| {
                    (c + tally.correct, t + tally.total, w + tally.words)
                });
        if total == 0 {
            return Snapshot::default();
        }
        let accuracy = correct as f64 / total as f64;
        Snapshot {
            effective_words: accuracy * words as f64,
            accuracy,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Words per minute from the effective word count.
///
/// `elapsed` is measured from the first accepted keystroke; before that the
/// rate is defined as zero.
pub fn wpm(effective_words: f64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    60.0 * effective_words / secs
}
