use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

use crate::App;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let good_style = Style::default().patch(bold_style).fg(Color::Green);
        let bad_style = Style::default().patch(bold_style).fg(Color::Red);
        let dim_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let next_style = Style::default()
            .patch(dim_style)
            .add_modifier(Modifier::UNDERLINED);
        let status_style = Style::default().fg(Color::Magenta);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        if session.has_finished() {
            let done = Paragraph::new(Span::styled("every line typed", bold_style))
                .alignment(Alignment::Center);
            done.render(chunks[0], buf);
        } else {
            let width = chunks[0].width as usize;
            let height = chunks[0].height as usize;
            let num_previous = self.config.num_previous_lines;

            let mut rows: Vec<Line> = Vec::with_capacity(height);

            // completed rows above the cursor, oldest first; empty slots
            // keep the current row at a fixed position
            for slot in 0..num_previous {
                let back = num_previous - slot;
                if back <= session.row() {
                    let row = session.row() - back;
                    rows.push(Line::from(diff_spans(
                        session.transcript_row(row),
                        clip(session.line_text(row).unwrap_or(""), width),
                        good_style,
                        bad_style,
                        dim_style,
                    )));
                } else {
                    rows.push(Line::default());
                }
            }

            // the row being typed
            if let Some(target) = session.line_text(session.row()) {
                rows.push(Line::from(cursor_spans(
                    session.typed(),
                    clip(target, width),
                    session.col(),
                    good_style,
                    bad_style,
                    dim_style,
                    next_style,
                )));
            }

            // lines still to come, as far as the viewport allows
            let mut upcoming = session.row() + 1;
            while rows.len() < height {
                match session.line_text(upcoming) {
                    Some(target) => rows.push(Line::from(Span::styled(
                        clip(target, width).to_owned(),
                        dim_style,
                    ))),
                    None => break,
                }
                upcoming += 1;
            }

            Paragraph::new(rows).render(chunks[0], buf);
        }

        let snap = session.snapshot();
        let mut status = format!(
            "wpm: {:3.2} | completed: {:3.1}% | accuracy: {:3.1}%",
            session.wpm_now(),
            session.completed_pct(),
            100.0 * snap.accuracy,
        );
        if self.config.show_key_code {
            if let Some(code) = self.last_key {
                status.push_str(&format!(" | {code:?}"));
            }
        }
        let status_line = Paragraph::new(Span::styled(status, status_style));
        status_line.render(chunks[1], buf);
    }
}

/// Per-character coloring of a completed row: the target text painted
/// green where the transcript matched, red where it did not, and dim past
/// the end of what was typed.
fn diff_spans(
    typed: &str,
    target: &str,
    good: Style,
    bad: Style,
    rest: Style,
) -> Vec<Span<'static>> {
    let typed: Vec<char> = typed.chars().collect();
    target
        .chars()
        .enumerate()
        .map(|(i, target_char)| {
            let style = match typed.get(i) {
                Some(&c) if c == target_char => good,
                Some(_) => bad,
                None => rest,
            };
            Span::styled(target_char.to_string(), style)
        })
        .collect()
}

/// Like `diff_spans` for the in-progress row, with the next expected
/// character underlined.
fn cursor_spans(
    typed: &str,
    target: &str,
    col: usize,
    good: Style,
    bad: Style,
    rest: Style,
    next: Style,
) -> Vec<Span<'static>> {
    let typed: Vec<char> = typed.chars().collect();
    target
        .chars()
        .enumerate()
        .map(|(i, target_char)| {
            let style = if i < typed.len() {
                if typed[i] == target_char {
                    good
                } else {
                    bad
                }
            } else if i == col {
                next
            } else {
                rest
            };
            Span::styled(target_char.to_string(), style)
        })
        .collect()
}

/// Cut `s` to at most `max` display columns without splitting a character.
fn clip(s: &str, max: usize) -> &str {
    let mut cols = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let char_cols = c.width().unwrap_or(0);
        if cols + char_cols > max {
            break;
        }
        cols += char_cols;
        end = idx + c.len_utf8();
    }
    &s[..end]
}
