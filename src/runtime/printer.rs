use chrono::Local;
use colored::Colorize;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use unicode_width::UnicodeWidthStr;

use crate::constants::{APP_NAME, UI_FALLBACK_WIDTH, UI_MAX_WIDTH};
use crate::models::StreamCallback;

/// Writes a streamed answer to stdout, soft-wrapping at the terminal width
pub struct Printer {
    width: usize,
    column: Mutex<usize>,
    /// Everything streamed since the last prompt
    reply: Mutex<String>,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    pub fn new() -> Self {
        let terminal_width = crossterm::terminal::size()
            .map(|(cols, _)| cols)
            .unwrap_or(UI_FALLBACK_WIDTH);
        Self::with_width(terminal_width.min(UI_MAX_WIDTH) as usize)
    }

    pub fn with_width(width: usize) -> Self {
        Self {
            width: width.max(1),
            column: Mutex::new(0),
            reply: Mutex::new(String::new()),
        }
    }

    /// Header line naming the model, followed by the prompt
    pub fn prompt(&self, model: &str, prompt: &str) {
        let title = format!(" {} | {} ", APP_NAME, model);
        println!("{}", self.rule(&title).cyan());
        println!("{}", prompt);
        println!("{}", "─".repeat(self.width).cyan());
        *self.column.lock() = 0;
        self.reply.lock().clear();
    }

    /// Callback handing streamed deltas to this printer
    pub fn stream_callback(self: &Arc<Self>) -> StreamCallback {
        let printer = Arc::clone(self);
        Arc::new(move |delta: &str| printer.write_delta(delta))
    }

    pub fn write_delta(&self, delta: &str) {
        self.reply.lock().push_str(delta);
        let rendered = {
            let mut column = self.column.lock();
            wrap_delta(&mut column, self.width, delta)
        };
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(rendered.as_bytes());
        let _ = stdout.flush();
    }

    /// Take the text streamed since the last prompt
    pub fn take_reply(&self) -> String {
        std::mem::take(&mut *self.reply.lock())
    }

    /// End the answer with a timestamp rule
    pub fn finish(&self) {
        let mut column = self.column.lock();
        if *column > 0 {
            println!();
            *column = 0;
        }
        let stamp = Local::now().format(" %Y %B %d - %I:%M %p ").to_string();
        println!("{}", self.rule(&stamp).cyan());
    }

    fn rule(&self, label: &str) -> String {
        let label_width = label.width();
        if label_width + 4 >= self.width {
            return label.to_string();
        }
        let left = (self.width - label_width) / 2;
        let right = self.width - label_width - left;
        format!("{}{}{}", "─".repeat(left), label, "─".repeat(right))
    }
}

/// Render `delta` given the current `column`, breaking before a piece that would
/// overflow `width`. Columns are display cells, so wide characters count twice.
/// Leading spaces of a wrapped piece are dropped.
fn wrap_delta(column: &mut usize, width: usize, delta: &str) -> String {
    let mut out = String::with_capacity(delta.len() + 1);

    for piece in delta.split_inclusive('\n') {
        let piece_width = piece.trim_end_matches('\n').width();
        if *column > 0 && *column + piece_width > width {
            let trimmed = piece.trim_start_matches(' ');
            out.push('\n');
            out.push_str(trimmed);
            *column = trimmed.trim_end_matches('\n').width();
        } else {
            out.push_str(piece);
            *column += piece_width;
        }

        if piece.ends_with('\n') {
            *column = 0;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pieces_within_width_pass_through() {
        let mut column = 0;
        assert_eq!(wrap_delta(&mut column, 20, "Hello"), "Hello");
        assert_eq!(wrap_delta(&mut column, 20, ", world"), ", world");
        assert_eq!(column, 12);
    }

    #[test]
    fn test_overflowing_piece_moves_to_next_line() {
        let mut column = 0;
        wrap_delta(&mut column, 10, "12345678");
        assert_eq!(wrap_delta(&mut column, 10, " next"), "\nnext");
        assert_eq!(column, 4);
    }

    #[test]
    fn test_newlines_reset_column() {
        let mut column = 0;
        assert_eq!(wrap_delta(&mut column, 10, "abc\ndefgh"), "abc\ndefgh");
        assert_eq!(column, 5);
        assert_eq!(wrap_delta(&mut column, 10, "ij\n"), "ij\n");
        assert_eq!(column, 0);
    }

    #[test]
    fn test_wide_characters_take_two_columns() {
        let mut column = 0;
        assert_eq!(wrap_delta(&mut column, 10, "你好世界"), "你好世界");
        assert_eq!(column, 8);
        assert_eq!(wrap_delta(&mut column, 10, "再见"), "\n再见");
        assert_eq!(column, 4);
    }

    #[test]
    fn test_take_reply_returns_streamed_text_once() {
        let printer = Printer::with_width(40);
        printer.write_delta("partial ");
        printer.write_delta("answer");
        assert_eq!(printer.take_reply(), "partial answer");
        assert_eq!(printer.take_reply(), "");
    }

    #[test]
    fn test_rule_centers_label() {
        let printer = Printer::with_width(12);
        let rule = printer.rule(" ab ");
        assert_eq!(rule.chars().count(), 12);
        assert_eq!(rule, "──── ab ────");
    }
}
