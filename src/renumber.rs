//!
//! Opt-in renumbering of ordered lists. Not part of the core pass:
//! renumbering rewrites marker values, so it only runs when explicitly
//! requested.

use crate::line_utils::{self, FenceTracker};

/// Renumber every maximal run of consecutive ordered-list lines to
/// `start, start + 1, ...`. Runs are broken by any other line, including
/// blanks, and numbering restarts per run. Only the marker digits change;
/// fenced code blocks are left untouched.
pub fn renumber_ordered_lists(text: &str, start: u64) -> String {
    let had_trailing_newline = text.ends_with('\n');
    let mut tracker = FenceTracker::new();
    let mut out: Vec<String> = Vec::new();
    let mut next = start;
    let mut in_run = false;

    for line in text.lines() {
        if tracker.observe(line) {
            in_run = false;
            out.push(line.to_string());
            continue;
        }
        match line_utils::ordered_item_digits(line) {
            Some(digits) => {
                if !in_run {
                    next = start;
                    in_run = true;
                }
                out.push(format!("{}{}", next, &line[digits..]));
                next += 1;
            }
            None => {
                in_run = false;
                out.push(line.to_string());
            }
        }
    }

    let mut result = out.join("\n");
    if had_trailing_newline {
        result.push('\n');
    }
    result
}
