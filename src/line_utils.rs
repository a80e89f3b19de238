//!
//! Line classification shared by the normalizer and the secondary passes.
//! Classification is structural and line-local; fence interiors are not a
//! line-local property, so `FenceTracker` resolves them while scanning.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FENCE_DELIMITER: Regex = Regex::new(r"^(`{3,})([^`]*)$").unwrap();
    static ref FENCE_CLOSER: Regex = Regex::new(r"^`{3,}\s*$").unwrap();
    static ref ATX_HEADING: Regex = Regex::new(r"^#{1,6}(?: |$)").unwrap();
    static ref UNORDERED_ITEM: Regex = Regex::new(r"^[-*] ").unwrap();
    static ref ORDERED_ITEM: Regex = Regex::new(r"^(\d+)\. ").unwrap();
}

/// Structural kind of a single line, outside of any fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    FenceDelimiter,
    ListItem,
    Heading,
    Plain,
}

/// A line is blank iff it contains no non-whitespace character.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// ATX heading: one to six `#` followed by a space or end of line.
pub fn is_heading(line: &str) -> bool {
    ATX_HEADING.is_match(line)
}

/// List item: `- `, `* `, or `<digits>. ` anchored at line start.
pub fn is_list_item(line: &str) -> bool {
    UNORDERED_ITEM.is_match(line) || ORDERED_ITEM.is_match(line)
}

/// Byte length of the digit prefix of an ordered-list line, so callers can
/// splice a new marker value in front of the rest.
pub fn ordered_item_digits(line: &str) -> Option<usize> {
    ORDERED_ITEM.captures(line).map(|caps| caps[1].len())
}

/// An opening fence delimiter: three or more backticks, optionally followed
/// by an info string containing no backtick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceOpening {
    pub ticks: usize,
    pub language: Option<String>,
}

pub fn parse_fence_opening(line: &str) -> Option<FenceOpening> {
    let caps = FENCE_DELIMITER.captures(line)?;
    let ticks = caps[1].len();
    let info = caps[2].trim();
    let language = if info.is_empty() { None } else { Some(info.to_string()) };
    Some(FenceOpening { ticks, language })
}

/// A closing delimiter is a backticks-only line with at least as many
/// backticks as the opener.
pub fn is_fence_closing(line: &str, opening_ticks: usize) -> bool {
    FENCE_CLOSER.is_match(line) && line.chars().take_while(|&c| c == '`').count() >= opening_ticks
}

/// Classify one line. List detection runs before heading detection, so
/// `- # text` is a list item.
pub fn classify(line: &str) -> LineKind {
    if is_blank(line) {
        LineKind::Blank
    } else if parse_fence_opening(line).is_some() {
        LineKind::FenceDelimiter
    } else if is_list_item(line) {
        LineKind::ListItem
    } else if is_heading(line) {
        LineKind::Heading
    } else {
        LineKind::Plain
    }
}

/// Tracks fenced-code-block state across a line-by-line scan so secondary
/// passes can leave fence delimiters and interiors alone.
#[derive(Debug, Default)]
pub struct FenceTracker {
    open_ticks: Option<usize>,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next line; returns true if the line belongs to a fenced code
    /// block (delimiter or interior). An unterminated fence extends to the
    /// end of input.
    pub fn observe(&mut self, line: &str) -> bool {
        match self.open_ticks {
            Some(ticks) => {
                if is_fence_closing(line, ticks) {
                    self.open_ticks = None;
                }
                true
            }
            None => {
                if let Some(opening) = parse_fence_opening(line) {
                    self.open_ticks = Some(opening.ticks);
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_kind() {
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("   \t"), LineKind::Blank);
        assert_eq!(classify("# Title"), LineKind::Heading);
        assert_eq!(classify("###### Deep"), LineKind::Heading);
        assert_eq!(classify("- item"), LineKind::ListItem);
        assert_eq!(classify("* item"), LineKind::ListItem);
        assert_eq!(classify("12. item"), LineKind::ListItem);
        assert_eq!(classify("```"), LineKind::FenceDelimiter);
        assert_eq!(classify("```rust"), LineKind::FenceDelimiter);
        assert_eq!(classify("just text"), LineKind::Plain);
    }

    #[test]
    fn list_marker_wins_over_heading_marker() {
        assert_eq!(classify("- # text"), LineKind::ListItem);
    }

    #[test]
    fn heading_requires_space_and_at_most_six_hashes() {
        assert_eq!(classify("#nospace"), LineKind::Plain);
        assert_eq!(classify("####### seven"), LineKind::Plain);
        assert_eq!(classify("#"), LineKind::Heading);
    }

    #[test]
    fn indented_markers_are_plain() {
        assert_eq!(classify("  - nested"), LineKind::Plain);
        assert_eq!(classify("   ```"), LineKind::Plain);
    }

    #[test]
    fn fence_opening_parses_info_string() {
        let opening = parse_fence_opening("```rust").unwrap();
        assert_eq!(opening.ticks, 3);
        assert_eq!(opening.language.as_deref(), Some("rust"));

        let bare = parse_fence_opening("````").unwrap();
        assert_eq!(bare.ticks, 4);
        assert_eq!(bare.language, None);

        assert!(parse_fence_opening("``").is_none());
        assert!(parse_fence_opening("``` has `ticks`").is_none());
    }

    #[test]
    fn closing_fence_needs_enough_backticks() {
        assert!(is_fence_closing("```", 3));
        assert!(is_fence_closing("````", 3));
        assert!(!is_fence_closing("```", 4));
        assert!(!is_fence_closing("```rust", 3));
    }

    #[test]
    fn tracker_marks_interior_and_delimiters() {
        let lines = ["text", "```", "# not a heading", "```", "after"];
        let mut tracker = FenceTracker::new();
        let inside: Vec<bool> = lines.iter().map(|line| tracker.observe(line)).collect();
        assert_eq!(inside, vec![false, true, true, true, false]);
    }

    #[test]
    fn tracker_keeps_unterminated_fence_open() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.observe("```"));
        assert!(tracker.observe("body"));
        assert!(tracker.observe("still body"));
    }
}
