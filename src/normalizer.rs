//!
//! The core normalization pass.
//!
//! `normalize` is a pure function from a text buffer to a text buffer: one
//! forward scan that places blank lines around headings, lists, and fenced
//! code blocks and tags bare fence openers, followed by whole-buffer cleanup
//! (trailing-whitespace strip, blank-run collapse, end-of-file newline).
//! Fence interiors are emitted verbatim and no cleanup pass may rewrite them.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::line_utils::{self, LineKind};

/// Options for the core pass. Deserializes from the kebab-case keys of the
/// `[normalize]` section in `.mdnorm.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NormalizeOptions {
    /// Language token appended to fence openers that carry none.
    pub default_fence_language: String,
    /// Collapse runs of two or more blank lines to exactly one.
    pub collapse_blank_lines: bool,
    /// End the buffer with exactly one newline, trimming trailing blanks.
    pub ensure_trailing_newline: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            default_fence_language: "bash".to_string(),
            collapse_blank_lines: true,
            ensure_trailing_newline: true,
        }
    }
}

/// One output line. Verbatim lines come from fence interiors and are exempt
/// from every cleanup pass.
struct Emitted<'a> {
    text: Cow<'a, str>,
    verbatim: bool,
}

impl<'a> Emitted<'a> {
    fn plain(text: &'a str) -> Self {
        Emitted {
            text: Cow::Borrowed(text),
            verbatim: false,
        }
    }

    fn owned(text: String) -> Self {
        Emitted {
            text: Cow::Owned(text),
            verbatim: false,
        }
    }

    fn verbatim(text: &'a str) -> Self {
        Emitted {
            text: Cow::Borrowed(text),
            verbatim: true,
        }
    }

    fn blank() -> Self {
        Emitted {
            text: Cow::Borrowed(""),
            verbatim: false,
        }
    }

    fn is_blank(&self) -> bool {
        !self.verbatim && line_utils::is_blank(&self.text)
    }
}

/// Normalize `text` against the fixed rule set.
///
/// Total function: any input produces a defined output, and malformed
/// constructs degrade to plain passthrough. Performs no I/O and holds no
/// state, so concurrent calls on independent buffers need no coordination.
pub fn normalize(text: &str, options: &NormalizeOptions) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<Emitted> = Vec::with_capacity(lines.len() + 8);

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        match line_utils::classify(line) {
            LineKind::FenceDelimiter => {
                i = emit_fence(&lines, i, options, &mut out);
            }
            LineKind::Heading => {
                push_separator(&mut out);
                out.push(Emitted::plain(line));
                if let Some(next) = lines.get(i + 1) {
                    if !line_utils::is_blank(next) && !line_utils::is_heading(next) {
                        out.push(Emitted::blank());
                    }
                }
                i += 1;
            }
            LineKind::ListItem => {
                i = emit_list_run(&lines, i, &mut out);
            }
            LineKind::Blank | LineKind::Plain => {
                out.push(Emitted::plain(line));
                i += 1;
            }
        }
    }

    if options.collapse_blank_lines {
        collapse_blank_runs(&mut out);
    }
    strip_trailing_whitespace(&mut out);
    render(out, text, options)
}

/// Insert a blank separator unless the buffer is empty or already ends with
/// one.
fn push_separator(out: &mut Vec<Emitted>) {
    if out.last().is_some_and(|last| !last.is_blank()) {
        out.push(Emitted::blank());
    }
}

/// Emit a fenced code block: separator, opener (tagged if bare), interior
/// verbatim, closer, trailing separator. Returns the next scan position.
/// An unterminated fence is passed through verbatim with no synthetic closer.
fn emit_fence<'a>(
    lines: &[&'a str],
    start: usize,
    options: &NormalizeOptions,
    out: &mut Vec<Emitted<'a>>,
) -> usize {
    let Some(opening) = line_utils::parse_fence_opening(lines[start]) else {
        // classify() only sends delimiter lines here; preserve as content
        out.push(Emitted::plain(lines[start]));
        return start + 1;
    };

    let closer =
        (start + 1..lines.len()).find(|&j| line_utils::is_fence_closing(lines[j], opening.ticks));
    let Some(end) = closer else {
        for line in &lines[start..] {
            out.push(Emitted::verbatim(line));
        }
        return lines.len();
    };

    push_separator(out);
    match opening.language {
        Some(_) => out.push(Emitted::plain(lines[start])),
        None => out.push(Emitted::owned(format!(
            "{}{}",
            "`".repeat(opening.ticks),
            options.default_fence_language
        ))),
    }
    for line in &lines[start + 1..end] {
        out.push(Emitted::verbatim(line));
    }
    out.push(Emitted::plain(lines[end]));
    if lines.get(end + 1).is_some_and(|next| !line_utils::is_blank(next)) {
        out.push(Emitted::blank());
    }
    end + 1
}

/// Consume a maximal run of list items, dropping interior blank lines so
/// loose lists come out tight. Returns the next scan position.
fn emit_list_run<'a>(lines: &[&'a str], start: usize, out: &mut Vec<Emitted<'a>>) -> usize {
    if out
        .last()
        .is_some_and(|last| !last.is_blank() && !line_utils::is_list_item(&last.text))
    {
        out.push(Emitted::blank());
    }

    let mut i = start;
    while i < lines.len() {
        if line_utils::is_list_item(lines[i]) {
            out.push(Emitted::plain(lines[i]));
            i += 1;
        } else if line_utils::is_blank(lines[i]) {
            // A blank run only stays inside the list if another item follows
            let mut next_item = i;
            while next_item < lines.len() && line_utils::is_blank(lines[next_item]) {
                next_item += 1;
            }
            if next_item < lines.len() && line_utils::is_list_item(lines[next_item]) {
                i = next_item;
            } else {
                break;
            }
        } else {
            break;
        }
    }

    if i < lines.len() && !line_utils::is_blank(lines[i]) {
        out.push(Emitted::blank());
    }
    i
}

/// Collapse every run of consecutive blank lines to a single one. Verbatim
/// blanks are fence interior and never join a run.
fn collapse_blank_runs(out: &mut Vec<Emitted>) {
    let mut previous_blank = false;
    out.retain(|line| {
        let blank = line.is_blank();
        let keep = !(blank && previous_blank);
        previous_blank = blank;
        keep
    });
}

/// Strip trailing horizontal whitespace from every non-verbatim line.
fn strip_trailing_whitespace(out: &mut [Emitted]) {
    for line in out.iter_mut() {
        if line.verbatim {
            continue;
        }
        let stripped = line.text.trim_end();
        if stripped.len() != line.text.len() {
            line.text = Cow::Owned(stripped.to_string());
        }
    }
}

/// Join the emitted lines, applying the end-of-file policy.
fn render(mut out: Vec<Emitted>, original: &str, options: &NormalizeOptions) -> String {
    if options.ensure_trailing_newline {
        // The end-of-file policy outranks verbatim passthrough for a
        // trailing run of blank lines (reachable only with an unterminated
        // fence at the end of input).
        while out
            .last()
            .is_some_and(|line| line_utils::is_blank(&line.text))
        {
            out.pop();
        }
    }

    if out.is_empty() {
        return if original.is_empty() || !options.ensure_trailing_newline {
            String::new()
        } else {
            "\n".to_string()
        };
    }

    let mut result = out
        .iter()
        .map(|line| line.text.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    if options.ensure_trailing_newline || original.ends_with('\n') {
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalize_default(text: &str) -> String {
        normalize(text, &NormalizeOptions::default())
    }

    #[test]
    fn surrounds_heading_and_list_with_blank_lines() {
        let input = "# Title\nSome text\n- item1\n- item2\nMore text\n";
        assert_eq!(
            normalize_default(input),
            "# Title\n\nSome text\n\n- item1\n- item2\n\nMore text\n"
        );
    }

    #[test]
    fn tags_bare_fence_and_surrounds_it() {
        let input = "Text\n```\ncode line\n```\nAfter\n";
        assert_eq!(normalize_default(input), "Text\n\n```bash\ncode line\n```\n\nAfter\n");
    }

    #[test]
    fn clean_document_is_unchanged() {
        let input = "# Title\n\nIntro paragraph.\n\n- one\n- two\n\n```rust\nfn main() {}\n```\n\nOutro.\n";
        assert_eq!(normalize_default(input), input);
    }

    #[test]
    fn fence_interior_is_verbatim() {
        let input = "```bash\n# not a heading\n- not a list\n\n\ntrailing  \n```\n";
        assert_eq!(normalize_default(input), input);
    }

    #[test]
    fn tagged_fence_opener_is_kept() {
        let input = "```python\nprint()\n```\n";
        assert_eq!(normalize_default(input), input);
    }

    #[test]
    fn fence_language_is_configurable() {
        let options = NormalizeOptions {
            default_fence_language: "text".to_string(),
            ..NormalizeOptions::default()
        };
        assert_eq!(normalize("```\nx\n```\n", &options), "```text\nx\n```\n");
    }

    #[test]
    fn longer_fences_keep_their_tick_count() {
        assert_eq!(normalize_default("````\nx\n````\n"), "````bash\nx\n````\n");
    }

    #[test]
    fn nested_fences_stay_inside_the_outer_block() {
        let input = "````markdown\n```\ncontent\n```\n````\n";
        assert_eq!(normalize_default(input), input);
    }

    #[test]
    fn unterminated_fence_passes_through() {
        let input = "start\n```\nno closer\n";
        assert_eq!(normalize_default(input), input);
    }

    #[test]
    fn consecutive_headings_are_separated() {
        assert_eq!(normalize_default("# A\n## B\n"), "# A\n\n## B\n");
    }

    #[test]
    fn loose_list_becomes_tight() {
        assert_eq!(normalize_default("- a\n\n- b\n\ntext\n"), "- a\n- b\n\ntext\n");
    }

    #[test]
    fn ordered_markers_are_not_renumbered() {
        let input = "intro\n\n1. first\n7. second\n";
        assert_eq!(normalize_default(input), input);
    }

    #[test]
    fn blank_runs_collapse_to_one() {
        assert_eq!(normalize_default("a\n\n\n\nb\n"), "a\n\nb\n");
    }

    #[test]
    fn collapse_can_be_disabled() {
        let options = NormalizeOptions {
            collapse_blank_lines: false,
            ..NormalizeOptions::default()
        };
        assert_eq!(normalize("a\n\n\nb\n", &options), "a\n\n\nb\n");
    }

    #[test]
    fn trailing_whitespace_is_stripped() {
        assert_eq!(normalize_default("word  \ntabs\t\n"), "word\ntabs\n");
    }

    #[test]
    fn missing_final_newline_is_added() {
        assert_eq!(normalize_default("text"), "text\n");
    }

    #[test]
    fn extra_final_newlines_are_trimmed() {
        assert_eq!(normalize_default("text\n\n\n"), "text\n");
    }

    #[test]
    fn trailing_newline_policy_can_be_disabled() {
        let options = NormalizeOptions {
            ensure_trailing_newline: false,
            ..NormalizeOptions::default()
        };
        assert_eq!(normalize("text", &options), "text");
        assert_eq!(normalize("text\n", &options), "text\n");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_default(""), "");
    }

    #[test]
    fn all_blank_input_becomes_single_newline() {
        assert_eq!(normalize_default("\n\n\n"), "\n");
    }

    #[test]
    fn list_marker_beats_heading_marker() {
        assert_eq!(normalize_default("x\n- # text\n"), "x\n\n- # text\n");
    }

    #[test]
    fn heading_at_end_of_buffer_needs_no_blank_below() {
        assert_eq!(normalize_default("text\n# Tail\n"), "text\n\n# Tail\n");
    }

    #[test]
    fn idempotent_on_messy_document() {
        let input = "# Title\nintro\n## Section\n- a\n\n- b\ntail\n```\ncode\n```\nend\n\n\n";
        let once = normalize_default(input);
        assert_eq!(normalize_default(&once), once);
    }
}
