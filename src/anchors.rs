//!
//! Anchor-link repair.
//!
//! Internal links of the form `[heading text](#fragment)` are rewritten to a
//! canonical slug taken from an explicit heading-text → slug mapping. The
//! mapping is always literal; `derive_anchor_map` offers automatic slug
//! derivation as a separate step, because mixed-script headings make
//! derived slugs ambiguous and callers may need to spell them out.

use std::borrow::Cow;
use std::collections::BTreeMap;

use regex::{NoExpand, Regex};

use crate::line_utils::{self, FenceTracker};

/// Rewrite `[heading text](#anything)` to `[heading text](#slug)` for every
/// mapping entry. Fenced code blocks are left untouched.
pub fn rewrite_anchor_links(text: &str, anchors: &BTreeMap<String, String>) -> String {
    if anchors.is_empty() {
        return text.to_string();
    }

    let rewrites: Vec<(Regex, String)> = anchors
        .iter()
        .map(|(title, slug)| {
            let pattern = format!(r"\[{}\]\(#[^)]*\)", regex::escape(title));
            // Built from an escaped literal, so the pattern always compiles
            let regex = Regex::new(&pattern).unwrap();
            (regex, format!("[{title}](#{slug})"))
        })
        .collect();

    let had_trailing_newline = text.ends_with('\n');
    let mut tracker = FenceTracker::new();
    let mut out: Vec<Cow<str>> = Vec::new();
    for line in text.lines() {
        if tracker.observe(line) {
            out.push(Cow::Borrowed(line));
            continue;
        }
        let mut rewritten = Cow::Borrowed(line);
        for (regex, replacement) in &rewrites {
            if regex.is_match(&rewritten) {
                rewritten =
                    Cow::Owned(regex.replace_all(&rewritten, NoExpand(replacement)).into_owned());
            }
        }
        out.push(rewritten);
    }

    let mut result = out.join("\n");
    if had_trailing_newline {
        result.push('\n');
    }
    result
}

/// Derive a slug the way most Markdown renderers do: lowercase, whitespace
/// to hyphens, punctuation dropped, non-ASCII alphanumerics kept.
pub fn slugify(heading: &str) -> String {
    let mut slug = String::with_capacity(heading.len());
    for c in heading.trim().chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else if c.is_whitespace() {
            slug.push('-');
        } else if c == '-' || c == '_' {
            slug.push(c);
        }
    }
    slug
}

/// Collect a heading-text → slug mapping for every heading outside fenced
/// code blocks. Repeated heading text keeps its first slug.
pub fn derive_anchor_map(text: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let mut tracker = FenceTracker::new();
    for line in text.lines() {
        if tracker.observe(line) || !line_utils::is_heading(line) {
            continue;
        }
        let title = line.trim_start_matches('#').trim();
        if !title.is_empty() {
            map.entry(title.to_string()).or_insert_with(|| slugify(title));
        }
    }
    map
}
