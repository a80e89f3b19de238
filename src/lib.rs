//!
//! mdnorm brings Markdown documents into a fixed structural style: blank
//! lines around headings, lists, and fenced code blocks, language tags on
//! bare fence openers, collapsed blank-line runs, stripped trailing
//! whitespace, and a single end-of-file newline.
//!
//! The core is [`normalizer::normalize`], a pure function over a text
//! buffer. Anchor-link repair and ordered-list renumbering are separate,
//! opt-in passes. All file discovery and I/O lives in the binary.

pub mod anchors;
pub mod config;
pub mod exit_codes;
pub mod line_utils;
pub mod normalizer;
pub mod renumber;

pub use anchors::{derive_anchor_map, rewrite_anchor_links, slugify};
pub use config::{Config, ConfigError};
pub use normalizer::{NormalizeOptions, normalize};
pub use renumber::renumber_ordered_lists;

/// Run the configured transformation: the core pass, then anchor-link
/// repair when a mapping is configured.
pub fn normalize_document(content: &str, config: &Config) -> String {
    let normalized = normalize(content, &config.normalize);
    if config.anchors.is_empty() {
        normalized
    } else {
        rewrite_anchor_links(&normalized, &config.anchors)
    }
}
