//! Markdown generation primitives.
//!
//! Everything here is a pure function of its input. The pieces are:
//!
//! - [`escape`]: escaping for Markdown text, embedded HTML and table cells
//! - [`fence`]: fenced code block and inline code span detection
//! - [`table`]: column-aligned table layout
//! - [`links`]: link detection and bare URL rewriting
//! - [`slugify`]: GitHub-style heading anchors
//! - [`formatter`]: the [`Formatter`] façade section renderers call
//!
//! ## Design Notes
//!
//! - **Dynamic code fence length**: code blocks use a fence one longer than
//!   the longest marker run in their content, with a minimum of three
//! - **Code awareness**: link rewriting and table cell splitting skip
//!   fenced blocks and inline code spans, found in one linear scan
//! - **Display width**: table columns are padded by terminal display width,
//!   so CJK text and emoji line up

pub mod escape;
pub mod fence;
pub mod formatter;
pub mod links;
pub mod slugify;
pub mod table;

pub use escape::{escape_html, escape_html_attribute, escape_markdown, escape_table_pipes};
pub use fence::{
    CodeRegions, Fence, FenceMarker, FenceScanner, InlineCodeSpan, calculate_fence_length,
    calculate_inline_code_ticks,
};
pub use formatter::{Formatter, FormatterConfig, ImageOptions, ListKind};
pub use links::{LinkFormat, is_inline_link, link_spans, rewrite_bare_urls};
pub use slugify::{SlugRegistry, slugify};
pub use table::{Alignment, CellLine, Table, TableLayout};
