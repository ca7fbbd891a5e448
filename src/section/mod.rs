//! Managed documentation sections.
//!
//! A generated document is split into regions bounded by marker comments:
//!
//! ```text
//! <!-- usage:start -->
//!
//! ...generated content...
//!
//! <!-- usage:end -->
//! ```
//!
//! - [`SectionId`] names a region, [`marker`] builds its delimiters
//! - [`document`] parses existing bytes into literal and managed blocks
//! - [`merge`] splices freshly rendered sections into a document
//! - [`render`] defines section renderers and the [`Generator`] driving them

pub mod document;
pub mod merge;
pub mod render;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::content::Content;
use crate::error::{Error, Result};

pub use document::{Block, Document, MergeWarning, ParsedDocument};
pub use merge::{MergeOutcome, RenderedSections, merge};
pub use render::{
    FnSection, GenerateReport, Generator, SectionRenderer, StaticSection, WriteMode,
};

/// Stable, lowercase token naming one region of a generated document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(Cow<'static, str>);

impl SectionId {
    pub const HEADER: SectionId = SectionId(Cow::Borrowed("header"));
    pub const BADGES: SectionId = SectionId(Cow::Borrowed("badges"));
    pub const DESCRIPTION: SectionId = SectionId(Cow::Borrowed("description"));
    pub const CONTENTS: SectionId = SectionId(Cow::Borrowed("contents"));
    pub const USAGE: SectionId = SectionId(Cow::Borrowed("usage"));
    pub const INPUTS: SectionId = SectionId(Cow::Borrowed("inputs"));
    pub const OUTPUTS: SectionId = SectionId(Cow::Borrowed("outputs"));
    pub const SECRETS: SectionId = SectionId(Cow::Borrowed("secrets"));
    pub const ENV: SectionId = SectionId(Cow::Borrowed("env"));
    pub const EXAMPLES: SectionId = SectionId(Cow::Borrowed("examples"));
    pub const CONTRIBUTING: SectionId = SectionId(Cow::Borrowed("contributing"));
    pub const LICENSE: SectionId = SectionId(Cow::Borrowed("license"));

    /// Validate a token: ASCII lowercase letters, digits, `-` and `_`,
    /// starting with a letter or digit.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if is_valid_token(token.as_bytes()) {
            Ok(Self(Cow::Owned(token)))
        } else {
            Err(Error::InvalidSectionId(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_token(token: &[u8]) -> bool {
    match token.split_first() {
        Some((first, rest)) => {
            (first.is_ascii_lowercase() || first.is_ascii_digit())
                && rest
                    .iter()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'_'))
        }
        None => false,
    }
}

impl FromStr for SectionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SectionId::new(s)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which end of a section a marker delimits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Start,
    End,
}

impl MarkerKind {
    const fn word(self) -> &'static str {
        match self {
            MarkerKind::Start => "start",
            MarkerKind::End => "end",
        }
    }
}

const MARKER_OPEN: &[u8] = b"<!-- ";
const MARKER_CLOSE: &[u8] = b" -->";

/// The marker line for `id`, without a line break: `<!-- {id}:start -->`.
pub fn marker(id: &SectionId, kind: MarkerKind) -> Content {
    Content::concat(&[
        MARKER_OPEN,
        id.as_str().as_bytes(),
        b":".as_slice(),
        kind.word().as_bytes(),
        MARKER_CLOSE,
    ])
}

/// Recognise a marker line.
///
/// Surrounding spaces, tabs and a trailing CR are ignored; the marker itself
/// must match exactly.
pub fn parse_marker(line: &[u8]) -> Option<(SectionId, MarkerKind)> {
    let line = Content::of(line).trim();
    let inner = line
        .as_bytes()
        .strip_prefix(MARKER_OPEN)?
        .strip_suffix(MARKER_CLOSE)?;
    let colon = memchr::memrchr(b':', inner)?;
    let (token, word) = (&inner[..colon], &inner[colon + 1..]);
    let kind = match word {
        b"start" => MarkerKind::Start,
        b"end" => MarkerKind::End,
        _ => return None,
    };
    if !is_valid_token(token) {
        return None;
    }
    let token = std::str::from_utf8(token).ok()?;
    Some((SectionId(Cow::Owned(token.to_owned())), kind))
}

/// A complete managed block: start marker, content, end marker.
///
/// Leading blank lines and trailing whitespace of `content` are dropped and
/// the content is framed by one blank line on each side. Empty content gives
/// the bare marker pair.
pub fn managed_block(id: &SectionId, content: &Content) -> Content {
    let body = strip_leading_blank_lines(&content.trim_end());
    let start = marker(id, MarkerKind::Start);
    let end = marker(id, MarkerKind::End);
    if body.is_empty() {
        Content::concat(&[start.as_bytes(), b"\n".as_slice(), end.as_bytes(), b"\n".as_slice()])
    } else {
        Content::concat(&[
            start.as_bytes(),
            b"\n\n".as_slice(),
            body.as_bytes(),
            b"\n\n".as_slice(),
            end.as_bytes(),
            b"\n".as_slice(),
        ])
    }
}

fn strip_leading_blank_lines(content: &Content) -> Content {
    let bytes = content.as_bytes();
    let mut start = 0;
    while let Some(nl) = memchr::memchr(b'\n', &bytes[start..]) {
        let line = &bytes[start..start + nl];
        if !line.iter().all(|b| matches!(b, b' ' | b'\t' | b'\r')) {
            break;
        }
        start += nl + 1;
    }
    content.slice_bytes(start..bytes.len())
}
