//! Link span detection and bare URL rewriting.
//!
//! Bare `http(s)://` URLs in paragraphs are turned into links, except where
//! they already sit inside Markdown syntax that gives them meaning:
//! code (fenced or inline), inline links and images, reference links and
//! definitions, autolinks and raw HTML tags.

use std::ops::Range;
use std::sync::LazyLock;

use regex::bytes::Regex;

use super::fence::CodeRegions;
use crate::content::Content;
use crate::error::Result;

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^\s<>\[\]`]+").expect("bare URL pattern is valid")
});

/// How [`crate::Formatter::paragraph`] rewrites bare URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize, clap::ValueEnum))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum LinkFormat {
    /// Leave bare URLs untouched.
    None,
    /// Wrap in angle brackets: `<https://example.com>`.
    #[default]
    Autolink,
    /// Full inline link: `[https://example.com](https://example.com)`.
    Full,
}

/// Byte ranges of links, images, reference definitions and HTML/autolink
/// tags, skipping anything inside `code`.
pub fn link_spans(content: &Content, code: &CodeRegions) -> Vec<Range<usize>> {
    let bytes = content.as_bytes();
    let code_ranges = code.ranges();
    let mut code = RangeCursor::new(&code_ranges);
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if let Some(range) = code.containing(pos) {
            pos = range.end;
            continue;
        }
        match bytes[pos] {
            b'\\' => pos += 2,
            b'[' => match bracket_link_end(bytes, pos) {
                Some(end) => {
                    let start = if pos > 0 && bytes[pos - 1] == b'!' { pos - 1 } else { pos };
                    spans.push(start..end);
                    pos = end;
                }
                None => pos += 1,
            },
            b'<' => match angle_end(bytes, pos) {
                Some(end) => {
                    spans.push(pos..end);
                    pos = end;
                }
                None => pos += 1,
            },
            _ => pos += 1,
        }
    }

    spans
}

/// Whether `text` is exactly one inline link, image or HTML tag.
///
/// Such text can be nested inside another link without escaping, which is
/// how badges become clickable.
pub fn is_inline_link(text: &Content) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    let bytes = text.as_bytes();
    let end = match bytes[0] {
        b'!' if bytes.get(1) == Some(&b'[') => bracket_link_end(bytes, 1),
        b'[' => bracket_link_end(bytes, 0),
        b'<' => angle_end(bytes, 0),
        _ => None,
    };
    end == Some(bytes.len())
}

/// Rewrite bare URLs outside `code` and existing link syntax.
pub fn rewrite_bare_urls(content: &Content, code: &CodeRegions, format: LinkFormat) -> Result<Content> {
    if format == LinkFormat::None {
        return Ok(content.clone());
    }

    let code_ranges = code.ranges();
    let link_ranges = link_spans(content, code);
    let mut code = RangeCursor::new(&code_ranges);
    let mut links = RangeCursor::new(&link_ranges);
    let mut is_protected =
        |offset: usize| code.containing(offset).is_some() || links.containing(offset).is_some();

    let bytes = content.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 4);
    let mut last = 0;
    for found in content.find_all_regex(&BARE_URL)? {
        if is_protected(found.start) {
            continue;
        }
        let end = found.start + url_length(&bytes[found.clone()]);
        let url = &bytes[found.start..end];
        out.extend_from_slice(&bytes[last..found.start]);
        match format {
            LinkFormat::Autolink => {
                out.push(b'<');
                out.extend_from_slice(url);
                out.push(b'>');
            }
            LinkFormat::Full | LinkFormat::None => {
                out.push(b'[');
                out.extend_from_slice(url);
                out.extend_from_slice(b"](");
                out.extend_from_slice(url);
                out.push(b')');
            }
        }
        last = end;
    }
    out.extend_from_slice(&bytes[last..]);

    Ok(Content::from(out))
}

/// Walks ranges sorted by start alongside offsets that never decrease.
struct RangeCursor<'a> {
    ranges: &'a [Range<usize>],
    next: usize,
}

impl<'a> RangeCursor<'a> {
    fn new(ranges: &'a [Range<usize>]) -> Self {
        Self { ranges, next: 0 }
    }

    /// The range holding `offset`, if any.
    fn containing(&mut self, offset: usize) -> Option<Range<usize>> {
        while self.ranges.get(self.next).is_some_and(|r| r.end <= offset) {
            self.next += 1;
        }
        self.ranges.get(self.next).filter(|r| r.start <= offset).cloned()
    }
}

/// Length of `candidate` once trailing punctuation and unbalanced closing
/// parentheses are dropped.
fn url_length(candidate: &[u8]) -> usize {
    let mut end = candidate.len();
    loop {
        match candidate[..end].last() {
            Some(b'.' | b',' | b';' | b':' | b'!' | b'?' | b'*' | b'_' | b'~' | b'\'' | b'"') => {
                end -= 1;
            }
            Some(b')') => {
                let opens = candidate[..end].iter().filter(|&&b| b == b'(').count();
                let closes = candidate[..end].iter().filter(|&&b| b == b')').count();
                if closes > opens {
                    end -= 1;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
    end
}

/// Offset of the `]` matching the `[` at `open`, honouring nesting and
/// backslash escapes.
fn matching_bracket(bytes: &[u8], open: usize, left: u8, right: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b if b == left => depth += 1,
            b if b == right => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// End of an inline link `[..](..)`, reference link `[..][..]` or
/// reference definition `[..]: ...` starting at `open`.
fn bracket_link_end(bytes: &[u8], open: usize) -> Option<usize> {
    let close = matching_bracket(bytes, open, b'[', b']')?;
    match bytes.get(close + 1) {
        Some(b'(') => matching_bracket(bytes, close + 1, b'(', b')').map(|end| end + 1),
        Some(b'[') => matching_bracket(bytes, close + 1, b'[', b']').map(|end| end + 1),
        Some(b':') if open == 0 || bytes[open - 1] == b'\n' => {
            let rest = &bytes[close..];
            Some(close + memchr::memchr(b'\n', rest).unwrap_or(rest.len()))
        }
        _ => None,
    }
}

/// End of an HTML tag or autolink starting at `open`.
fn angle_end(bytes: &[u8], open: usize) -> Option<usize> {
    let next = *bytes.get(open + 1)?;
    if !(next.is_ascii_alphabetic() || next == b'/' || next == b'!') {
        return None;
    }
    memchr::memchr(b'>', &bytes[open..]).map(|i| open + i + 1)
}
