//! Linear scanning for fenced code blocks and inline code spans.
//!
//! Detection works on bytes, one line at a time, instead of through a single
//! regex. Nested or adversarial backtick runs therefore cost linear time and
//! never produce ambiguous overlapping matches.
//!
//! Unterminated constructs degrade to plain text: an opening fence without a
//! closer, or a backtick run without a partner of the same length, records
//! nothing and scanning continues after it.

use std::collections::HashMap;
use std::ops::Range;

use memchr::memchr;

use crate::content::Content;

/// Character used to build a code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FenceMarker {
    #[default]
    Backtick,
    Tilde,
}

impl FenceMarker {
    pub const fn byte(self) -> u8 {
        match self {
            FenceMarker::Backtick => b'`',
            FenceMarker::Tilde => b'~',
        }
    }

    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'`' => Some(FenceMarker::Backtick),
            b'~' => Some(FenceMarker::Tilde),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        match self {
            FenceMarker::Backtick => 0,
            FenceMarker::Tilde => 1,
        }
    }
}

/// A fenced code block found by [`FenceScanner::fences`].
///
/// All offsets are byte offsets into the scanned content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    pub marker: FenceMarker,
    /// Length of the opening run (at least 3).
    pub length: usize,
    /// Info string after the opening run, trimmed. `None` when blank.
    pub language: Option<Content>,
    /// Start of the opening fence line.
    pub start: usize,
    /// First byte of the block's inner content.
    pub content_start: usize,
    /// End of the inner content, excluding the line break before the closer.
    pub content_end: usize,
    /// End of the closing fence line, excluding its line break.
    pub end: usize,
}

impl Fence {
    /// Byte range of the whole block, fences included.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The text between the fences.
    pub fn inner(&self, source: &Content) -> Content {
        source.slice_bytes(self.content_start..self.content_end)
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.span().contains(&offset)
    }
}

/// An inline code span delimited by equal-length backtick runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineCodeSpan {
    /// Offset of the opening run.
    pub start: usize,
    /// Offset just past the closing run.
    pub end: usize,
    pub delimiter_length: usize,
}

impl InlineCodeSpan {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Byte range between the delimiters.
    pub fn inner_range(&self) -> Range<usize> {
        self.start + self.delimiter_length..self.end - self.delimiter_length
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.span().contains(&offset)
    }
}

/// All code regions of one piece of content, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeRegions {
    pub fences: Vec<Fence>,
    pub inline: Vec<InlineCodeSpan>,
}

impl CodeRegions {
    pub fn is_empty(&self) -> bool {
        self.fences.is_empty() && self.inline.is_empty()
    }

    /// Whether `offset` falls inside any fence or inline span.
    pub fn is_code(&self, offset: usize) -> bool {
        self.fences.iter().any(|f| f.contains(offset))
            || self.inline.iter().any(|s| s.contains(offset))
    }

    /// Every fence and inline span as one list of byte ranges, sorted by
    /// start. The ranges never overlap.
    pub fn ranges(&self) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = self
            .fences
            .iter()
            .map(Fence::span)
            .chain(self.inline.iter().map(InlineCodeSpan::span))
            .collect();
        ranges.sort_unstable_by_key(|r| r.start);
        ranges
    }
}

/// Stateless scanner for code regions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FenceScanner;

impl FenceScanner {
    pub fn new() -> Self {
        Self
    }

    /// Fences and inline spans of `content`.
    pub fn scan(&self, content: &Content) -> CodeRegions {
        let fences = self.fences(content);
        let inline = self.inline_spans(content, &fences);
        CodeRegions { fences, inline }
    }

    /// Find every terminated fenced block. Blocks never nest.
    pub fn fences(&self, content: &Content) -> Vec<Fence> {
        let bytes = content.as_bytes();
        let lines = line_ranges(bytes);

        // reach[i][m]: longest closing run of marker m on any line from i on.
        // An opener longer than what follows it can never close.
        let mut reach = vec![[0usize; 2]; lines.len() + 1];
        for (i, line) in lines.iter().enumerate().rev() {
            reach[i] = reach[i + 1];
            if let Some((marker, run)) = closing_run(bytes, line) {
                let slot = &mut reach[i][marker.index()];
                *slot = (*slot).max(run);
            }
        }

        let mut fences = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            match parse_fence_at(bytes, &lines, i, &reach[i + 1]) {
                Some((fence, closer)) => {
                    fences.push(fence);
                    i = closer + 1;
                }
                None => i += 1,
            }
        }

        fences
    }

    /// Find inline code spans outside `fences`.
    ///
    /// A span closes on the next backtick run of exactly the opening length
    /// and never extends across a fenced block.
    pub fn inline_spans(&self, content: &Content, fences: &[Fence]) -> Vec<InlineCodeSpan> {
        let bytes = content.as_bytes();
        let runs = backtick_runs(bytes, fences);

        // partner[k]: next run after k with the same length.
        let mut partner = vec![None; runs.len()];
        let mut seen: HashMap<usize, usize> = HashMap::new();
        for (k, run) in runs.iter().enumerate().rev() {
            partner[k] = seen.insert(run.length, k);
        }

        let mut spans = Vec::new();
        let mut k = 0;
        while k < runs.len() {
            let open = &runs[k];
            match partner[k].filter(|&p| runs[p].start < open.limit) {
                Some(p) => {
                    spans.push(InlineCodeSpan {
                        start: open.start,
                        end: runs[p].start + open.length,
                        delimiter_length: open.length,
                    });
                    k = p + 1;
                }
                None => k += 1,
            }
        }

        spans
    }
}

/// Calculate the fence length needed to wrap `content`.
///
/// Returns the smallest length (at least 3) longer than every run of the
/// marker character in the content, so no line of the content can close
/// the fence early.
///
/// # Examples
///
/// ```
/// use actdoc::Content;
/// use actdoc::markdown::{FenceMarker, calculate_fence_length};
///
/// assert_eq!(calculate_fence_length(&Content::from("let x = 1;"), FenceMarker::Backtick), 3);
/// assert_eq!(calculate_fence_length(&Content::from("```rust\ncode\n```"), FenceMarker::Backtick), 4);
/// ```
pub fn calculate_fence_length(content: &Content, marker: FenceMarker) -> usize {
    longest_run(content.as_bytes(), marker.byte()).max(2) + 1
}

/// Calculate the backtick count needed for an inline code span.
///
/// Returns the smallest number of backticks (at least 1) that doesn't
/// appear as a run in the content.
pub fn calculate_inline_code_ticks(content: &Content) -> usize {
    longest_run(content.as_bytes(), b'`') + 1
}

fn longest_run(bytes: &[u8], needle: u8) -> usize {
    let mut max_run = 0;
    let mut current_run = 0;
    for &b in bytes {
        if b == needle {
            current_run += 1;
            max_run = max_run.max(current_run);
        } else {
            current_run = 0;
        }
    }
    max_run
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    memchr(b'\n', &bytes[from..]).map_or(bytes.len(), |i| from + i)
}

fn run_length(bytes: &[u8], from: usize, needle: u8) -> usize {
    bytes[from..].iter().take_while(|&&b| b == needle).count()
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| matches!(b, b' ' | b'\t' | b'\r'))
}

/// Byte ranges of every line, line breaks excluded.
fn line_ranges(bytes: &[u8]) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    while start < bytes.len() {
        let end = line_end(bytes, start);
        lines.push(start..end);
        start = end + 1;
    }
    lines
}

/// The marker and run length when `line` can close a fence.
fn closing_run(bytes: &[u8], line: &Range<usize>) -> Option<(FenceMarker, usize)> {
    let marker = FenceMarker::from_byte(*bytes.get(line.start)?)?;
    let run = run_length(&bytes[..line.end], line.start, marker.byte());
    is_blank(&bytes[line.start + run..line.end]).then_some((marker, run))
}

/// Parse an opening fence on line `index` and find its closer.
///
/// `reach` holds the longest closing run per marker on the lines after the
/// opener. Returns the fence and the index of its closing line.
fn parse_fence_at(
    bytes: &[u8],
    lines: &[Range<usize>],
    index: usize,
    reach: &[usize; 2],
) -> Option<(Fence, usize)> {
    let Range { start, end } = lines[index].clone();
    let marker = FenceMarker::from_byte(*bytes.get(start)?)?;
    let length = run_length(&bytes[..end], start, marker.byte());
    if length < 3 || length > reach[marker.index()] {
        return None;
    }

    let info = Content::of(&bytes[start + length..end]).trim();
    if marker == FenceMarker::Backtick && info.contains("`") {
        return None;
    }

    let content_start = end + 1;
    let (closer, close_line) = lines[index + 1..]
        .iter()
        .enumerate()
        .find(|(_, line)| closing_run(bytes, line).is_some_and(|(m, run)| m == marker && run >= length))?;

    let content_end = if close_line.start > content_start {
        let before_nl = close_line.start - 1;
        if before_nl > content_start && bytes[before_nl - 1] == b'\r' {
            before_nl - 1
        } else {
            before_nl
        }
    } else {
        content_start
    };

    let fence = Fence {
        marker,
        length,
        language: (!info.is_empty()).then_some(info),
        start,
        content_start,
        content_end,
        end: close_line.end,
    };
    Some((fence, index + 1 + closer))
}

/// A maximal backtick run outside any fence.
struct BacktickRun {
    start: usize,
    length: usize,
    /// Start of the next fence, or end of input. A span opened by this run
    /// must close before it.
    limit: usize,
}

fn backtick_runs(bytes: &[u8], fences: &[Fence]) -> Vec<BacktickRun> {
    let mut runs = Vec::new();
    let mut upcoming = fences.iter().peekable();
    let mut pos = 0;

    while let Some(rel) = memchr(b'`', &bytes[pos..]) {
        let at = pos + rel;
        while upcoming.next_if(|f| f.end <= at).is_some() {}
        let limit = match upcoming.peek() {
            Some(fence) if fence.start <= at => {
                pos = fence.end;
                continue;
            }
            Some(fence) => fence.start,
            None => bytes.len(),
        };
        let length = run_length(bytes, at, b'`');
        runs.push(BacktickRun { start: at, length, limit });
        pos = at + length;
    }

    runs
}
