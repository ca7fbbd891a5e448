//! Immutable byte content with UTF-8 aware operations.
//!
//! [`Content`] is the value type every other component of the crate works on.
//! It wraps an owned byte sequence that is interpreted as UTF-8 text whenever
//! it is shown to callers. All operations are pure: they borrow `self` and
//! return a new, independent value.
//!
//! Two families of indices exist:
//!
//! - **Character indices** ([`Content::slice`]) count codepoints and never
//!   split a multi-byte sequence.
//! - **Byte offsets** ([`Content::search`], [`Content::slice_bytes`], the
//!   fence scanner's descriptors) address the raw bytes directly and are
//!   only meaningful at positions produced by another byte-level operation.
//!
//! Regex-based operations live in the `pattern` submodule and refuse inputs
//! larger than [`REGEX_INPUT_LIMIT`].

mod pattern;

use std::borrow::Cow;
use std::fmt;
use std::ops::{Bound, Range, RangeBounds};

use bstr::ByteSlice;
use memchr::memmem;

pub use pattern::REGEX_INPUT_LIMIT;

/// Bytes stripped by [`Content::trim`] and friends.
const TRIM_BYTES: &[u8] = b" \t\n\r";

/// An immutable sequence of bytes, exposed as UTF-8 text.
///
/// Equality, ordering and hashing are defined over the underlying bytes.
///
/// # Examples
///
/// ```
/// use actdoc::Content;
///
/// let content = Content::from("a*b");
/// assert_eq!(content.escape("*", '\\'), "a\\*b");
/// assert_eq!(Content::from("héllo").slice(1..3), "él");
/// ```
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Content(Vec<u8>);

impl Content {
    /// The empty value.
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Create content from anything that can be viewed as bytes.
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        Self(bytes.as_ref().to_vec())
    }

    /// Concatenate all parts with a single allocation.
    pub fn concat<T: AsRef<[u8]>>(parts: &[T]) -> Self {
        let total = parts.iter().map(|p| p.as_ref().len()).sum();
        let mut bytes = Vec::with_capacity(total);
        for part in parts {
            bytes.extend_from_slice(part.as_ref());
        }
        Self(bytes)
    }

    /// Build content by repeating `unit` `count` times.
    pub fn repeat(unit: impl AsRef<[u8]>, count: usize) -> Self {
        Self(unit.as_ref().repeat(count))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of codepoints. Invalid UTF-8 sequences count as one each.
    pub fn char_count(&self) -> usize {
        if self.0.is_ascii() {
            self.0.len()
        } else {
            self.0.chars().count()
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// View as `&str` if the bytes are valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// View as text, replacing invalid sequences with U+FFFD.
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        self.0.to_str_lossy()
    }

    /// Return `self` followed by `other`.
    pub fn append(&self, other: impl AsRef<[u8]>) -> Content {
        Content::concat(&[self.as_bytes(), other.as_ref()])
    }

    /// Codepoint-indexed sub-range.
    ///
    /// Indices past the end clamp to the end; an end at or before the start
    /// yields the empty value. The result is always cut on character
    /// boundaries.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Content {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => Some(e.saturating_add(1)),
            Bound::Excluded(&e) => Some(e),
            Bound::Unbounded => None,
        };
        if let Some(end) = end
            && end <= start
        {
            return Content::empty();
        }

        let from = self.char_to_byte(start);
        let to = end.map_or(self.0.len(), |e| self.char_to_byte(e));
        Content(self.0[from..to].to_vec())
    }

    /// Byte-indexed sub-range, clamped to the content length.
    ///
    /// Callers are responsible for passing offsets that fall on character
    /// boundaries, typically ones returned by [`Content::search`] or the
    /// fence scanner.
    pub fn slice_bytes(&self, range: Range<usize>) -> Content {
        let end = range.end.min(self.0.len());
        let start = range.start.min(end);
        Content(self.0[start..end].to_vec())
    }

    fn char_to_byte(&self, index: usize) -> usize {
        if self.0.is_ascii() {
            return index.min(self.0.len());
        }
        self.0
            .char_indices()
            .nth(index)
            .map_or(self.0.len(), |(start, _, _)| start)
    }

    /// Strip spaces, tabs, LF and CR from both ends.
    pub fn trim(&self) -> Content {
        let start = self.leading_trim_len();
        let end = self.0.len() - self.trailing_trim_len();
        if start >= end {
            return Content::empty();
        }
        Content(self.0[start..end].to_vec())
    }

    /// Strip spaces, tabs, LF and CR from the start.
    pub fn trim_start(&self) -> Content {
        Content(self.0[self.leading_trim_len()..].to_vec())
    }

    /// Strip spaces, tabs, LF and CR from the end.
    pub fn trim_end(&self) -> Content {
        Content(self.0[..self.0.len() - self.trailing_trim_len()].to_vec())
    }

    fn leading_trim_len(&self) -> usize {
        self.0
            .iter()
            .take_while(|b| TRIM_BYTES.contains(b))
            .count()
    }

    fn trailing_trim_len(&self) -> usize {
        self.0
            .iter()
            .rev()
            .take_while(|b| TRIM_BYTES.contains(b))
            .count()
    }

    /// Insert `escape_char` before every occurrence of any character in
    /// `chars`, scanning left to right.
    ///
    /// ```
    /// use actdoc::Content;
    ///
    /// assert_eq!(Content::from("[a](b)").escape("[]", '\\'), "\\[a\\](b)");
    /// ```
    pub fn escape(&self, chars: &str, escape_char: char) -> Content {
        if chars.is_empty() {
            return self.clone();
        }
        let mut esc = [0u8; 4];
        let esc = escape_char.encode_utf8(&mut esc).as_bytes();

        let mut out = Vec::with_capacity(self.0.len() + self.0.len() / 8);
        for (start, end, ch) in self.0.char_indices() {
            // Invalid sequences decode to U+FFFD but are copied verbatim.
            if end - start == ch.len_utf8() && chars.contains(ch) {
                out.extend_from_slice(esc);
            }
            out.extend_from_slice(&self.0[start..end]);
        }
        Content(out)
    }

    /// Inverse of [`Content::escape`] for the same `chars` and `escape_char`.
    ///
    /// An escape character is dropped only when the next character is one of
    /// `chars`; every other byte is copied unchanged.
    pub fn unescape(&self, chars: &str, escape_char: char) -> Content {
        let mut out = Vec::with_capacity(self.0.len());
        let mut iter = self.0.char_indices().peekable();
        while let Some((start, end, ch)) = iter.next() {
            if ch == escape_char
                && end - start == ch.len_utf8()
                && let Some(&(n_start, n_end, next)) = iter.peek()
                && n_end - n_start == next.len_utf8()
                && chars.contains(next)
            {
                out.extend_from_slice(&self.0[n_start..n_end]);
                iter.next();
                continue;
            }
            out.extend_from_slice(&self.0[start..end]);
        }
        Content(out)
    }

    /// Split on LF, dropping one trailing CR per line.
    ///
    /// A value ending in LF yields a trailing empty line and the empty value
    /// yields a single empty line.
    pub fn split_lines(&self) -> Vec<Content> {
        let mut lines = Vec::new();
        let mut start = 0;
        for nl in memchr::memchr_iter(b'\n', &self.0) {
            lines.push(Content(strip_cr(&self.0[start..nl]).to_vec()));
            start = nl + 1;
        }
        lines.push(Content(strip_cr(&self.0[start..]).to_vec()));
        lines
    }

    /// Byte offset of the first occurrence of `needle` at or after `offset`.
    pub fn search(&self, needle: impl AsRef<[u8]>, offset: usize) -> Option<usize> {
        let offset = offset.min(self.0.len());
        memmem::find(&self.0[offset..], needle.as_ref()).map(|i| i + offset)
    }

    /// Byte offset of the last occurrence of `needle` that starts at or
    /// before `offset` (the whole value when `offset` is `None`).
    pub fn search_last(&self, needle: impl AsRef<[u8]>, offset: Option<usize>) -> Option<usize> {
        let needle = needle.as_ref();
        let limit = offset.map_or(self.0.len(), |o| o.saturating_add(needle.len()).min(self.0.len()));
        memmem::rfind(&self.0[..limit], needle)
    }

    pub fn contains(&self, needle: impl AsRef<[u8]>) -> bool {
        memmem::find(&self.0, needle.as_ref()).is_some()
    }

    pub fn starts_with(&self, prefix: impl AsRef<[u8]>) -> bool {
        self.0.starts_with(prefix.as_ref())
    }

    pub fn ends_with(&self, suffix: impl AsRef<[u8]>) -> bool {
        self.0.ends_with(suffix.as_ref())
    }

    /// Whether `needle` occurs at byte offset `position`.
    pub fn includes_at(&self, needle: impl AsRef<[u8]>, position: usize) -> bool {
        self.0
            .get(position..)
            .is_some_and(|rest| rest.starts_with(needle.as_ref()))
    }

    /// Byte at `position`, if any.
    pub fn byte_at(&self, position: usize) -> Option<u8> {
        self.0.get(position).copied()
    }

    /// Replace the first occurrence of `needle`.
    pub fn replace(&self, needle: impl AsRef<[u8]>, replacement: impl AsRef<[u8]>) -> Content {
        let needle = needle.as_ref();
        match memmem::find(&self.0, needle) {
            Some(at) => Content::concat(&[
                &self.0[..at],
                replacement.as_ref(),
                &self.0[at + needle.len()..],
            ]),
            None => self.clone(),
        }
    }

    /// Replace every non-overlapping occurrence of `needle`.
    pub fn replace_all(&self, needle: impl AsRef<[u8]>, replacement: impl AsRef<[u8]>) -> Content {
        let needle = needle.as_ref();
        if needle.is_empty() {
            return self.clone();
        }
        Content(self.0.replace(needle, replacement.as_ref()))
    }

    /// Replace every occurrence of `needle` with the output of `f`, which
    /// receives the byte offset of the match.
    pub fn replace_all_with<F>(&self, needle: impl AsRef<[u8]>, mut f: F) -> Content
    where
        F: FnMut(usize) -> Content,
    {
        let needle = needle.as_ref();
        if needle.is_empty() {
            return self.clone();
        }
        let mut out = Vec::with_capacity(self.0.len());
        let mut last = 0;
        for at in memmem::find_iter(&self.0, needle) {
            out.extend_from_slice(&self.0[last..at]);
            out.extend_from_slice(f(at).as_bytes());
            last = at + needle.len();
        }
        out.extend_from_slice(&self.0[last..]);
        Content(out)
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

impl AsRef<[u8]> for Content {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&String> for Content {
    fn from(s: &String) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Content {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&Content> for Content {
    fn from(content: &Content) -> Self {
        content.clone()
    }
}

impl PartialEq<str> for Content {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Content {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<Content> for &str {
    fn eq(&self, other: &Content) -> bool {
        self.as_bytes() == other.0
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Content({:?})", self.0.as_bstr())
    }
}

impl FromIterator<Content> for Content {
    fn from_iter<I: IntoIterator<Item = Content>>(iter: I) -> Self {
        let parts: Vec<Content> = iter.into_iter().collect();
        Content::concat(&parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_is_identity_safe() {
        let empty = Content::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.trim(), "");
        assert_eq!(empty.trim_start(), "");
        assert_eq!(empty.slice(0..10), "");
        assert_eq!(empty.escape("*", '\\'), "");
        assert_eq!(empty.split_lines(), vec![Content::empty()]);
    }

    #[test]
    fn test_append_and_concat() {
        let a = Content::from("foo");
        assert_eq!(a.append("bar"), "foobar");
        assert_eq!(a, "foo");
        assert_eq!(Content::concat(&["a", "", "b", "c"]), "abc");
    }

    #[test]
    fn test_slice_by_codepoint() {
        let c = Content::from("a😀b€c");
        assert_eq!(c.slice(1..2), "😀");
        assert_eq!(c.slice(2..), "b€c");
        assert_eq!(c.slice(..3), "a😀b");
        assert_eq!(c.slice(3..4), "€");
    }

    #[test]
    fn test_slice_clamps_and_empty_ranges() {
        let c = Content::from("hello");
        assert_eq!(c.slice(3..100), "lo");
        assert_eq!(c.slice(10..20), "");
        assert_eq!(c.slice(3..3), "");
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = c.slice(4..2);
        assert_eq!(reversed, "");
        assert_eq!(c.slice(..), "hello");
    }

    #[test]
    fn test_trim_variants() {
        let c = Content::from(" \t\r\nbody \n");
        assert_eq!(c.trim(), "body");
        assert_eq!(c.trim_start(), "body \n");
        assert_eq!(c.trim_end(), " \t\r\nbody");
        assert_eq!(Content::from(" \n\t").trim(), "");
    }

    #[test]
    fn test_escape_asterisk() {
        assert_eq!(Content::from("a*b").escape("*", '\\'), "a\\*b");
    }

    #[test]
    fn test_escape_multiple_chars() {
        let c = Content::from("[x] (y)");
        assert_eq!(c.escape("[]()", '\\'), "\\[x\\] \\(y\\)");
    }

    #[test]
    fn test_escape_non_ascii_set() {
        let c = Content::from("a€b€");
        assert_eq!(c.escape("€", '^'), "a^€b^€");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let c = Content::from("a*b\\c*");
        let escaped = c.escape("*", '\\');
        assert_eq!(escaped, "a\\*b\\c\\*");
        assert_eq!(escaped.unescape("*", '\\'), c);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(Content::from("a\r\nb\nc").split_lines(), vec![
            Content::from("a"),
            Content::from("b"),
            Content::from("c"),
        ]);
        assert_eq!(Content::from("a\n").split_lines(), vec![
            Content::from("a"),
            Content::empty(),
        ]);
    }

    #[test]
    fn test_search() {
        let c = Content::from("abcabc");
        assert_eq!(c.search("bc", 0), Some(1));
        assert_eq!(c.search("bc", 2), Some(4));
        assert_eq!(c.search("bc", 5), None);
        assert_eq!(c.search("zz", 0), None);
        assert_eq!(c.search("a", 100), None);
    }

    #[test]
    fn test_search_last() {
        let c = Content::from("abcabc");
        assert_eq!(c.search_last("abc", None), Some(3));
        assert_eq!(c.search_last("abc", Some(2)), Some(0));
        assert_eq!(c.search_last("x", None), None);
    }

    #[test]
    fn test_includes_at() {
        let c = Content::from("<!-- x -->");
        assert!(c.includes_at("<!--", 0));
        assert!(c.includes_at(b"x", 5));
        assert!(!c.includes_at("x", 4));
        assert!(!c.includes_at("x", 50));
    }

    #[test]
    fn test_replace_first_and_all() {
        let c = Content::from("a-b-c");
        assert_eq!(c.replace("-", "+"), "a+b-c");
        assert_eq!(c.replace_all("-", "+"), "a+b+c");
        assert_eq!(c.replace("x", "+"), "a-b-c");
    }

    #[test]
    fn test_replace_all_with_closure() {
        let c = Content::from("x.x.x");
        let mut n = 0;
        let out = c.replace_all_with("x", |_| {
            n += 1;
            Content::from(n.to_string())
        });
        assert_eq!(out, "1.2.3");
    }

    #[test]
    fn test_equality_is_bytewise() {
        assert_eq!(Content::from("abc"), Content::of(b"abc"));
        assert_ne!(Content::from("abc"), Content::from("abd"));
    }

    #[test]
    fn test_invalid_utf8_is_preserved() {
        let c = Content::of(b"a\xffb");
        assert_eq!(c.escape("b", '\\').as_bytes(), b"a\xff\\b");
        assert_eq!(c.char_count(), 3);
        assert_eq!(c.to_str_lossy(), "a\u{FFFD}b");
    }

    proptest! {
        #[test]
        fn prop_slice_never_splits_codepoints(s in "\\PC{0,40}", i in 0usize..50, j in 0usize..50) {
            let c = Content::from(s.as_str());
            let sliced = c.slice(i..j);
            prop_assert!(sliced.to_str().is_some());
        }

        #[test]
        fn prop_slice_matches_char_semantics(s in "\\PC{0,40}", i in 0usize..50, j in 0usize..50) {
            let expected: String = s.chars().skip(i).take(j.saturating_sub(i)).collect();
            prop_assert_eq!(Content::from(s.as_str()).slice(i..j), Content::from(expected));
        }

        #[test]
        fn prop_escape_is_reversible(s in "[a-z*_\\[\\] ]{0,40}", chars in "[*_\\[\\]]{1,3}") {
            let c = Content::from(s.as_str());
            prop_assert_eq!(c.escape(&chars, '\\').unescape(&chars, '\\'), c);
        }
    }
}
