//! Size-bounded regex operations on [`Content`].
//!
//! Manifest text is user supplied, so every regex entry point first checks
//! the input length against [`REGEX_INPUT_LIMIT`] and fails with
//! [`Error::InputTooLarge`] instead of running the match.

use std::ops::Range;

use regex::bytes::{Captures, Regex, Replacer};

use super::Content;
use crate::error::{Error, Result};

/// Largest input, in bytes, accepted by the regex operations.
pub const REGEX_INPUT_LIMIT: usize = 50 * 1024;

impl Content {
    fn regex_input(&self) -> Result<&[u8]> {
        if self.0.len() > REGEX_INPUT_LIMIT {
            return Err(Error::InputTooLarge {
                size: self.0.len(),
                limit: REGEX_INPUT_LIMIT,
            });
        }
        Ok(&self.0)
    }

    /// Whether `re` matches anywhere in the content.
    pub fn is_match(&self, re: &Regex) -> Result<bool> {
        Ok(re.is_match(self.regex_input()?))
    }

    /// Byte range of the first match of `re`.
    pub fn find_regex(&self, re: &Regex) -> Result<Option<Range<usize>>> {
        Ok(re.find(self.regex_input()?).map(|m| m.range()))
    }

    /// Byte ranges of every non-overlapping match of `re`.
    pub fn find_all_regex(&self, re: &Regex) -> Result<Vec<Range<usize>>> {
        Ok(re
            .find_iter(self.regex_input()?)
            .map(|m| m.range())
            .collect())
    }

    /// Capture groups of the first match of `re`.
    pub fn captures<'c>(&'c self, re: &Regex) -> Result<Option<Captures<'c>>> {
        Ok(re.captures(self.regex_input()?))
    }

    /// Replace every match of `re`.
    ///
    /// `replacement` is anything implementing [`Replacer`]: a literal byte
    /// string (with `$1` style group references) or a closure over
    /// [`Captures`].
    pub fn replace_regex<R: Replacer>(&self, re: &Regex, replacement: R) -> Result<Content> {
        let input = self.regex_input()?;
        Ok(Content(re.replace_all(input, replacement).into_owned()))
    }
}
