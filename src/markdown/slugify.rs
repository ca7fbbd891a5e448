//! GitHub-style slug generation for heading anchors.

use std::collections::HashMap;

/// Generate a GitHub-style slug from heading text.
///
/// Lowercases the text, keeps letters, digits, `-` and `_`, turns each
/// space into `-` and drops everything else. Runs of hyphens are kept, as
/// GitHub does.
///
/// # Examples
///
/// ```
/// use actdoc::markdown::slugify;
///
/// assert_eq!(slugify("Chapter One"), "chapter-one");
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("inputs & outputs"), "inputs--outputs");
/// ```
pub fn slugify(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else if c == ' ' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}

/// Hands out unique slugs for the headings of one document.
///
/// The first heading with a given slug keeps it; later ones get `-1`, `-2`,
/// and so on, matching GitHub's anchor numbering.
#[derive(Debug, Clone, Default)]
pub struct SlugRegistry {
    seen: HashMap<String, usize>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug for the next heading titled `text`.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        slug
    }
}
