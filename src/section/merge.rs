//! Splicing rendered sections into an existing document.
//!
//! Merging is idempotent: merging the output again with the same sections
//! reproduces it byte for byte. Literal text keeps its bytes and relative
//! order; the only edit ever made to it is a line break appended to a final
//! literal that lacks one, so a new section's start marker begins its own
//! line.

use std::collections::HashMap;

use super::document::{Block, Document, MergeWarning};
use super::SectionId;
use crate::content::Content;

/// Freshly rendered sections in canonical order.
///
/// The order in which ids are first inserted is the canonical section
/// order used to place sections missing from the existing document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedSections {
    entries: Vec<(SectionId, Content)>,
}

impl RenderedSections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the content for `id`. Replacing keeps the original
    /// position.
    pub fn insert(&mut self, id: SectionId, content: impl Into<Content>) {
        let content = content.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = content,
            None => self.entries.push((id, content)),
        }
    }

    pub fn with(mut self, id: SectionId, content: impl Into<Content>) -> Self {
        self.insert(id, content);
        self
    }

    pub fn get(&self, id: &SectionId) -> Option<&Content> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, content)| content)
    }

    pub fn contains(&self, id: &SectionId) -> bool {
        self.position(id).is_some()
    }

    /// Canonical index of `id`.
    pub fn position(&self, id: &SectionId) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| existing == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SectionId, &Content)> {
        self.entries.iter().map(|(id, content)| (id, content))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(SectionId, Content)> for RenderedSections {
    fn from_iter<I: IntoIterator<Item = (SectionId, Content)>>(iter: I) -> Self {
        let mut sections = RenderedSections::new();
        for (id, content) in iter {
            sections.insert(id, content);
        }
        sections
    }
}

/// Final document bytes plus any recoverable problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub content: Content,
    pub warnings: Vec<MergeWarning>,
}

/// Merge `sections` into `existing`. An absent document is treated as empty.
///
/// - Managed blocks for ids in `sections` get the fresh content; ids whose
///   fresh content is empty are removed together with their markers.
/// - Markers for ids not in `sections` are left alone as literal text.
/// - Sections missing from the document are inserted directly before the
///   first managed block that follows them canonically, or appended.
///
/// # Examples
///
/// ```
/// use actdoc::Content;
/// use actdoc::section::{RenderedSections, SectionId, merge};
///
/// let existing = Content::from("<!-- usage:start -->\nold\n<!-- usage:end -->");
/// let sections = RenderedSections::new().with(SectionId::USAGE, "new");
/// let outcome = merge(Some(&existing), &sections);
/// assert_eq!(outcome.content, "<!-- usage:start -->\n\nnew\n\n<!-- usage:end -->\n");
/// ```
pub fn merge(existing: Option<&Content>, sections: &RenderedSections) -> MergeOutcome {
    let empty = Content::empty();
    let parsed = Document::parse(existing.unwrap_or(&empty), |id| sections.contains(id));
    let mut warnings = parsed.warnings;

    let mut seen: HashMap<SectionId, usize> = HashMap::new();
    for id in parsed.document.blocks().iter().filter_map(Block::managed_id) {
        let count = seen.entry(id.clone()).or_insert(0);
        *count += 1;
        if *count == 2 {
            warnings.push(MergeWarning::DuplicateSection(id.clone()));
        }
    }

    let mut blocks: Vec<Block> = parsed
        .document
        .into_blocks()
        .into_iter()
        .filter_map(|block| match block {
            Block::Managed { id, .. } => {
                let fresh = sections.get(&id)?;
                if fresh.trim().is_empty() {
                    None
                } else {
                    Some(Block::Managed {
                        id,
                        body: fresh.clone(),
                    })
                }
            }
            literal => Some(literal),
        })
        .collect();

    for (index, (id, content)) in sections.iter().enumerate() {
        if content.trim().is_empty() || seen.contains_key(id) {
            continue;
        }
        let at = blocks
            .iter()
            .position(|block| {
                block
                    .managed_id()
                    .and_then(|other| sections.position(other))
                    .is_some_and(|other| other > index)
            })
            .unwrap_or(blocks.len());
        if at > 0
            && let Some(Block::Literal(text)) = blocks.get_mut(at - 1)
            && !text.is_empty()
            && !text.ends_with("\n")
        {
            *text = text.append("\n");
        }
        blocks.insert(at, Block::Managed {
            id: id.clone(),
            body: content.clone(),
        });
    }

    MergeOutcome {
        content: Document::new(blocks).to_content(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::Formatter;
    use proptest::prelude::*;

    fn merged(existing: Option<&str>, sections: &RenderedSections) -> String {
        let existing = existing.map(Content::from);
        merge(existing.as_ref(), sections).content.to_string()
    }

    #[test]
    fn test_replace_existing_section() {
        let sections = RenderedSections::new().with(SectionId::USAGE, "new");
        assert_eq!(
            merged(Some("<!-- usage:start -->\nold\n<!-- usage:end -->"), &sections),
            "<!-- usage:start -->\n\nnew\n\n<!-- usage:end -->\n"
        );
    }

    #[test]
    fn test_absent_document_gets_sections_in_order() {
        let sections = RenderedSections::new()
            .with(SectionId::HEADER, "# Title")
            .with(SectionId::USAGE, "Use it.");
        assert_eq!(
            merged(None, &sections),
            "<!-- header:start -->\n\n# Title\n\n<!-- header:end -->\n\
             <!-- usage:start -->\n\nUse it.\n\n<!-- usage:end -->\n"
        );
    }

    #[test]
    fn test_literal_text_is_preserved() {
        let doc = "# My Action\n\nHand written.\n<!-- usage:start -->\nold\n<!-- usage:end -->\n\n## Notes\nMore.";
        let sections = RenderedSections::new().with(SectionId::USAGE, "fresh");
        assert_eq!(
            merged(Some(doc), &sections),
            "# My Action\n\nHand written.\n<!-- usage:start -->\n\nfresh\n\n<!-- usage:end -->\n\n## Notes\nMore."
        );
    }

    #[test]
    fn test_new_section_inserted_before_canonical_successor() {
        let doc = "intro\n<!-- outputs:start -->\no\n<!-- outputs:end -->\n";
        let sections = RenderedSections::new()
            .with(SectionId::INPUTS, "i")
            .with(SectionId::OUTPUTS, "o");
        assert_eq!(
            merged(Some(doc), &sections),
            "intro\n\
             <!-- inputs:start -->\n\ni\n\n<!-- inputs:end -->\n\
             <!-- outputs:start -->\n\no\n\n<!-- outputs:end -->\n"
        );
    }

    #[test]
    fn test_new_section_appended_after_literal_without_newline() {
        let sections = RenderedSections::new().with(SectionId::LICENSE, "MIT");
        assert_eq!(
            merged(Some("# Title"), &sections),
            "# Title\n<!-- license:start -->\n\nMIT\n\n<!-- license:end -->\n"
        );
    }

    #[test]
    fn test_empty_content_removes_section() {
        let doc = "a\n<!-- usage:start -->\nold\n<!-- usage:end -->\nb\n";
        let sections = RenderedSections::new().with(SectionId::USAGE, "");
        assert_eq!(merged(Some(doc), &sections), "a\nb\n");
        assert_eq!(merged(None, &sections), "");
    }

    #[test]
    fn test_unknown_sections_untouched() {
        let doc = "<!-- custom:start -->\nkeep me\n<!-- custom:end -->\n";
        let sections = RenderedSections::new().with(SectionId::USAGE, "u");
        assert_eq!(
            merged(Some(doc), &sections),
            "<!-- custom:start -->\nkeep me\n<!-- custom:end -->\n\
             <!-- usage:start -->\n\nu\n\n<!-- usage:end -->\n"
        );
    }

    #[test]
    fn test_unterminated_section_warns_and_closes() {
        let existing = Content::from("top\n<!-- usage:start -->\nstale");
        let sections = RenderedSections::new().with(SectionId::USAGE, "u");
        let outcome = merge(Some(&existing), &sections);
        assert_eq!(outcome.content, "top\n<!-- usage:start -->\n\nu\n\n<!-- usage:end -->\n");
        assert_eq!(outcome.warnings, vec![MergeWarning::UnterminatedSection(
            SectionId::USAGE
        )]);
    }

    #[test]
    fn test_duplicate_sections_replaced_and_reported() {
        let existing = Content::from(
            "<!-- usage:start -->\na\n<!-- usage:end -->\nmid\n<!-- usage:start -->\nb\n<!-- usage:end -->\n",
        );
        let sections = RenderedSections::new().with(SectionId::USAGE, "u");
        let outcome = merge(Some(&existing), &sections);
        let block = "<!-- usage:start -->\n\nu\n\n<!-- usage:end -->\n";
        assert_eq!(outcome.content.to_string(), format!("{block}mid\n{block}"));
        assert_eq!(outcome.warnings, vec![MergeWarning::DuplicateSection(SectionId::USAGE)]);
    }

    #[test]
    fn test_fenced_marker_body_is_stable() {
        let sections = RenderedSections::new().with(
            SectionId::USAGE,
            Formatter::default().code("<!-- usage:start -->\n<!-- usage:end -->", Some("md")),
        );
        let once = merge(None, &sections).content;
        let twice = merge(Some(&once), &sections).content;
        assert_eq!(once, twice);
        assert_eq!(
            once,
            "<!-- usage:start -->\n\n```md\n<!-- usage:start -->\n<!-- usage:end -->\n```\n\n\
             <!-- usage:end -->\n"
        );
    }

    #[test]
    fn test_fenced_marker_example_in_literal_is_kept() {
        let existing = "\
Example:

```md
<!-- usage:start -->
example
<!-- usage:end -->
```
";
        let sections = RenderedSections::new().with(SectionId::USAGE, "real");
        let out = merged(Some(existing), &sections);
        assert_eq!(
            out,
            format!("{existing}<!-- usage:start -->\n\nreal\n\n<!-- usage:end -->\n")
        );
    }

    #[test]
    fn test_rendered_sections_keep_first_position() {
        let mut sections = RenderedSections::new()
            .with(SectionId::HEADER, "h")
            .with(SectionId::USAGE, "u");
        sections.insert(SectionId::HEADER, "h2");
        assert_eq!(sections.position(&SectionId::HEADER), Some(0));
        assert_eq!(sections.get(&SectionId::HEADER), Some(&Content::from("h2")));
        assert_eq!(sections.len(), 2);
    }

    const IDS: [SectionId; 4] = [
        SectionId::HEADER,
        SectionId::USAGE,
        SectionId::INPUTS,
        SectionId::LICENSE,
    ];

    fn piece() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z #\\n]{0,12}",
            (0..IDS.len(), any::<bool>()).prop_map(|(i, start)| {
                let kind = if start { "start" } else { "end" };
                format!("<!-- {}:{kind} -->\n", IDS[i])
            }),
        ]
    }

    /// A fenced Markdown example showing the markers of one section.
    fn marker_example(i: usize) -> Content {
        let id = &IDS[i];
        Formatter::default().code(format!("<!-- {id}:start -->\n<!-- {id}:end -->"), Some("md"))
    }

    fn body() -> impl Strategy<Value = Content> {
        prop_oneof![
            "[a-z \\n]{0,10}".prop_map(Content::from),
            (0..IDS.len(), "[a-z ]{0,6}").prop_map(|(i, text)| {
                Content::concat(&[Content::from(text), Content::from("\n"), marker_example(i)])
            }),
        ]
    }

    fn sections() -> impl Strategy<Value = RenderedSections> {
        prop::collection::vec((0..IDS.len(), body()), 0..5).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(i, body)| (IDS[i].clone(), body))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(
            pieces in prop::collection::vec(piece(), 0..8),
            sections in sections(),
        ) {
            let doc = Content::from(pieces.concat());
            let once = merge(Some(&doc), &sections).content;
            let twice = merge(Some(&once), &sections).content;
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_merge_preserves_literal_text(
            literals in prop::collection::vec("[a-z #\\n]{1,12}", 1..4),
            sections in sections(),
        ) {
            let mut doc = String::new();
            for (i, text) in literals.iter().enumerate() {
                doc.push_str(text);
                let id = &IDS[i % IDS.len()];
                if !doc.ends_with('\n') {
                    doc.push('\n');
                }
                doc.push_str(&format!("<!-- {id}:start -->\nold\n<!-- {id}:end -->\n"));
            }
            let out = merge(Some(&Content::from(doc.as_str())), &sections).content.to_string();
            let mut from = 0;
            for text in &literals {
                let found = out[from..].find(text.as_str());
                prop_assert!(found.is_some(), "literal {:?} missing from {:?}", text, out);
                from += found.unwrap_or(0) + text.len();
            }
        }
    }
}
