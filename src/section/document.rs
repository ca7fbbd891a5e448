//! Parsing documents into literal and managed blocks.

use std::fmt;

use memchr::memchr;

use super::{MarkerKind, SectionId, managed_block, parse_marker};
use crate::content::Content;
use crate::markdown::FenceScanner;

/// One region of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Bytes outside any managed section, preserved verbatim.
    Literal(Content),
    /// A section owned by the generator. `body` is whatever sat between the
    /// markers when parsed, or the fresh content after a merge.
    Managed { id: SectionId, body: Content },
}

impl Block {
    pub fn managed_id(&self) -> Option<&SectionId> {
        match self {
            Block::Managed { id, .. } => Some(id),
            Block::Literal(_) => None,
        }
    }
}

/// Recoverable problems found while parsing or merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    /// A start marker had no matching end marker; the section was closed at
    /// end of input.
    UnterminatedSection(SectionId),
    /// The same section appears more than once; every copy was replaced.
    DuplicateSection(SectionId),
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeWarning::UnterminatedSection(id) => {
                write!(f, "section `{id}` has no end marker; closed at end of document")
            }
            MergeWarning::DuplicateSection(id) => {
                write!(f, "section `{id}` appears more than once")
            }
        }
    }
}

/// An ordered sequence of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

/// Result of [`Document::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub document: Document,
    pub warnings: Vec<MergeWarning>,
}

enum State {
    Scanning { literal_start: usize },
    InManagedSection { id: SectionId, body_start: usize },
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Split `source` into blocks.
    ///
    /// Only markers whose id satisfies `is_managed` open a managed block;
    /// any other marker line stays part of the surrounding literal text.
    /// Inside a managed block, every line up to the matching end marker
    /// belongs to the block.
    ///
    /// Marker lines inside a fenced code block are code, not markers, so a
    /// README can show the marker syntax in an example.
    pub fn parse(source: &Content, is_managed: impl Fn(&SectionId) -> bool) -> ParsedDocument {
        let bytes = source.as_bytes();
        let fences = FenceScanner::new().fences(source);
        let mut upcoming = fences.iter().peekable();
        let mut blocks = Vec::new();
        let mut warnings = Vec::new();
        let mut state = State::Scanning { literal_start: 0 };
        let mut line_start = 0;

        while line_start < bytes.len() {
            let line_end = memchr(b'\n', &bytes[line_start..]).map_or(bytes.len(), |i| line_start + i);
            let next_line = (line_end + 1).min(bytes.len());

            while upcoming.next_if(|f| f.end < line_start).is_some() {}
            let in_fence = upcoming.peek().is_some_and(|f| f.start <= line_start);

            if !in_fence && let Some((id, kind)) = parse_marker(&bytes[line_start..line_end]) {
                state = match (state, kind) {
                    (State::Scanning { literal_start }, MarkerKind::Start) if is_managed(&id) => {
                        if line_start > literal_start {
                            blocks.push(Block::Literal(source.slice_bytes(literal_start..line_start)));
                        }
                        State::InManagedSection {
                            id,
                            body_start: next_line,
                        }
                    }
                    (State::InManagedSection { id: open, body_start }, MarkerKind::End)
                        if open == id =>
                    {
                        blocks.push(Block::Managed {
                            id,
                            body: source.slice_bytes(body_start..line_start),
                        });
                        State::Scanning {
                            literal_start: next_line,
                        }
                    }
                    (state, _) => state,
                };
            }

            line_start = line_end + 1;
        }

        match state {
            State::Scanning { literal_start } => {
                if literal_start < bytes.len() {
                    blocks.push(Block::Literal(source.slice_bytes(literal_start..bytes.len())));
                }
            }
            State::InManagedSection { id, body_start } => {
                warnings.push(MergeWarning::UnterminatedSection(id.clone()));
                blocks.push(Block::Managed {
                    id,
                    body: source.slice_bytes(body_start..bytes.len()),
                });
            }
        }

        ParsedDocument {
            document: Document { blocks },
            warnings,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Whether any managed block carries `id`.
    pub fn contains(&self, id: &SectionId) -> bool {
        self.blocks.iter().any(|b| b.managed_id() == Some(id))
    }

    /// Serialize all blocks in order. Literal blocks are emitted unchanged.
    pub fn to_content(&self) -> Content {
        let parts: Vec<Content> = self
            .blocks
            .iter()
            .map(|block| match block {
                Block::Literal(text) => text.clone(),
                Block::Managed { id, body } => managed_block(id, body),
            })
            .collect();
        Content::concat(&parts)
    }
}
