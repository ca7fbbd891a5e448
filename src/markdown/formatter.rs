//! Markdown formatting primitives.
//!
//! [`Formatter`] is built once from its collaborators (a [`FenceScanner`]
//! and a [`TableLayout`]) and passed to every section renderer. Each
//! primitive applies the escaping rule of the construct it produces.
//!
//! Block-level primitives (`heading`, `paragraph`, `code`, `table`, `list`,
//! `horizontal_rule`, `center`) end with exactly one line break; use
//! [`Formatter::blocks`] to join them with blank lines.

use super::escape::{escape_html_attribute, escape_markdown};
use super::fence::{FenceMarker, FenceScanner, calculate_fence_length, calculate_inline_code_ticks};
use super::links::{LinkFormat, is_inline_link, rewrite_bare_urls};
use super::slugify::slugify;
use super::table::{Alignment, Table, TableLayout};
use crate::content::Content;
use crate::error::Result;
use crate::section::{MarkerKind, SectionId, managed_block, marker};

/// Configuration for [`Formatter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatterConfig {
    /// How `paragraph` rewrites bare URLs.
    pub link_format: LinkFormat,
    /// Character used for code fences.
    pub fence_marker: FenceMarker,
}

impl FormatterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link_format(mut self, link_format: LinkFormat) -> Self {
        self.link_format = link_format;
        self
    }

    pub fn with_fence_marker(mut self, fence_marker: FenceMarker) -> Self {
        self.fence_marker = fence_marker;
        self
    }
}

/// Layout options for images and badges.
///
/// When any option is set the image is rendered as an HTML `<img>` tag,
/// since Markdown image syntax cannot express size or alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOptions {
    pub width: Option<String>,
    pub height: Option<String>,
    pub align: Option<Alignment>,
}

impl ImageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn with_height(mut self, height: impl Into<String>) -> Self {
        self.height = Some(height.into());
        self
    }

    pub fn with_align(mut self, align: Alignment) -> Self {
        self.align = Some(align);
        self
    }

    fn needs_html(&self) -> bool {
        self.width.is_some() || self.height.is_some() || self.align.is_some()
    }
}

/// List marker style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListKind {
    #[default]
    Unordered,
    Ordered,
}

/// Façade over the Markdown primitives.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    config: FormatterConfig,
    scanner: FenceScanner,
    tables: TableLayout,
}

impl Formatter {
    pub fn new(config: FormatterConfig, scanner: FenceScanner, tables: TableLayout) -> Self {
        Self {
            config,
            scanner,
            tables,
        }
    }

    /// Build a formatter with default collaborators.
    pub fn with_config(config: FormatterConfig) -> Self {
        let scanner = FenceScanner::new();
        Self::new(config, scanner, TableLayout::new(scanner))
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    pub fn scanner(&self) -> &FenceScanner {
        &self.scanner
    }

    /// `#` repeated `level` times (clamped to 1..=6), a space, the text.
    /// Line breaks inside the text become spaces.
    pub fn heading(&self, content: impl Into<Content>, level: u8) -> Content {
        let level = usize::from(level.clamp(1, 6));
        let text = single_line(&content.into());
        Content::concat(&[
            Content::repeat("#", level),
            Content::from(" "),
            text,
            Content::from("\n"),
        ])
    }

    pub fn bold(&self, content: impl Into<Content>) -> Content {
        wrap(&content.into(), "**", "*")
    }

    pub fn italic(&self, content: impl Into<Content>) -> Content {
        wrap(&content.into(), "*", "*")
    }

    /// Inline code using enough backticks to contain the content.
    ///
    /// Multi-line content cannot be inline code and falls back to a fenced
    /// block.
    pub fn inline_code(&self, content: impl Into<Content>) -> Content {
        let content = content.into();
        if content.is_empty() {
            return Content::empty();
        }
        if content.contains("\n") {
            return self.code(content, None);
        }
        let ticks = Content::repeat("`", calculate_inline_code_ticks(&content));
        let spacer = if content.starts_with("`") || content.ends_with("`") {
            " "
        } else {
            ""
        };
        Content::concat(&[
            ticks.as_bytes(),
            spacer.as_bytes(),
            content.as_bytes(),
            spacer.as_bytes(),
            ticks.as_bytes(),
        ])
    }

    /// Fenced code block.
    ///
    /// The fence is longer than any marker run inside the content, so the
    /// content comes back unchanged when the block is parsed. Trailing blank
    /// lines are dropped.
    ///
    /// ```
    /// use actdoc::Formatter;
    ///
    /// let f = Formatter::default();
    /// assert_eq!(f.code("```\ninner\n```", None), "````\n```\ninner\n```\n````\n");
    /// ```
    pub fn code(&self, content: impl Into<Content>, language: Option<&str>) -> Content {
        let body = strip_trailing_blank_lines(&content.into());
        if body.is_empty() {
            return Content::empty();
        }
        let marker = self.config.fence_marker;
        let fence = Content::repeat([marker.byte()], calculate_fence_length(&body, marker));
        let language: String = language
            .unwrap_or("")
            .trim()
            .chars()
            .filter(|&c| c != '\n' && c != '\r' && c != '`')
            .collect();
        Content::concat(&[
            fence.as_bytes(),
            language.as_bytes(),
            b"\n".as_slice(),
            body.as_bytes(),
            b"\n".as_slice(),
            fence.as_bytes(),
            b"\n".as_slice(),
        ])
    }

    /// Inline link.
    ///
    /// Brackets in `text` are escaped unless `text` is itself exactly one
    /// link, image or HTML tag, which lets badges nest inside links.
    pub fn link(&self, text: impl Into<Content>, url: &str) -> Content {
        let text = text.into();
        let text = if is_inline_link(&text) {
            text.trim()
        } else {
            text.escape("[]", '\\')
        };
        Content::concat(&[
            b"[".as_slice(),
            text.as_bytes(),
            b"](".as_slice(),
            escape_url(url).as_bytes(),
            b")".as_slice(),
        ])
    }

    /// Link to a heading of the same document.
    pub fn anchor_link(&self, text: impl Into<Content>) -> Content {
        let text = text.into();
        let anchor = format!("#{}", slugify(&text.to_str_lossy()));
        self.link(text, &anchor)
    }

    /// Image, as Markdown or as an `<img>` tag when `options` ask for layout.
    pub fn image(&self, alt: impl Into<Content>, url: &str, options: &ImageOptions) -> Content {
        let alt = alt.into();
        if !options.needs_html() {
            return Content::concat(&[
                b"![".as_slice(),
                alt.escape("[]", '\\').as_bytes(),
                b"](".as_slice(),
                escape_url(url).as_bytes(),
                b")".as_slice(),
            ]);
        }

        let mut tag = format!(
            "<img src=\"{}\" alt=\"{}\"",
            escape_html_attribute(&Content::from(url)),
            escape_html_attribute(&alt.escape("[]", '\\')),
        );
        if let Some(width) = &options.width {
            tag.push_str(&format!(" width=\"{}\"", escape_html_attribute(&Content::from(width.as_str()))));
        }
        if let Some(height) = &options.height {
            tag.push_str(&format!(" height=\"{}\"", escape_html_attribute(&Content::from(height.as_str()))));
        }
        if let Some(align) = options.align {
            tag.push_str(&format!(" align=\"{}\"", alignment_name(align)));
        }
        tag.push_str(" />");
        Content::from(tag)
    }

    /// Badge image, optionally wrapped in a link.
    pub fn badge(
        &self,
        label: impl Into<Content>,
        image_url: &str,
        link_url: Option<&str>,
        options: &ImageOptions,
    ) -> Content {
        let image = self.image(label, image_url, options);
        match link_url {
            Some(url) => self.link(image, url),
            None => image,
        }
    }

    /// Paragraph text with bare URLs rewritten per
    /// [`FormatterConfig::link_format`].
    ///
    /// Fails with [`crate::Error::InputTooLarge`] for content beyond the
    /// regex size limit.
    pub fn paragraph(&self, content: impl Into<Content>) -> Result<Content> {
        let content = content.into().trim();
        if content.is_empty() {
            return Ok(Content::empty());
        }
        let code = self.scanner.scan(&content);
        let text = rewrite_bare_urls(&content, &code, self.config.link_format)?;
        Ok(text.append("\n"))
    }

    /// Plain text with Markdown syntax characters escaped.
    pub fn text(&self, content: impl Into<Content>) -> Content {
        escape_markdown(&content.into())
    }

    pub fn section_start(&self, id: &SectionId) -> Content {
        marker(id, MarkerKind::Start)
    }

    pub fn section_end(&self, id: &SectionId) -> Content {
        marker(id, MarkerKind::End)
    }

    /// `content` wrapped in the marker pair for `id`.
    pub fn section(&self, id: &SectionId, content: impl Into<Content>) -> Content {
        managed_block(id, &content.into())
    }

    pub fn table(&self, table: &Table) -> Content {
        self.tables.render(table)
    }

    /// Bulleted or numbered list. Empty items are skipped; continuation
    /// lines are indented under the item text.
    pub fn list<I, C>(&self, items: I, kind: ListKind) -> Content
    where
        I: IntoIterator<Item = C>,
        C: Into<Content>,
    {
        let mut out = Vec::new();
        let mut number = 0;
        for item in items {
            let item = item.into().trim();
            if item.is_empty() {
                continue;
            }
            number += 1;
            let bullet = match kind {
                ListKind::Unordered => "- ".to_string(),
                ListKind::Ordered => format!("{number}. "),
            };
            let indent = " ".repeat(bullet.len());
            for (i, line) in item.split_lines().iter().enumerate() {
                if i == 0 {
                    out.extend_from_slice(bullet.as_bytes());
                } else if !line.trim().is_empty() {
                    out.extend_from_slice(indent.as_bytes());
                }
                out.extend_from_slice(line.trim_end().as_bytes());
                out.push(b'\n');
            }
        }
        Content::from(out)
    }

    pub fn horizontal_rule(&self) -> Content {
        Content::from("---\n")
    }

    pub fn line_break(&self) -> Content {
        Content::from("\n")
    }

    /// Content inside a centered HTML container, each non-empty line
    /// indented by two spaces.
    pub fn center(&self, content: impl Into<Content>) -> Content {
        let content = content.into().trim_end();
        let content = strip_trailing_blank_lines(&content);
        if content.is_empty() {
            return Content::empty();
        }
        let mut out = b"<div align=\"center\">\n\n".to_vec();
        for line in content.split_lines() {
            if !line.trim().is_empty() {
                out.extend_from_slice(b"  ");
                out.extend_from_slice(line.as_bytes());
            }
            out.push(b'\n');
        }
        out.extend_from_slice(b"\n</div>\n");
        Content::from(out)
    }

    /// Join block fragments with one blank line, skipping empty ones.
    pub fn blocks<I, C>(&self, parts: I) -> Content
    where
        I: IntoIterator<Item = C>,
        C: Into<Content>,
    {
        let mut out = Vec::new();
        for part in parts {
            let part = part.into().trim_end();
            if part.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.extend_from_slice(b"\n\n");
            }
            out.extend_from_slice(part.as_bytes());
        }
        if !out.is_empty() {
            out.push(b'\n');
        }
        Content::from(out)
    }
}

fn wrap(content: &Content, delimiter: &str, escaped: &str) -> Content {
    if content.is_empty() {
        return Content::empty();
    }
    Content::concat(&[
        delimiter.as_bytes(),
        content.escape(escaped, '\\').as_bytes(),
        delimiter.as_bytes(),
    ])
}

fn single_line(content: &Content) -> Content {
    content.trim().replace_all("\r\n", " ").replace_all("\n", " ")
}

fn escape_url(url: &str) -> Content {
    Content::from(url.trim()).escape(")", '\\')
}

fn alignment_name(align: Alignment) -> &'static str {
    match align {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    }
}

/// Drop trailing lines that contain only whitespace, and the line break
/// ending the last kept line.
fn strip_trailing_blank_lines(content: &Content) -> Content {
    let bytes = content.as_bytes();
    let mut end = bytes.len();
    loop {
        let line_start = memchr::memrchr(b'\n', &bytes[..end]).map_or(0, |i| i + 1);
        let blank = bytes[line_start..end]
            .iter()
            .all(|b| matches!(b, b' ' | b'\t' | b'\r'));
        if !blank {
            break;
        }
        if line_start == 0 {
            return Content::empty();
        }
        end = line_start - 1;
    }
    if end > 0 && bytes[end - 1] == b'\r' {
        end -= 1;
    }
    content.slice_bytes(0..end)
}
