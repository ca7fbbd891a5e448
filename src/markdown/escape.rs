//! Pure escaping utilities for Markdown and embedded HTML.

use crate::content::Content;

/// Escape special Markdown characters in plain text.
///
/// Escapes characters that have special meaning in Markdown:
/// - Backslash: `\\`
/// - Emphasis: `*`, `_`
/// - Links: `[`, `]`
/// - Code: `` ` ``
/// - Headings: `#` (only at line start)
/// - Tables: `|`
/// - HTML: `<`, `>`
/// - Images: `!` (when followed by `[`)
///
/// # Examples
///
/// ```
/// use actdoc::Content;
/// use actdoc::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown(&Content::from("*bold*")), "\\*bold\\*");
/// assert_eq!(escape_markdown(&Content::from("[link]")), "\\[link\\]");
/// ```
pub fn escape_markdown(text: &Content) -> Content {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len() + bytes.len() / 10);
    let mut at_line_start = true;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\\' | b'*' | b'_' | b'[' | b']' | b'`' | b'|' | b'<' | b'>' => {
                result.push(b'\\');
                result.push(b);
            }
            b'#' if at_line_start => {
                result.push(b'\\');
                result.push(b);
            }
            b'!' if bytes.get(i + 1) == Some(&b'[') => {
                result.push(b'\\');
                result.push(b);
            }
            _ => result.push(b),
        }
        at_line_start = b == b'\n';
    }

    Content::from(result)
}

/// Escape `&`, `<` and `>` for HTML text nodes.
pub fn escape_html(text: &Content) -> Content {
    escape_bytes(text, |b| match b {
        b'&' => Some("&amp;"),
        b'<' => Some("&lt;"),
        b'>' => Some("&gt;"),
        _ => None,
    })
}

/// Escape text for use inside a double-quoted HTML attribute.
pub fn escape_html_attribute(text: &Content) -> Content {
    escape_bytes(text, |b| match b {
        b'&' => Some("&amp;"),
        b'<' => Some("&lt;"),
        b'>' => Some("&gt;"),
        b'"' => Some("&quot;"),
        _ => None,
    })
}

/// Escape every `|` not already preceded by a backslash.
///
/// GFM removes the backslash while splitting table cells, including inside
/// code spans and inline HTML, so this is safe for any cell text.
pub fn escape_table_pipes(text: &Content) -> Content {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len() + 4);
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'|' && (i == 0 || bytes[i - 1] != b'\\') {
            result.push(b'\\');
        }
        result.push(b);
    }
    Content::from(result)
}

fn escape_bytes(text: &Content, table: impl Fn(u8) -> Option<&'static str>) -> Content {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len() + bytes.len() / 8);
    for &b in bytes {
        match table(b) {
            Some(entity) => result.extend_from_slice(entity.as_bytes()),
            None => result.push(b),
        }
    }
    Content::from(result)
}
