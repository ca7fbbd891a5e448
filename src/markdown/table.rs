//! Aligned Markdown table rendering.
//!
//! Cells are split into display lines first. Plain text is split on line
//! breaks and trimmed; fenced blocks and multi-line inline code spans stay
//! together as one literal segment rendered as an HTML `<pre>` element, with
//! its line breaks encoded as `&#13;` so the segment occupies one physical
//! table row. Columns are then padded to the widest rendered line.

use unicode_width::UnicodeWidthStr;

use super::escape::{escape_html, escape_html_attribute, escape_table_pipes};
use super::fence::FenceScanner;
use crate::content::Content;

/// Narrowest column, so the separator always has at least three dashes.
const MIN_COLUMN_WIDTH: usize = 3;

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Header cells plus data rows.
///
/// Rows may be ragged; missing cells render empty. Every column is padded
/// to at least three display columns, so the separator row always has
/// three dashes even when all cells are narrower:
///
/// ```
/// use actdoc::{Formatter, Table};
///
/// let table = Table::new(["A", "B"]).with_row(["1", "22"]);
/// assert_eq!(
///     Formatter::default().table(&table),
///     "| A   | B   |\n| --- | --- |\n| 1   | 22  |\n"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<Content>,
    rows: Vec<Vec<Content>>,
    alignments: Vec<Alignment>,
}

impl Table {
    pub fn new<I, C>(headers: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Content>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_row<I, C>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Content>,
    {
        self.push_row(row);
        self
    }

    pub fn push_row<I, C>(&mut self, row: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Content>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Set per-column alignment. Columns without an entry are left aligned.
    pub fn with_alignments(mut self, alignments: impl IntoIterator<Item = Alignment>) -> Self {
        self.alignments = alignments.into_iter().collect();
        self
    }

    pub fn headers(&self) -> &[Content] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Content>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.column_count() == 0
    }

    fn alignment(&self, column: usize) -> Alignment {
        self.alignments.get(column).copied().unwrap_or_default()
    }
}

/// One display line of a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellLine {
    /// Trimmed plain text.
    Text(Content),
    /// A code block or multi-line inline span kept as one literal segment.
    Code {
        text: Content,
        language: Option<Content>,
    },
}

impl CellLine {
    /// The line as it appears between the column pipes.
    pub fn render(&self) -> Content {
        match self {
            CellLine::Text(text) => escape_table_pipes(text),
            CellLine::Code { text, language } => {
                let body = escape_html(&text.replace_all("\r\n", "\n")).replace_all("\n", "&#13;");
                let open = match language {
                    Some(lang) => Content::concat(&[
                        "<pre lang=\"".as_bytes(),
                        escape_html_attribute(lang).as_bytes(),
                        b"\">".as_slice(),
                    ]),
                    None => Content::from("<pre>"),
                };
                escape_table_pipes(&Content::concat(&[
                    open.as_bytes(),
                    body.as_bytes(),
                    b"</pre>".as_slice(),
                ]))
            }
        }
    }
}

/// Lays out [`Table`] values as pipe tables.
#[derive(Debug, Clone, Default)]
pub struct TableLayout {
    scanner: FenceScanner,
}

impl TableLayout {
    pub fn new(scanner: FenceScanner) -> Self {
        Self { scanner }
    }

    /// Split a cell into display lines. Always returns at least one line.
    pub fn cell_lines(&self, cell: &Content) -> Vec<CellLine> {
        let regions = self.scanner.scan(cell);

        let mut literals: Vec<(usize, usize, CellLine)> = regions
            .fences
            .iter()
            .map(|fence| {
                let line = CellLine::Code {
                    text: fence.inner(cell),
                    language: fence.language.clone(),
                };
                (fence.start, fence.end, line)
            })
            .collect();
        for span in &regions.inline {
            let inner = cell.slice_bytes(span.inner_range());
            if inner.contains("\n") {
                let line = CellLine::Code {
                    text: inner.trim(),
                    language: None,
                };
                literals.push((span.start, span.end, line));
            }
        }
        literals.sort_by_key(|(start, _, _)| *start);

        let mut lines = Vec::new();
        let mut pos = 0;
        for (start, end, literal) in literals {
            push_text_lines(&mut lines, &cell.slice_bytes(pos..start));
            lines.push(literal);
            pos = end;
        }
        push_text_lines(&mut lines, &cell.slice_bytes(pos..cell.len()));

        if lines.is_empty() {
            lines.push(CellLine::Text(Content::empty()));
        }
        lines
    }

    /// Render `table`. A table without any column renders as empty content.
    pub fn render(&self, table: &Table) -> Content {
        let columns = table.column_count();
        if columns == 0 {
            return Content::empty();
        }

        let header = self.render_row(table.headers(), columns);
        let rows: Vec<Vec<Vec<Content>>> = table
            .rows()
            .iter()
            .map(|row| self.render_row(row, columns))
            .collect();

        let mut widths = vec![MIN_COLUMN_WIDTH; columns];
        for cells in std::iter::once(&header).chain(rows.iter()) {
            for (column, lines) in cells.iter().enumerate() {
                for line in lines {
                    widths[column] = widths[column].max(display_width(line));
                }
            }
        }

        let mut out = Vec::new();
        let max_header_lines = line_count(&header);
        push_table_line(&mut out, table, &widths, &header, 0);
        push_separator(&mut out, table, &widths);
        for i in 1..max_header_lines {
            push_table_line(&mut out, table, &widths, &header, i);
        }
        for cells in &rows {
            for i in 0..line_count(cells) {
                push_table_line(&mut out, table, &widths, cells, i);
            }
        }

        Content::from(out)
    }

    /// Rendered display lines for each of `columns` cells of a row.
    fn render_row(&self, cells: &[Content], columns: usize) -> Vec<Vec<Content>> {
        (0..columns)
            .map(|column| match cells.get(column) {
                Some(cell) => self.cell_lines(cell).iter().map(CellLine::render).collect(),
                None => vec![Content::empty()],
            })
            .collect()
    }
}

fn push_text_lines(lines: &mut Vec<CellLine>, text: &Content) {
    for line in text.split_lines() {
        let line = line.trim();
        if !line.is_empty() {
            lines.push(CellLine::Text(line));
        }
    }
}

fn display_width(line: &Content) -> usize {
    UnicodeWidthStr::width(line.to_str_lossy().as_ref())
}

fn line_count(cells: &[Vec<Content>]) -> usize {
    cells.iter().map(Vec::len).max().unwrap_or(1).max(1)
}

fn push_table_line(
    out: &mut Vec<u8>,
    table: &Table,
    widths: &[usize],
    cells: &[Vec<Content>],
    index: usize,
) {
    out.push(b'|');
    for (column, width) in widths.iter().enumerate() {
        let empty = Content::empty();
        let text = cells
            .get(column)
            .and_then(|lines| lines.get(index))
            .unwrap_or(&empty);
        let fill = width.saturating_sub(display_width(text));
        let (left, right) = match table.alignment(column) {
            Alignment::Left => (0, fill),
            Alignment::Right => (fill, 0),
            Alignment::Center => (fill / 2, fill - fill / 2),
        };
        out.push(b' ');
        out.extend(std::iter::repeat_n(b' ', left));
        out.extend_from_slice(text.as_bytes());
        out.extend(std::iter::repeat_n(b' ', right));
        out.extend_from_slice(b" |");
    }
    out.push(b'\n');
}

fn push_separator(out: &mut Vec<u8>, table: &Table, widths: &[usize]) {
    out.push(b'|');
    for (column, &width) in widths.iter().enumerate() {
        out.push(b' ');
        match table.alignment(column) {
            Alignment::Left => out.extend(std::iter::repeat_n(b'-', width)),
            Alignment::Center => {
                out.push(b':');
                out.extend(std::iter::repeat_n(b'-', width - 2));
                out.push(b':');
            }
            Alignment::Right => {
                out.extend(std::iter::repeat_n(b'-', width - 1));
                out.push(b':');
            }
        }
        out.extend_from_slice(b" |");
    }
    out.push(b'\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn render(table: &Table) -> String {
        TableLayout::default().render(table).to_string()
    }

    /// Count `|` column delimiters that are not backslash escaped.
    fn delimiters(line: &str) -> usize {
        let bytes = line.as_bytes();
        (0..bytes.len())
            .filter(|&i| bytes[i] == b'|' && (i == 0 || bytes[i - 1] != b'\\'))
            .count()
    }

    #[test]
    fn test_two_column_table() {
        let table = Table::new(["A", "B"]).with_row(["1", "22"]);
        assert_eq!(
            render(&table),
            "| A   | B   |\n\
             | --- | --- |\n\
             | 1   | 22  |\n"
        );
    }

    #[test]
    fn test_wide_cells_set_column_width() {
        let table = Table::new(["Name", "Description"]).with_row(["token", "Access token"]);
        assert_eq!(
            render(&table),
            "| Name  | Description  |\n\
             | ----- | ------------ |\n\
             | token | Access token |\n"
        );
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        assert!(TableLayout::default().render(&Table::default()).is_empty());
        let no_columns = Table::new(Vec::<Content>::new()).with_row(Vec::<Content>::new());
        assert!(TableLayout::default().render(&no_columns).is_empty());
    }

    #[test]
    fn test_pipes_are_escaped() {
        let table = Table::new(["Expr"]).with_row(["a | b"]);
        let out = render(&table);
        assert!(out.contains("a \\| b"));
        for line in out.lines() {
            assert_eq!(delimiters(line), 2);
        }
    }

    #[test]
    fn test_multiline_cells_span_several_lines() {
        let table = Table::new(["Key", "Value"]).with_row(["k", "first\n  second\n\n"]);
        assert_eq!(
            render(&table),
            "| Key | Value  |\n\
             | --- | ------ |\n\
             | k   | first  |\n\
             |     | second |\n"
        );
    }

    #[test]
    fn test_multiline_header_lines_follow_separator() {
        let table = Table::new(["Top\nBottom", "X"]).with_row(["1", "2"]);
        let out = render(&table);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "| Top    | X   |");
        assert_eq!(lines[1], "| ------ | --- |");
        assert_eq!(lines[2], "| Bottom |     |");
        assert_eq!(lines[3], "| 1      | 2   |");
    }

    #[test]
    fn test_fenced_cell_becomes_pre() {
        let layout = TableLayout::default();
        let cell = Content::from("Example:\n```yaml\non: push\nx: <a> | b\n```");
        let lines = layout.cell_lines(&cell);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CellLine::Text(Content::from("Example:")));
        assert_eq!(
            lines[1].render(),
            "<pre lang=\"yaml\">on: push&#13;x: &lt;a&gt; \\| b</pre>"
        );
    }

    #[test]
    fn test_multiline_inline_code_becomes_pre() {
        let layout = TableLayout::default();
        let lines = layout.cell_lines(&Content::from("run `a\nb` now"));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].render(), "<pre>a&#13;b</pre>");
        assert_eq!(lines[2], CellLine::Text(Content::from("now")));
    }

    #[test]
    fn test_single_line_inline_code_stays_plain() {
        let layout = TableLayout::default();
        let lines = layout.cell_lines(&Content::from("use `x`"));
        assert_eq!(lines, vec![CellLine::Text(Content::from("use `x`"))]);
    }

    #[test]
    fn test_ragged_rows_and_alignment() {
        let table = Table::new(["L", "C", "R"])
            .with_alignments([Alignment::Left, Alignment::Center, Alignment::Right])
            .with_row(["a"]);
        assert_eq!(
            render(&table),
            "| L   |  C  |   R |\n\
             | --- | :-: | --: |\n\
             | a   |     |     |\n"
        );
    }

    #[test]
    fn test_wide_characters_use_display_width() {
        let table = Table::new(["名前"]).with_row(["a"]);
        assert_eq!(render(&table), "| 名前 |\n| ---- |\n| a    |\n");
    }

    proptest! {
        #[test]
        fn prop_every_line_has_header_column_count(
            headers in prop::collection::vec("[a-z|` \\n]{0,8}", 1..5),
            rows in prop::collection::vec(prop::collection::vec("[a-z|` \\n]{0,8}", 0..5), 0..4),
        ) {
            let mut table = Table::new(headers.iter().map(String::as_str));
            for row in &rows {
                table.push_row(row.iter().map(String::as_str));
            }
            let columns = table.column_count();
            let out = TableLayout::default().render(&table).to_string();
            for line in out.lines() {
                prop_assert_eq!(delimiters(line), columns + 1);
            }
        }
    }
}
