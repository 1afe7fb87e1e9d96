use docmark_config::{CompileSettings, NumberStyle};
use serde::Serialize;

use crate::element::{InlineSpan, MarkdownElement};
use crate::placeholder::placeholder_marker;
use crate::units::utf16_len;

/// Single unit reserved in the text payload where a table will be inserted.
pub const TABLE_ANCHOR: char = '\u{0}';

/// Character-level formatting applied by `ApplyTextStyle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub monospace: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl TextStyle {
    fn for_span(span: &InlineSpan) -> Self {
        TextStyle {
            bold: span.emphasis.bold,
            italic: span.emphasis.italic,
            strikethrough: span.emphasis.strikethrough,
            monospace: span.emphasis.code,
            link: span.link.clone(),
        }
    }

    fn monospace() -> Self {
        TextStyle {
            monospace: true,
            ..TextStyle::default()
        }
    }
}

/// An index-addressed edit. Offsets live in the coordinate system fixed at
/// compile time; they are never rewritten after emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditOperation {
    InsertText {
        offset: usize,
        text: String,
    },
    ApplyTextStyle {
        start_offset: usize,
        end_offset: usize,
        style: TextStyle,
    },
    ApplyParagraphStyle {
        start_offset: usize,
        end_offset: usize,
        heading_level: u8,
    },
    InsertTable {
        offset: usize,
        rows: usize,
        cols: usize,
    },
    InsertInlineImage {
        offset: usize,
        source_url: String,
    },
}

impl EditOperation {
    /// The first offset this operation touches.
    pub fn start_offset(&self) -> usize {
        match self {
            EditOperation::InsertText { offset, .. }
            | EditOperation::InsertTable { offset, .. }
            | EditOperation::InsertInlineImage { offset, .. } => *offset,
            EditOperation::ApplyTextStyle { start_offset, .. }
            | EditOperation::ApplyParagraphStyle { start_offset, .. } => *start_offset,
        }
    }
}

/// A table deferred to the second wave of mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    /// Offset of the table's anchor unit, relative to the compile base.
    pub start_offset: usize,
    /// Rectangular grid; short rows have been padded with empty cells.
    pub cells: Vec<Vec<Vec<InlineSpan>>>,
}

impl TableDescriptor {
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map(Vec::len).unwrap_or(0)
    }

    /// Concatenated plain text of one cell.
    pub fn cell_text(&self, row: usize, col: usize) -> String {
        self.cells
            .get(row)
            .and_then(|cells| cells.get(col))
            .map(|spans| spans.iter().map(|span| span.text.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn insert_operation(&self, offset: usize) -> EditOperation {
        EditOperation::InsertTable {
            offset,
            rows: self.rows(),
            cols: self.cols(),
        }
    }
}

/// An image marker embedded in the payload, to be swapped for an inline
/// image once the document exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePlaceholder {
    pub ordinal: usize,
    pub marker: String,
    pub offset: usize,
    pub original_ref: String,
    pub is_remote: bool,
}

/// Output of a single compilation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledDocument {
    pub base_offset: usize,
    pub plain_text: String,
    /// Formatting operations only; they reference text that must already exist.
    pub operations: Vec<EditOperation>,
    pub tables: Vec<TableDescriptor>,
    pub placeholders: Vec<ImagePlaceholder>,
    /// Rows padded while normalising ragged tables, as (table index, row index).
    pub padded_rows: Vec<(usize, usize)>,
}

impl CompiledDocument {
    pub fn end_offset(&self) -> usize {
        self.base_offset + utf16_len(&self.plain_text)
    }

    /// The primary insert that must land before any other operation.
    pub fn text_insert(&self) -> EditOperation {
        EditOperation::InsertText {
            offset: self.base_offset,
            text: self.plain_text.clone(),
        }
    }
}

/// Literal text the compiler uses for list prefixes and rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub bullet: String,
    pub indent: String,
    pub rule_text: String,
    pub numbering: NumberStyle,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            bullet: "• ".into(),
            indent: "\t".into(),
            rule_text: "---".into(),
            numbering: NumberStyle::Decimal,
        }
    }
}

impl From<&CompileSettings> for CompileOptions {
    fn from(settings: &CompileSettings) -> Self {
        Self {
            bullet: settings.bullet.clone(),
            indent: settings.indent.clone(),
            rule_text: settings.rule_text.clone(),
            numbering: settings.number_style,
        }
    }
}

/// Compiles elements against `base_offset` using the default options.
pub fn compile(elements: &[MarkdownElement], base_offset: usize) -> CompiledDocument {
    compile_with(elements, base_offset, &CompileOptions::default())
}

/// Single left-to-right pass producing the text payload, the formatting
/// operations, and the deferred tables and image placeholders.
pub fn compile_with(
    elements: &[MarkdownElement],
    base_offset: usize,
    options: &CompileOptions,
) -> CompiledDocument {
    let mut compiler = Compiler::new(base_offset, options);
    for element in elements {
        compiler.element(element);
    }
    compiler.finish()
}

/// Compiles a run of inline spans with no block framing, as used for table
/// cell text.
pub fn compile_inline(spans: &[InlineSpan], base_offset: usize) -> CompiledDocument {
    let options = CompileOptions::default();
    let mut compiler = Compiler::new(base_offset, &options);
    compiler.spans(spans);
    compiler.finish()
}

struct Compiler<'a> {
    options: &'a CompileOptions,
    base_offset: usize,
    offset: usize,
    text: String,
    operations: Vec<EditOperation>,
    tables: Vec<TableDescriptor>,
    placeholders: Vec<ImagePlaceholder>,
    padded_rows: Vec<(usize, usize)>,
    list_counters: Vec<usize>,
}

impl<'a> Compiler<'a> {
    fn new(base_offset: usize, options: &'a CompileOptions) -> Self {
        Self {
            options,
            base_offset,
            offset: base_offset,
            text: String::new(),
            operations: Vec::new(),
            tables: Vec::new(),
            placeholders: Vec::new(),
            padded_rows: Vec::new(),
            list_counters: Vec::new(),
        }
    }

    fn element(&mut self, element: &MarkdownElement) {
        if !element.is_list_item() {
            self.list_counters.clear();
        }

        match element {
            MarkdownElement::Heading { level, spans } => {
                let start = self.offset;
                let len: usize = spans.iter().map(|span| utf16_len(&span.text)).sum();
                self.operations.push(EditOperation::ApplyParagraphStyle {
                    start_offset: start,
                    end_offset: start + len + 1,
                    heading_level: *level,
                });
                self.spans(spans);
                self.push_text("\n");
            }
            MarkdownElement::Paragraph { spans } => {
                self.spans(spans);
                self.push_text("\n");
            }
            MarkdownElement::ListItem {
                ordered,
                depth,
                spans,
            } => {
                let prefix = self.list_prefix(*ordered, *depth);
                self.push_text(&prefix);
                self.spans(spans);
                self.push_text("\n");
            }
            MarkdownElement::Table { rows } => self.table(rows),
            MarkdownElement::ImageRef {
                original_ref,
                is_remote,
                ..
            } => {
                let ordinal = self.placeholders.len();
                let marker = placeholder_marker(ordinal);
                self.placeholders.push(ImagePlaceholder {
                    ordinal,
                    marker: marker.clone(),
                    offset: self.offset,
                    original_ref: original_ref.clone(),
                    is_remote: *is_remote,
                });
                self.push_text(&marker);
                self.push_text("\n");
            }
            MarkdownElement::HorizontalRule => {
                let rule = self.options.rule_text.clone();
                self.push_text(&rule);
                self.push_text("\n");
            }
            MarkdownElement::CodeBlock { text } => {
                let start = self.offset;
                self.push_text(text);
                if self.offset > start {
                    self.operations.push(EditOperation::ApplyTextStyle {
                        start_offset: start,
                        end_offset: self.offset,
                        style: TextStyle::monospace(),
                    });
                }
                self.push_text("\n");
            }
        }
    }

    fn spans(&mut self, spans: &[InlineSpan]) {
        for span in spans {
            let start = self.offset;
            self.push_text(&span.text);
            if span.is_styled() && self.offset > start {
                self.operations.push(EditOperation::ApplyTextStyle {
                    start_offset: start,
                    end_offset: self.offset,
                    style: TextStyle::for_span(span),
                });
            }
        }
    }

    fn table(&mut self, rows: &[Vec<Vec<InlineSpan>>]) {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return;
        }

        let table_index = self.tables.len();
        let mut cells = Vec::with_capacity(rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            let mut row = row.clone();
            if row.len() < width {
                row.resize_with(width, Vec::new);
                self.padded_rows.push((table_index, row_index));
            }
            cells.push(row);
        }

        self.tables.push(TableDescriptor {
            start_offset: self.offset,
            cells,
        });
        let mut anchor = [0u8; 4];
        self.push_text(TABLE_ANCHOR.encode_utf8(&mut anchor));
    }

    fn list_prefix(&mut self, ordered: bool, depth: usize) -> String {
        self.list_counters.resize(depth + 1, 0);
        let indent = self.options.indent.repeat(depth);
        if !ordered {
            self.list_counters[depth] = 0;
            return format!("{indent}{}", self.options.bullet);
        }
        self.list_counters[depth] += 1;
        let number = self.list_counters[depth];
        let label = match self.options.numbering {
            NumberStyle::Decimal => number.to_string(),
            NumberStyle::LowerAlpha => alpha_label(number),
        };
        format!("{indent}{label}. ")
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.offset += utf16_len(text);
    }

    fn finish(self) -> CompiledDocument {
        CompiledDocument {
            base_offset: self.base_offset,
            plain_text: self.text,
            operations: self.operations,
            tables: self.tables,
            placeholders: self.placeholders,
            padded_rows: self.padded_rows,
        }
    }
}

/// 1 → a, 26 → z, 27 → aa.
fn alpha_label(mut number: usize) -> String {
    let mut label = Vec::new();
    while number > 0 {
        number -= 1;
        label.push(b'a' + (number % 26) as u8);
        number /= 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Emphasis;
    use pretty_assertions::assert_eq;

    fn item(ordered: bool, depth: usize, text: &str) -> MarkdownElement {
        MarkdownElement::ListItem {
            ordered,
            depth,
            spans: vec![InlineSpan::plain(text)],
        }
    }

    #[test]
    fn numbers_ordered_items_per_depth() {
        let elements = vec![
            item(true, 0, "a"),
            item(true, 1, "b"),
            item(true, 1, "c"),
            item(true, 0, "d"),
            item(false, 0, "e"),
        ];
        let compiled = compile(&elements, 1);
        assert_eq!(
            compiled.plain_text,
            "1. a\n\t1. b\n\t2. c\n2. d\n• e\n"
        );
    }

    #[test]
    fn lower_alpha_numbering() {
        assert_eq!(alpha_label(1), "a");
        assert_eq!(alpha_label(26), "z");
        assert_eq!(alpha_label(28), "ab");
    }

    #[test]
    fn prefix_counts_toward_offsets() {
        let elements = vec![MarkdownElement::ListItem {
            ordered: false,
            depth: 0,
            spans: vec![InlineSpan::styled(
                "bold",
                Emphasis {
                    bold: true,
                    ..Emphasis::default()
                },
            )],
        }];
        let compiled = compile(&elements, 10);
        assert_eq!(
            compiled.operations,
            vec![EditOperation::ApplyTextStyle {
                start_offset: 12,
                end_offset: 16,
                style: TextStyle {
                    bold: true,
                    ..TextStyle::default()
                },
            }]
        );
    }

    #[test]
    fn pads_ragged_rows_and_records_them() {
        let elements = vec![MarkdownElement::Table {
            rows: vec![
                vec![vec![InlineSpan::plain("a")], vec![InlineSpan::plain("b")]],
                vec![vec![InlineSpan::plain("1")]],
            ],
        }];
        let compiled = compile(&elements, 1);
        assert_eq!(compiled.tables[0].cols(), 2);
        assert_eq!(compiled.tables[0].cell_text(1, 1), "");
        assert_eq!(compiled.padded_rows, vec![(0, 1)]);
    }

    #[test]
    fn empty_table_emits_nothing() {
        let compiled = compile(&[MarkdownElement::Table { rows: vec![] }], 1);
        assert!(compiled.plain_text.is_empty());
        assert!(compiled.tables.is_empty());
    }
}
