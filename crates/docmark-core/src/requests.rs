use docmark_document::{Request, RunStyle};
use docmark_markdown::{EditOperation, TextStyle};

/// Lowers a compiled operation to a service request. Compiled offsets were
/// fixed against the live base index, so they carry over unchanged.
pub(crate) fn to_request(operation: &EditOperation) -> Request {
    match operation {
        EditOperation::InsertText { offset, text } => Request::InsertText {
            index: *offset,
            text: text.clone(),
        },
        EditOperation::ApplyTextStyle {
            start_offset,
            end_offset,
            style,
        } => Request::UpdateTextStyle {
            start_index: *start_offset,
            end_index: *end_offset,
            style: run_style(style),
        },
        EditOperation::ApplyParagraphStyle {
            start_offset,
            end_offset,
            heading_level,
        } => Request::UpdateParagraphStyle {
            start_index: *start_offset,
            end_index: *end_offset,
            heading_level: *heading_level,
        },
        EditOperation::InsertTable { offset, rows, cols } => Request::InsertTable {
            index: *offset,
            rows: *rows,
            columns: *cols,
        },
        EditOperation::InsertInlineImage { offset, source_url } => Request::InsertInlineImage {
            index: *offset,
            uri: source_url.clone(),
        },
    }
}

fn run_style(style: &TextStyle) -> RunStyle {
    RunStyle {
        bold: style.bold,
        italic: style.italic,
        strikethrough: style.strikethrough,
        monospace: style.monospace,
        link: style.link.clone(),
    }
}
