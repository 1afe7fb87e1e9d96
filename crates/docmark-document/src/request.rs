use serde::Serialize;

/// Character formatting carried by an `UpdateTextStyle` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub monospace: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// One mutation in a batch sent to the document service. Indices are
/// absolute positions in the live document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    InsertText { index: usize, text: String },
    #[serde(rename_all = "camelCase")]
    DeleteContentRange { start_index: usize, end_index: usize },
    #[serde(rename_all = "camelCase")]
    UpdateTextStyle {
        start_index: usize,
        end_index: usize,
        style: RunStyle,
    },
    #[serde(rename_all = "camelCase")]
    UpdateParagraphStyle {
        start_index: usize,
        end_index: usize,
        heading_level: u8,
    },
    #[serde(rename_all = "camelCase")]
    InsertTable {
        index: usize,
        rows: usize,
        columns: usize,
    },
    #[serde(rename_all = "camelCase")]
    InsertInlineImage { index: usize, uri: String },
}

impl Request {
    /// Name of the request kind, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::InsertText { .. } => "insertText",
            Request::DeleteContentRange { .. } => "deleteContentRange",
            Request::UpdateTextStyle { .. } => "updateTextStyle",
            Request::UpdateParagraphStyle { .. } => "updateParagraphStyle",
            Request::InsertTable { .. } => "insertTable",
            Request::InsertInlineImage { .. } => "insertInlineImage",
        }
    }
}
