use serde::{Deserialize, Serialize};

/// A document as returned by the service. Field names follow the service's
/// camelCase JSON; absent collections deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub revision_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<Tab>,
}

impl Document {
    /// Content of the default body; empty when the document has none.
    pub fn content(&self) -> &[StructuralElement] {
        self.body
            .as_ref()
            .map(|body| body.content.as_slice())
            .unwrap_or(&[])
    }

    /// End index of the last structural element, or 1 for an empty body.
    pub fn end_index(&self) -> usize {
        self.content()
            .last()
            .map(|element| element.end_index)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// One node of the structural element tree. The service sets exactly one of
/// the payload fields; section breaks carry none of the ones modelled here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<Paragraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_of_contents: Option<TableOfContents>,
}

/// Borrowed view of whichever payload a structural element carries.
#[derive(Debug, Clone, Copy)]
pub enum ElementKind<'a> {
    Paragraph(&'a Paragraph),
    Table(&'a Table),
    TableOfContents(&'a TableOfContents),
    Other,
}

impl StructuralElement {
    pub fn kind(&self) -> ElementKind<'_> {
        if let Some(paragraph) = &self.paragraph {
            ElementKind::Paragraph(paragraph)
        } else if let Some(table) = &self.table {
            ElementKind::Table(table)
        } else if let Some(toc) = &self.table_of_contents {
            ElementKind::TableOfContents(toc)
        } else {
            ElementKind::Other
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub columns: usize,
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOfContents {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default)]
    pub tab_properties: TabProperties,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_tabs: Vec<Tab>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_tab: Option<DocumentTab>,
}

impl Tab {
    pub fn content(&self) -> &[StructuralElement] {
        self.document_tab
            .as_ref()
            .and_then(|tab| tab.body.as_ref())
            .map(|body| body.content.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabProperties {
    #[serde(default)]
    pub tab_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub nesting_level: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tab_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentTab {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

/// Visits every text run depth-first in document order, entering tables
/// cell by cell and tables of contents. The callback receives the run's
/// start index and its content.
pub fn for_each_text_run<'a, F>(content: &'a [StructuralElement], visit: &mut F)
where
    F: FnMut(usize, &'a str),
{
    for element in content {
        match element.kind() {
            ElementKind::Paragraph(paragraph) => {
                for run in &paragraph.elements {
                    if let Some(text) = &run.text_run {
                        visit(run.start_index, &text.content);
                    }
                }
            }
            ElementKind::Table(table) => {
                for row in &table.table_rows {
                    for cell in &row.table_cells {
                        for_each_text_run(&cell.content, visit);
                    }
                }
            }
            ElementKind::TableOfContents(toc) => for_each_text_run(&toc.content, visit),
            ElementKind::Other => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_service_json_with_missing_fields() {
        let document: Document = serde_json::from_str(
            r#"{
                "documentId": "doc-1",
                "title": "Notes",
                "body": {"content": [
                    {"endIndex": 1, "sectionBreak": {}},
                    {"startIndex": 1, "endIndex": 7, "paragraph": {"elements": [
                        {"startIndex": 1, "endIndex": 7, "textRun": {"content": "Hello\n"}}
                    ]}}
                ]}
            }"#,
        )
        .expect("parse document");

        assert_eq!(document.document_id, "doc-1");
        assert_eq!(document.content().len(), 2);
        assert!(matches!(document.content()[0].kind(), ElementKind::Other));
        assert_eq!(document.end_index(), 7);
    }

    #[test]
    fn walks_runs_inside_tables_and_contents() {
        let document: Document = serde_json::from_str(
            r#"{"body": {"content": [
                {"startIndex": 1, "endIndex": 3, "paragraph": {"elements": [
                    {"startIndex": 1, "endIndex": 3, "textRun": {"content": "a\n"}}]}},
                {"startIndex": 3, "endIndex": 10, "table": {"rows": 1, "columns": 1, "tableRows": [
                    {"tableCells": [{"content": [
                        {"startIndex": 5, "endIndex": 7, "paragraph": {"elements": [
                            {"startIndex": 5, "endIndex": 7, "textRun": {"content": "b\n"}}]}}]}]}]}},
                {"startIndex": 10, "endIndex": 14, "tableOfContents": {"content": [
                    {"startIndex": 11, "endIndex": 13, "paragraph": {"elements": [
                        {"startIndex": 11, "endIndex": 13, "textRun": {"content": "c\n"}}]}}]}}
            ]}}"#,
        )
        .expect("parse document");

        let mut runs = Vec::new();
        for_each_text_run(document.content(), &mut |start, text| runs.push((start, text)));
        assert_eq!(runs, vec![(1, "a\n"), (5, "b\n"), (11, "c\n")]);
    }
}
