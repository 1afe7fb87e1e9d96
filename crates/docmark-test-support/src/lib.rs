//! Shared test harness utilities for docmark crates: an in-memory document
//! service, a recording object store, and document tree builders.

use std::cell::RefCell;
use std::collections::BTreeMap;

use docmark_config::Config;
use docmark_document::{
    Body, Document, DocumentService, DocumentTab, ObjectStore, Paragraph, ParagraphElement,
    Request, ServiceError, StructuralElement, Tab, TabProperties, Table, TableCell,
    TableLayout, TableOfContents, TableRow, TextRun, UploadedObject,
};

/// Returns a baseline configuration for tests.
pub fn test_config() -> Config {
    Config::builtin()
}

/// Object replacement character standing in for inline images in
/// [`SimulatedDocuments::plain_text`].
pub const IMAGE_UNIT: char = '\u{FFFC}';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Text(u16),
    Structure,
    Image(String),
}

#[derive(Debug, Clone)]
struct LiveDocument {
    title: String,
    parent: Option<String>,
    revision: usize,
    slots: Vec<Slot>,
}

impl LiveDocument {
    fn new(title: &str, parent: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            parent: parent.map(str::to_string),
            revision: 1,
            slots: vec![Slot::Text(u16::from(b'\n'))],
        }
    }

    /// Index one past the final newline.
    fn end_index(&self) -> usize {
        self.slots.len() + 1
    }

    fn apply(&mut self, request: &Request) -> Result<(), ServiceError> {
        match request {
            Request::InsertText { index, text } => {
                self.check_insert(*index)?;
                let at = index - 1;
                self.slots
                    .splice(at..at, text.encode_utf16().map(Slot::Text));
            }
            Request::DeleteContentRange {
                start_index,
                end_index,
            } => {
                self.check_range(*start_index, *end_index)?;
                self.slots.drain(start_index - 1..end_index - 1);
            }
            Request::UpdateTextStyle {
                start_index,
                end_index,
                ..
            }
            | Request::UpdateParagraphStyle {
                start_index,
                end_index,
                ..
            } => self.check_range(*start_index, *end_index)?,
            Request::InsertTable {
                index,
                rows,
                columns,
            } => {
                self.check_insert(*index)?;
                if *rows == 0 || *columns == 0 {
                    return Err(ServiceError::Transport(format!(
                        "invalid table shape {rows}x{columns}"
                    )));
                }
                let mut table = vec![Slot::Structure; TableLayout::TABLE_OPEN];
                for _ in 0..*rows {
                    table.extend(vec![Slot::Structure; TableLayout::ROW_OPEN]);
                    for _ in 0..*columns {
                        table.extend(vec![Slot::Structure; TableLayout::CELL_OPEN]);
                        table.push(Slot::Text(u16::from(b'\n')));
                    }
                }
                let at = index - 1;
                self.slots.splice(at..at, table);
            }
            Request::InsertInlineImage { index, uri } => {
                self.check_insert(*index)?;
                self.slots.insert(index - 1, Slot::Image(uri.clone()));
            }
        }
        Ok(())
    }

    fn check_insert(&self, index: usize) -> Result<(), ServiceError> {
        if index == 0 || index >= self.end_index() {
            return Err(ServiceError::Transport(format!(
                "index {index} outside [1, {})",
                self.end_index()
            )));
        }
        Ok(())
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), ServiceError> {
        if start == 0 || start >= end || end > self.end_index() {
            return Err(ServiceError::Transport(format!(
                "range [{start}, {end}) invalid for end index {}",
                self.end_index()
            )));
        }
        Ok(())
    }

    /// Renders the flat body as paragraphs split at newlines. Tables appear
    /// as their cell paragraphs; structure units carry no text run.
    fn render(&self, document_id: &str) -> Document {
        let mut content = vec![StructuralElement {
            start_index: 0,
            end_index: 1,
            ..StructuralElement::default()
        }];
        let mut paragraph_start = 1;
        let mut elements = Vec::new();
        let mut run: Vec<u16> = Vec::new();
        let mut run_start = 1;

        for (position, slot) in self.slots.iter().enumerate() {
            let index = position + 1;
            match slot {
                Slot::Text(unit) => {
                    if run.is_empty() {
                        run_start = index;
                    }
                    run.push(*unit);
                    if *unit == u16::from(b'\n') {
                        flush_run(&mut elements, &mut run, run_start);
                        content.push(paragraph_element(paragraph_start, index + 1, &mut elements));
                        paragraph_start = index + 1;
                    }
                }
                Slot::Structure | Slot::Image(_) => {
                    flush_run(&mut elements, &mut run, run_start);
                    if elements.is_empty() && matches!(slot, Slot::Structure) {
                        paragraph_start = index + 1;
                    }
                }
            }
        }
        flush_run(&mut elements, &mut run, run_start);
        if !elements.is_empty() {
            content.push(paragraph_element(paragraph_start, self.end_index(), &mut elements));
        }

        Document {
            document_id: document_id.to_string(),
            title: self.title.clone(),
            revision_id: format!("rev-{}", self.revision),
            body: Some(Body { content }),
            tabs: Vec::new(),
        }
    }

    fn plain_text(&self) -> String {
        let mut out = String::new();
        let mut units = Vec::new();
        for slot in &self.slots {
            match slot {
                Slot::Text(unit) => units.push(*unit),
                Slot::Structure => {}
                Slot::Image(_) => {
                    out.push_str(&String::from_utf16_lossy(&units));
                    units.clear();
                    out.push(IMAGE_UNIT);
                }
            }
        }
        out.push_str(&String::from_utf16_lossy(&units));
        out
    }
}

fn flush_run(elements: &mut Vec<ParagraphElement>, run: &mut Vec<u16>, start: usize) {
    if run.is_empty() {
        return;
    }
    let content = String::from_utf16_lossy(run);
    elements.push(ParagraphElement {
        start_index: start,
        end_index: start + run.len(),
        text_run: Some(TextRun { content }),
    });
    run.clear();
}

fn paragraph_element(
    start: usize,
    end: usize,
    elements: &mut Vec<ParagraphElement>,
) -> StructuralElement {
    StructuralElement {
        start_index: start,
        end_index: end,
        paragraph: Some(Paragraph {
            elements: std::mem::take(elements),
        }),
        ..StructuralElement::default()
    }
}

#[derive(Default)]
struct SimulatorState {
    live: BTreeMap<String, LiveDocument>,
    fixed: BTreeMap<String, Document>,
    batches: Vec<(String, Vec<Request>)>,
    batch_calls: usize,
    fail_on_batch: Option<usize>,
    created: usize,
}

/// In-memory document service. Live documents are a flat sequence of UTF-16
/// units that accepts the same requests as the remote service; each batch is
/// applied atomically. Fixed documents are returned verbatim and reject
/// mutation.
#[derive(Default)]
pub struct SimulatedDocuments {
    state: RefCell<SimulatorState>,
}

impl SimulatedDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a live document whose body holds `text` plus a final newline.
    pub fn with_text(self, document_id: &str, title: &str, text: &str) -> Self {
        let mut document = LiveDocument::new(title, None);
        if !text.is_empty() {
            document
                .slots
                .splice(0..0, text.encode_utf16().map(Slot::Text));
        }
        self.state
            .borrow_mut()
            .live
            .insert(document_id.to_string(), document);
        self
    }

    /// Adds a read-only document returned exactly as given.
    pub fn with_fixed(self, document: Document) -> Self {
        self.state
            .borrow_mut()
            .fixed
            .insert(document.document_id.clone(), document);
        self
    }

    /// Makes the `nth` call to `batch_update` (1-based) fail without
    /// applying anything.
    pub fn fail_on_batch(self, nth: usize) -> Self {
        self.state.borrow_mut().fail_on_batch = Some(nth);
        self
    }

    /// Every successfully applied batch, in order.
    pub fn batches(&self) -> Vec<(String, Vec<Request>)> {
        self.state.borrow().batches.clone()
    }

    /// Body text with structure units removed and images shown as
    /// [`IMAGE_UNIT`].
    pub fn plain_text(&self, document_id: &str) -> Option<String> {
        self.state
            .borrow()
            .live
            .get(document_id)
            .map(LiveDocument::plain_text)
    }

    pub fn end_index(&self, document_id: &str) -> Option<usize> {
        self.state
            .borrow()
            .live
            .get(document_id)
            .map(LiveDocument::end_index)
    }

    /// Image URIs in body order.
    pub fn images(&self, document_id: &str) -> Vec<String> {
        self.state
            .borrow()
            .live
            .get(document_id)
            .map(|document| {
                document
                    .slots
                    .iter()
                    .filter_map(|slot| match slot {
                        Slot::Image(uri) => Some(uri.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parent_of(&self, document_id: &str) -> Option<String> {
        self.state
            .borrow()
            .live
            .get(document_id)
            .and_then(|document| document.parent.clone())
    }
}

impl DocumentService for SimulatedDocuments {
    fn get_document(&self, document_id: &str, _include_tabs: bool) -> Result<Document, ServiceError> {
        let state = self.state.borrow();
        if let Some(document) = state.fixed.get(document_id) {
            return Ok(document.clone());
        }
        state
            .live
            .get(document_id)
            .map(|document| document.render(document_id))
            .ok_or_else(|| ServiceError::NotFound(document_id.to_string()))
    }

    fn batch_update(&self, document_id: &str, requests: &[Request]) -> Result<(), ServiceError> {
        let mut state = self.state.borrow_mut();
        state.batch_calls += 1;
        if state.fail_on_batch == Some(state.batch_calls) {
            return Err(ServiceError::Transport(format!(
                "injected failure on batch {}",
                state.batch_calls
            )));
        }
        if state.fixed.contains_key(document_id) {
            return Err(ServiceError::Unsupported(format!(
                "document {document_id} is read-only"
            )));
        }
        let document = state
            .live
            .get(document_id)
            .ok_or_else(|| ServiceError::NotFound(document_id.to_string()))?;

        let mut updated = document.clone();
        for request in requests {
            updated.apply(request)?;
        }
        updated.revision += 1;
        state.live.insert(document_id.to_string(), updated);
        state
            .batches
            .push((document_id.to_string(), requests.to_vec()));
        Ok(())
    }

    fn create_document(&self, title: &str, parent: Option<&str>) -> Result<Document, ServiceError> {
        let mut state = self.state.borrow_mut();
        state.created += 1;
        let document_id = format!("sim-doc-{}", state.created);
        let document = LiveDocument::new(title, parent);
        let rendered = document.render(&document_id);
        state.live.insert(document_id, document);
        Ok(rendered)
    }
}

/// An upload recorded by [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub object_id: String,
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Default)]
struct StoreState {
    uploads: Vec<RecordedUpload>,
    deleted: Vec<String>,
    fail_deletes: bool,
    fail_uploads_after: Option<usize>,
}

/// Object store that keeps uploads in memory and records deletions.
#[derive(Default)]
pub struct MemoryObjectStore {
    state: RefCell<StoreState>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `delete` call fails after being recorded.
    pub fn failing_deletes(self) -> Self {
        self.state.borrow_mut().fail_deletes = true;
        self
    }

    /// Uploads beyond the first `count` fail.
    pub fn fail_uploads_after(self, count: usize) -> Self {
        self.state.borrow_mut().fail_uploads_after = Some(count);
        self
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.borrow().uploads.clone()
    }

    /// Object ids passed to `delete`, including failed attempts.
    pub fn deleted(&self) -> Vec<String> {
        self.state.borrow().deleted.clone()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn upload_temporary(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<UploadedObject, ServiceError> {
        let mut state = self.state.borrow_mut();
        if state
            .fail_uploads_after
            .is_some_and(|limit| state.uploads.len() >= limit)
        {
            return Err(ServiceError::Transport(format!("upload of {name} rejected")));
        }
        let object_id = format!("obj-{}", state.uploads.len() + 1);
        state.uploads.push(RecordedUpload {
            object_id: object_id.clone(),
            name: name.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
        });
        Ok(UploadedObject {
            url: format!("https://storage.test/tmp/{object_id}/{name}"),
            object_id,
        })
    }

    fn delete(&self, object_id: &str) -> Result<(), ServiceError> {
        let mut state = self.state.borrow_mut();
        state.deleted.push(object_id.to_string());
        if state.fail_deletes {
            return Err(ServiceError::Transport(format!("delete of {object_id} failed")));
        }
        Ok(())
    }
}

/// A paragraph holding one text run starting at `start`.
pub fn paragraph(start: usize, text: &str) -> StructuralElement {
    let end = start + text.encode_utf16().count();
    StructuralElement {
        start_index: start,
        end_index: end,
        paragraph: Some(Paragraph {
            elements: vec![ParagraphElement {
                start_index: start,
                end_index: end,
                text_run: Some(TextRun {
                    content: text.to_string(),
                }),
            }],
        }),
        ..StructuralElement::default()
    }
}

/// A table whose cells hold the given content.
pub fn table(start: usize, end: usize, cells: Vec<Vec<Vec<StructuralElement>>>) -> StructuralElement {
    let columns = cells.first().map(Vec::len).unwrap_or(0);
    StructuralElement {
        start_index: start,
        end_index: end,
        table: Some(Table {
            rows: cells.len(),
            columns,
            table_rows: cells
                .into_iter()
                .map(|row| TableRow {
                    table_cells: row
                        .into_iter()
                        .map(|content| TableCell {
                            content,
                            ..TableCell::default()
                        })
                        .collect(),
                    ..TableRow::default()
                })
                .collect(),
        }),
        ..StructuralElement::default()
    }
}

pub fn table_of_contents(start: usize, end: usize, content: Vec<StructuralElement>) -> StructuralElement {
    StructuralElement {
        start_index: start,
        end_index: end,
        table_of_contents: Some(TableOfContents { content }),
        ..StructuralElement::default()
    }
}

pub fn document(document_id: &str, title: &str, content: Vec<StructuralElement>) -> Document {
    Document {
        document_id: document_id.to_string(),
        title: title.to_string(),
        revision_id: "rev-1".to_string(),
        body: Some(Body { content }),
        tabs: Vec::new(),
    }
}

/// A tab with the given body and children; nesting metadata is filled in
/// from the children's position.
pub fn tab(tab_id: &str, title: &str, content: Vec<StructuralElement>, children: Vec<Tab>) -> Tab {
    let child_tabs = children
        .into_iter()
        .enumerate()
        .map(|(index, child)| nest(child, tab_id, index, 1))
        .collect();
    Tab {
        tab_properties: TabProperties {
            tab_id: tab_id.to_string(),
            title: title.to_string(),
            ..TabProperties::default()
        },
        child_tabs,
        document_tab: Some(DocumentTab {
            body: Some(Body { content }),
        }),
    }
}

fn nest(mut tab: Tab, parent: &str, index: usize, level: usize) -> Tab {
    tab.tab_properties.parent_tab_id = Some(parent.to_string());
    tab.tab_properties.index = index;
    tab.tab_properties.nesting_level = level;
    let id = tab.tab_properties.tab_id.clone();
    tab.child_tabs = std::mem::take(&mut tab.child_tabs)
        .into_iter()
        .enumerate()
        .map(|(child_index, child)| nest(child, &id, child_index, level + 1))
        .collect();
    tab
}
