use std::path::PathBuf;

use docmark_document::Request;
use docmark_markdown::{compile_with, parse, CompileOptions, CompiledDocument};
use serde::Serialize;

use crate::error::{DocmarkError, DocmarkResult};
use crate::images::{document_not_found, ImagePass};
use crate::read::DocumentInfo;
use crate::requests::to_request;
use crate::table::TableInserter;
use crate::Docmark;

/// How update content is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentFormat {
    #[default]
    Plain,
    Markdown,
}

impl ContentFormat {
    /// Accepts `plain` or `markdown` in any case; blank means plain.
    pub fn parse(raw: &str) -> DocmarkResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "plain" => Ok(Self::Plain),
            "markdown" => Ok(Self::Markdown),
            other => Err(DocmarkError::InvalidInput(format!(
                "invalid format {other:?} (expected plain or markdown)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub document_id: String,
    pub content: String,
    pub format: ContentFormat,
    /// Append after existing content instead of replacing it.
    pub append: bool,
    /// Directory local image references resolve against.
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub document_id: String,
    pub appended: bool,
    pub base_index: usize,
    /// Text units inserted by the primary insert.
    pub inserted_units: usize,
    pub tables_inserted: usize,
    pub images_placed: usize,
    pub images_expected: usize,
}

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub title: String,
    pub parent: Option<String>,
    pub markdown: Option<String>,
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutcome {
    pub document: DocumentInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<UpdateOutcome>,
}

impl Docmark<'_> {
    /// Writes content into an existing document.
    ///
    /// The text batch (optional delete, primary insert, then formatting) goes
    /// first; tables follow against the re-read live end index, and images
    /// are placed last from a fresh scan of the document.
    pub fn update(&self, request: &UpdateRequest) -> DocmarkResult<UpdateOutcome> {
        let document_id = request.document_id.trim();
        if document_id.is_empty() {
            return Err(DocmarkError::InvalidInput("empty document id".to_string()));
        }
        let document = self
            .documents
            .get_document(document_id, false)
            .map_err(|err| DocmarkError::from_service(err, || document_not_found(document_id)))?;

        let end_index = document.end_index();
        let base_index = if request.append && end_index > 1 {
            end_index - 1
        } else {
            1
        };

        let compiled = match request.format {
            ContentFormat::Markdown => {
                let options = CompileOptions::from(&self.config.compile);
                compile_with(&parse(&request.content), base_index, &options)
            }
            ContentFormat::Plain => plain_payload(&request.content, base_index),
        };

        let mut requests = Vec::with_capacity(compiled.operations.len() + 2);
        if !request.append && end_index > 2 {
            requests.push(Request::DeleteContentRange {
                start_index: 1,
                end_index: end_index - 1,
            });
        }
        if !compiled.plain_text.is_empty() {
            requests.push(to_request(&compiled.text_insert()));
            requests.extend(compiled.operations.iter().map(to_request));
        }

        let mut outcome = UpdateOutcome {
            document_id: document_id.to_string(),
            appended: request.append,
            base_index,
            inserted_units: compiled.end_offset() - base_index,
            images_expected: compiled.placeholders.len(),
            ..UpdateOutcome::default()
        };
        if requests.is_empty() {
            return Ok(outcome);
        }

        log::debug!(
            "sending {} requests to {document_id} (base index {base_index})",
            requests.len()
        );
        self.documents.batch_update(document_id, &requests)?;

        if !compiled.tables.is_empty() {
            let live = self.documents.get_document(document_id, false)?;
            let pass = TableInserter::new(self.documents, document_id)
                .insert_all(&compiled.tables, live.end_index())?;
            outcome.tables_inserted = pass.inserted;
        }

        outcome.images_placed = ImagePass {
            documents: self.documents,
            objects: self.objects,
            settings: &self.config.images,
            base_dir: request.base_dir.as_deref(),
        }
        .run(document_id, &compiled.placeholders)?;

        Ok(outcome)
    }

    /// Creates a document, filling it from markdown when given.
    pub fn create(&self, request: &CreateRequest) -> DocmarkResult<CreateOutcome> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(DocmarkError::InvalidInput("empty title".to_string()));
        }
        let parent = request
            .parent
            .as_deref()
            .map(str::trim)
            .filter(|parent| !parent.is_empty());
        let created = self.documents.create_document(title, parent)?;
        log::info!("created document {}", created.document_id);

        let update = match &request.markdown {
            Some(markdown) => Some(self.update(&UpdateRequest {
                document_id: created.document_id.clone(),
                content: markdown.clone(),
                format: ContentFormat::Markdown,
                append: false,
                base_dir: request.base_dir.clone(),
            })?),
            None => None,
        };

        Ok(CreateOutcome {
            document: DocumentInfo::from_document(&created),
            update,
        })
    }
}

fn plain_payload(text: &str, base_index: usize) -> CompiledDocument {
    CompiledDocument {
        base_offset: base_index,
        plain_text: text.to_string(),
        operations: Vec::new(),
        tables: Vec::new(),
        placeholders: Vec::new(),
        padded_rows: Vec::new(),
    }
}
