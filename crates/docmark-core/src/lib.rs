//! Core orchestration layer for docmark: pipelines that read documents and
//! write compiled markdown into them through the service interfaces.

pub mod error;
pub mod images;
pub mod payload;
pub mod read;
mod requests;
pub mod table;
pub mod update;

use docmark_config::Config;
use docmark_document::{DocumentService, ExtractOptions, ObjectStore, TabSummary};

pub use error::{DocmarkError, DocmarkResult, ExitCode};
pub use images::{find_placeholders, resolve_placeholders, PlaceholderRange, TemporaryUploads};
pub use payload::{load_payload, Payload, PayloadSource};
pub use read::{web_link, CatOutput, CatScope, DocumentInfo, TabText};
pub use table::{TableInserter, TablePass};
pub use update::{ContentFormat, CreateOutcome, CreateRequest, UpdateOutcome, UpdateRequest};

use images::document_not_found;

/// Entry point for higher-level consumers such as the CLI.
pub struct Docmark<'a> {
    config: Config,
    documents: &'a dyn DocumentService,
    objects: Option<&'a dyn ObjectStore>,
}

impl<'a> Docmark<'a> {
    /// Bootstrap the engine from configuration and a document service.
    pub fn bootstrap(config: Config, documents: &'a dyn DocumentService) -> Self {
        Self {
            config,
            documents,
            objects: None,
        }
    }

    /// Enables uploads of local images.
    pub fn with_object_store(mut self, objects: &'a dyn ObjectStore) -> Self {
        self.objects = Some(objects);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn info(&self, document_id: &str) -> DocmarkResult<DocumentInfo> {
        let document = self.fetch(document_id, false)?;
        Ok(DocumentInfo::from_document(&document))
    }

    /// Bounded plain text of a document, one tab, or every tab. `max_bytes`
    /// overrides the configured budget.
    pub fn cat(
        &self,
        document_id: &str,
        scope: &CatScope,
        max_bytes: Option<i64>,
    ) -> DocmarkResult<CatOutput> {
        let document = self.fetch(document_id, scope.needs_tabs())?;
        let settings = &self.config.extract;
        let options = ExtractOptions {
            max_bytes: max_bytes.unwrap_or(settings.max_bytes),
            row_separator: settings.row_separator.clone(),
            column_separator: settings.column_separator.clone(),
        };
        read::cat_document(&document, scope, &options).ok_or_else(|| match scope {
            CatScope::Tab(query) => DocmarkError::NotFound(format!("tab not found: {query}")),
            _ => DocmarkError::NotFound(document_not_found(document_id)),
        })
    }

    pub fn list_tabs(&self, document_id: &str) -> DocmarkResult<Vec<TabSummary>> {
        let document = self.fetch(document_id, true)?;
        Ok(read::list_tabs(&document))
    }

    /// Live ranges of the first `expected` image placeholders.
    pub fn locate_images(
        &self,
        document_id: &str,
        expected: usize,
    ) -> DocmarkResult<Vec<PlaceholderRange>> {
        resolve_placeholders(self.documents, document_id.trim(), expected)
    }

    fn fetch(
        &self,
        document_id: &str,
        include_tabs: bool,
    ) -> DocmarkResult<docmark_document::Document> {
        let document_id = document_id.trim();
        if document_id.is_empty() {
            return Err(DocmarkError::InvalidInput("empty document id".to_string()));
        }
        self.documents
            .get_document(document_id, include_tabs)
            .map_err(|err| DocmarkError::from_service(err, || document_not_found(document_id)))
    }
}
