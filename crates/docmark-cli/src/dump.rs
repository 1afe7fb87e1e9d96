use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use docmark_document::{Document, DocumentService, Request, ServiceError};

/// Read-only document service over a JSON dump of one document.
pub struct DumpDocuments {
    document: Document,
}

impl DumpDocuments {
    /// Loads a dump. Documents without an id take the file stem as theirs.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read document dump '{}'", path.display()))?;
        let mut document: Document = serde_json::from_str(&raw)
            .with_context(|| format!("invalid document dump '{}'", path.display()))?;
        if document.document_id.trim().is_empty() {
            document.document_id = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
        }
        Ok(Self { document })
    }

    pub fn document_id(&self) -> &str {
        &self.document.document_id
    }
}

impl DocumentService for DumpDocuments {
    fn get_document(&self, document_id: &str, include_tabs: bool) -> Result<Document, ServiceError> {
        if document_id != self.document.document_id {
            return Err(ServiceError::NotFound(document_id.to_string()));
        }
        let mut document = self.document.clone();
        if !include_tabs {
            document.tabs.clear();
        }
        Ok(document)
    }

    fn batch_update(&self, document_id: &str, _requests: &[Request]) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported(format!(
            "document dump {document_id} is read-only"
        )))
    }

    fn create_document(&self, title: &str, _parent: Option<&str>) -> Result<Document, ServiceError> {
        Err(ServiceError::Unsupported(format!(
            "cannot create {title:?} from a document dump"
        )))
    }
}
