use thiserror::Error;

use crate::model::Document;
use crate::request::Request;

/// Failures reported by the remote collaborators.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// The remote document service. Each call is one synchronous round trip.
pub trait DocumentService {
    fn get_document(&self, document_id: &str, include_tabs: bool)
        -> Result<Document, ServiceError>;

    /// Applies `requests` in order as one batch.
    fn batch_update(&self, document_id: &str, requests: &[Request]) -> Result<(), ServiceError>;

    /// Creates an empty document and returns it.
    fn create_document(&self, title: &str, parent: Option<&str>)
        -> Result<Document, ServiceError>;
}

/// A temporary object uploaded so the document service can fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub url: String,
    pub object_id: String,
}

/// Object storage used for temporary image uploads.
pub trait ObjectStore {
    fn upload_temporary(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<UploadedObject, ServiceError>;

    fn delete(&self, object_id: &str) -> Result<(), ServiceError>;
}
