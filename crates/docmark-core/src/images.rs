use std::path::{Path, PathBuf};

use docmark_config::ImageSettings;
use docmark_document::{for_each_text_run, Document, DocumentService, ObjectStore, Request};
use docmark_markdown::{find_markers, utf16_len, utf16_offset, EditOperation, ImagePlaceholder};
use serde::Serialize;

use crate::error::{DocmarkError, DocmarkResult};
use crate::requests::to_request;

/// Live index range occupied by one placeholder marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderRange {
    pub ordinal: usize,
    pub start_index: usize,
    pub end_index: usize,
}

/// Scans `document` depth-first for markers with ordinals below `expected`.
/// Matches come back in document order; an ordinal seen twice keeps its first
/// position. Markers that are not found are simply absent.
pub fn find_placeholders(document: &Document, expected: usize) -> Vec<PlaceholderRange> {
    let mut found: Vec<PlaceholderRange> = Vec::new();
    for_each_text_run(document.content(), &mut |run_start, text| {
        for marker in find_markers(text) {
            if marker.ordinal >= expected || found.iter().any(|r| r.ordinal == marker.ordinal) {
                continue;
            }
            let start_index = run_start + utf16_offset(text, marker.range.start);
            found.push(PlaceholderRange {
                ordinal: marker.ordinal,
                start_index,
                end_index: start_index + utf16_len(&text[marker.range.clone()]),
            });
        }
    });
    found
}

/// Fetches the live document and locates its placeholders.
pub fn resolve_placeholders(
    service: &dyn DocumentService,
    document_id: &str,
    expected: usize,
) -> DocmarkResult<Vec<PlaceholderRange>> {
    let document = service
        .get_document(document_id, false)
        .map_err(|err| DocmarkError::from_service(err, || document_not_found(document_id)))?;
    let found = find_placeholders(&document, expected);
    if found.len() < expected {
        log::info!(
            "found {} of {expected} image placeholders in {document_id}",
            found.len()
        );
    }
    Ok(found)
}

pub(crate) fn document_not_found(document_id: &str) -> String {
    format!("document not found (id={document_id})")
}

/// Temporary objects uploaded during one command. Deletion is attempted for
/// every object when the guard drops, whatever the outcome; failures are
/// logged and never reported.
pub struct TemporaryUploads<'a> {
    store: &'a dyn ObjectStore,
    objects: Vec<String>,
}

impl<'a> TemporaryUploads<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            objects: Vec::new(),
        }
    }

    pub fn upload(&mut self, path: &Path, settings: &ImageSettings) -> DocmarkResult<String> {
        let content_type = content_type_for(path)?;
        let metadata = std::fs::metadata(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => {
                DocmarkError::NotFound(format!("image not found: {}", path.display()))
            }
            _ => DocmarkError::Io(err),
        })?;
        if metadata.len() > settings.max_upload_bytes {
            return Err(DocmarkError::InvalidInput(format!(
                "image {} is {} bytes, above the {} byte limit",
                path.display(),
                metadata.len(),
                settings.max_upload_bytes
            )));
        }

        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let uploaded = self.store.upload_temporary(&name, &bytes, content_type)?;
        log::debug!("uploaded {} as {}", path.display(), uploaded.object_id);
        self.objects.push(uploaded.object_id);
        Ok(uploaded.url)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Deletes every tracked object now.
    pub fn cleanup(&mut self) {
        for object_id in self.objects.drain(..) {
            if let Err(err) = self.store.delete(&object_id) {
                log::warn!("failed to delete temporary object {object_id}: {err}");
            }
        }
    }
}

impl Drop for TemporaryUploads<'_> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Content type for a local image, from its extension.
pub fn content_type_for(path: &Path) -> DocmarkResult<&'static str> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        "bmp" => Ok("image/bmp"),
        "svg" => Ok("image/svg+xml"),
        _ => Err(DocmarkError::InvalidInput(format!(
            "unsupported image type: {}",
            path.display()
        ))),
    }
}

/// Inputs for the image pass over a document that already holds markers.
pub struct ImagePass<'a> {
    pub documents: &'a dyn DocumentService,
    pub objects: Option<&'a dyn ObjectStore>,
    pub settings: &'a ImageSettings,
    /// Directory local references resolve against.
    pub base_dir: Option<&'a Path>,
}

impl ImagePass<'_> {
    /// Replaces each located placeholder with its image in one batch.
    /// Returns the number of images placed.
    pub fn run(&self, document_id: &str, placeholders: &[ImagePlaceholder]) -> DocmarkResult<usize> {
        if placeholders.is_empty() {
            return Ok(0);
        }
        let ranges = resolve_placeholders(self.documents, document_id, placeholders.len())?;
        if ranges.is_empty() {
            return Ok(0);
        }

        let mut uploads = self.objects.map(TemporaryUploads::new);
        let mut placements = Vec::with_capacity(ranges.len());
        for range in &ranges {
            let Some(image) = placeholders.iter().find(|p| p.ordinal == range.ordinal) else {
                continue;
            };
            let url = if image.is_remote {
                image.original_ref.clone()
            } else {
                let uploads = uploads.as_mut().ok_or_else(|| {
                    DocmarkError::InvalidInput(format!(
                        "no object store available to upload {}",
                        image.original_ref
                    ))
                })?;
                uploads.upload(&self.local_path(&image.original_ref), self.settings)?
            };
            placements.push((*range, url));
        }

        // Later ranges first so earlier indices stay valid within the batch.
        placements.sort_by(|a, b| b.0.start_index.cmp(&a.0.start_index));
        let mut requests = Vec::with_capacity(placements.len() * 2);
        for (range, url) in &placements {
            requests.push(Request::DeleteContentRange {
                start_index: range.start_index,
                end_index: range.end_index,
            });
            requests.push(to_request(&EditOperation::InsertInlineImage {
                offset: range.start_index,
                source_url: url.clone(),
            }));
        }
        log::debug!("sending {} image requests to {document_id}", requests.len());
        self.documents.batch_update(document_id, &requests)?;
        if let Some(uploads) = uploads.as_ref().filter(|uploads| !uploads.is_empty()) {
            log::debug!("removing {} temporary uploads", uploads.len());
        }
        Ok(placements.len())
    }

    fn local_path(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        match self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
