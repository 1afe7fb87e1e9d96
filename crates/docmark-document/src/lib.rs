//! Read-only model of documents held by the remote document service, the
//! mutation requests it accepts, and the service interfaces docmark talks to.

mod extract;
mod layout;
mod model;
mod request;
mod service;
mod tabs;

pub use extract::{extract_text, extract_text_with, ExtractOptions};
pub use layout::TableLayout;
pub use model::{
    for_each_text_run, Body, Document, DocumentTab, ElementKind, Paragraph, ParagraphElement,
    StructuralElement, Tab, TabProperties, Table, TableCell, TableOfContents, TableRow, TextRun,
};
pub use request::{Request, RunStyle};
pub use service::{DocumentService, ObjectStore, ServiceError, UploadedObject};
pub use tabs::{find_tab, flatten_tabs, TabSummary, UNTITLED_TAB};
