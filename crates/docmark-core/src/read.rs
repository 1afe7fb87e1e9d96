use docmark_document::{
    extract_text_with, find_tab, flatten_tabs, Document, ExtractOptions, Tab, TabSummary,
};
use serde::Serialize;

/// Summary returned by `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub revision_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl DocumentInfo {
    pub fn from_document(document: &Document) -> Self {
        Self {
            id: document.document_id.clone(),
            title: document.title.clone(),
            revision_id: document.revision_id.clone(),
            link: web_link(&document.document_id),
        }
    }
}

/// Browser link for a document id; none for an empty id.
pub fn web_link(document_id: &str) -> Option<String> {
    let id = document_id.trim();
    if id.is_empty() {
        None
    } else {
        Some(format!("https://docs.google.com/document/d/{id}/edit"))
    }
}

/// Which part of a document `cat` reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CatScope {
    #[default]
    Body,
    Tab(String),
    AllTabs,
}

impl CatScope {
    pub(crate) fn needs_tabs(&self) -> bool {
        !matches!(self, CatScope::Body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabText {
    pub id: String,
    pub title: String,
    pub index: usize,
    pub text: String,
}

impl TabText {
    fn new(tab: &Tab, options: &ExtractOptions) -> Self {
        Self {
            id: tab.tab_properties.tab_id.clone(),
            title: tab.tab_properties.title.clone(),
            index: tab.tab_properties.index,
            text: extract_text_with(tab.content(), options),
        }
    }
}

/// Text produced by `cat`, kept structured so callers can emit JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatOutput {
    Text(String),
    Tab(TabText),
    Tabs(Vec<TabText>),
}

impl CatOutput {
    /// Plain rendering. All-tabs output gives each tab a `=== Tab: title ===`
    /// header, separates tabs with a blank line and ends each non-empty tab
    /// with a newline.
    pub fn to_text(&self) -> String {
        match self {
            CatOutput::Text(text) => text.clone(),
            CatOutput::Tab(tab) => tab.text.clone(),
            CatOutput::Tabs(tabs) => {
                let mut out = String::new();
                for (position, tab) in tabs.iter().enumerate() {
                    if position > 0 {
                        out.push('\n');
                    }
                    let title = if tab.title.is_empty() {
                        docmark_document::UNTITLED_TAB
                    } else {
                        &tab.title
                    };
                    out.push_str(&format!("=== Tab: {title} ===\n"));
                    out.push_str(&tab.text);
                    if !tab.text.is_empty() && !tab.text.ends_with('\n') {
                        out.push('\n');
                    }
                }
                out
            }
        }
    }
}

/// Reads `scope` out of `document`. Returns `None` when a tab query matches
/// nothing.
pub(crate) fn cat_document(
    document: &Document,
    scope: &CatScope,
    options: &ExtractOptions,
) -> Option<CatOutput> {
    match scope {
        CatScope::Body => Some(CatOutput::Text(extract_text_with(document.content(), options))),
        CatScope::Tab(query) => {
            let tabs = flatten_tabs(&document.tabs);
            find_tab(&tabs, query).map(|tab| CatOutput::Tab(TabText::new(tab, options)))
        }
        CatScope::AllTabs => Some(CatOutput::Tabs(
            flatten_tabs(&document.tabs)
                .into_iter()
                .map(|tab| TabText::new(tab, options))
                .collect(),
        )),
    }
}

pub(crate) fn list_tabs(document: &Document) -> Vec<TabSummary> {
    flatten_tabs(&document.tabs)
        .into_iter()
        .map(Tab::summary)
        .collect()
}
