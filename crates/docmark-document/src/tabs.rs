use serde::Serialize;

use crate::model::Tab;

/// Display title for tabs without one.
pub const UNTITLED_TAB: &str = "(untitled)";

/// Flattens a tab tree pre-order: each tab precedes its children, and
/// siblings keep document order.
pub fn flatten_tabs(tabs: &[Tab]) -> Vec<&Tab> {
    let mut flat = Vec::new();
    collect(tabs, &mut flat);
    flat
}

fn collect<'a>(tabs: &'a [Tab], flat: &mut Vec<&'a Tab>) {
    for tab in tabs {
        flat.push(tab);
        collect(&tab.child_tabs, flat);
    }
}

/// Finds a tab by exact id across all tabs, then by case-insensitive title.
/// The query is trimmed first.
pub fn find_tab<'a>(tabs: &[&'a Tab], query: &str) -> Option<&'a Tab> {
    let query = query.trim();
    if let Some(tab) = tabs.iter().find(|tab| tab.tab_properties.tab_id == query) {
        return Some(*tab);
    }
    let lowered = query.to_lowercase();
    tabs.iter()
        .find(|tab| tab.tab_properties.title.to_lowercase() == lowered)
        .copied()
}

impl Tab {
    pub fn display_title(&self) -> &str {
        if self.tab_properties.title.is_empty() {
            UNTITLED_TAB
        } else {
            &self.tab_properties.title
        }
    }

    pub fn summary(&self) -> TabSummary {
        let properties = &self.tab_properties;
        TabSummary {
            id: properties.tab_id.clone(),
            title: properties.title.clone(),
            index: properties.index,
            nesting_level: properties.nesting_level,
            parent_tab_id: properties.parent_tab_id.clone(),
        }
    }
}

/// Metadata of one tab, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSummary {
    pub id: String,
    pub title: String,
    pub index: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub nesting_level: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_tab_id: Option<String>,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}
