use docmark_document::{
    extract_text, extract_text_with, find_tab, flatten_tabs, Document, ExtractOptions,
    UNTITLED_TAB,
};
use pretty_assertions::assert_eq;

fn report() -> Document {
    serde_json::from_str(include_str!("fixtures/report.json")).expect("parse fixture")
}

const FULL_TEXT: &str = "Summary\na\n\tb\n\n1\t2ContentsEnd.\n";

#[test]
fn extracts_paragraphs_tables_and_contents_in_order() {
    let document = report();
    assert_eq!(extract_text(document.content(), 0), FULL_TEXT);
}

#[test]
fn never_exceeds_the_budget() {
    let document = report();
    let full = extract_text(document.content(), 0);
    for limit in 1..=(full.len() as i64 + 3) {
        let text = extract_text(document.content(), limit);
        let expected = (limit as usize).min(full.len());
        assert_eq!(text.len(), expected, "limit {limit}");
        assert!(full.starts_with(&text));
    }
}

#[test]
fn non_positive_budget_is_unlimited() {
    let document = report();
    let full = extract_text(document.content(), 0);
    assert_eq!(extract_text(document.content(), -5), full);
    assert_eq!(extract_text(document.content(), i64::MIN), full);
}

#[test]
fn truncation_inside_a_table_stops_the_whole_walk() {
    let document = report();
    let text = extract_text(document.content(), 11);
    assert_eq!(text, "Summary\na\n\t");
}

#[test]
fn separators_are_configurable() {
    let document = report();
    let options = ExtractOptions {
        max_bytes: 0,
        row_separator: " / ".into(),
        column_separator: " | ".into(),
    };
    let text = extract_text_with(document.content(), &options);
    assert!(text.contains("a\n | b\n / 1 | 2"), "{text:?}");
}

#[test]
fn flattens_tabs_pre_order() {
    let document = report();
    let ids: Vec<&str> = flatten_tabs(&document.tabs)
        .iter()
        .map(|tab| tab.tab_properties.tab_id.as_str())
        .collect();
    assert_eq!(ids, vec!["t.a", "t.b", "t.d", "t.e", "t.c"]);
}

#[test]
fn finds_tabs_by_id_then_title() {
    let document = report();
    let tabs = flatten_tabs(&document.tabs);

    let by_id = find_tab(&tabs, "  t.d ").expect("id match");
    assert_eq!(by_id.tab_properties.title, "D");

    let by_title = find_tab(&tabs, "BUDGET").expect("title match");
    assert_eq!(by_title.tab_properties.tab_id, "t.b");

    assert!(find_tab(&tabs, "missing").is_none());
}

#[test]
fn id_match_wins_over_earlier_title_match() {
    let mut document = report();
    document.tabs[0].tab_properties.title = "t.c".into();
    let tabs = flatten_tabs(&document.tabs);
    let found = find_tab(&tabs, "t.c").expect("match");
    assert_eq!(found.tab_properties.title, "C");
}

#[test]
fn summarises_tabs() {
    let document = report();
    let tabs = flatten_tabs(&document.tabs);
    let untitled = tabs[3];
    assert_eq!(untitled.display_title(), UNTITLED_TAB);

    let summary = tabs[1].summary();
    assert_eq!(summary.nesting_level, 1);
    assert_eq!(summary.parent_tab_id.as_deref(), Some("t.a"));
    let json = serde_json::to_value(&summary).expect("serialize");
    assert_eq!(json["parentTabId"], "t.a");
    assert_eq!(tabs[4].content().len(), 1);
}
