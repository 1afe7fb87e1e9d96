use docmark_core::{CatOutput, CatScope, Docmark, DocmarkError, ExitCode};
use docmark_document::Document;
use docmark_test_support::{document, paragraph, tab, table, test_config, SimulatedDocuments};
use pretty_assertions::assert_eq;

fn tabbed() -> Document {
    let mut doc = document(
        "doc-1",
        "Handbook",
        vec![
            paragraph(1, "Welcome\n"),
            table(
                9,
                20,
                vec![
                    vec![vec![paragraph(12, "k\n")], vec![paragraph(14, "v\n")]],
                    vec![vec![paragraph(17, "x\n")], vec![paragraph(19, "y\n")]],
                ],
            ),
        ],
    );
    doc.tabs = vec![
        tab(
            "t.a",
            "Overview",
            vec![paragraph(1, "overview text")],
            vec![tab(
                "t.b",
                "Details",
                vec![paragraph(1, "details\n")],
                vec![tab("t.d", "", vec![], vec![])],
            )],
        ),
        tab("t.c", "Appendix", vec![paragraph(1, "appendix\n")], vec![]),
    ];
    doc
}

fn documents() -> SimulatedDocuments {
    SimulatedDocuments::new().with_fixed(tabbed())
}

#[test]
fn info_reports_title_revision_and_link() {
    let documents = documents();
    let docmark = Docmark::bootstrap(test_config(), &documents);

    let info = docmark.info(" doc-1 ").expect("info");
    assert_eq!(info.title, "Handbook");
    assert_eq!(info.revision_id, "rev-1");
    assert_eq!(
        info.link.as_deref(),
        Some("https://docs.google.com/document/d/doc-1/edit")
    );
}

#[test]
fn cat_body_uses_configured_separators_and_budget() {
    let documents = documents();
    let mut config = test_config();
    config.extract.column_separator = ",".into();
    let docmark = Docmark::bootstrap(config, &documents);

    let full = docmark.cat("doc-1", &CatScope::Body, None).expect("cat");
    assert_eq!(full, CatOutput::Text("Welcome\nk\n,v\n\nx\n,y\n".into()));

    let bounded = docmark.cat("doc-1", &CatScope::Body, Some(9)).expect("cat");
    assert_eq!(bounded.to_text(), "Welcome\nk");
}

#[test]
fn cat_single_tab_by_title() {
    let documents = documents();
    let docmark = Docmark::bootstrap(test_config(), &documents);

    let output = docmark
        .cat("doc-1", &CatScope::Tab("details".into()), None)
        .expect("cat tab");
    match output {
        CatOutput::Tab(tab) => {
            assert_eq!(tab.id, "t.b");
            assert_eq!(tab.text, "details\n");
        }
        other => panic!("unexpected output {other:?}"),
    }
}

#[test]
fn cat_unknown_tab_is_not_found() {
    let documents = documents();
    let docmark = Docmark::bootstrap(test_config(), &documents);

    let err = docmark
        .cat("doc-1", &CatScope::Tab("nope".into()), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "tab not found: nope");
    assert_eq!(err.exit_code(), ExitCode::NotFound);
}

#[test]
fn cat_all_tabs_renders_headers_in_flattened_order() {
    let documents = documents();
    let docmark = Docmark::bootstrap(test_config(), &documents);

    let output = docmark
        .cat("doc-1", &CatScope::AllTabs, None)
        .expect("cat all");
    assert_eq!(
        output.to_text(),
        "=== Tab: Overview ===\noverview text\n\n\
         === Tab: Details ===\ndetails\n\n\
         === Tab: (untitled) ===\n\n\
         === Tab: Appendix ===\nappendix\n"
    );
}

#[test]
fn list_tabs_carries_nesting() {
    let documents = documents();
    let docmark = Docmark::bootstrap(test_config(), &documents);

    let tabs = docmark.list_tabs("doc-1").expect("list tabs");
    let summary: Vec<(&str, usize, Option<&str>)> = tabs
        .iter()
        .map(|tab| {
            (
                tab.id.as_str(),
                tab.nesting_level,
                tab.parent_tab_id.as_deref(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("t.a", 0, None),
            ("t.b", 1, Some("t.a")),
            ("t.d", 2, Some("t.b")),
            ("t.c", 0, None),
        ]
    );
}

#[test]
fn unknown_document_and_empty_id() {
    let documents = documents();
    let docmark = Docmark::bootstrap(test_config(), &documents);

    let err = docmark.info("other").unwrap_err();
    assert_eq!(err.to_string(), "document not found (id=other)");

    let err = docmark.list_tabs("  ").unwrap_err();
    assert!(matches!(err, DocmarkError::InvalidInput(_)));
}
