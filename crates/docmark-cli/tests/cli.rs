use std::fs;
use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SCENARIO: &str = "# Title\n\nHello **world**\n\n| a | b |\n|---|---|\n| 1 | 2 |\n";

const DUMP: &str = r#"{
  "documentId": "doc-9",
  "title": "Field Notes",
  "revisionId": "rev-3",
  "body": {
    "content": [
      { "endIndex": 1, "sectionBreak": {} },
      { "startIndex": 1, "endIndex": 21, "paragraph": { "elements": [
        { "startIndex": 1, "endIndex": 21, "textRun": { "content": "Opening <<docmark-img-0>>\n" } }
      ] } },
      { "startIndex": 27, "endIndex": 40, "paragraph": { "elements": [
        { "startIndex": 27, "endIndex": 40, "textRun": { "content": "Closing words\n" } }
      ] } }
    ]
  },
  "tabs": [
    { "tabProperties": { "tabId": "t.1", "title": "Main", "index": 0 },
      "documentTab": { "body": { "content": [
        { "startIndex": 1, "endIndex": 6, "paragraph": { "elements": [
          { "startIndex": 1, "endIndex": 6, "textRun": { "content": "main\n" } } ] } } ] } },
      "childTabs": [
        { "tabProperties": { "tabId": "t.2", "title": "", "index": 0, "nestingLevel": 1, "parentTabId": "t.1" } }
      ] }
  ]
}"#;

fn setup_file(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    let mut file = fs::File::create(&path).expect("create file");
    file.write_all(contents.as_bytes()).expect("write file");
}

fn docmark(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docmark").expect("binary");
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn compile_describes_text_styles_and_tables() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.md", SCENARIO);

    docmark(temp.path())
        .args(["compile", "doc.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("end offset: 20"))
        .stdout(predicate::str::contains("style 13..18 bold"))
        .stdout(predicate::str::contains("heading 1..7 level 1"))
        .stdout(predicate::str::contains("#0 at 19: 2x2"));
}

#[test]
fn compile_json_includes_anchor_and_descriptor() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.md", SCENARIO);

    let output = docmark(temp.path())
        .args(["compile", "doc.md", "--format", "json", "--base-offset", "5"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(value["plain_text"], "Title\nHello world\n\u{0}");
    assert_eq!(value["tables"][0]["start_offset"], 23);
    assert_eq!(value["tables"][0]["cells"][1][0][0]["text"], "1");
}

#[test]
fn compile_accepts_inline_content_with_escapes() {
    let temp = TempDir::new().expect("tempdir");

    docmark(temp.path())
        .args(["compile", "--content", "# Hi\\n\\nHello **there**"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"text: "Hi\nHello there\n""#))
        .stdout(predicate::str::contains("style 10..15 bold"));
}

#[test]
fn inline_content_conflicts_with_a_file() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.md", SCENARIO);

    docmark(temp.path())
        .args(["render", "doc.md", "--content", "x"])
        .assert()
        .failure();

    docmark(temp.path())
        .args(["render", "--content", "* one\\n* two"])
        .assert()
        .success()
        .stdout("- one\n- two\n");
}

#[test]
fn compile_missing_file_exits_not_found() {
    let temp = TempDir::new().expect("tempdir");

    docmark(temp.path())
        .args(["compile", "absent.md"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn config_override_changes_list_bullets() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "list.md", "- a\n- b\n");
    setup_file(temp.path(), "custom.toml", "[compile]\nbullet = \"* \"\n");

    docmark(temp.path())
        .args(["--config", "custom.toml", "compile", "list.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"text: "* a\n* b\n""#));
}

#[test]
fn render_normalises_markdown() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.md", "Title\n=====\n\n* one\n* two\n");

    docmark(temp.path())
        .args(["render", "doc.md"])
        .assert()
        .success()
        .stdout("# Title\n\n- one\n- two\n");
}

#[test]
fn cat_reads_bounded_body_text() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.json", DUMP);

    docmark(temp.path())
        .args(["cat", "doc.json", "--max-bytes", "7"])
        .assert()
        .success()
        .stdout("Opening");
}

#[test]
fn cat_all_tabs_prints_headers() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.json", DUMP);

    docmark(temp.path())
        .args(["cat", "doc.json", "--all-tabs"])
        .assert()
        .success()
        .stdout("=== Tab: Main ===\nmain\n\n=== Tab: (untitled) ===\n");
}

#[test]
fn cat_unknown_tab_fails_with_not_found() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.json", DUMP);

    docmark(temp.path())
        .args(["cat", "doc.json", "--tab", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("tab not found: nope"));
}

#[test]
fn list_tabs_json_reports_parents() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.json", DUMP);

    docmark(temp.path())
        .args(["list-tabs", "doc.json", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"parentTabId\": \"t.1\""))
        .stdout(predicate::str::contains("\"nestingLevel\": 1"));
}

#[test]
fn info_prints_web_link() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.json", DUMP);

    docmark(temp.path())
        .args(["info", "doc.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("title\tField Notes"))
        .stdout(predicate::str::contains(
            "link\thttps://docs.google.com/document/d/doc-9/edit",
        ));
}

#[test]
fn locate_reports_found_placeholders_only() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.json", DUMP);

    docmark(temp.path())
        .args(["locate", "doc.json", "--images", "2"])
        .assert()
        .success()
        .stdout("0\t9\t26\n");
}

#[test]
fn invalid_dump_is_an_error() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "doc.json", "{ not json");

    docmark(temp.path())
        .args(["info", "doc.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid document dump"));
}
