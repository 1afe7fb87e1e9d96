use std::fs;
use std::path::Path;

use docmark_core::{
    find_placeholders, CreateRequest, Docmark, DocmarkError, PlaceholderRange, TemporaryUploads,
};
use docmark_markdown::{compile, parse, placeholder_marker};
use docmark_test_support::{
    document, paragraph, table, table_of_contents, test_config, MemoryObjectStore,
    SimulatedDocuments, IMAGE_UNIT,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const WITH_IMAGES: &str = "\
Intro

![first](a.png)

![remote](https://example.com/r.gif)

Between

![second](pics/b.jpg)
";

fn image_dir() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a.png"), b"png-bytes").expect("write a.png");
    fs::create_dir(dir.path().join("pics")).expect("mkdir");
    fs::write(dir.path().join("pics/b.jpg"), b"jpg").expect("write b.jpg");
    dir
}

fn create(markdown: &str, dir: &Path) -> CreateRequest {
    CreateRequest {
        title: "  Report ".into(),
        parent: Some("folder-1".into()),
        markdown: Some(markdown.into()),
        base_dir: Some(dir.to_path_buf()),
    }
}

#[test]
fn create_places_images_in_document_order() {
    let dir = image_dir();
    let documents = SimulatedDocuments::new();
    let store = MemoryObjectStore::new();
    let docmark = Docmark::bootstrap(test_config(), &documents).with_object_store(&store);

    let outcome = docmark.create(&create(WITH_IMAGES, dir.path())).expect("create");

    let id = outcome.document.id.clone();
    assert_eq!(outcome.document.title, "Report");
    assert_eq!(documents.parent_of(&id).as_deref(), Some("folder-1"));
    let update = outcome.update.expect("update outcome");
    assert_eq!((update.images_expected, update.images_placed), (3, 3));

    let uploads = store.uploads();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].name, "a.png");
    assert_eq!(uploads[0].content_type, "image/png");
    assert_eq!(uploads[0].size, 9);
    assert_eq!(uploads[1].content_type, "image/jpeg");

    assert_eq!(
        documents.images(&id),
        vec![
            "https://storage.test/tmp/obj-1/a.png".to_string(),
            "https://example.com/r.gif".to_string(),
            "https://storage.test/tmp/obj-2/b.jpg".to_string(),
        ]
    );
    let text = documents.plain_text(&id).expect("document");
    assert!(!text.contains("<<docmark-img"), "{text:?}");
    assert_eq!(
        text,
        format!("Intro\n{IMAGE_UNIT}\n{IMAGE_UNIT}\nBetween\n{IMAGE_UNIT}\n\n")
    );

    assert_eq!(store.deleted(), vec!["obj-1".to_string(), "obj-2".to_string()]);
}

#[test]
fn uploads_are_cleaned_up_when_the_image_batch_fails() {
    let dir = image_dir();
    let documents = SimulatedDocuments::new().fail_on_batch(2);
    let store = MemoryObjectStore::new();
    let docmark = Docmark::bootstrap(test_config(), &documents).with_object_store(&store);

    let err = docmark.create(&create(WITH_IMAGES, dir.path())).unwrap_err();

    assert!(matches!(err, DocmarkError::Transport(_)), "{err}");
    assert_eq!(store.uploads().len(), 2);
    assert_eq!(store.deleted().len(), 2);
}

#[test]
fn failed_deletes_do_not_mask_success() {
    let dir = image_dir();
    let documents = SimulatedDocuments::new();
    let store = MemoryObjectStore::new().failing_deletes();
    let docmark = Docmark::bootstrap(test_config(), &documents).with_object_store(&store);

    let outcome = docmark.create(&create(WITH_IMAGES, dir.path())).expect("create");
    assert_eq!(outcome.update.map(|update| update.images_placed), Some(3));
    assert_eq!(store.deleted().len(), 2);
}

#[test]
fn upload_failure_still_cleans_earlier_uploads() {
    let dir = image_dir();
    let documents = SimulatedDocuments::new();
    let store = MemoryObjectStore::new().fail_uploads_after(1);
    let docmark = Docmark::bootstrap(test_config(), &documents).with_object_store(&store);

    let err = docmark.create(&create(WITH_IMAGES, dir.path())).unwrap_err();
    assert!(matches!(err, DocmarkError::Transport(_)), "{err}");
    assert_eq!(store.deleted(), vec!["obj-1".to_string()]);
}

#[test]
fn missing_local_image_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let documents = SimulatedDocuments::new();
    let store = MemoryObjectStore::new();
    let docmark = Docmark::bootstrap(test_config(), &documents).with_object_store(&store);

    let err = docmark
        .create(&create("![x](absent.png)\n", dir.path()))
        .unwrap_err();
    assert!(matches!(err, DocmarkError::NotFound(_)), "{err}");
    assert!(store.uploads().is_empty());
}

#[test]
fn oversized_or_unknown_images_are_invalid_input() {
    let dir = image_dir();
    fs::write(dir.path().join("notes.txt"), b"text").expect("write txt");
    let documents = SimulatedDocuments::new();
    let store = MemoryObjectStore::new();

    let mut config = test_config();
    config.images.max_upload_bytes = 4;
    let docmark = Docmark::bootstrap(config, &documents).with_object_store(&store);
    let err = docmark
        .create(&create("![big](a.png)\n", dir.path()))
        .unwrap_err();
    assert!(matches!(err, DocmarkError::InvalidInput(_)), "{err}");

    let docmark = Docmark::bootstrap(test_config(), &documents).with_object_store(&store);
    let err = docmark
        .create(&create("![doc](notes.txt)\n", dir.path()))
        .unwrap_err();
    assert!(matches!(err, DocmarkError::InvalidInput(_)), "{err}");
    assert!(store.uploads().is_empty());
}

#[test]
fn local_images_need_an_object_store() {
    let dir = image_dir();
    let documents = SimulatedDocuments::new();
    let docmark = Docmark::bootstrap(test_config(), &documents);

    let err = docmark
        .create(&create("![a](a.png)\n", dir.path()))
        .unwrap_err();
    assert!(matches!(err, DocmarkError::InvalidInput(_)), "{err}");
}

#[test]
fn resolver_walks_tables_and_contents_in_document_order() {
    let source = "![a](a.png)\n\n![b](b.png)\n\n![c](c.png)\n\n![r](https://example.com/r.png)\n";
    let compiled = compile(&parse(source), 1);
    let markers: Vec<String> = compiled
        .placeholders
        .iter()
        .map(|placeholder| placeholder.marker.clone())
        .collect();
    assert_eq!(markers.len(), 4);
    assert_eq!(
        compiled
            .placeholders
            .iter()
            .map(|placeholder| placeholder.is_remote)
            .collect::<Vec<_>>(),
        vec![false, false, false, true]
    );

    let live = document(
        "doc",
        "Live",
        vec![
            paragraph(1, &format!("x{}\n", markers[0])),
            table(
                20,
                60,
                vec![vec![
                    vec![paragraph(23, "plain\n")],
                    vec![paragraph(30, &format!("{}\n", markers[1]))],
                ]],
            ),
            table_of_contents(60, 90, vec![paragraph(61, &format!("{} and {}\n", markers[2], markers[3]))]),
            paragraph(90, &format!("{}\n", placeholder_marker(9))),
        ],
    );

    let found = find_placeholders(&live, 4);
    let m = markers[0].len();
    assert_eq!(
        found,
        vec![
            PlaceholderRange { ordinal: 0, start_index: 2, end_index: 2 + m },
            PlaceholderRange { ordinal: 1, start_index: 30, end_index: 30 + m },
            PlaceholderRange { ordinal: 2, start_index: 61, end_index: 61 + m },
            PlaceholderRange { ordinal: 3, start_index: 61 + m + 5, end_index: 61 + 2 * m + 5 },
        ]
    );

    let partial = document("doc", "Live", vec![paragraph(1, &format!("{}\n", markers[2]))]);
    let found = find_placeholders(&partial, 4);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].ordinal, 2);
}

#[test]
fn offsets_count_utf16_units_before_markers() {
    let marker = placeholder_marker(0);
    let live = document("doc", "Live", vec![paragraph(5, &format!("😀é{marker}\n"))]);
    let found = find_placeholders(&live, 1);
    assert_eq!(found[0].start_index, 8);
}

#[test]
fn dropping_the_guard_deletes_uploads() {
    let dir = image_dir();
    let store = MemoryObjectStore::new();
    let settings = test_config().images;
    {
        let mut uploads = TemporaryUploads::new(&store);
        assert!(uploads.is_empty());
        uploads
            .upload(&dir.path().join("a.png"), &settings)
            .expect("upload");
        assert_eq!(uploads.len(), 1);
    }
    assert_eq!(store.deleted(), vec!["obj-1".to_string()]);
}

#[test]
fn explicit_cleanup_empties_the_guard() {
    let dir = image_dir();
    let store = MemoryObjectStore::new();
    let settings = test_config().images;

    let mut uploads = TemporaryUploads::new(&store);
    uploads
        .upload(&dir.path().join("a.png"), &settings)
        .expect("upload a");
    uploads
        .upload(&dir.path().join("pics/b.jpg"), &settings)
        .expect("upload b");
    assert_eq!(uploads.len(), 2);

    uploads.cleanup();
    assert!(uploads.is_empty());
    drop(uploads);
    assert_eq!(store.deleted(), vec!["obj-1".to_string(), "obj-2".to_string()]);
}
