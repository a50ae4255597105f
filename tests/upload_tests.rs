//! End-to-end tests of the upload, query and versification pipeline.
//!
//! Books go in as USFM or JSON, come out as canonical rows, and survive a
//! store snapshot round trip.

use serde_json::json;
use tempfile::TempDir;
use versifier::canon::upload::{delete_book, update_books, upload_books, BookSource, BookUpdate, ErrorKind};
use versifier::catalog::query::{PassageQuery, VerseFinder, VerseQuery};
use versifier::{compute_versification, BookCatalog, ResourceRegistry, VerseStore};

const RUTH: &str = "\\id RUT\n\
\\c 1\n\
\\p\n\
\\v 1 In the days when the judges ruled\n\
\\v 2-3 Elimelech died and she was left\n\
\\v 4a They took wives\n\
\\v 4b of the women of Moab\n\
\\v 6 Then she arose\n\
\\c 2\n\
\\v 1 Naomi had a kinsman\n";

fn setup() -> (BookCatalog, ResourceRegistry) {
    let books = BookCatalog::load_embedded().unwrap();
    let mut registry = ResourceRegistry::new();
    registry.create("en_KJV_1_bible").unwrap();
    (books, registry)
}

#[test]
fn test_usfm_upload_produces_canonical_rows() {
    let (books, mut registry) = setup();
    let table = registry.get_mut("en_KJV_1_bible").unwrap();

    let summary = upload_books(table, &books, &[BookSource::from_usfm(RUTH)]).unwrap();
    assert_eq!(summary.books, vec!["rut"]);
    // 1, 2, 3, 4, 6 in chapter 1 and 1 in chapter 2
    assert_eq!(summary.rows_written, 6);

    let rows = table.query_ordered_by_reference(None);
    let positions: Vec<(u32, u32)> = rows.iter().map(|r| (r.chapter, r.verse_number)).collect();
    assert_eq!(positions, vec![(1, 1), (1, 2), (1, 3), (1, 4), (1, 6), (2, 1)]);

    assert_eq!(rows[1].verse_text, "Elimelech died and she was left");
    assert_eq!(rows[2].verse_text, "");
    assert_eq!(rows[3].verse_text, "They took wives of the women of Moab");
    assert!(rows[0].metadata.is_none());
    assert_eq!(
        rows[3].published_versification().len(),
        2,
        "split verse keeps both published fragments"
    );
}

#[test]
fn test_versification_of_uploaded_book() {
    let (books, mut registry) = setup();
    let table = registry.get_mut("en_KJV_1_bible").unwrap();
    upload_books(table, &books, &[BookSource::from_usfm(RUTH)]).unwrap();

    let rows = table.query_ordered_by_reference(None);
    let report = compute_versification(&rows, &books);

    assert_eq!(report.max_verses.get("rut"), Some(&[6, 1][..]));
    assert_eq!(report.excluded_verses, vec!["rut 1:5"]);
    assert_eq!(report.mapped_verses.len(), 1);
    assert_eq!(report.mapped_verses[0].published, "rut 1:2-3");
    assert_eq!(report.mapped_verses[0].verses, vec!["rut 1:2", "rut 1:3"]);
    assert_eq!(report.partial_verses[0].reference, "rut 1:4");
    assert_eq!(report.partial_verses[0].parts, vec!["a", "b"]);
}

#[test]
fn test_json_and_usfm_books_in_one_batch() {
    let (books, mut registry) = setup();
    let table = registry.get_mut("en_KJV_1_bible").unwrap();

    let jonah = BookSource::from_json(json!({
        "book": {"bookCode": "JON"},
        "chapters": [{"chapterNumber": 1, "contents": [
            {"verseNumber": "1", "verseText": "Now the word of the LORD"},
            {"verseNumber": "2", "verseText": "Arise, go to Nineveh"}
        ]}]
    }));
    let summary = upload_books(table, &books, &[BookSource::from_usfm(RUTH), jonah]).unwrap();
    assert_eq!(summary.books, vec!["rut", "jon"]);

    // Stored documents carry both forms
    let jon_id = books.books.iter().find(|b| b.book_code == "jon").unwrap().book_id;
    let stored = table.book(jon_id).unwrap();
    assert!(stored.usfm.as_deref().unwrap().contains("\\v 2 Arise, go to Nineveh"));
    assert!(stored.json.is_some());
}

#[test]
fn test_failed_batch_keeps_applied_books() {
    let (books, mut registry) = setup();
    let table = registry.get_mut("en_KJV_1_bible").unwrap();

    let bad = BookSource::from_usfm("\\id GEN\n\\c 1\n\\v 5-2 backwards\n");
    let err = upload_books(table, &books, &[BookSource::from_usfm(RUTH), bad]).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Format);
    assert_eq!(err.applied, vec!["rut"]);
    assert_eq!(err.index, 1);
    assert_eq!(table.book_count(), 1);
}

#[test]
fn test_verse_queries_and_passages() {
    let (books, mut registry) = setup();
    let table = registry.get_mut("en_KJV_1_bible").unwrap();
    upload_books(table, &books, &[BookSource::from_usfm(RUTH)]).unwrap();

    let finder = VerseFinder::new(table, &books);

    let hits = finder
        .find_verses(&VerseQuery {
            book_code: Some("rut".into()),
            search_phrase: Some("Moab".into()),
            ..VerseQuery::default()
        })
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].reference.verse_number, 4);
    assert_eq!(hits[0].reference.bible, "en_KJV_1_bible");

    let passage = PassageQuery::chapter("rut", 1)
        .verses(4, None)
        .until("rut", 2, Some(1));
    let hits = finder.find_passage(&passage).unwrap();
    let verses: Vec<(u32, u32)> = hits
        .iter()
        .map(|h| (h.reference.chapter, h.reference.verse_number))
        .collect();
    assert_eq!(verses, vec![(1, 4), (1, 6), (2, 1)]);
}

#[test]
fn test_update_deactivate_and_delete() {
    let (books, mut registry) = setup();
    let table = registry.get_mut("en_KJV_1_bible").unwrap();
    upload_books(table, &books, &[BookSource::from_usfm(RUTH)]).unwrap();

    let replacement = BookUpdate {
        book_code: "rut".into(),
        source: BookSource::from_usfm("\\id RUT\n\\c 1\n\\v 1 Only verse\n"),
        active: Some(false),
    };
    let summary = update_books(table, &books, &[replacement]).unwrap();
    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.rows_flagged, 1);

    let finder = VerseFinder::new(table, &books);
    assert!(finder.find_verses(&VerseQuery::default()).unwrap().is_empty());
    let inactive = finder
        .find_verses(&VerseQuery {
            active: false,
            ..VerseQuery::default()
        })
        .unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].verse_text, "Only verse");

    delete_book(table, &books, "RUT").unwrap();
    assert_eq!(table.row_count(), 0);
    assert!(delete_book(table, &books, "rut").is_err());
}

#[test]
fn test_store_snapshot_round_trip() {
    let (books, mut registry) = setup();
    let table = registry.get_mut("en_KJV_1_bible").unwrap();
    upload_books(table, &books, &[BookSource::from_usfm(RUTH)]).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    registry.save(&path).unwrap();

    let loaded = ResourceRegistry::load(&path).unwrap();
    let table = loaded.get("en_KJV_1_bible").unwrap();
    let rows = table.query_ordered_by_reference(None);
    assert_eq!(rows.len(), 6);
    assert_eq!(
        compute_versification(&rows, &books).excluded_verses,
        vec!["rut 1:5"]
    );
}
