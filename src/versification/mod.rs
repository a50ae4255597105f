//! Versification: the verse structure of a bible text.
//!
//! The report is derived from canonical rows in reference order and is never
//! stored. It lists the highest verse of every chapter per book, verses
//! missing inside a chapter, and which verses came from merged or split
//! source entries.
//!
//! ## Example
//!
//! ```rust,no_run
//! use versifier::catalog::BookCatalog;
//! use versifier::core::verse::CanonicalVerseRow;
//! use versifier::versification::compute_versification;
//!
//! let books = BookCatalog::load_embedded().unwrap();
//! let rows = vec![
//!     CanonicalVerseRow::new(1, 1, 1, "In the beginning"),
//!     CanonicalVerseRow::new(1, 1, 3, "And God said"),
//! ];
//! let report = compute_versification(&rows, &books);
//! assert_eq!(report.excluded_verses, vec!["gen 1:2"]);
//! ```

use serde::Serialize;
use tracing::warn;

use crate::catalog::BookLookup;
use crate::core::verse::CanonicalVerseRow;

pub mod audit;
pub mod scanner;

pub use audit::{AuditCollector, MappedVerse, PartialVerse};
pub use scanner::{MaxVerses, ScanResult, VersificationScanner};

/// Versification of one bible text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersificationReport {
    pub max_verses: MaxVerses,
    pub excluded_verses: Vec<String>,
    pub mapped_verses: Vec<MappedVerse>,
    pub partial_verses: Vec<PartialVerse>,
    pub irregular_chapters: Vec<String>,
}

/// Build the versification report from rows sorted by reference id.
///
/// Rows whose book id is not in the lookup are reported under the
/// zero-padded id (e.g. `"067"`).
pub fn compute_versification<L: BookLookup>(
    rows: &[CanonicalVerseRow],
    lookup: &L,
) -> VersificationReport {
    let mut scanner = VersificationScanner::new();
    let mut audit = AuditCollector::new();
    let mut last_unknown = None;

    for row in rows {
        let code = match lookup.find_by_id(row.book_id) {
            Some(book) => book.book_code.clone(),
            None => {
                if last_unknown != Some(row.book_id) {
                    warn!("Book id {} not in catalog, reporting it by id", row.book_id);
                    last_unknown = Some(row.book_id);
                }
                format!("{:03}", row.book_id)
            }
        };
        scanner.push(&code, row.chapter, row.verse_number);
        audit.push(&code, row);
    }

    let scan = scanner.finish();
    let (mapped_verses, partial_verses) = audit.finish();
    VersificationReport {
        max_verses: scan.max_verses,
        excluded_verses: scan.excluded_verses,
        mapped_verses,
        partial_verses,
        irregular_chapters: scan.irregular_chapters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::upload::classify_and_resolve;
    use crate::catalog::BookCatalog;
    use crate::parsing::book_json::{ChapterContent, VerseContent};

    #[test]
    fn test_empty_rows_give_empty_report() {
        let books = BookCatalog::load_embedded().unwrap();
        let report = compute_versification(&[], &books);
        assert_eq!(report, VersificationReport::default());
    }

    #[test]
    fn test_report_from_classified_rows() {
        let books = BookCatalog::load_embedded().unwrap();
        let genesis = books.find_by_code("gen").unwrap();
        let chapters = vec![
            ChapterContent::new(
                1,
                vec![
                    VerseContent::new("1", "One"),
                    VerseContent::new("2-3", "Two and three"),
                    VerseContent::new("5a", "Five a"),
                    VerseContent::new("5b", "Five b"),
                ],
            ),
            ChapterContent::new(3, vec![VerseContent::new("1", "Three one")]),
        ];
        let rows = classify_and_resolve(genesis, &chapters).unwrap();

        let report = compute_versification(&rows, &books);
        assert_eq!(report.max_verses.get("gen"), Some(&[5, 0, 1][..]));
        assert_eq!(report.excluded_verses, vec!["gen 1:4"]);
        assert_eq!(report.mapped_verses[0].published, "gen 1:2-3");
        assert_eq!(report.partial_verses[0].reference, "gen 1:5");
        assert_eq!(report.irregular_chapters, vec!["gen 1"]);
    }

    #[test]
    fn test_unknown_book_reported_by_id() {
        let books = BookCatalog::load_embedded().unwrap();
        let rows = vec![CanonicalVerseRow::new(67, 1, 1, "Extra")];
        let report = compute_versification(&rows, &books);
        assert_eq!(report.max_verses.get("067"), Some(&[1][..]));
    }

    #[test]
    fn test_report_json_shape() {
        let books = BookCatalog::load_embedded().unwrap();
        let rows = vec![CanonicalVerseRow::new(1, 1, 1, "One")];
        let json = serde_json::to_value(compute_versification(&rows, &books)).unwrap();
        assert_eq!(json["maxVerses"]["gen"][0], 1);
        assert!(json["excludedVerses"].as_array().unwrap().is_empty());
        assert!(json.get("mappedVerses").is_some());
        assert!(json.get("partialVerses").is_some());
    }
}
