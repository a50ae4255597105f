use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Max verse per chapter for each book, in first-seen book order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaxVerses(Vec<(String, Vec<u32>)>);

impl MaxVerses {
    /// Chapter maxima of a book; index 0 is chapter 1
    pub fn get(&self, book_code: &str) -> Option<&[u32]> {
        self.0
            .iter()
            .find(|(code, _)| code == book_code)
            .map(|(_, maxima)| maxima.as_slice())
    }

    pub fn books(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.0.iter().map(|(code, maxima)| (code.as_str(), maxima.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn current(&mut self) -> Option<&mut Vec<u32>> {
        self.0.last_mut().map(|(_, maxima)| maxima)
    }
}

impl Serialize for MaxVerses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (code, maxima) in &self.0 {
            map.serialize_entry(code, maxima)?;
        }
        map.end()
    }
}

/// Position of the previous row seen by the scanner
#[derive(Debug, Clone)]
struct Cursor {
    book: String,
    chapter: u32,
    verse: u32,
}

/// Single forward pass over rows in reference order.
///
/// Rows must arrive sorted by reference id; the scanner does not check.
/// A new book closes the previous book's last chapter. A new chapter closes
/// the previous one and records a `0` for every chapter skipped. Within a
/// chapter, a verse that does not follow its predecessor records each missing
/// number as an excluded reference. The first verse of a chapter is never
/// compared against anything.
#[derive(Debug, Default)]
pub struct VersificationScanner {
    max_verses: MaxVerses,
    excluded_verses: Vec<String>,
    irregular_chapters: Vec<String>,
    prev: Option<Cursor>,
}

/// What a full scan produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub max_verses: MaxVerses,
    pub excluded_verses: Vec<String>,
    /// `"<book> <chapter>"` for chapters with at least one gap
    pub irregular_chapters: Vec<String>,
}

impl VersificationScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one verse. Positions come from reference ids, so chapter and
    /// verse are at most 999; larger values are still handled without
    /// overflow.
    pub fn push(&mut self, book_code: &str, chapter: u32, verse: u32) {
        match self.prev.take() {
            None => self.start_book(book_code),
            Some(prev) if prev.book != book_code => {
                self.close_chapter(prev.verse);
                self.start_book(book_code);
            }
            Some(prev) if prev.chapter != chapter => {
                self.close_chapter(prev.verse);
                if let Some(maxima) = self.max_verses.current() {
                    maxima.extend((prev.chapter.saturating_add(1)..chapter).map(|_| 0));
                }
            }
            Some(prev) if verse > prev.verse.saturating_add(1) => {
                for missing in prev.verse + 1..verse {
                    self.excluded_verses
                        .push(format!("{book_code} {chapter}:{missing}"));
                }
                let label = format!("{book_code} {chapter}");
                if self.irregular_chapters.last() != Some(&label) {
                    self.irregular_chapters.push(label);
                }
            }
            Some(_) => {}
        }

        self.prev = Some(Cursor {
            book: book_code.to_string(),
            chapter,
            verse,
        });
    }

    fn start_book(&mut self, book_code: &str) {
        self.max_verses.0.push((book_code.to_string(), Vec::new()));
    }

    fn close_chapter(&mut self, last_verse: u32) {
        if let Some(maxima) = self.max_verses.current() {
            maxima.push(last_verse);
        }
    }

    /// Flush the last chapter and return the scan
    pub fn finish(mut self) -> ScanResult {
        if let Some(prev) = self.prev.take() {
            self.close_chapter(prev.verse);
        }
        ScanResult {
            max_verses: self.max_verses,
            excluded_verses: self.excluded_verses,
            irregular_chapters: self.irregular_chapters,
        }
    }
}
