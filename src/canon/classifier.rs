use tracing::debug;

use crate::canon::resolver::{resolve_split_verses, PendingSplits, SplitFragment};
use crate::canon::CanonError;
use crate::core::reference::encode;
use crate::core::types::{BookRef, VerseShape};
use crate::core::verse::{CanonicalVerseRow, PublishedVerse, VerseMetadata};
use crate::parsing::book_json::VerseContent;
use crate::parsing::verse_number::VerseNumberToken;
use crate::utils::text::normalize_text;

/// Rows and pending split verses built so far for one upload.
///
/// Every classification step reads and extends this state; nothing is kept
/// between uploads.
#[derive(Debug, Default)]
pub struct UploadAccumulator {
    rows: Vec<CanonicalVerseRow>,
    pending: PendingSplits,
}

impl UploadAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[CanonicalVerseRow] {
        &self.rows
    }

    pub fn pending(&self) -> &PendingSplits {
        &self.pending
    }

    /// Classify one content entry and append the rows it produces.
    ///
    /// - `N`: one row with the normalized text
    /// - `N<suffix>`: continues the previous row when it is the same verse and
    ///   still pending, otherwise opens a new empty pending row
    /// - `N-M`: a row at `N` with the text plus empty rows for `N+1..=M`
    ///
    /// # Errors
    ///
    /// Returns `CanonError::Format` naming the book, chapter and token when the
    /// token matches no shape or is a non-ascending range, and
    /// `CanonError::Range` for a merged range ending past verse 999. The
    /// accumulator is unchanged on error.
    pub fn classify(
        &mut self,
        book: &BookRef,
        chapter: u32,
        content: &VerseContent,
    ) -> Result<VerseShape, CanonError> {
        let token = VerseNumberToken::parse(&content.verse_number).map_err(|reason| {
            CanonError::Format {
                book: book.book_code.clone(),
                chapter,
                token: content.verse_number.clone(),
                reason,
            }
        })?;
        let shape = token.shape();

        match token {
            VerseNumberToken::Normal(verse) => {
                self.rows.push(CanonicalVerseRow::new(
                    book.book_id,
                    chapter,
                    verse,
                    normalize_text(&content.verse_text),
                ));
            }
            VerseNumberToken::Split { verse, suffix } => {
                self.push_split(book, chapter, verse, suffix, content);
            }
            VerseNumberToken::Merged { start, end } => {
                // The end must be addressable before any row is expanded
                encode(book.book_id, chapter, end).map_err(|source| CanonError::Range {
                    book: book.book_code.clone(),
                    chapter,
                    source,
                })?;
                debug!(
                    "{} {chapter}:{start}-{end} merged, adding {} empty rows",
                    book.book_code,
                    end - start
                );
                let metadata = VerseMetadata::published(published(content));
                self.rows.push(
                    CanonicalVerseRow::new(
                        book.book_id,
                        chapter,
                        start,
                        normalize_text(&content.verse_text),
                    )
                    .with_metadata(metadata.clone()),
                );
                for verse in start + 1..=end {
                    self.rows.push(
                        CanonicalVerseRow::new(book.book_id, chapter, verse, "")
                            .with_metadata(metadata.clone()),
                    );
                }
            }
        }

        Ok(shape)
    }

    fn push_split(
        &mut self,
        book: &BookRef,
        chapter: u32,
        verse: u32,
        suffix: String,
        content: &VerseContent,
    ) {
        let fragment = SplitFragment::new(verse, normalize_text(&content.verse_text));

        let continuing = self.rows.len().checked_sub(1).filter(|&last| {
            self.rows[last].same_position(book.book_id, chapter, verse) && self.pending.contains(last)
        });

        if let Some(last) = continuing {
            debug!("{} {chapter}:{verse} continues split with '{suffix}'", book.book_code);
            self.pending.add_fragment(last, suffix, fragment);
            self.rows[last]
                .metadata
                .get_or_insert_with(VerseMetadata::default)
                .published_versification
                .push(published(content));
        } else {
            debug!("{} {chapter}:{verse} starts split with '{suffix}'", book.book_code);
            let row_index = self.rows.len();
            self.pending.start(row_index, suffix, fragment);
            self.rows.push(
                CanonicalVerseRow::new(book.book_id, chapter, verse, "")
                    .with_metadata(VerseMetadata::published(published(content))),
            );
        }
    }

    /// Split into the row list and the pending split table
    pub fn into_parts(self) -> (Vec<CanonicalVerseRow>, PendingSplits) {
        (self.rows, self.pending)
    }

    /// Resolve all pending split verses and return the canonical rows.
    ///
    /// # Errors
    ///
    /// Returns `CanonError::Resolve` if the pending table does not match the rows.
    pub fn finish(self) -> Result<Vec<CanonicalVerseRow>, CanonError> {
        let (mut rows, pending) = self.into_parts();
        resolve_split_verses(&mut rows, pending)?;
        Ok(rows)
    }
}

fn published(content: &VerseContent) -> PublishedVerse {
    PublishedVerse::new(&content.verse_number, &content.verse_text)
}
