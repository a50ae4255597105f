use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::verse::CanonicalVerseRow;
use crate::parsing::verse_number::VerseNumberToken;

/// A merged source entry and the canonical verses it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedVerse {
    /// `"<book> <chapter>:<start>-<end>"`
    pub published: String,
    /// `"<book> <chapter>:<verse>"` for every covered verse
    pub verses: Vec<String>,
}

/// A split verse and the suffixes it was published with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialVerse {
    /// `"<book> <chapter>:<verse>"`
    pub reference: String,
    pub parts: Vec<String>,
}

/// Collects merged and split verse detail from row audit metadata.
///
/// Rows must arrive in reference order so that each merged range is reported
/// once, when its first row is seen.
#[derive(Debug, Default)]
pub struct AuditCollector {
    mapped: Vec<MappedVerse>,
    partial: Vec<PartialVerse>,
}

impl AuditCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, book_code: &str, row: &CanonicalVerseRow) {
        let chapter = row.chapter;
        let mut parts = BTreeSet::new();

        for published in row.published_versification() {
            match VerseNumberToken::parse(&published.verse_number) {
                Ok(VerseNumberToken::Merged { start, end }) if start == row.verse_number => {
                    self.mapped.push(MappedVerse {
                        published: format!("{book_code} {chapter}:{start}-{end}"),
                        verses: (start..=end)
                            .map(|v| format!("{book_code} {chapter}:{v}"))
                            .collect(),
                    });
                }
                Ok(VerseNumberToken::Split { suffix, .. }) => {
                    parts.insert(suffix);
                }
                _ => {}
            }
        }

        if !parts.is_empty() {
            self.partial.push(PartialVerse {
                reference: format!("{book_code} {chapter}:{}", row.verse_number),
                parts: parts.into_iter().collect(),
            });
        }
    }

    pub fn finish(self) -> (Vec<MappedVerse>, Vec<PartialVerse>) {
        (self.mapped, self.partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::verse::{PublishedVerse, VerseMetadata};

    fn with_published(verse: u32, tokens: &[&str]) -> CanonicalVerseRow {
        let metadata = VerseMetadata {
            published_versification: tokens
                .iter()
                .map(|t| PublishedVerse::new(*t, "text"))
                .collect(),
        };
        CanonicalVerseRow::new(1, 2, verse, "text").with_metadata(metadata)
    }

    #[test]
    fn test_merged_range_reported_once() {
        let mut audit = AuditCollector::new();
        for verse in 5..=7 {
            audit.push("gen", &with_published(verse, &["5-7"]));
        }
        let (mapped, partial) = audit.finish();

        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].published, "gen 2:5-7");
        assert_eq!(mapped[0].verses, vec!["gen 2:5", "gen 2:6", "gen 2:7"]);
        assert!(partial.is_empty());
    }

    #[test]
    fn test_split_parts_are_sorted() {
        let mut audit = AuditCollector::new();
        audit.push("gen", &with_published(4, &["4b", "4a"]));
        audit.push("gen", &CanonicalVerseRow::new(1, 2, 5, "plain"));
        let (mapped, partial) = audit.finish();

        assert!(mapped.is_empty());
        assert_eq!(
            partial,
            vec![PartialVerse {
                reference: "gen 2:4".to_string(),
                parts: vec!["a".to_string(), "b".to_string()],
            }]
        );
    }
}
