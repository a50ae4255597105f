use std::collections::BTreeMap;

use crate::canon::CanonError;
use crate::core::verse::CanonicalVerseRow;

/// Text of one split-verse fragment, keyed elsewhere by its suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFragment {
    pub verse_number: u32,
    pub verse_text: String,
}

impl SplitFragment {
    pub fn new(verse_number: u32, verse_text: impl Into<String>) -> Self {
        Self {
            verse_number,
            verse_text: verse_text.into(),
        }
    }
}

/// Split verses still waiting for their text, keyed by row index.
///
/// This table lives beside the row list for one upload and is never part of
/// a persisted row. Suffixes are kept in a `BTreeMap`, so iteration is already
/// in natural string order ("a" < "b" < "c") regardless of arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSplits {
    entries: BTreeMap<usize, BTreeMap<String, SplitFragment>>,
}

impl PendingSplits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending row seeded with its first fragment
    pub fn start(&mut self, row_index: usize, suffix: impl Into<String>, fragment: SplitFragment) {
        let mut fragments = BTreeMap::new();
        fragments.insert(suffix.into(), fragment);
        self.entries.insert(row_index, fragments);
    }

    /// Add a fragment to a pending row. A repeated suffix replaces the earlier text.
    ///
    /// Returns false if the row is not pending.
    pub fn add_fragment(
        &mut self,
        row_index: usize,
        suffix: impl Into<String>,
        fragment: SplitFragment,
    ) -> bool {
        match self.entries.get_mut(&row_index) {
            Some(fragments) => {
                fragments.insert(suffix.into(), fragment);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn contains(&self, row_index: usize) -> bool {
        self.entries.contains_key(&row_index)
    }

    /// Fragments of a pending row in suffix order
    pub fn fragments(&self, row_index: usize) -> Option<&BTreeMap<String, SplitFragment>> {
        self.entries.get(&row_index)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fold every pending split verse into its row's text.
///
/// The pending table is consumed: once resolved, the fragments are gone and a
/// row cannot be resolved again from the same state. Rows are checked before
/// any is modified, so a failure leaves `rows` untouched.
///
/// # Errors
///
/// Returns `CanonError::Resolve` if a pending index is out of bounds or its row
/// already carries text (i.e. it was resolved before).
pub fn resolve_split_verses(
    rows: &mut [CanonicalVerseRow],
    pending: PendingSplits,
) -> Result<usize, CanonError> {
    for row_index in pending.indices() {
        match rows.get(row_index) {
            Some(row) if row.verse_text.is_empty() => {}
            _ => return Err(CanonError::Resolve { row_index }),
        }
    }

    let resolved = pending.len();
    for (row_index, fragments) in pending.entries {
        let text = fragments
            .values()
            .map(|f| f.verse_text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        rows[row_index].verse_text = text;
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_row(rows: &mut Vec<CanonicalVerseRow>, verse: u32) -> usize {
        rows.push(CanonicalVerseRow::new(1, 1, verse, ""));
        rows.len() - 1
    }

    #[test]
    fn test_resolve_orders_by_suffix() {
        let mut rows = Vec::new();
        let idx = pending_row(&mut rows, 23);
        let mut pending = PendingSplits::new();
        pending.start(idx, "c", SplitFragment::new(23, "Baz"));
        assert!(pending.add_fragment(idx, "a", SplitFragment::new(23, "Foo")));
        assert!(pending.add_fragment(idx, "b", SplitFragment::new(23, "Bar")));

        let resolved = resolve_split_verses(&mut rows, pending).unwrap();
        assert_eq!(resolved, 1);
        assert_eq!(rows[0].verse_text, "Foo Bar Baz");
    }

    #[test]
    fn test_empty_fragments_do_not_add_spaces() {
        let mut rows = Vec::new();
        let idx = pending_row(&mut rows, 4);
        let mut pending = PendingSplits::new();
        pending.start(idx, "a", SplitFragment::new(4, "Only"));
        pending.add_fragment(idx, "b", SplitFragment::new(4, ""));

        resolve_split_verses(&mut rows, pending).unwrap();
        assert_eq!(rows[0].verse_text, "Only");
    }

    #[test]
    fn test_add_fragment_requires_pending_row() {
        let mut pending = PendingSplits::new();
        assert!(!pending.add_fragment(0, "a", SplitFragment::new(1, "x")));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_resolving_twice_is_rejected() {
        let mut rows = Vec::new();
        let idx = pending_row(&mut rows, 23);
        let mut pending = PendingSplits::new();
        pending.start(idx, "a", SplitFragment::new(23, "Foo"));
        pending.add_fragment(idx, "b", SplitFragment::new(23, "Bar"));
        let replay = pending.clone();

        resolve_split_verses(&mut rows, pending).unwrap();
        let err = resolve_split_verses(&mut rows, replay).unwrap_err();

        assert!(matches!(err, CanonError::Resolve { row_index: 0 }));
        assert_eq!(rows[0].verse_text, "Foo Bar");
    }

    #[test]
    fn test_out_of_bounds_index_leaves_rows_untouched() {
        let mut rows = Vec::new();
        let idx = pending_row(&mut rows, 2);
        let mut pending = PendingSplits::new();
        pending.start(idx, "a", SplitFragment::new(2, "Kept"));
        pending.start(5, "a", SplitFragment::new(9, "Missing"));

        assert!(resolve_split_verses(&mut rows, pending).is_err());
        assert_eq!(rows[0].verse_text, "");
    }

    #[test]
    fn test_empty_pending_is_noop() {
        let mut rows = vec![CanonicalVerseRow::new(1, 1, 1, "Text")];
        assert_eq!(resolve_split_verses(&mut rows, PendingSplits::new()).unwrap(), 0);
        assert_eq!(rows[0].verse_text, "Text");
    }
}
