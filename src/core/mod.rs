//! Core data types for canonical verse storage.
//!
//! - [`BookRef`]: A canonical bible book (id, lowercase code, name)
//! - [`ReferenceId`], [`VerseRef`]: Totally-ordered verse positions
//! - [`CanonicalVerseRow`]: One persisted verse after split/merge resolution
//! - [`VerseMetadata`]: Audit trail of how a row was published in the source
//!
//! ## Reference Ids
//!
//! | Position       | Id          | Key         |
//! |----------------|-------------|-------------|
//! | Genesis 1:1    | 1001001     | `001001001` |
//! | John 3:16      | 43003016    | `043003016` |
//! | Revelation 22:21 | 66022021  | `066022021` |
//!
//! [`BookRef`]: types::BookRef
//! [`ReferenceId`]: reference::ReferenceId
//! [`VerseRef`]: reference::VerseRef
//! [`CanonicalVerseRow`]: verse::CanonicalVerseRow
//! [`VerseMetadata`]: verse::VerseMetadata

pub mod reference;
pub mod types;
pub mod verse;
