use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::io::Write as _;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, warn};

use crate::catalog::{CatalogError, VerseStore};
use crate::core::reference::{encode, ReferenceId, MAX_COMPONENT};
use crate::core::types::ResourceName;
use crate::core::verse::CanonicalVerseRow;
use crate::utils::validation::validate_resource_name;

/// Store snapshot version for compatibility checking
pub const STORE_VERSION: &str = "1.0.0";

/// Source document of one uploaded book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookContent {
    pub book_id: u32,
    pub book_code: String,
    #[serde(rename = "USFM", default, skip_serializing_if = "Option::is_none")]
    pub usfm: Option<String>,
    #[serde(rename = "JSON", default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
    pub active: bool,
}

/// A canonical row together with its visibility flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    #[serde(flatten)]
    pub row: CanonicalVerseRow,
    pub active: bool,
}

/// All content of one bible resource: book documents and canonical rows.
///
/// Rows are keyed by [`ReferenceId`], which makes `(book, chapter, verse)`
/// unique per resource and keeps iteration in reading order.
#[derive(Debug, Clone)]
pub struct BibleTable {
    resource: ResourceName,
    books: BTreeMap<u32, BookContent>,
    verses: BTreeMap<ReferenceId, VerseRecord>,
}

/// Serializable form of a [`BibleTable`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibleTableData {
    pub resource: ResourceName,
    #[serde(default)]
    pub books: Vec<BookContent>,
    #[serde(default)]
    pub verses: Vec<VerseRecord>,
}

impl BibleTable {
    pub fn new(resource: ResourceName) -> Self {
        Self {
            resource,
            books: BTreeMap::new(),
            verses: BTreeMap::new(),
        }
    }

    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    /// Rebuild a table from its snapshot
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Reference` or `CatalogError::DuplicateRow` if a
    /// stored row cannot be keyed.
    pub fn from_data(data: BibleTableData) -> Result<Self, CatalogError> {
        let mut table = Self::new(data.resource);
        for book in data.books {
            table.books.insert(book.book_id, book);
        }
        for record in data.verses {
            let id = record.row.reference_id()?;
            if table.verses.insert(id, record).is_some() {
                return Err(CatalogError::DuplicateRow(id));
            }
        }
        Ok(table)
    }

    pub fn to_data(&self) -> BibleTableData {
        BibleTableData {
            resource: self.resource.clone(),
            books: self.books.values().cloned().collect(),
            verses: self.verses.values().cloned().collect(),
        }
    }

    pub fn book(&self, book_id: u32) -> Option<&BookContent> {
        self.books.get(&book_id)
    }

    #[must_use]
    pub fn has_book(&self, book_id: u32) -> bool {
        self.books.contains_key(&book_id)
    }

    pub fn put_book(&mut self, content: BookContent) {
        self.books.insert(content.book_id, content);
    }

    /// Remove a book document and all of its rows
    pub fn remove_book(&mut self, book_id: u32) -> Option<BookContent> {
        let removed = self.books.remove(&book_id);
        let rows = self.delete_rows(book_id, None);
        debug!("{}: removed book {book_id} with {rows} rows", self.resource);
        removed
    }

    /// Set the active flag on a book document and all of its rows
    pub fn set_book_active(&mut self, book_id: u32, active: bool) -> usize {
        if let Some(book) = self.books.get_mut(&book_id) {
            book.active = active;
        }
        let Some(range) = book_range(book_id, None) else {
            return 0;
        };
        let mut changed = 0;
        for (_, record) in self.verses.range_mut(range) {
            record.active = active;
            changed += 1;
        }
        changed
    }

    /// Uploaded books, optionally filtered by code and active flag
    pub fn list_books(
        &self,
        book_code: Option<&str>,
        active: bool,
        skip: usize,
        limit: usize,
    ) -> Vec<&BookContent> {
        self.books
            .values()
            .filter(|b| b.active == active)
            .filter(|b| book_code.map_or(true, |code| b.book_code.eq_ignore_ascii_case(code.trim())))
            .skip(skip)
            .take(limit)
            .collect()
    }

    /// Records in reference order between two ids, inclusive
    pub fn records_between(
        &self,
        start: ReferenceId,
        end: ReferenceId,
    ) -> impl Iterator<Item = &VerseRecord> + '_ {
        let range = if start <= end { start..=end } else { end..=end };
        self.verses
            .range(range)
            .filter(move |(id, _)| **id >= start)
            .map(|(_, record)| record)
    }

    /// Records of a book (or of all books) in reference order
    pub fn records(&self, book_id: Option<u32>) -> Box<dyn Iterator<Item = &VerseRecord> + '_> {
        match book_id {
            Some(book_id) => Box::new(
                book_range(book_id, None)
                    .into_iter()
                    .flat_map(|range| self.verses.range(range))
                    .map(|(_, record)| record),
            ),
            None => Box::new(self.verses.values()),
        }
    }

    pub fn row_count(&self) -> usize {
        self.verses.len()
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }
}

/// Key range covering a book, or one chapter of it. `None` if no id can fall in it.
fn book_range(book_id: u32, chapter: Option<u32>) -> Option<RangeInclusive<ReferenceId>> {
    let (first, last) = chapter.map_or((0, MAX_COMPONENT), |c| (c, c));
    let start = encode(book_id, first, 0).ok()?;
    let end = encode(book_id, last, MAX_COMPONENT).ok()?;
    Some(start..=end)
}

impl VerseStore for BibleTable {
    fn delete_rows(&mut self, book_id: u32, chapter: Option<u32>) -> usize {
        let ids: Vec<ReferenceId> = book_range(book_id, chapter)
            .into_iter()
            .flat_map(|range| self.verses.range(range))
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.verses.remove(id);
        }
        ids.len()
    }

    fn insert_rows(&mut self, rows: Vec<CanonicalVerseRow>) -> Result<usize, CatalogError> {
        let mut keyed = Vec::with_capacity(rows.len());
        let mut seen = HashSet::with_capacity(rows.len());
        for row in rows {
            let id = row.reference_id()?;
            if self.verses.contains_key(&id) || !seen.insert(id) {
                return Err(CatalogError::DuplicateRow(id));
            }
            keyed.push((id, row));
        }

        let inserted = keyed.len();
        for (id, row) in keyed {
            self.verses.insert(id, VerseRecord { row, active: true });
        }
        Ok(inserted)
    }

    fn query_ordered_by_reference(&self, book_id: Option<u32>) -> Vec<CanonicalVerseRow> {
        self.records(book_id).map(|record| record.row.clone()).collect()
    }
}

/// Serializable store format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreData {
    pub version: String,
    pub created_at: String,
    pub resources: Vec<BibleTableData>,
}

/// Registry of bible resources, persisted as one JSON snapshot file
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    tables: BTreeMap<ResourceName, BibleTable>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry snapshot. A missing file is an empty registry.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ReadError` if the file cannot be read, or
    /// `CatalogError::ParseError` if it is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            debug!("Store {} does not exist yet, starting empty", path.display());
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a registry snapshot from JSON
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ParseError` for invalid JSON, or the errors of
    /// [`BibleTable::from_data`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: StoreData = serde_json::from_str(json)?;
        if data.version != STORE_VERSION {
            warn!(
                "Store version mismatch (expected {}, found {})",
                STORE_VERSION, data.version
            );
        }

        let mut registry = Self::new();
        for table in data.resources {
            let table = BibleTable::from_data(table)?;
            registry.tables.insert(table.resource().clone(), table);
        }
        Ok(registry)
    }

    /// Export the registry snapshot to JSON
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = StoreData {
            version: STORE_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            resources: self.tables.values().map(BibleTable::to_data).collect(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Write the snapshot atomically: a temp file in the same directory is renamed over `path`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ReadError` on I/O failure and
    /// `CatalogError::PersistError` if the rename fails.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(json.as_bytes())?;
        file.persist(path)?;
        Ok(())
    }

    /// Register a new bible resource
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidResource` for a malformed or non-bible
    /// name and `CatalogError::ResourceExists` if it is already registered.
    pub fn create(&mut self, name: &str) -> Result<&mut BibleTable, CatalogError> {
        let resource = validate_resource_name(name)?;
        if self.tables.contains_key(&resource) {
            return Err(CatalogError::ResourceExists(resource.to_string()));
        }
        Ok(self
            .tables
            .entry(resource.clone())
            .or_insert_with(|| BibleTable::new(resource)))
    }

    /// Look up a bible resource
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidResource` for a malformed or non-bible
    /// name and `CatalogError::ResourceNotFound` if it is not registered.
    pub fn get(&self, name: &str) -> Result<&BibleTable, CatalogError> {
        let resource = validate_resource_name(name)?;
        self.tables
            .get(&resource)
            .ok_or_else(|| CatalogError::ResourceNotFound(resource.to_string()))
    }

    /// Mutable variant of [`ResourceRegistry::get`]
    ///
    /// # Errors
    ///
    /// Same as [`ResourceRegistry::get`].
    pub fn get_mut(&mut self, name: &str) -> Result<&mut BibleTable, CatalogError> {
        let resource = validate_resource_name(name)?;
        self.tables
            .get_mut(&resource)
            .ok_or_else(|| CatalogError::ResourceNotFound(resource.to_string()))
    }

    /// Remove a resource with all of its books and rows
    ///
    /// # Errors
    ///
    /// Same as [`ResourceRegistry::get`].
    pub fn remove(&mut self, name: &str) -> Result<BibleTable, CatalogError> {
        let resource = validate_resource_name(name)?;
        self.tables
            .remove(&resource)
            .ok_or_else(|| CatalogError::ResourceNotFound(resource.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &ResourceName> {
        self.tables.keys()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
