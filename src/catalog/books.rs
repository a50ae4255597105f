use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::catalog::{BookLookup, CatalogError};
use crate::core::types::{normalize_book_code, BookRef};

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Serializable catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCatalogData {
    pub version: String,
    pub created_at: String,
    pub books: Vec<BookRef>,
}

/// The bible book catalog with lookup indexes
#[derive(Debug)]
pub struct BookCatalog {
    /// All books, in catalog (canonical) order
    pub books: Vec<BookRef>,

    /// Index: lowercase code -> index in books vec
    code_to_index: HashMap<String, usize>,

    /// Index: book id -> index in books vec
    id_to_index: HashMap<u32, usize>,
}

impl BookCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            books: Vec::new(),
            code_to_index: HashMap::new(),
            id_to_index: HashMap::new(),
        }
    }

    /// Load the embedded default catalog
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ParseError` if the embedded JSON is invalid.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        // Validated at compile time by build.rs
        const EMBEDDED_CATALOG: &str = include_str!("../../catalogs/bible_books.json");
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Load catalog from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ReadError` if the file cannot be read, or
    /// `CatalogError::ParseError` if it is not a valid catalog.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load a custom catalog if a path is given, otherwise the embedded one
    ///
    /// # Errors
    ///
    /// Returns the errors of [`BookCatalog::load_from_file`] or [`BookCatalog::load_embedded`].
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load_embedded(),
        }
    }

    /// Parse catalog from JSON string
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ParseError` if the JSON is not a valid catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: BookCatalogData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != CATALOG_VERSION {
            warn!(
                "Book catalog version mismatch (expected {}, found {})",
                CATALOG_VERSION, data.version
            );
        }

        let mut catalog = Self::new();
        for book in data.books {
            catalog.add_book(BookRef::new(book.book_id, book.book_code, book.book_name));
        }

        Ok(catalog)
    }

    /// Add a book to the catalog. A later book with the same code or id shadows the earlier one.
    pub fn add_book(&mut self, book: BookRef) {
        let index = self.books.len();
        self.code_to_index.insert(book.book_code.clone(), index);
        self.id_to_index.insert(book.book_id, index);
        self.books.push(book);
    }

    /// Export catalog to JSON
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = BookCatalogData {
            version: CATALOG_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            books: self.books.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of books in catalog
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl BookLookup for BookCatalog {
    fn find_by_code(&self, code: &str) -> Option<&BookRef> {
        self.code_to_index
            .get(&normalize_book_code(code))
            .map(|&idx| &self.books[idx])
    }

    fn find_by_id(&self, book_id: u32) -> Option<&BookRef> {
        self.id_to_index.get(&book_id).map(|&idx| &self.books[idx])
    }
}

impl Default for BookCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_embedded_catalog() {
        let catalog = BookCatalog::load_embedded().unwrap();
        assert_eq!(catalog.len(), 66);
        assert_eq!(catalog.books[0].book_code, "gen");
        assert_eq!(catalog.books[65].book_code, "rev");
    }

    #[test]
    fn test_find_by_code_is_case_insensitive() {
        let catalog = BookCatalog::load_embedded().unwrap();
        let john = catalog.find_by_code("JHN").unwrap();
        assert_eq!(john.book_id, 43);
        assert_eq!(john.book_name, "John");
        assert_eq!(catalog.find_by_id(43), Some(john));
    }

    #[test]
    fn test_require_code_missing() {
        let catalog = BookCatalog::load_embedded().unwrap();
        assert!(matches!(
            catalog.require_code("xyz"),
            Err(CatalogError::BookNotFound(code)) if code == "xyz"
        ));
    }

    #[test]
    fn test_catalog_json_round_trip() {
        let mut catalog = BookCatalog::new();
        catalog.add_book(BookRef::new(1, "GEN", "Genesis"));
        let json = catalog.to_json().unwrap();
        assert!(json.contains("\"version\""));

        let reloaded = BookCatalog::from_json(&json).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.find_by_code("gen").unwrap().book_name, "Genesis");
    }
}
