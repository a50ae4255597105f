use std::collections::HashSet;
use std::path::Path;

fn main() {
    let catalog_path = Path::new("catalogs/bible_books.json");
    validate_catalog_file(catalog_path);
    set_build_dependencies();
}

fn validate_catalog_file(catalog_path: &Path) {
    assert!(
        catalog_path.exists(),
        "\n\nBOOK CATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the book catalog before building.\n",
        catalog_path.display()
    );

    let catalog_contents = std::fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        panic!(
            "\n\nBOOK CATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            catalog_path.display()
        );
    });

    let catalog: serde_json::Value = serde_json::from_str(&catalog_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nBOOK CATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            catalog_path.display()
        );
    });

    validate_catalog_structure(&catalog);
}

fn validate_catalog_structure(catalog: &serde_json::Value) {
    assert!(
        catalog.is_object(),
        "\n\nBOOK CATALOG BUILD ERROR: Root must be a JSON object\n\
         Got: {catalog}\n"
    );

    let books = catalog.get("books").unwrap_or_else(|| {
        panic!(
            "\n\nBOOK CATALOG BUILD ERROR: Missing 'books' field\n\
             The catalog must have a top-level 'books' array.\n"
        );
    });

    let books = books.as_array().unwrap_or_else(|| {
        panic!(
            "\n\nBOOK CATALOG BUILD ERROR: 'books' must be an array\n\
             Got: {books}\n"
        );
    });

    validate_books(books);

    println!(
        "cargo:warning=Validated book catalog: {} books",
        books.len()
    );
}

fn validate_books(books: &[serde_json::Value]) {
    let mut seen_ids = HashSet::new();
    let mut seen_codes = HashSet::new();

    for (i, book) in books.iter().enumerate() {
        let code = book
            .get("book_code")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| {
                panic!("\n\nBOOK CATALOG BUILD ERROR: Book at index {i} missing 'book_code' field\n")
            });

        assert!(
            code.len() == 3 && code.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
            "\n\nBOOK CATALOG BUILD ERROR: Book code '{code}' (index {i}) must be 3 lowercase characters\n"
        );
        assert!(
            book.get("book_name").and_then(|v| v.as_str()).is_some(),
            "\n\nBOOK CATALOG BUILD ERROR: Book '{code}' (index {i}) missing 'book_name' field\n"
        );

        let id = book
            .get("book_id")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or_else(|| {
                panic!("\n\nBOOK CATALOG BUILD ERROR: Book '{code}' (index {i}) missing numeric 'book_id'\n")
            });

        // Book ids occupy the leading three digits of a reference id
        assert!(
            (1..=999).contains(&id),
            "\n\nBOOK CATALOG BUILD ERROR: Book '{code}' has id {id}, expected 1..=999\n"
        );
        assert!(
            seen_ids.insert(id),
            "\n\nBOOK CATALOG BUILD ERROR: Duplicate book id {id} ('{code}')\n"
        );
        assert!(
            seen_codes.insert(code.to_string()),
            "\n\nBOOK CATALOG BUILD ERROR: Duplicate book code '{code}'\n"
        );
    }
}

fn set_build_dependencies() {
    println!("cargo:rerun-if-changed=catalogs/bible_books.json");
    println!("cargo:rerun-if-changed=build.rs");
}
