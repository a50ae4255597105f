//! JSON web API over a bible store.
//!
//! Serves the same operations as the CLI from a store snapshot that is
//! rewritten after every change.
//!
//! ## Starting the Server
//!
//! ```text
//! # Start on default port 8080 with the default store
//! versifier serve
//!
//! # Custom port and store, open the book list in a browser
//! versifier serve --port 3000 --store bibles.json --open
//!
//! # Bind to all interfaces
//! versifier serve --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /api/books` - Book catalog
//! - `GET /api/references/{id}` - Decode a reference id
//! - `GET|POST /api/resources` - List or create bible resources
//! - `GET|POST|PUT /api/resources/{name}/books` - List, upload or update books
//! - `DELETE /api/resources/{name}/books/{code}` - Delete a book
//! - `GET /api/resources/{name}/verses` - Query verses
//! - `GET /api/resources/{name}/passage` - Read a passage
//! - `GET /api/resources/{name}/versification` - Versification report

pub mod server;
