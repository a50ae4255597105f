//! Command-line interface for versifier.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **books**: List the book catalog, or the books uploaded to a bible
//! - **resource**: Create, list or delete bible resources
//! - **upload** / **update** / **delete**: Manage the books of a bible
//! - **verses** / **passage**: Query canonical verses
//! - **versification**: Report the verse structure of a bible
//! - **reference**: Encode and decode reference ids
//! - **serve**: Start the web API
//!
//! ## Usage
//!
//! ```text
//! # Create a bible and upload two books
//! versifier resource create en_KJV_1_bible
//! versifier upload en_KJV_1_bible GEN.usfm EXO.json
//!
//! # Read John 3:16-18
//! versifier verses en_KJV_1_bible --book jhn --chapter 3 --verse 16 --last-verse 18
//!
//! # Versification as JSON
//! versifier versification en_KJV_1_bible --format json
//!
//! # Start web API
//! versifier serve --port 8080 --open
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::catalog::store::ResourceRegistry;
use crate::catalog::BookCatalog;

pub mod books;
pub mod reference;
pub mod resource;
pub mod upload;
pub mod verses;
pub mod versification;

/// Store file used when `--store` is not given
pub const DEFAULT_STORE: &str = "versifier_store.json";

#[derive(Parser)]
#[command(name = "versifier")]
#[command(version)]
#[command(about = "Normalize bible verse numbering and report versification")]
#[command(
    long_about = "versifier loads bible books from USFM or JSON and stores one canonical row per verse.\n\nSplit verses (12a, 12b) are folded into a single verse, merged verses (12-14) are expanded to one row per verse, and every verse gets a reference id that sorts in reading order. From the stored rows it reports:\n- The highest verse of every chapter\n- Verses missing inside a chapter\n- Which verses were merged or split in the source"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List catalog books or the books of a bible
    Books(books::BooksArgs),

    /// Manage bible resources
    Resource(resource::ResourceArgs),

    /// Upload USFM or JSON books into a bible
    Upload(upload::UploadArgs),

    /// Replace the content of uploaded books or change their active flag
    Update(upload::UpdateArgs),

    /// Delete a book from a bible
    Delete(upload::DeleteArgs),

    /// Query verses of a bible
    Verses(verses::VersesArgs),

    /// Read a passage, which may cross chapters and books
    Passage(verses::PassageArgs),

    /// Report the versification of a bible
    Versification(versification::VersificationArgs),

    /// Encode or decode reference ids
    Reference(reference::ReferenceArgs),

    /// Start the web server
    Serve(ServeArgs),
}

/// Location of the store snapshot and book catalog
#[derive(clap::Args, Clone, Debug)]
pub struct StoreArgs {
    /// Path to the store file (created on first write)
    #[arg(long, global = true, default_value = DEFAULT_STORE)]
    pub store: PathBuf,

    /// Path to custom book catalog file
    #[arg(long, global = true)]
    pub books: Option<PathBuf>,
}

impl StoreArgs {
    pub fn load_books(&self) -> anyhow::Result<BookCatalog> {
        Ok(BookCatalog::load(self.books.as_deref())?)
    }

    pub fn load_registry(&self) -> anyhow::Result<ResourceRegistry> {
        Ok(ResourceRegistry::load(&self.store)?)
    }

    pub fn save_registry(&self, registry: &ResourceRegistry) -> anyhow::Result<()> {
        registry.save(&self.store)?;
        Ok(())
    }
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
