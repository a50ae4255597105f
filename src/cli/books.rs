use clap::{Args, Subcommand};

use crate::catalog::query::DEFAULT_LIMIT;
use crate::cli::{print_json, OutputFormat, StoreArgs};

#[derive(Args)]
pub struct BooksArgs {
    #[command(subcommand)]
    pub command: BooksCommands,
}

#[derive(Subcommand)]
pub enum BooksCommands {
    /// List all books in the book catalog
    List {
        /// Path to custom book catalog file
        #[arg(long)]
        books: Option<std::path::PathBuf>,
    },

    /// List the books uploaded to a bible
    Uploaded {
        /// Bible resource name (e.g. en_KJV_1_bible)
        #[arg(required = true)]
        resource: String,

        /// Only this book code
        #[arg(long)]
        book: Option<String>,

        /// List inactive books instead of active ones
        #[arg(long)]
        inactive: bool,

        #[arg(long, default_value = "0")]
        skip: usize,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        #[command(flatten)]
        store: StoreArgs,
    },
}

pub fn run(args: BooksArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        BooksCommands::List { books } => run_list(books, format, verbose),
        BooksCommands::Uploaded {
            resource,
            book,
            inactive,
            skip,
            limit,
            store,
        } => run_uploaded(&resource, book.as_deref(), !inactive, skip, limit, &store, format),
    }
}

fn run_list(
    books_path: Option<std::path::PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let catalog = crate::catalog::BookCatalog::load(books_path.as_deref())?;

    if verbose {
        eprintln!("Loaded book catalog with {} books", catalog.len());
    }

    match format {
        OutputFormat::Text => {
            let name_width = catalog
                .books
                .iter()
                .map(|b| b.book_name.len())
                .max()
                .unwrap_or(4)
                .max(4);

            println!("Book Catalog ({} books)\n", catalog.len());
            println!("{:>4}  {:<4}  {:<name_w$}", "ID", "Code", "Name", name_w = name_width);
            println!("{}", "-".repeat(12 + name_width));
            for book in &catalog.books {
                println!(
                    "{:>4}  {:<4}  {:<name_w$}",
                    book.book_id,
                    book.book_code,
                    book.book_name,
                    name_w = name_width
                );
            }
        }
        OutputFormat::Json => print_json(&catalog.books)?,
        OutputFormat::Tsv => {
            println!("book_id\tbook_code\tbook_name");
            for book in &catalog.books {
                println!("{}\t{}\t{}", book.book_id, book.book_code, book.book_name);
            }
        }
    }

    Ok(())
}

fn run_uploaded(
    resource: &str,
    book: Option<&str>,
    active: bool,
    skip: usize,
    limit: usize,
    store: &StoreArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let registry = store.load_registry()?;
    let table = registry.get(resource)?;
    let listed = table.list_books(book, active, skip, limit);

    match format {
        OutputFormat::Text => {
            println!("{} ({} books)\n", table.resource(), listed.len());
            for content in &listed {
                let chapters = content
                    .json
                    .as_ref()
                    .and_then(|j| j.get("chapters"))
                    .and_then(|c| c.as_array())
                    .map_or(0, Vec::len);
                println!(
                    "  {:>3}  {}  {} chapter(s){}",
                    content.book_id,
                    content.book_code,
                    chapters,
                    if content.active { "" } else { "  [inactive]" }
                );
            }
        }
        OutputFormat::Json => print_json(&listed)?,
        OutputFormat::Tsv => {
            println!("book_id\tbook_code\tactive");
            for content in &listed {
                println!("{}\t{}\t{}", content.book_id, content.book_code, content.active);
            }
        }
    }

    Ok(())
}
