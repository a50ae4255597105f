use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::canon::upload::{
    delete_book, update_books, upload_books, BatchError, BookSource, BookUpdate, UploadSummary,
};
use crate::cli::{print_json, OutputFormat, StoreArgs};

#[derive(Args)]
pub struct UploadArgs {
    /// Bible resource name (e.g. en_KJV_1_bible)
    #[arg(required = true)]
    pub resource: String,

    /// Book files: `.usfm`/`.sfm` or `.json`
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Create the resource if it does not exist
    #[arg(long)]
    pub create: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Bible resource name
    #[arg(required = true)]
    pub resource: String,

    /// Book code of the book to update
    #[arg(long, required = true)]
    pub book: String,

    /// Replacement content for the book
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Set the active flag of the book and its verses
    #[arg(long)]
    pub active: Option<bool>,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Bible resource name
    #[arg(required = true)]
    pub resource: String,

    /// Book code of the book to delete
    #[arg(required = true)]
    pub book: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn run_upload(args: UploadArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let books = args.store.load_books()?;
    let mut registry = args.store.load_registry()?;

    let mut sources = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let source = BookSource::from_file(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        sources.push(source);
    }

    if args.create && registry.get(&args.resource).is_err() {
        registry.create(&args.resource)?;
    }
    let table = registry.get_mut(&args.resource)?;
    let result = upload_books(table, &books, &sources);

    // Books applied before a failure stay in the store
    args.store.save_registry(&registry)?;
    let summary = result.map_err(|e| batch_failure(e, &args.files))?;

    if verbose {
        eprintln!("Saved store to {}", args.store.store.display());
    }
    print_summary("Uploaded", &summary, format)
}

pub fn run_update(args: UpdateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if args.file.is_none() && args.active.is_none() {
        anyhow::bail!("Nothing to update: pass --file, --active, or both");
    }

    let books = args.store.load_books()?;
    let mut registry = args.store.load_registry()?;

    let source = match &args.file {
        Some(path) => BookSource::from_file(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => BookSource::default(),
    };
    let update = BookUpdate {
        book_code: args.book.clone(),
        source,
        active: args.active,
    };

    let table = registry.get_mut(&args.resource)?;
    let summary = update_books(table, &books, &[update])?;
    args.store.save_registry(&registry)?;

    if verbose {
        eprintln!("Saved store to {}", args.store.store.display());
    }
    print_summary("Updated", &summary, format)
}

pub fn run_delete(args: DeleteArgs, _format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    let books = args.store.load_books()?;
    let mut registry = args.store.load_registry()?;

    let table = registry.get_mut(&args.resource)?;
    let removed = delete_book(table, &books, &args.book)?;
    args.store.save_registry(&registry)?;

    println!("Deleted {} from {}", removed.book_code, args.resource);
    Ok(())
}

fn batch_failure(err: BatchError, files: &[PathBuf]) -> anyhow::Error {
    let file = files
        .get(err.index)
        .map_or_else(String::new, |p| format!(" in {}", p.display()));
    let applied = if err.applied.is_empty() {
        "no books were applied".to_string()
    } else {
        format!("already applied: {}", err.applied.join(", "))
    };
    anyhow::Error::new(err).context(format!("Upload failed{file} ({applied})"))
}

fn print_summary(verb: &str, summary: &UploadSummary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!(
                "{verb} {} book(s) in {}: {}",
                summary.books.len(),
                summary.resource,
                summary.books.join(", ")
            );
            println!("  Verse rows written: {}", summary.rows_written);
            if summary.rows_flagged > 0 {
                println!("  Verse rows flagged: {}", summary.rows_flagged);
            }
        }
        OutputFormat::Json => print_json(summary)?,
        OutputFormat::Tsv => {
            println!("resource\tbooks\trows_written\trows_flagged");
            println!(
                "{}\t{}\t{}\t{}",
                summary.resource,
                summary.books.join(","),
                summary.rows_written,
                summary.rows_flagged
            );
        }
    }
    Ok(())
}
