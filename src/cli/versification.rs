use clap::Args;

use crate::catalog::VerseStore;
use crate::cli::{print_json, OutputFormat, StoreArgs};
use crate::versification::{compute_versification, VersificationReport};

#[derive(Args)]
pub struct VersificationArgs {
    /// Bible resource name
    #[arg(required = true)]
    pub resource: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn run(args: VersificationArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let books = args.store.load_books()?;
    let registry = args.store.load_registry()?;
    let table = registry.get(&args.resource)?;

    let rows = table.query_ordered_by_reference(None);
    if verbose {
        eprintln!("Scanning {} verse rows of {}", rows.len(), table.resource());
    }
    let report = compute_versification(&rows, &books);

    match format {
        OutputFormat::Text => print_text_report(&args.resource, &report),
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Tsv => print_tsv_report(&report),
    }
    Ok(())
}

fn print_text_report(resource: &str, report: &VersificationReport) {
    println!("Versification of {resource}");
    println!("{}", "=".repeat(60));

    println!("\nMax verses per chapter:");
    for (book, maxima) in report.max_verses.books() {
        let chapters: Vec<String> = maxima.iter().map(u32::to_string).collect();
        println!("  {book}: {}", chapters.join(" "));
    }

    if !report.excluded_verses.is_empty() {
        println!("\nExcluded verses ({}):", report.excluded_verses.len());
        for verse in &report.excluded_verses {
            println!("  {verse}");
        }
    }

    if !report.mapped_verses.is_empty() {
        println!("\nMerged verses ({}):", report.mapped_verses.len());
        for mapped in &report.mapped_verses {
            println!("  {} -> {}", mapped.published, mapped.verses.join(", "));
        }
    }

    if !report.partial_verses.is_empty() {
        println!("\nSplit verses ({}):", report.partial_verses.len());
        for partial in &report.partial_verses {
            println!("  {} [{}]", partial.reference, partial.parts.join(", "));
        }
    }
}

fn print_tsv_report(report: &VersificationReport) {
    println!("book\tchapter\tmax_verse");
    for (book, maxima) in report.max_verses.books() {
        for (i, max) in maxima.iter().enumerate() {
            println!("{book}\t{}\t{max}", i + 1);
        }
    }
}
