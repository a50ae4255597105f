use clap::Args;

use crate::catalog::query::{PassageQuery, VerseFinder, VerseHit, VerseQuery, DEFAULT_LIMIT};
use crate::cli::{print_json, OutputFormat, StoreArgs};

#[derive(Args)]
pub struct VersesArgs {
    /// Bible resource name
    #[arg(required = true)]
    pub resource: String,

    /// Book code (e.g. gen, 1co)
    #[arg(long)]
    pub book: Option<String>,

    #[arg(long)]
    pub chapter: Option<u32>,

    /// First verse; also the last unless --last-verse is given
    #[arg(long)]
    pub verse: Option<u32>,

    #[arg(long, requires = "verse")]
    pub last_verse: Option<u32>,

    /// Only verses containing this phrase
    #[arg(long)]
    pub search: Option<String>,

    /// Query inactive verses instead of active ones
    #[arg(long)]
    pub inactive: bool,

    #[arg(long, default_value = "0")]
    pub skip: usize,

    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct PassageArgs {
    /// Bible resource name
    #[arg(required = true)]
    pub resource: String,

    /// Start book code
    #[arg(required = true)]
    pub book: String,

    /// Start chapter
    #[arg(required = true)]
    pub chapter: u32,

    /// Start verse (default: start of chapter)
    #[arg(long)]
    pub verse: Option<u32>,

    /// End book code (default: start book)
    #[arg(long)]
    pub end_book: Option<String>,

    /// End chapter (default: start chapter)
    #[arg(long)]
    pub end_chapter: Option<u32>,

    /// End verse (default: end of chapter)
    #[arg(long)]
    pub end_verse: Option<u32>,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn run_verses(args: VersesArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let books = args.store.load_books()?;
    let registry = args.store.load_registry()?;
    let table = registry.get(&args.resource)?;

    let query = VerseQuery {
        book_code: args.book,
        chapter: args.chapter,
        verse: args.verse,
        last_verse: args.last_verse,
        search_phrase: args.search,
        active: !args.inactive,
        skip: args.skip,
        limit: args.limit,
    };
    let hits = VerseFinder::new(table, &books).find_verses(&query)?;

    if verbose {
        eprintln!("{} verse(s) matched in {}", hits.len(), table.resource());
    }
    print_hits(&hits, format)
}

pub fn run_passage(args: PassageArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let books = args.store.load_books()?;
    let registry = args.store.load_registry()?;
    let table = registry.get(&args.resource)?;

    let passage = PassageQuery {
        book: args.book,
        chapter: args.chapter,
        verse: args.verse,
        book_end: args.end_book,
        chapter_end: args.end_chapter,
        verse_end: args.end_verse,
    };
    let hits = VerseFinder::new(table, &books).find_passage(&passage)?;

    if verbose {
        eprintln!("{} verse(s) in passage", hits.len());
    }
    print_hits(&hits, format)
}

fn print_hits(hits: &[VerseHit], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for hit in hits {
                let r = &hit.reference;
                println!("{} {}:{}  {}", r.book, r.chapter, r.verse_number, hit.verse_text);
            }
        }
        OutputFormat::Json => print_json(hits)?,
        OutputFormat::Tsv => {
            println!("bible\tbook\tchapter\tverse\tverse_text");
            for hit in hits {
                let r = &hit.reference;
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    r.bible, r.book, r.chapter, r.verse_number, hit.verse_text
                );
            }
        }
    }
    Ok(())
}
