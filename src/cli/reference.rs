use clap::{Args, Subcommand};
use serde_json::json;

use crate::catalog::query::decode_reference;
use crate::catalog::BookLookup;
use crate::cli::{print_json, OutputFormat, StoreArgs};
use crate::core::reference::{encode, ReferenceId};

#[derive(Args)]
pub struct ReferenceArgs {
    #[command(subcommand)]
    pub command: ReferenceCommands,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Subcommand)]
pub enum ReferenceCommands {
    /// Encode a book code (or numeric book id), chapter and verse
    Encode {
        #[arg(required = true)]
        book: String,
        #[arg(required = true)]
        chapter: u32,
        #[arg(required = true)]
        verse: u32,
    },

    /// Decode a reference id (integer or 9-digit key)
    Decode {
        #[arg(required = true)]
        id: String,
    },
}

pub fn run(args: ReferenceArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    let books = args.store.load_books()?;

    match args.command {
        ReferenceCommands::Encode {
            book,
            chapter,
            verse,
        } => {
            let book_id = match book.parse::<u32>() {
                Ok(id) => id,
                Err(_) => books.require_code(&book)?.book_id,
            };
            let id = encode(book_id, chapter, verse)?;
            match format {
                OutputFormat::Text => println!("{id}"),
                OutputFormat::Json => print_json(&json!({
                    "ref_id": id.value(),
                    "key": id.to_key(),
                }))?,
                OutputFormat::Tsv => {
                    println!("ref_id\tkey");
                    println!("{}\t{}", id.value(), id.to_key());
                }
            }
        }
        ReferenceCommands::Decode { id } => {
            let parsed: ReferenceId = id.parse()?;
            let decoded = decode_reference(&books, u64::from(parsed.value()))?;
            match format {
                OutputFormat::Text => {
                    println!("{} {}:{}", decoded.book, decoded.chapter, decoded.verse);
                }
                OutputFormat::Json => print_json(&decoded)?,
                OutputFormat::Tsv => {
                    println!("book\tchapter\tverse");
                    println!("{}\t{}\t{}", decoded.book, decoded.chapter, decoded.verse);
                }
            }
        }
    }

    Ok(())
}
