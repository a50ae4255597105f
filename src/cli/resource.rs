use clap::{Args, Subcommand};

use crate::cli::{print_json, OutputFormat, StoreArgs};

#[derive(Args)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub command: ResourceCommands,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Subcommand)]
pub enum ResourceCommands {
    /// Register a new bible resource
    Create {
        /// Resource name, ending in `_bible` (e.g. en_KJV_1_bible)
        #[arg(required = true)]
        name: String,
    },

    /// List registered resources
    List,

    /// Delete a resource with all of its books and verses
    Delete {
        #[arg(required = true)]
        name: String,
    },
}

pub fn run(args: ResourceArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut registry = args.store.load_registry()?;

    match args.command {
        ResourceCommands::Create { name } => {
            let table = registry.create(&name)?;
            let created = table.resource().to_string();
            args.store.save_registry(&registry)?;
            if verbose {
                eprintln!("Saved store to {}", args.store.store.display());
            }
            println!("Created {created}");
        }
        ResourceCommands::Delete { name } => {
            let removed = registry.remove(&name)?;
            args.store.save_registry(&registry)?;
            println!(
                "Deleted {} ({} books, {} verses)",
                removed.resource(),
                removed.book_count(),
                removed.row_count()
            );
        }
        ResourceCommands::List => {
            let names: Vec<&str> = registry.names().map(|n| n.as_str()).collect();
            match format {
                OutputFormat::Text => {
                    println!("Resources ({})\n", names.len());
                    for name in &names {
                        if let Ok(table) = registry.get(name) {
                            println!(
                                "  {name}  {} books, {} verses",
                                table.book_count(),
                                table.row_count()
                            );
                        }
                    }
                }
                OutputFormat::Json => print_json(&names)?,
                OutputFormat::Tsv => {
                    println!("resource");
                    for name in &names {
                        println!("{name}");
                    }
                }
            }
        }
    }

    Ok(())
}
