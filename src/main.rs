use clap::Parser;
use tracing_subscriber::EnvFilter;

mod canon;
mod catalog;
mod cli;
mod core;
mod parsing;
mod utils;
mod versification;
mod web;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("versifier=debug,info")
    } else {
        EnvFilter::new("versifier=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Books(args) => {
            cli::books::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Resource(args) => {
            cli::resource::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Upload(args) => {
            cli::upload::run_upload(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Update(args) => {
            cli::upload::run_update(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Delete(args) => {
            cli::upload::run_delete(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Verses(args) => {
            cli::verses::run_verses(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Passage(args) => {
            cli::verses::run_passage(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Versification(args) => {
            cli::versification::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Reference(args) => {
            cli::reference::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Serve(args) => {
            web::server::run(args)?;
        }
    }

    Ok(())
}
