mod account_holder;
mod address;
mod bank;
mod cli;
mod clients;
mod db;
mod delta;
mod documents;
mod error;
mod fmt;
mod http;
mod models;
mod reconciler;
mod repository;
mod settings;
mod shareholders;
#[cfg(test)]
mod testing;
mod uploads;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_tracing(verbose: bool) {
    let default = if verbose { "shopsync=debug" } else { "shopsync=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Sync => cli::sync::run(),
        Commands::Documents { shop_ids } => cli::documents::run(&shop_ids),
        Commands::Mappings { shop } => cli::mappings::run(shop.as_deref()),
        Commands::Pending => cli::pending::run(),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
