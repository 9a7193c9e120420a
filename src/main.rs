mod categorizer;
mod charts;
mod cli;
mod cluster;
mod encoder;
mod error;
mod export;
mod fmt;
mod loader;
mod models;
mod pipeline;
mod reports;
mod settings;
mod tui;

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands, settings_path: Option<&Path>) -> Result<()> {
    let load = || settings::load_settings(settings_path);
    match command {
        Commands::Init { force } => cli::init::run(settings_path, force),
        Commands::Analyze {
            file,
            cluster,
            export,
            charts,
            limit,
        } => cli::analyze::run(&file, &cluster, export, charts, limit, &load()?),
        Commands::Categorize { description } => cli::categorize::run(&description, &load()?),
        Commands::Export {
            file,
            cluster,
            output,
        } => cli::export::run(&file, &cluster, output, &load()?),
        Commands::Charts { file, output_dir } => cli::charts::run(&file, output_dir, &load()?),
        Commands::Keywords => cli::keywords::run(&load()?),
        Commands::Dashboard { file, cluster } => cli::dashboard::run(&file, &cluster, &load()?),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command, cli.settings.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
