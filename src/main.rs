//! StoreLens CLI entry point.

use clap::Parser;

use storelens::cli::{commands, handle_error, Cli, Commands};
use storelens::infrastructure::config::ConfigLoader;
use storelens::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args, config, cli.json).await,
        Commands::Route(args) => commands::route::execute(args, cli.json).await,
        Commands::Extract(args) => commands::extract::execute(args, cli.json).await,
        Commands::Knowledge(args) => commands::knowledge::execute(args, config, cli.json).await,
        Commands::Suggestions(args) => commands::suggestions::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
