//! shellcache - offline cache manager
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use shellcache::cli::{commands, Cli, Commands};
use shellcache::config::{ConfigManager, StateLayout};
use shellcache::error::ShellCacheResult;
use shellcache::host::WorkerHost;
use shellcache::ui;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; logs go to stderr so fetch bodies stay clean
fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("shellcache=warn"),
        1 => EnvFilter::new("shellcache=info"),
        _ => EnvFilter::new("shellcache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

async fn run() -> ShellCacheResult<()> {
    let cli = Cli::parse();
    ui::init_theme();

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Config commands must work even when the file does not parse
    if let Commands::Config(args) = cli.command {
        init_logging(cli.verbose, false);
        return commands::config(args, &manager).await;
    }

    let config = manager.load().await?;
    let verbose = cli.verbose.max(u8::from(config.general.verbose));
    init_logging(verbose, config.general.log_format == "json");

    let layout = match cli.state_dir {
        Some(path) => StateLayout::new(path),
        None => StateLayout::default(),
    };
    let host = WorkerHost::open(config, layout).await?;

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Install(args) => commands::install(args, &host).await,
        Commands::Activate => commands::activate(&host).await,
        Commands::Fetch(args) => commands::fetch(args, &host).await,
        Commands::Status(args) => commands::status(args, &host).await,
        Commands::Clear(args) => commands::clear(args, &host).await,
        Commands::Sync(args) => commands::sync(args, &host).await,
        Commands::Push(args) => commands::push(args, &host).await,
    }
}
