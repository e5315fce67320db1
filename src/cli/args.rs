//! CLI argument definitions using clap derive

use crate::http::{Destination, Method};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// shellcache - offline cache manager for a static site
///
/// Precaches the application shell, prunes stale cache generations and
/// answers requests cache-first with an offline fallback page.
#[derive(Parser, Debug)]
#[command(name = "shellcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHELLCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// State directory holding caches, registration and journal
    #[arg(long, global = true, env = "SHELLCACHE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the configured version and precache the shell
    Install(InstallArgs),

    /// Activate the installed version and delete stale caches
    Activate,

    /// Send a request through the active worker
    Fetch(FetchArgs),

    /// Show registration and cache partitions
    Status(StatusArgs),

    /// Delete every cache partition and unregister
    Clear(ClearArgs),

    /// Deliver a background sync event
    Sync(SyncArgs),

    /// Deliver a push event
    Push(PushArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Reinstall even if this version is already installed
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// URL or site-relative path (e.g. /about.html)
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET", value_parser = parse_method)]
    pub method: Method,

    /// Request destination
    #[arg(short, long, value_parser = parse_destination, conflicts_with = "navigate")]
    pub destination: Option<Destination>,

    /// Treat the request as a page navigation
    #[arg(short, long)]
    pub navigate: bool,

    /// Extra request header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body
    #[arg(long)]
    pub data: Option<String>,

    /// Write the response body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl FetchArgs {
    pub fn destination(&self) -> Destination {
        if self.navigate {
            Destination::Document
        } else {
            self.destination.unwrap_or_default()
        }
    }
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Sync tag registered by the page
    pub tag: String,
}

#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Push payload text, shown as the notification body
    #[arg(short, long)]
    pub body: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for the status command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Partition names, one per line
    Plain,
}

fn parse_method(s: &str) -> Result<Method, String> {
    s.parse()
}

fn parse_destination(s: &str) -> Result<Destination, String> {
    s.parse()
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{}`", s))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(format!("invalid header name `{}`", name));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
