/*
 * aqr - list, map, and track visits to aquariums
 *
 * SPDX-FileCopyrightText: 2025-2026 Steve Schoettler
 * SPDX-License-Identifier: Apache-2.0
 */
use std::path::{Path, PathBuf};

use anyhow::Result;
use aquatrack::prelude::*;
use aquatrack_view::prelude::*;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::warn;

use crate::{
    config::CliConfig,
    output::{Output, OutputFormat},
};

pub mod account;
pub mod config;
pub mod items;
pub mod visit;

#[derive(Parser, Debug)]
#[command(name = "aqr")]
#[command(author, version, about = "aqr: list, map, and track visits to aquariums", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// API endpoint URL. Default: environment `AQUATRACK_URL`, the config file, or <http://127.0.0.1:8000>
    #[arg(short = 'u', long, env = "AQUATRACK_URL")]
    pub url: Option<String>,

    /// Value of the server's session cookie. Default: environment `AQUATRACK_SESSION` or the config file
    #[arg(long, env = "AQUATRACK_SESSION", hide_env_values = true)]
    pub session: Option<String>,

    /// Write output to file (default: stdout)
    #[arg(short = 'o', long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// JSON output
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Table output format (default)
    #[arg(short, long, global = true)]
    pub table: bool,

    /// Quiet mode - suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (repeat for more: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global=true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show login status
    Session,

    /// Show visit progress
    Stats,

    /// List aquariums, grouped by region when sorted by prefecture
    #[command(alias = "ls")]
    List(ViewArgs),

    /// Show map markers and the viewport command
    Map(ViewArgs),

    /// Full view model: list, map, progress, counts
    View(ViewArgs),

    /// List prefectures that have aquariums
    Divisions,

    /// Mark an aquarium visited
    Visit { id: String },

    /// Clear the visited mark
    Unvisit { id: String },

    /// Set or clear the note on an aquarium
    Note {
        id: String,

        /// Note text. An empty string clears the note.
        #[arg(required_unless_present = "stdin")]
        text: Option<String>,

        /// Read the note text from stdin
        #[arg(long, conflicts_with = "text")]
        stdin: bool,
    },

    /// End the server session
    Logout,

    /// Check server liveness
    Health,

    /// Show or change the config file
    Config(ConfigArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct ViewArgs {
    /// Which aquariums to show
    #[arg(long, value_enum, default_value_t = CategoryArg::All)]
    pub filter: CategoryArg,

    /// List order
    #[arg(long, value_enum, default_value_t = SortArg::Division)]
    pub sort: SortArg,

    /// Only this prefecture (prefecture sort only)
    #[arg(long, value_name = "PREFECTURE")]
    pub pref: Option<String>,

    /// Case-insensitive text search over name and location
    #[arg(short, long)]
    pub search: Option<String>,

    /// Expand a region section (repeatable)
    #[arg(long, value_name = "REGION")]
    pub expand: Vec<String>,

    /// Expand every region section
    #[arg(long, conflicts_with = "expand")]
    pub expand_all: bool,
}

impl ViewArgs {
    pub fn query(&self) -> ViewQuery {
        ViewQuery {
            category: self.filter.to_category(),
            division_filter: self.pref.clone(),
            search: self.search.clone().unwrap_or_default(),
            sort: self.sort.to_sort(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryArg {
    #[default]
    All,
    Visited,
    Unvisited,
    Starred,
}

impl CategoryArg {
    pub fn to_category(self) -> CategoryFilter {
        match self {
            Self::All => CategoryFilter::All,
            Self::Visited => CategoryFilter::Visited,
            Self::Unvisited => CategoryFilter::Unvisited,
            Self::Starred => CategoryFilter::Starred,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortArg {
    Name,
    #[default]
    Division,
}

impl SortArg {
    pub fn to_sort(self) -> SortMode {
        match self {
            Self::Name => SortMode::ByName,
            Self::Division => SortMode::ByDivision,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the config file (session redacted)
    Show,

    /// Set a config value
    Set {
        #[arg(value_enum)]
        key: ConfigKeyArg,
        value: String,
    },

    /// Delete the config file
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKeyArg {
    Url,
    Session,
}

pub struct AppContext {
    pub client: TrackerClient,
    pub output: Output,
}

impl AppContext {
    /// View session over this context's client, drawing into an in-memory marker layer
    pub fn view_session(&self) -> Session<TrackerClient, MarkerLayer> {
        Session::new(
            self.client.clone(),
            MarkerLayer::default(),
            MapConfig::default(),
        )
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    run_with_config(cli, &CliConfig::path()).await
}

/// Runs a command with the config file at `config_path`
pub async fn run_with_config(cli: Cli, config_path: &Path) -> Result<()> {
    let output = Output::new(resolve_output_format(&cli), cli.output.clone());

    if let Commands::Config(args) = &cli.command {
        return config::handle(args, config_path, &output);
    }

    let client = build_client(&cli, &CliConfig::load_from(config_path)?)?;
    let ctx = AppContext { client, output };

    match cli.command {
        Commands::Session => account::session(&ctx).await,
        Commands::Stats => account::stats(&ctx).await,
        Commands::Logout => account::logout(&ctx).await,
        Commands::Health => account::health(&ctx).await,
        Commands::List(args) => items::list(&ctx, &args).await,
        Commands::Map(args) => items::map(&ctx, &args).await,
        Commands::View(args) => items::view(&ctx, &args).await,
        Commands::Divisions => items::divisions(&ctx).await,
        Commands::Visit { id } => visit::set_visited(&ctx, &id, true).await,
        Commands::Unvisit { id } => visit::set_visited(&ctx, &id, false).await,
        Commands::Note { id, text, stdin } => visit::set_note(&ctx, &id, text, stdin).await,
        Commands::Config(_) => Ok(()),
    }
}

fn resolve_output_format(cli: &Cli) -> OutputFormat {
    if cli.quiet {
        OutputFormat::Quiet
    } else if cli.pretty {
        if cli.table {
            warn!("--pretty conflicts with --table. Using json pretty format");
        }
        OutputFormat::Pretty
    } else if cli.json {
        if cli.table {
            warn!("--json conflicts with --table. Using json format");
        }
        OutputFormat::Json
    } else {
        OutputFormat::Table
    }
}

/// Flags and environment win over the config file; the client's own
/// defaults apply when neither sets a value.
fn build_client(cli: &Cli, file: &CliConfig) -> Result<TrackerClient> {
    let mut config = ClientConfig::default();
    if let Some(url) = cli.url.as_ref().or(file.url.as_ref()) {
        config = config.base_url(url.as_str());
    }
    if let Some(session) = cli.session.as_ref().or(file.session.as_ref()) {
        config = config.session_cookie(session.as_str());
    }
    Ok(TrackerClient::with_config(config)?)
}
