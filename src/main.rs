//! # Intel Harness CLI (`intel`)
//!
//! ## Usage
//!
//! ```bash
//! intel --config ./config/intel.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `intel import <file> --forum <id>` | Import forum posts from CSV |
//! | `intel search [query]` | Search across entity types |
//! | `intel forums` | List import destinations |
//! | `intel fields` | List filterable fields |
//! | `intel serve` | Start the HTTP server |

use clap::{Parser, Subcommand, ValueEnum};
use intel_harness::progress::ProgressMode;
use intel_harness::{config, fields, forums, import_cmd, logging, search_cmd, server};
use intel_harness_core::import::LineNumbering;
use std::path::PathBuf;

/// Intel Harness: tolerant CSV import and cross-entity search over
/// threat-intelligence records.
#[derive(Parser)]
#[command(name = "intel", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/intel.toml")]
    config: PathBuf,

    /// Debug logging on stderr (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import forum posts from a CSV file into a forum.
    ///
    /// Lines are submitted one at a time; failing lines are logged and
    /// skipped. The full log is printed when the file is done.
    Import {
        /// CSV file, one post per line.
        file: PathBuf,

        /// Destination forum id (see `intel forums`).
        #[arg(long)]
        forum: String,

        /// What log line numbers count. Defaults to `[import].line_numbering`.
        #[arg(long, value_enum)]
        line_numbers: Option<NumberingArg>,

        /// Progress on stderr.
        #[arg(long, value_enum, default_value = "auto")]
        progress: ProgressArg,

        /// Print the log and summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search records across entity types.
    Search {
        /// Free-text query; may be omitted when filters are given.
        query: Option<String>,

        /// Comma-separated scopes, e.g. `forum-posts,telegram`.
        #[arg(long)]
        entity: Option<String>,

        /// Filter clause `field:operator:value`; repeatable.
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Result tab: `all` or an entity id such as `sources`.
        #[arg(long)]
        tab: Option<String>,

        /// Print the search view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List forums that posts can be imported into.
    Forums,

    /// List filterable fields.
    Fields {
        /// Comma-separated scopes; all searchable types when omitted.
        #[arg(long)]
        entity: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Clone, Copy, ValueEnum)]
enum NumberingArg {
    Compacted,
    Physical,
}

impl From<NumberingArg> for LineNumbering {
    fn from(arg: NumberingArg) -> Self {
        match arg {
            NumberingArg::Compacted => LineNumbering::Compacted,
            NumberingArg::Physical => LineNumbering::Physical,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ProgressArg {
    Auto,
    Off,
    Human,
    Json,
}

impl ProgressArg {
    fn mode(self) -> ProgressMode {
        match self {
            ProgressArg::Auto => ProgressMode::default_for_tty(),
            ProgressArg::Off => ProgressMode::Off,
            ProgressArg::Human => ProgressMode::Human,
            ProgressArg::Json => ProgressMode::Json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Commands that don't require config
    if let Commands::Fields { entity, json } = &cli.command {
        fields::run_fields(entity.as_deref(), *json)?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Import {
            file,
            forum,
            line_numbers,
            progress,
            json,
        } => {
            import_cmd::run_import(
                &cfg,
                &file,
                &forum,
                line_numbers.map(Into::into),
                progress.mode(),
                json,
            )
            .await?;
        }
        Commands::Search {
            query,
            entity,
            filters,
            tab,
            json,
        } => {
            search_cmd::run_search(
                &cfg,
                query,
                entity.as_deref(),
                &filters,
                tab.as_deref(),
                json,
            )
            .await?;
        }
        Commands::Forums => {
            forums::list_forums(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Fields { .. } => {}
    }

    Ok(())
}
