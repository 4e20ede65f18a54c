//! # EcoMatch CLI (`ecomatch`)
//!
//! ## Usage
//!
//! ```bash
//! ecomatch --config ./config/ecomatch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ecomatch init` | Create the SQLite catalog schema |
//! | `ecomatch sources` | Show configured catalog sources |
//! | `ecomatch import <file>` | Load a JSON / JSON Lines catalog into SQLite |
//! | `ecomatch recommend "<text>"` | Recommend the greenest product for a query |
//! | `ecomatch compare <a> <b>` | Compare two products by name |
//! | `ecomatch catalog` | Load the catalog and print its summary |
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default
//! `ecomatch=info,ecomatch_core=info`); results go to stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ecomatch::{catalog, config, import, migrate, recommend, sources};

/// EcoMatch CLI: eco product recommendations from free-text queries.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ecomatch.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ecomatch",
    about = "EcoMatch: recommend the greener product for a free-text query",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ecomatch.toml")]
    config: PathBuf,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the SQLite catalog schema.
    ///
    /// Creates the database file and the `eco_products` table. Safe to run
    /// more than once.
    Init,

    /// List catalog sources and their status.
    Sources,

    /// Import products from a JSON array, listing object, or JSON Lines file.
    Import {
        /// Path to the catalog file (`.json` or `.jsonl`).
        file: PathBuf,

        /// Remove existing products before importing.
        #[arg(long)]
        replace: bool,

        /// Decode the file and report counts without writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Recommend the greenest product for a free-text request.
    ///
    /// Mentioning two product kinds ("bottle or cup") compares them instead.
    Recommend {
        /// The request, e.g. "recommend a small bottle".
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Compare two products by name.
    ///
    /// Naming the same product twice compares its category's best eco
    /// option against its worst conventional one.
    Compare {
        /// First product name.
        name_a: String,
        /// Second product name.
        name_b: String,
    },

    /// Load the catalog and print counts, threshold, and categories.
    Catalog {
        /// Also list every product.
        #[arg(long)]
        products: bool,

        /// Also list every data issue found while loading.
        #[arg(long)]
        issues: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ecomatch=info,ecomatch_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Catalog database initialized successfully.");
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Import {
            file,
            replace,
            dry_run,
        } => {
            import::run_import(&cfg, &file, replace, dry_run).await?;
        }
        Commands::Recommend { text } => {
            recommend::run_recommend(&cfg, &text.join(" "), cli.json).await?;
        }
        Commands::Compare { name_a, name_b } => {
            recommend::run_compare(&cfg, &name_a, &name_b, cli.json).await?;
        }
        Commands::Catalog { products, issues } => {
            catalog::run_catalog(&cfg, products, issues, cli.json).await?;
        }
    }

    Ok(())
}
