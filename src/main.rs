//! # Madrasa CLI (`madrasa`)
//!
//! The `madrasa` binary is the primary interface for the Arabic-learning
//! backend. It provides commands for database initialization, materials
//! ingestion, question answering, transliteration, and starting the HTTP
//! server.
//!
//! ## Usage
//!
//! ```bash
//! madrasa --config ./config/madrasa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `madrasa init` | Create the SQLite database and run schema migrations |
//! | `madrasa ingest` | Ingest PDF/DOCX materials from the materials directory |
//! | `madrasa seed <dir>` | Seed materials from JSON documents |
//! | `madrasa materials` | List stored materials |
//! | `madrasa get <level> <week>` | Print a stored material |
//! | `madrasa ask "<question>"` | Run the question pipeline once |
//! | `madrasa transliterate "<text>"` | Transliterate Arabic text directly |
//! | `madrasa serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use madrasa::translit::{transliterate, ARABIC_TO_HEBREW, ARABIC_TO_LATIN};
use madrasa::{ask, config, get, ingest, migrate, server};

/// Madrasa — an Arabic-learning question-answering backend.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/madrasa.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "madrasa",
    about = "Madrasa — an Arabic-learning question-answering backend",
    version,
    long_about = "Madrasa ingests teaching materials into a SQLite store keyed by proficiency \
    level and course week, answers student questions against the stored material through an LLM \
    provider with a configurable fallback, and post-processes answers into Hebrew or Latin \
    phonetic transliteration."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/madrasa.toml`. Database, materials, answer
    /// provider, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/madrasa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the materials table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// Ingest materials from the configured materials directory.
    ///
    /// Scans `[materials].root` for PDF/DOCX files named
    /// `<level>_week<NN>.<ext>` (e.g. `beginner_week03.pdf`), extracts
    /// their text, and upserts them into the store. Files with
    /// unrecognized names or failing extraction are reported and skipped.
    Ingest {
        /// Show file counts without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Seed materials from a directory of JSON documents.
    ///
    /// Each `*.json` file holds one object with `level`, `week`, and
    /// `content` fields.
    Seed {
        /// Directory containing the JSON seed documents.
        dir: PathBuf,
    },

    /// List stored materials.
    Materials,

    /// Print a stored material.
    Get {
        /// Proficiency level (e.g. `beginner`).
        level: String,
        /// Course week (e.g. `week03`).
        week: String,
    },

    /// Answer a question against the stored material.
    ///
    /// Fetches the material for the level and week, asks the configured
    /// answer provider, and renders the answer in the requested target
    /// script.
    Ask {
        /// The student's question.
        question: String,

        /// Proficiency level of the material to answer from.
        #[arg(long)]
        level: String,

        /// Course week of the material to answer from.
        #[arg(long)]
        week: String,

        /// Target script: `arabic`, `transliteration-hebrew`, or
        /// `transliteration-english`.
        #[arg(long, default_value = "arabic")]
        language: String,
    },

    /// Transliterate Arabic text directly, without the store or a provider.
    Transliterate {
        /// The Arabic text to transliterate.
        text: String,

        /// Destination script: `hebrew` or `english`.
        #[arg(long)]
        target: String,
    },

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// `POST /ask`, `POST /save_user`, and `GET /health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Transliterate { text, target } = &cli.command {
        let table = match target.as_str() {
            "hebrew" => &ARABIC_TO_HEBREW,
            "english" | "latin" => &ARABIC_TO_LATIN,
            other => {
                eprintln!("Error: unknown target script: '{}'. Use hebrew or english.", other);
                std::process::exit(1);
            }
        };
        println!("{}", transliterate(text, table));
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run).await?;
        }
        Commands::Seed { dir } => {
            ingest::run_seed(&cfg, &dir).await?;
        }
        Commands::Materials => {
            get::run_list(&cfg).await?;
        }
        Commands::Get { level, week } => {
            get::run_get(&cfg, &level, &week).await?;
        }
        Commands::Ask {
            question,
            level,
            week,
            language,
        } => {
            ask::run_ask(&cfg, &question, &level, &week, &language).await?;
        }
        Commands::Transliterate { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
