//! Thin CLI front-end: parses arguments into a `Command` and hands it to the runner.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use galdrdb::cli::{Command, OutputMode, run_with_format};
use galdrdb::engine::Engine;

#[derive(Parser)]
#[command(name = "galdrdb", version, about = "GaldrDb: an embedded, single-file document database")]
struct Cli {
    /// Path to the database's WASP log file.
    #[arg(short, long, global = true, default_value = "galdrdb.wasp")]
    db: PathBuf,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value = "human")]
    format: Format,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Copy, Clone, clap::ValueEnum)]
enum Format {
    Human,
    Plain,
    Json,
}

impl From<Format> for OutputMode {
    fn from(f: Format) -> Self {
        match f {
            Format::Human => OutputMode::Human,
            Format::Plain => OutputMode::Plain,
            Format::Json => OutputMode::Json,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Print aggregate stats across all collections.
    Info,
    /// Print package and feature-flag info.
    Version,
    /// Create a collection.
    ColCreate { name: String },
    /// Delete a collection.
    ColDelete { name: String },
    /// List all collections.
    ColList,
    /// Rename a collection.
    ColRename { old: String, new: String },
    /// Create a B+-tree index on a field.
    CreateIndex { collection: String, field: String },
    /// Drop an index from a field.
    DropIndex { collection: String, field: String },
    /// Insert a JSON document into a collection.
    Insert {
        collection: String,
        /// Document body as a JSON object.
        json: String,
    },
    /// Find documents matching a JSON filter.
    Find {
        collection: String,
        /// Filter as a JSON object, e.g. '{"age": {"$gt": 21}}'.
        filter: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        skip: Option<usize>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        project: Option<String>,
    },
    /// Count documents matching a JSON filter.
    Count { collection: String, filter: String },
    /// Update every document matching a filter by applying a JSON update document.
    UpdateMany { collection: String, filter: String, update: String },
    /// Delete every document matching a filter.
    DeleteMany { collection: String, filter: String },
    /// Import a file (ndjson/csv/bson, auto-detected by default) into a collection.
    Import {
        collection: String,
        file: PathBuf,
        #[arg(long)]
        format: Option<String>,
    },
    /// Export a collection to a file.
    Export {
        collection: String,
        file: PathBuf,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Force a checkpoint of the WASP log, compacting it into the page file.
    Checkpoint,
    /// List or toggle compile/runtime feature flags.
    FeatureList,
    FeatureEnable { name: String },
    FeatureDisable { name: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = galdrdb::logger::init();
    let cli = Cli::parse();
    let engine = Engine::new(cli.db.clone())?;
    let mode: OutputMode = cli.format.into();

    let command = match cli.command {
        Cmd::Info => Command::Info,
        Cmd::Version => Command::Version,
        Cmd::ColCreate { name } => Command::ColCreate { name },
        Cmd::ColDelete { name } => Command::ColDelete { name },
        Cmd::ColList => Command::ColList,
        Cmd::ColRename { old, new } => Command::ColRename { old, new },
        Cmd::CreateIndex { collection, field } => Command::CreateIndex { collection, field },
        Cmd::DropIndex { collection, field } => Command::DropIndex { collection, field },
        Cmd::Insert { collection, json } => {
            Command::CreateDocument { collection: Some(collection), json }
        }
        Cmd::Find { collection, filter, limit, skip, sort, project } => Command::QueryFind {
            collection,
            filter_json: filter,
            project,
            sort,
            limit,
            skip,
        },
        Cmd::Count { collection, filter } => Command::QueryCount { collection, filter_json: filter },
        Cmd::UpdateMany { collection, filter, update } => Command::QueryUpdate {
            collection,
            filter_json: filter,
            update_json: update,
        },
        Cmd::DeleteMany { collection, filter } => {
            Command::QueryDelete { collection, filter_json: filter }
        }
        Cmd::Import { collection, file, format } => Command::Import { collection, file, format },
        Cmd::Export { collection, file, format, limit } => Command::Export {
            collection,
            file,
            format,
            redact_fields: None,
            filter_json: None,
            limit,
        },
        Cmd::Checkpoint => {
            engine.checkpoint_with_indexes(&cli.db)?;
            println!("checkpointed: {}", cli.db.display());
            return Ok(());
        }
        Cmd::FeatureList => Command::FeatureList,
        Cmd::FeatureEnable { name } => Command::FeatureEnable { name },
        Cmd::FeatureDisable { name } => Command::FeatureDisable { name },
    };

    run_with_format(&engine, command, mode)
}
