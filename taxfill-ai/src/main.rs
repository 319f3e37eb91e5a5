//! taxfill-ai - command-line driver
//!
//! `prepare` runs the full pipeline over documents in a local folder and
//! prints the outcome as JSON. `compute` computes and renders a record
//! supplied directly as a JSON object of field values.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use taxfill_ai::config::{resolve_storage_root, GenerationSettings};
use taxfill_ai::extractors::DocumentExtractor;
use taxfill_ai::workflow::{
    finalize, FilesystemObjectStore, InMemoryDocumentRegistry, ReturnPipeline,
};
use taxfill_ai::{FieldSet, TaxRecord};
use taxfill_common::config::load_toml_config;
use taxfill_common::events::EventBus;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for taxfill-ai
#[derive(Parser, Debug)]
#[command(name = "taxfill-ai")]
#[command(about = "Extract, reconcile and compute a tax return from uploaded documents")]
#[command(version)]
struct Args {
    /// Config file (overrides TAXFILL_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract and reconcile documents, computing the return when complete
    Prepare {
        /// Owner the documents belong to
        #[arg(long)]
        owner: String,

        /// Document location relative to the storage root (repeatable)
        #[arg(long = "doc", required = true)]
        docs: Vec<PathBuf>,

        /// JSON object answering missing fields
        #[arg(long)]
        answers: Option<PathBuf>,

        /// Storage root folder (overrides storage_root in the config)
        #[arg(long, env = "TAXFILL_STORAGE_ROOT")]
        root: Option<PathBuf>,
    },

    /// Compute and render a complete record given as JSON field values
    Compute {
        #[arg(long)]
        record: PathBuf,
    },
}

fn read_field_set(path: &Path) -> Result<FieldSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref());

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting taxfill-ai {}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Prepare {
            owner,
            docs,
            answers,
            root,
        } => {
            // Fatal configuration is checked before any document is read
            let settings = GenerationSettings::from_config(&toml_config)?;
            let root = resolve_storage_root(root.as_deref(), &toml_config)?;
            let answers = answers.as_deref().map(read_field_set).transpose()?;

            let extractor = DocumentExtractor::new(Arc::new(settings.build_client()?))
                .with_retry(settings.retry);
            let locations: Vec<String> = docs
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();

            let event_bus = EventBus::new(100);
            let pipeline = ReturnPipeline::new(
                Arc::new(InMemoryDocumentRegistry::for_locations(&owner, &locations)),
                Arc::new(FilesystemObjectStore::new(root)),
                Arc::new(extractor),
            )
            .with_max_concurrent(settings.max_concurrent_extractions)
            .with_event_bus(event_bus);

            let cancel = CancellationToken::new();
            let ctrl_c_token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling remaining extractions");
                    ctrl_c_token.cancel();
                }
            });

            let mut prepared = pipeline.prepare(&owner, &locations, &cancel).await?;
            if let Some(answers) = answers {
                prepared = pipeline.apply_answers(&prepared, &answers)?;
            }

            println!("{}", serde_json::to_string_pretty(&prepared)?);
        }

        Command::Compute { record } => {
            let fields = read_field_set(&record)?;
            let record = TaxRecord::from_fields(&fields);
            let missing = record.missing_fields();
            if !missing.is_empty() {
                bail!("Record is incomplete, missing required fields: {}", missing);
            }

            let completed = finalize(&record)?;
            println!("{}", serde_json::to_string_pretty(&completed)?);
        }
    }

    Ok(())
}
