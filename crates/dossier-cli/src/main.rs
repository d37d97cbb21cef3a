//! `dossier`: batch front end for the Dossier forensic corpus engine.
//!
//! # Usage
//!
//! ```
//! dossier ingest ./evidence
//! dossier analyze
//! dossier stats
//! dossier findings --kind silence_interval
//! ```
//!
//! Settings come from `dossier.toml` (or `--config`), overridden by
//! `DOSSIER_*` environment variables.

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dossier_analytics::{Analyzer, recognize::CapitalizedNameRecognizer};
use dossier_core::{finding::FindingKind, store::CorpusStore};
use dossier_ingest::{IngestPipeline, RankedExtractor};
use dossier_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Forensic analysis over a document corpus")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "dossier.toml", global = true)]
  config: PathBuf,

  /// SQLite database file; overrides `store_path` from the configuration.
  #[arg(long, global = true)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Fingerprint, extract and store every supported file under a directory.
  Ingest {
    dir: PathBuf,

    /// Only scan the top level of the directory.
    #[arg(long)]
    no_recursive: bool,
  },
  /// Analyse new documents, then run the corpus-wide detectors.
  Analyze,
  /// Print corpus row counts as JSON.
  Stats,
  /// Print stored findings as JSON.
  Findings {
    /// Restrict to one kind: bridge_entity, benfords_violation or
    /// silence_interval.
    #[arg(long)]
    kind: Option<FindingKind>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(store) = cli.store {
    settings.store_path = store;
  }

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  match cli.command {
    Command::Ingest { dir, no_recursive } => {
      let recursive = settings.ingest.recursive && !no_recursive;
      let extractor = RankedExtractor::with_defaults(settings.ingest.min_text_len);
      let pipeline = IngestPipeline::new(store, extractor, settings.ingest);

      let report = pipeline
        .ingest_directory(&dir, recursive)
        .await
        .with_context(|| format!("failed to ingest {}", dir.display()))?;
      println!(
        "scanned {}  ingested {}  duplicate {}  failed {}",
        report.scanned, report.ingested, report.duplicate, report.failed
      );
    }
    Command::Analyze => {
      let analyzer = Analyzer::new(CapitalizedNameRecognizer, settings.analysis);
      let report = analyzer.run(&store).await.context("analysis failed")?;
      println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Command::Stats => {
      let stats = store.stats().await.context("failed to read stats")?;
      println!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Command::Findings { kind } => {
      let findings = store
        .list_findings(kind)
        .await
        .context("failed to list findings")?;
      println!("{}", serde_json::to_string_pretty(&findings)?);
    }
  }

  Ok(())
}
