//! `docstash`: command-line access to a docstash store directory.
//!
//! # Usage
//!
//! ```
//! docstash insert users '{"name": "Ada", "langs": ["en", "fr"]}'
//! docstash insert users @ada.json
//! docstash find users 0192f5e4-7c1a-7d3e-9a4b-3f2e1d0c9b8a
//! docstash count users '{"langs": ["fr", "de"]}'
//! docstash --dir /var/lib/docstash delete users '{"name": "Ada"}'
//! docstash collections
//! ```

use std::{fs, path::PathBuf};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use docstash_core::{DocumentCollection, DocumentId, Filter, StoreConfig};
use docstash_sqlite::Catalog;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Embedded JSON document store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "docstash.toml")]
  config: PathBuf,

  /// Store directory; overrides `dir` from the configuration.
  #[arg(long, value_name = "DIR")]
  dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Store a document and print its id.
  Insert {
    collection: String,
    /// JSON text, or `@path` to read it from a file.
    document:   String,
  },
  /// Print a stored document as JSON.
  Find { collection: String, id: DocumentId },
  /// Count documents matching a JSON filter (default: all).
  Count { collection: String, filter: Option<String> },
  /// Delete the first document matching a JSON filter and print its id.
  Delete { collection: String, filter: String },
  /// List registered collections.
  Collections,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("DOCSTASH").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let mut store_cfg: StoreConfig = settings
    .try_deserialize()
    .context("failed to deserialise StoreConfig")?;
  if let Some(dir) = cli.dir {
    store_cfg.dir = dir;
  }

  let catalog = Catalog::open(store_cfg.clone())
    .with_context(|| format!("failed to open store at {:?}", store_cfg.dir))?;

  match cli.command {
    Command::Insert { collection, document } => {
      let text = match document.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
          .with_context(|| format!("failed to read document from {path}"))?,
        None => document,
      };
      let id = catalog
        .add_collection(&collection)?
        .insert_one(text, None)
        .context("insert failed")?;
      println!("{id}");
    }
    Command::Find { collection, id } => {
      let Some(document) = catalog.add_collection(&collection)?.find_one(id)? else {
        bail!("no document {id} in {collection}");
      };
      println!("{}", serde_json::to_string_pretty(&document)?);
    }
    Command::Count { collection, filter } => {
      let filter = parse_filter(filter.as_deref().unwrap_or("{}"))?;
      let count = catalog.add_collection(&collection)?.count_documents(&filter)?;
      println!("{count}");
    }
    Command::Delete { collection, filter } => {
      let filter = parse_filter(&filter)?;
      let id = catalog
        .add_collection(&collection)?
        .delete_one(&filter)
        .context("delete failed")?;
      println!("{id}");
    }
    Command::Collections => {
      for entry in catalog.list_collections()? {
        println!("{}\t{}", entry.collection_id, entry.name);
      }
    }
  }

  Ok(())
}

fn parse_filter(text: &str) -> anyhow::Result<Filter> {
  text.parse().with_context(|| format!("invalid filter {text:?}"))
}
