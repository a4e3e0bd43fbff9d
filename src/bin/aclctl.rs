//! aclctl - inspect and edit ACL buckets stored in a snapshot file
//!
//! Every invocation loads the snapshot (if present), runs one command
//! through the document backend and writes the snapshot back when the
//! command mutated anything.
//!
//! # Examples
//!
//! ```bash
//! # Grant two permissions
//! aclctl add users joe admin editor
//!
//! # Read them back
//! aclctl get users joe
//!
//! # Share one collection between all buckets
//! ACL_USE_SINGLE_COLLECTION=true aclctl add roles admin photos.read
//! ```

use acl_docstore::acl::{AclBackend, BackendConfig, DocumentBackend, Key, ValueSet, Values};
use acl_docstore::store::{DocumentStore, MemoryStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// aclctl - ACL bucket administration
#[derive(Parser, Debug)]
#[command(name = "aclctl")]
#[command(version = acl_docstore::VERSION)]
#[command(about = "Inspect and edit ACL buckets stored as documents", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Snapshot file holding the document store
    #[arg(long, global = true, default_value = "acl.json", env = "ACL_SNAPSHOT")]
    snapshot: PathBuf,

    /// Backend configuration file (TOML)
    #[arg(long, global = true, env = "ACL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the values of a key
    Get {
        bucket: String,
        key: String,
    },

    /// Show the union of the values of several keys
    Union {
        bucket: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Add values to a key
    Add {
        bucket: String,
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Remove values from a key
    Remove {
        bucket: String,
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Delete keys from a bucket
    Del {
        bucket: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Drop every collection
    Clean,

    /// List physical collections
    Collections,

    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli);

    if let Commands::Version = cli.command {
        println!("aclctl {}", acl_docstore::VERSION);
        return Ok(());
    }

    let config = BackendConfig::load(cli.config.as_deref())?;
    debug!(?config, "Loaded configuration");

    let store = if cli.snapshot.exists() {
        MemoryStore::load_snapshot(&cli.snapshot)?
    } else {
        info!(path = %cli.snapshot.display(), "Snapshot not found; starting empty");
        MemoryStore::new()
    };
    let backend = DocumentBackend::new(Arc::new(store.clone()), config);

    let mutated = run(&backend, &store, cli.command).await?;

    if mutated {
        store.save_snapshot(&cli.snapshot)?;
        info!(path = %cli.snapshot.display(), "Snapshot written");
    }

    backend.close().await?;
    Ok(())
}

/// Execute one command, returning whether the store changed
async fn run(
    backend: &DocumentBackend,
    store: &MemoryStore,
    command: Commands,
) -> anyhow::Result<bool> {
    match command {
        Commands::Get { bucket, key } => {
            print_values(&backend.get(&bucket, parse_key(key)).await?);
            Ok(false)
        }
        Commands::Union { bucket, keys } => {
            let keys = keys.into_iter().map(parse_key).collect();
            print_values(&backend.union(&bucket, keys).await?);
            Ok(false)
        }
        Commands::Add { bucket, key, values } => {
            let mut tx = backend.begin();
            backend.add(&mut tx, &bucket, parse_key(key), to_values(values))?;
            backend.end(&mut tx).await?;
            Ok(true)
        }
        Commands::Remove { bucket, key, values } => {
            let mut tx = backend.begin();
            backend.remove(&mut tx, &bucket, parse_key(key), to_values(values))?;
            backend.end(&mut tx).await?;
            Ok(true)
        }
        Commands::Del { bucket, keys } => {
            let mut tx = backend.begin();
            backend.del(&mut tx, &bucket, to_values(keys))?;
            backend.end(&mut tx).await?;
            Ok(true)
        }
        Commands::Clean => {
            backend.clean().await?;
            Ok(true)
        }
        Commands::Collections => {
            for name in store.list_collections().await? {
                println!("{}\t{} documents", name, store.document_count(&name));
            }
            Ok(false)
        }
        Commands::Version => Ok(false),
    }
}

/// Integers on the command line are integer keys, everything else is text
fn parse_key(raw: String) -> Key {
    raw.parse::<i64>().map(Key::Integer).unwrap_or(Key::Text(raw))
}

fn to_values(raw: Vec<String>) -> Values {
    raw.into_iter().map(parse_key).collect()
}

fn print_values(values: &ValueSet) {
    for value in values {
        println!("{}", value);
    }
}

/// Setup console logging on stderr so command output stays clean
fn setup_logging(cli: &Cli) {
    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();
}
