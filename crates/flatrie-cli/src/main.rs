//! Flatrie - apply leaf batches to flat trie node arrays

use anyhow::Context;
use clap::{Parser, Subcommand};
use flatrie_cli::{apply_files, build_file, validate_file, window_files, write_json, CliConfig};
use flatrie_core::Traversal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "flatrie")]
#[command(about = "Apply sorted leaf batches to a preorder-sorted Patricia trie")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true, env = "FLATRIE_DEBUG")]
    debug: bool,

    /// Build windows right to left, anchored at the last work item
    #[arg(long, global = true, env = "FLATRIE_BACKWARD")]
    backward: bool,

    /// Skip validating node arrays before applying work
    #[arg(long, global = true, env = "FLATRIE_NO_VERIFY")]
    no_verify: bool,

    /// Sort work batches by path instead of requiring sorted input
    #[arg(long, global = true)]
    sort: bool,

    /// Emit compact JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a work batch and write the new node array
    Apply {
        /// Node array (JSON)
        #[arg(short, long)]
        storage: PathBuf,
        /// Work batch (JSON)
        #[arg(short, long)]
        work: PathBuf,
        /// Output file, stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print only the computed splice
        #[arg(long)]
        update_only: bool,
    },
    /// Show the transformation window of a work batch
    Window {
        #[arg(short, long)]
        storage: PathBuf,
        #[arg(short, long)]
        work: PathBuf,
    },
    /// Bulk-build a node array from leaves
    Build {
        /// Leaves (JSON)
        #[arg(short, long)]
        leaves: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a node array and print its shape
    Validate {
        #[arg(short, long)]
        storage: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr so JSON on stdout stays clean
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("flatrie_cli={0},flatrie_core={0}", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = CliConfig {
        traversal: if args.backward {
            Traversal::Backward
        } else {
            Traversal::Forward
        },
        verify_storage: !args.no_verify,
        sort_work: args.sort,
        pretty: !args.compact,
    };

    if !config.verify_storage {
        tracing::warn!("node array validation is disabled");
    }

    match args.command {
        Command::Apply {
            storage,
            work,
            output,
            update_only,
        } => {
            let outcome = apply_files(&config, &storage, &work)
                .with_context(|| format!("applying {} to {}", work.display(), storage.display()))?;
            if update_only {
                write_json(&outcome.update, output.as_deref(), config.pretty)?;
            } else {
                write_json(&outcome.nodes, output.as_deref(), config.pretty)?;
            }
        }
        Command::Window { storage, work } => {
            let window = window_files(&config, &storage, &work)
                .with_context(|| format!("building window for {}", work.display()))?;
            write_json(&window, None, config.pretty)?;
        }
        Command::Build { leaves, output } => {
            let nodes = build_file(&leaves)
                .with_context(|| format!("building trie from {}", leaves.display()))?;
            write_json(&nodes, output.as_deref(), config.pretty)?;
        }
        Command::Validate { storage } => {
            let summary = validate_file(&storage)
                .with_context(|| format!("validating {}", storage.display()))?;
            tracing::info!(
                nodes = summary.nodes,
                branches = summary.branches,
                leaves = summary.leaves,
                depth = summary.depth,
                "node array is valid"
            );
            write_json(&summary, None, config.pretty)?;
        }
    }

    Ok(())
}
