use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use vault_indexer::{
    load_config, IndexReport, IndexStatus, PathScope, SearchHit, VaultConfig, VaultIndexer,
    VaultSearcher,
};
use vault_store::{Embedder, FastembedEmbedder, QdrantStore, VectorStore};

#[derive(Parser)]
#[command(name = "vault")]
#[command(about = "Incremental markdown vault indexing and semantic search", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (default: ./vault-embedder.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize the vault into the vector collection
    Index(IndexArgs),

    /// Search indexed chunks by query text
    Search(SearchArgs),

    /// Find chunks similar to an already-indexed file
    Similar(SimilarArgs),

    /// Show ledger and collection counters
    Status(StatusArgs),

    /// Remove one file from the index
    Delete(DeleteArgs),

    /// Drop the collection and reset the ledger
    Clear(ClearArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// Restrict the run to these vault-relative paths
    files: Vec<String>,

    /// Re-index even when content is unchanged
    #[arg(long)]
    force: bool,

    /// Output JSON format
    #[arg(long)]
    json: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Maximum number of results
    #[arg(long, short = 'n', default_value_t = 10)]
    limit: usize,

    /// Minimum similarity score
    #[arg(long)]
    min_score: Option<f32>,

    /// Restrict to one file (vault-relative path)
    #[arg(long, conflicts_with = "folder")]
    file: Option<String>,

    /// Restrict to a folder prefix
    #[arg(long)]
    folder: Option<String>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SimilarArgs {
    /// Vault-relative path of the reference file
    path: String,

    /// Maximum number of results
    #[arg(long, short = 'n', default_value_t = 10)]
    limit: usize,

    /// Minimum similarity score
    #[arg(long)]
    min_score: Option<f32>,

    /// Keep the reference file's own chunks in the results
    #[arg(long)]
    include_self: bool,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StatusArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DeleteArgs {
    /// Vault-relative path to remove from the index
    path: String,
}

#[derive(Args)]
struct ClearArgs {
    /// Confirm dropping the whole collection
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Index(args) => cmd_index(&config, args).await,
        Commands::Search(args) => cmd_search(&config, args).await,
        Commands::Similar(args) => cmd_similar(&config, args).await,
        Commands::Status(args) => cmd_status(&config, args).await,
        Commands::Delete(args) => cmd_delete(&config, args).await,
        Commands::Clear(args) => cmd_clear(&config, args).await,
    }
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // ORT is extremely noisy at info level
    if !cli.verbose {
        builder.filter_module("ort", log::LevelFilter::Off);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn build_store(config: &VaultConfig) -> Result<Arc<dyn VectorStore>> {
    let store = QdrantStore::new(&config.qdrant_url, config.qdrant_api_key.as_deref())?;
    Ok(Arc::new(store))
}

fn build_embedder(config: &VaultConfig) -> Result<Arc<dyn Embedder>> {
    let embedder = FastembedEmbedder::new(&config.model_name, config.model_dimensions)?;
    Ok(Arc::new(embedder))
}

async fn cmd_index(config: &VaultConfig, args: IndexArgs) -> Result<()> {
    let mut indexer = VaultIndexer::new(config.clone(), build_embedder(config)?, build_store(config)?)?;

    let bar = (!args.no_progress && !args.json).then(|| {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .expect("valid progress template"),
        );
        bar
    });
    if let Some(bar) = bar.clone() {
        indexer = indexer.with_progress(Box::new(move |path, position, total| {
            bar.set_length(total as u64);
            bar.set_position(position as u64);
            bar.set_message(path.to_string());
        }));
    }

    let files = (!args.files.is_empty()).then_some(args.files.as_slice());
    let report = indexer.index(files, args.force).await?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    print_report(&report, args.json)?;
    if report.errors.is_empty() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

async fn cmd_search(config: &VaultConfig, args: SearchArgs) -> Result<()> {
    let searcher = VaultSearcher::new(config.clone(), build_embedder(config)?, build_store(config)?);

    let scope = match (args.file, args.folder) {
        (Some(path), _) => Some(PathScope::Exact(path)),
        (None, Some(prefix)) => Some(PathScope::Folder(prefix)),
        (None, None) => None,
    };
    let hits = searcher
        .search(&args.query, args.limit, args.min_score, scope)
        .await?;
    print_hits(&hits, args.json)
}

async fn cmd_similar(config: &VaultConfig, args: SimilarArgs) -> Result<()> {
    let searcher = VaultSearcher::new(config.clone(), build_embedder(config)?, build_store(config)?);

    let hits = searcher
        .search_by_path(&args.path, args.limit, args.min_score, !args.include_self)
        .await?;
    print_hits(&hits, args.json)
}

async fn cmd_status(config: &VaultConfig, args: StatusArgs) -> Result<()> {
    let indexer = VaultIndexer::new(config.clone(), build_embedder(config)?, build_store(config)?)?;
    let status = indexer.status().await?;
    print_status(&status, args.json)
}

async fn cmd_delete(config: &VaultConfig, args: DeleteArgs) -> Result<()> {
    let indexer = VaultIndexer::new(config.clone(), build_embedder(config)?, build_store(config)?)?;
    let removed = indexer.delete_file(&args.path).await?;
    println!("Removed {removed} chunk(s) of {}", args.path);
    Ok(())
}

async fn cmd_clear(config: &VaultConfig, args: ClearArgs) -> Result<()> {
    if !args.yes {
        anyhow::bail!(
            "this drops collection '{}' and the ledger; pass --yes to confirm",
            config.collection_name
        );
    }

    let indexer = VaultIndexer::new(config.clone(), build_embedder(config)?, build_store(config)?)?;
    indexer.clear().await?;
    println!("Cleared collection '{}'", config.collection_name);
    Ok(())
}

fn print_report(report: &IndexReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Processed {} file(s), skipped {}, deleted {} in {}ms",
        report.files_processed, report.files_skipped, report.files_deleted, report.time_ms
    );
    println!(
        "Chunks: +{} / -{}",
        report.chunks_added, report.chunks_removed
    );
    for error in &report.errors {
        eprintln!("error: {error}");
    }
    Ok(())
}

fn print_hits(hits: &[SearchHit], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results");
        return Ok(());
    }
    for hit in hits {
        let heading = hit.heading.as_deref().unwrap_or("-");
        println!(
            "{:.3}  {}:{}-{}  [{}]",
            hit.score, hit.path, hit.line_start, hit.line_end, heading
        );
        println!("       {}", snippet(&hit.text, 160));
    }
    Ok(())
}

fn print_status(status: &IndexStatus, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }

    println!("Collection:    {}", status.collection_name);
    println!("Model:         {}", status.model_name);
    println!("Files indexed: {}", status.files_indexed);
    println!("Chunks:        {}", status.chunks_tracked);
    println!("Stored points: {}", status.points_stored);
    match status.last_indexed_unix_ms {
        Some(ms) => println!("Last indexed:  {ms} (unix ms)"),
        None => println!("Last indexed:  never"),
    }
    Ok(())
}

/// Single-line preview, truncated on a char boundary.
fn snippet(text: &str, max_chars: usize) -> String {
    let one_line = text.replace('\n', " ");
    if one_line.chars().count() <= max_chars {
        return one_line;
    }
    let cut: String = one_line.chars().take(max_chars).collect();
    format!("{cut}…")
}
