//! CLI entry point for codectx.
//!
//! Indexes a directory incrementally (only changed files are embedded again)
//! and answers one similarity query against the freshly built graph.

use anyhow::Context;
use clap::{
    Parser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use codectx::indexing::{FileWalker, Indexer, prune_missing};
use codectx::io::{self, ErrorResponse, ExitCode, OutputFormat};
use codectx::{
    EmbeddingStore, HnswIndex, IndexError, IndexResult, QueryEngine, SetupError, Settings,
    create_provider, embed_query,
};
use std::path::PathBuf;
use tracing::Dispatch;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Incremental embedding index with similarity search
#[derive(Parser, Debug)]
#[command(
    name = "codectx",
    version = env!("CARGO_PKG_VERSION"),
    about = "Index a file tree and find the files most similar to a query",
    long_about = "Embeds every changed file under PATH, reuses stored embeddings for \
                  unchanged files, then prints the files nearest to QUERY. Without QUERY \
                  the query is read from stdin.",
    styles = clap_cargo_style()
)]
struct Cli {
    /// Directory to index (defaults to the current directory)
    path: Option<PathBuf>,

    /// Query text (prompted for when omitted)
    query: Option<String>,

    /// Path to custom settings.toml file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of results to print (overrides config)
    #[arg(short = 'k', long)]
    limit: Option<usize>,

    /// Number of worker threads (overrides config)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Embeddings database file (overrides config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Embedding provider: ollama or voyage (overrides config)
    #[arg(long)]
    provider: Option<String>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Delete stored embeddings of files under PATH that no longer exist
    #[arg(long)]
    prune: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let format = OutputFormat::from_json_flag(cli.json);

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            let error = IndexError::Setup(SetupError::Config(format!("{e:#}")));
            return report_error(&error, format).into();
        }
    };

    let dispatch = codectx::logging::build_dispatch(settings.debug);
    let result =
        tracing::dispatcher::with_default(&dispatch, || run(&cli, &settings, dispatch.clone()));

    match result {
        Ok(code) => code.into(),
        Err(error) => {
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::debug!("run failed: {error:?}");
            });
            report_error(&error, format).into()
        }
    }
}

/// Layered settings with command-line overrides applied on top.
fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Settings::load().context("loading configuration")?,
    };

    if let Some(limit) = cli.limit {
        settings.search.limit = limit;
    }
    if let Some(workers) = cli.workers {
        anyhow::ensure!(workers > 0, "--workers must be at least 1");
        settings.indexing.workers = workers;
    }
    if let Some(db) = &cli.db {
        settings.db_path = db.clone();
    }
    if let Some(provider) = &cli.provider {
        settings.embedding.provider = provider.clone();
    }
    if cli.verbose {
        settings.debug = true;
    }
    Ok(settings)
}

fn run(cli: &Cli, settings: &Settings, dispatch: Dispatch) -> IndexResult<ExitCode> {
    let (root, source) = io::resolve_positionals(cli.path.as_deref(), cli.query.as_deref())?;
    let provider = create_provider(&settings.embedding)?;
    tracing::debug!(
        "using provider {} with model {}",
        provider.name(),
        provider.model()
    );

    // Embed the query first so an unusable provider fails before any indexing work
    let query = io::read_query(&source)?;
    let query_vector = embed_query(provider.as_ref(), &query)?;

    let store = EmbeddingStore::open(&settings.db_path).map_err(|source| SetupError::Store {
        path: settings.db_path.clone(),
        source,
    })?;

    let walker = FileWalker::new(&settings.indexing).exclude(&settings.db_path);
    let paths = walker
        .walk(&root)
        .map_err(|e| SetupError::Config(format!("invalid ignore pattern: {e}")))?;

    let indexer = Indexer::new(&store, provider.as_ref(), HnswIndex::new(settings.search.ef))
        .with_workers(settings.indexing.workers)
        .with_queue_capacity(settings.indexing.queue_capacity)
        .with_query(query_vector.clone())
        .with_dispatch(dispatch);
    let (graph, mut stats) = indexer.run(paths)?;

    if cli.prune {
        stats.pruned = prune_missing(&store, &root)?;
    }

    let results = QueryEngine::new(&graph).search(&query_vector, settings.search.limit)?;

    let format = OutputFormat::from_json_flag(cli.json);
    let stdout = std::io::stdout();
    io::write_results(&mut stdout.lock(), format, &query, &results, &stats).map_err(|source| {
        IndexError::Io {
            action: "write results to stdout",
            source,
        }
    })?;
    if !format.is_json() {
        stats.display();
    }

    Ok(ExitCode::Success)
}

fn report_error(error: &IndexError, format: OutputFormat) -> ExitCode {
    let code = ExitCode::from_error(error);
    if format.is_json() {
        match serde_json::to_string_pretty(&ErrorResponse::from_error(error)) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    } else {
        eprintln!("Error: {error}");
        for suggestion in error.recovery_suggestions() {
            eprintln!("  - {suggestion}");
        }
    }
    code
}
