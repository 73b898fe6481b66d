use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lab_publications::config::{load_config, Config, DEFAULT_CONFIG_FILE};
use lab_publications::models::Report;
use lab_publications::pipeline::{read_snapshot, Pipeline, RunSummary};
use lab_publications::render::{render_html, RenderOptions};
use lab_publications::sources::{BibliographicSource, SourceKind};
use lab_publications::utils::{BlobStore, MetricsCache};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Lab Publications - Keep a lab's publication page in sync with its bibliographic profile
#[derive(Parser, Debug)]
#[command(name = "lab-publications")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch an author's works, resolve journal metrics and render a publication page", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch works and metrics, then write the snapshot, cache and page (default)
    #[command(alias = "u")]
    Update {
        /// Author id, overriding the configuration
        #[arg(long)]
        author_id: Option<String>,

        /// Bibliographic source, overriding the configuration
        #[arg(long, value_parser = parse_source)]
        source: Option<SourceKind>,

        /// Maximum number of works, overriding the configuration
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Re-render the page from the existing snapshot and cache, offline
    #[command(alias = "r")]
    Render,

    /// Write a default configuration file
    Init {
        /// Destination
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_source(value: &str) -> Result<SourceKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "openalex" => Ok(SourceKind::OpenAlex),
        "scholar" | "google_scholar" => Ok(SourceKind::Scholar),
        other => Err(format!("unknown source '{}' (expected openalex or scholar)", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        None => update(&cli, None, None, None).await,
        Some(Commands::Update {
            ref author_id,
            source,
            max_results,
        }) => update(&cli, author_id.clone(), source, max_results).await,
        Some(Commands::Render) => render(&cli),
        Some(Commands::Init { ref path, force }) => init(path, force),
    }
}

fn init_logging(cli: &Cli) {
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lab_publications={}", env_filter)),
    );
    let json_layer = cli
        .json_logs
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!cli.json_logs)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn load(cli: &Cli) -> Result<Config> {
    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    Ok(config)
}

async fn update(
    cli: &Cli,
    author_id: Option<String>,
    source: Option<SourceKind>,
    max_results: Option<usize>,
) -> Result<()> {
    let mut config = load(cli)?;
    if author_id.is_some() {
        config.author_id = author_id;
    }
    if let Some(source) = source {
        config.source = source;
    }
    if let Some(max_results) = max_results {
        config.max_results = max_results;
    }

    let settings = config.pipeline_settings()?;
    let http = config.http_client()?;
    let source = config.bibliographic_source(&http)?;
    let metrics = Arc::new(config.openalex_source(http));
    let store: Arc<dyn BlobStore> = Arc::new(config.output_store());

    let pipeline = Pipeline::new(source.clone(), metrics, store.clone(), settings);
    let output = pipeline.run().await?;

    let report = Report::from_snapshot(&output.snapshot, &output.cache, &config.title_matcher());
    write_page(&config, store.as_ref(), &report, Some(source.as_ref()))?;

    if !cli.quiet {
        print_summary(&output.summary, &config);
    }
    Ok(())
}

fn render(cli: &Cli) -> Result<()> {
    let config = load(cli)?;
    let store: Arc<dyn BlobStore> = Arc::new(config.output_store());

    let snapshot = read_snapshot(store.as_ref(), &config.output.snapshot_file)?;
    let cache = MetricsCache::load(store.clone(), config.output.metrics_cache_file.clone());
    let report = Report::from_snapshot(&snapshot, &cache, &config.title_matcher());

    let http = config.http_client()?;
    let registry = config.source_registry(&http);
    let source = registry.get(&snapshot.source).map(|s| s.as_ref());
    write_page(&config, store.as_ref(), &report, source)?;

    if !cli.quiet {
        println!(
            "Rendered {} publications from {}",
            report.publication_count,
            config.output.directory.join(&config.output.snapshot_file).display()
        );
    }
    Ok(())
}

fn write_page(
    config: &Config,
    store: &dyn BlobStore,
    report: &Report,
    source: Option<&dyn BibliographicSource>,
) -> Result<()> {
    let options = RenderOptions {
        title: config.report.title.clone(),
        profile_url: source.and_then(|s| s.profile_url(&report.author_id)),
        source_name: source.map(|s| s.name().to_string()).unwrap_or_else(|| report.source.clone()),
    };

    let html = render_html(report, &options)?;
    store
        .write_text(&config.output.html_file, &html)
        .with_context(|| format!("failed to write {}", config.output.html_file))?;
    tracing::info!(file = %config.output.html_file, "wrote publication page");
    Ok(())
}

fn print_summary(summary: &RunSummary, config: &Config) {
    let dir = &config.output.directory;
    println!("Publications: {} ({} with the PI identified)", summary.publications, summary.with_pi);
    println!(
        "Journals:     {} keys, {} cached, {} looked up ({} resolved, {} not found, {} failed)",
        summary.journal_keys,
        summary.metrics.cached,
        summary.metrics.lookups(),
        summary.metrics.resolved,
        summary.metrics.not_found,
        summary.metrics.failed
    );
    println!("Snapshot:     {}", dir.join(&config.output.snapshot_file).display());
    println!("Page:         {}", dir.join(&config.output.html_file).display());
}

fn init(path: &PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}; set author_id before running an update", path.display());
    Ok(())
}
