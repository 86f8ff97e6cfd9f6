//! BtcLab CLI — forecast and cache management commands.
//!
//! Commands:
//! - `forecast` — run the full pipeline (fetch, fuse, train, explain)
//!   and save an artifact bundle
//! - `cache status` — report cached source payloads, their age and
//!   freshness
//! - `cache clean` — remove cached payloads

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use btclab_core::data::FetchCache;
use btclab_core::model::Backend;
use btclab_runner::runner::run_forecast;
use btclab_runner::{
    generate_report, save_artifacts, AttributionOutcome, ForecastConfig, PipelineRun, RunOptions,
    RunOutcome,
};

#[derive(Parser)]
#[command(name = "btclab", about = "BtcLab CLI — crypto forecasting pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the forecast pipeline and save artifacts.
    Forecast {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Primary ticker override (e.g., BTC-USD).
        #[arg(long)]
        ticker: Option<String>,

        /// Forecast horizon override, in days (1-30).
        #[arg(long)]
        horizon: Option<usize>,

        /// Backend override: depthwise or leafwise.
        #[arg(long)]
        backend: Option<String>,

        /// Offline mode: no network access, serve from cache only.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Generate synthetic data instead of fetching.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Output directory for artifact bundles.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Also print the markdown report to stdout.
        #[arg(long, default_value_t = false)]
        report: bool,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached payloads with age and freshness.
    Status {
        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Remove every cached payload.
    Clean {
        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Forecast {
            config,
            ticker,
            horizon,
            backend,
            offline,
            synthetic,
            cache_dir,
            output_dir,
            report,
        } => run_forecast_cmd(
            config, ticker, horizon, backend, offline, synthetic, cache_dir, output_dir, report,
        ),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
            CacheAction::Clean { cache_dir, confirm } => run_cache_clean(&cache_dir, confirm),
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn run_forecast_cmd(
    config_path: Option<PathBuf>,
    ticker: Option<String>,
    horizon: Option<usize>,
    backend: Option<String>,
    offline: bool,
    synthetic: bool,
    cache_dir: PathBuf,
    output_dir: PathBuf,
    print_report: bool,
) -> Result<()> {
    // Validate mutually exclusive options
    if offline && synthetic {
        bail!("--offline and --synthetic are mutually exclusive");
    }

    // Build ForecastConfig
    let mut config = match config_path {
        Some(path) => ForecastConfig::from_file(&path)?,
        None => ForecastConfig::default(),
    };
    if let Some(ticker) = ticker {
        config.ticker = ticker;
    }
    if let Some(horizon) = horizon {
        config.horizon = horizon;
    }
    if let Some(name) = backend.as_deref() {
        config.model.backend = parse_backend(name)?;
    }
    config.validate()?;

    // Run pipeline
    let cache = FetchCache::new(&cache_dir);
    let opts = RunOptions { offline, synthetic };
    let run = run_forecast(&config, &cache, &opts)?;

    // Print summary
    print_summary(&run);

    // Save full artifact set (manifest.json, features.csv, report.md)
    let run_dir = save_artifacts(&run, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    if print_report {
        println!();
        println!("{}", generate_report(&run));
    }

    Ok(())
}

fn parse_backend(name: &str) -> Result<Backend> {
    match name {
        "depthwise" => Ok(Backend::Depthwise),
        "leafwise" => Ok(Backend::Leafwise),
        _ => bail!("unknown backend '{name}'. Valid: depthwise, leafwise"),
    }
}

fn backend_label(backend: Backend) -> &'static str {
    match backend {
        Backend::Depthwise => "depthwise",
        Backend::Leafwise => "leafwise",
    }
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = FetchCache::new(cache_dir);
    let entries = cache.status();
    if entries.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    println!("Cache: {}", cache_dir.display());
    println!("Entries: {}", entries.len());
    println!();
    println!(
        "{:<10} {:<36} {:>6} {:>8} {:<6}",
        "Source", "Params", "Rows", "Age", "State"
    );
    println!("{}", "-".repeat(70));
    for entry in &entries {
        let state = if entry.fresh { "fresh" } else { "stale" };
        println!(
            "{:<10} {:<36} {:>6} {:>8} {:<6}",
            entry.source,
            entry.params,
            entry.rows,
            format_age(entry.age_secs),
            state
        );
    }

    Ok(())
}

fn run_cache_clean(cache_dir: &Path, confirm: bool) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = FetchCache::new(cache_dir);
    let entries = cache.status();
    if entries.is_empty() {
        println!("Cache is already empty: {}", cache_dir.display());
        return Ok(());
    }

    println!("Found {} cached payload(s):", entries.len());
    for entry in &entries {
        println!("  {} ({}, {} rows)", entry.source, entry.params, entry.rows);
    }

    if !confirm {
        println!();
        println!("Dry run — pass --confirm to actually delete.");
        return Ok(());
    }

    let removed = cache.clean()?;
    println!("Done. Removed {removed} file(s).");
    Ok(())
}

fn format_age(secs: i64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3_600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3_600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

fn print_summary(run: &PipelineRun) {
    println!();
    println!("=== Forecast Run ===");
    println!("Ticker:           {}", run.config.ticker);
    println!("Range:            {}", run.config.range);
    println!("Horizon:          {} days", run.config.horizon);
    println!("Backend:          {}", backend_label(run.config.model.backend));
    println!("Rows:             {}", run.table.len());
    println!("Features:         {}", run.table.columns().len());
    println!("Run ID:           {}", run.run_id);
    println!();
    match &run.outcome {
        RunOutcome::Forecast {
            as_of,
            predicted_return,
            signal,
            train_rows,
        } => {
            println!("--- Forecast ---");
            println!("As of:            {as_of}");
            println!("Training rows:    {train_rows}");
            println!("Predicted return: {:+.4}%", predicted_return * 100.0);
            println!("Signal:           {signal}");
        }
        RunOutcome::FeaturesOnly { reason } => {
            println!("--- No forecast ---");
            println!("Reason:           {reason}");
            println!("The fused feature table was still exported.");
        }
    }
    println!();
    match &run.attribution {
        AttributionOutcome::Ready(att) => {
            println!("--- Top drivers ---");
            for contribution in att.ranked().iter().take(5) {
                println!("{:<18} {:+.6}", contribution.feature, contribution.phi);
            }
        }
        AttributionOutcome::Unavailable { reason } => {
            println!("Attribution unavailable: {reason}");
        }
    }
    if run.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
