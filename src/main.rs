// Transit Catalog - Command line
// load / filter / sources over the configured mission catalogs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use transit_catalog::{
    filter_catalog, load_catalog, CanonicalRecord, CatalogConfig, CatalogSnapshot,
    DefaultFetcher, FilterQuery,
};

#[derive(Debug, Parser)]
#[command(
    name = "transit-catalog",
    version,
    about = "Unified Kepler / K2 / TESS transit catalog",
    after_help = "Config is resolved in order by --config, TRANSIT_CATALOG_CONFIG, then the NASA Exoplanet Archive defaults."
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "JSON config file listing catalog sources")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load every source and report per-source stats
    Load,
    /// Load, then filter by dataset and ranges
    Filter(FilterArgs),
    /// Print the resolved source configuration
    Sources,
}

/// Bounds are taken as text: anything unparsable is treated as "no bound".
#[derive(Debug, clap::Args)]
struct FilterArgs {
    #[arg(long, default_value = "all", help = "all, Kepler, K2 or TESS")]
    dataset: String,
    #[arg(long = "min-radius", value_name = "EARTH_RADII", allow_hyphen_values = true)]
    min_radius: Option<String>,
    #[arg(long = "max-radius", value_name = "EARTH_RADII", allow_hyphen_values = true)]
    max_radius: Option<String>,
    #[arg(long = "min-period", value_name = "DAYS", allow_hyphen_values = true)]
    min_period: Option<String>,
    #[arg(long = "max-period", value_name = "DAYS", allow_hyphen_values = true)]
    max_period: Option<String>,
    #[arg(long = "min-temp", value_name = "KELVIN", allow_hyphen_values = true)]
    min_temp: Option<String>,
    #[arg(long = "max-temp", value_name = "KELVIN", allow_hyphen_values = true)]
    max_temp: Option<String>,
    #[arg(long, help = "Print matching records as JSON")]
    json: bool,
}

impl FilterArgs {
    fn to_query(&self) -> FilterQuery {
        FilterQuery {
            dataset: Some(self.dataset.clone()),
            min_radius: self.min_radius.clone(),
            max_radius: self.max_radius.clone(),
            min_period: self.min_period.clone(),
            max_period: self.max_period.clone(),
            min_temp: self.min_temp.clone(),
            max_temp: self.max_temp.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = CatalogConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Load => run_load(&config).await,
        Command::Filter(args) => run_filter(&config, &args).await,
        Command::Sources => run_sources(&config),
    }
}

async fn load(config: &CatalogConfig) -> CatalogSnapshot {
    let fetcher = Arc::new(DefaultFetcher::new(config.http_timeout()));
    load_catalog(&config.sources, fetcher).await
}

fn print_errors(snapshot: &CatalogSnapshot) {
    if let Some(summary) = snapshot.error_summary() {
        println!("\n⚠️  {}", summary);
    }
}

async fn run_load(config: &CatalogConfig) -> Result<()> {
    println!("🔭 Loading {} catalog sources...", config.sources.len());

    let snapshot = load(config).await;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for stats in &snapshot.stats {
        println!("  {}", stats.summary());
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ {} records in catalog (run {})", snapshot.len(), snapshot.run_id);
    print_errors(&snapshot);

    Ok(())
}

async fn run_filter(config: &CatalogConfig, args: &FilterArgs) -> Result<()> {
    // Reject a bad --dataset before fetching anything
    let spec = args.to_query().to_spec()?;

    let snapshot = load(config).await;
    let matches = filter_catalog(&snapshot.records, &spec);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    print_table(&matches);
    println!("\n{} of {} records match", matches.len(), snapshot.len());
    print_errors(&snapshot);

    Ok(())
}

fn print_table(records: &[&CanonicalRecord]) {
    println!(
        "{:<28} {:<7} {:>8} {:>10} {:>7}  {}",
        "NAME", "DATASET", "RADIUS", "PERIOD", "TEMP", "STATUS"
    );
    for record in records {
        println!(
            "{:<28} {:<7} {:>8.2} {:>10.1} {:>7.0}  {}",
            record.name,
            record.source.name(),
            record.radius,
            record.period,
            record.equilibrium_temp,
            record.disposition
        );
    }
}

fn run_sources(config: &CatalogConfig) -> Result<()> {
    println!("📚 Configured catalog sources");
    for entry in &config.sources {
        println!("  {:<7} {}", entry.source.name(), entry.location);
    }
    println!("\n  bind address: {}", config.bind_addr);
    println!("  http timeout: {}s", config.http_timeout_secs);
    Ok(())
}
