// Copyright 2025 The gdeltnet Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! gdeltnet CLI
//!
//! Builds day and month artifacts from GDELT export files, then runs the
//! year analyses on the artifact registry. The registry lives in a single
//! snapshot file between invocations.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gdeltnet_core::{parse_year, AnalysisConfig, CountryIndex, MonthKey, Polarity};
use gdeltnet_query::{write_csv, CommunityRun, MonthBuildReport, MonthPipeline, YearAnalysis};
use gdeltnet_storage::{ArtifactRegistry, GdeltExportSource};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Column of the country table holding the ISO alpha-3 codes.
const COUNTRY_COLUMN: &str = "Alpha3_code";

#[derive(Parser)]
#[command(name = "gdeltnet")]
#[command(about = "gdeltnet - country interaction networks from GDELT events", long_about = None)]
struct Cli {
    /// Artifact registry snapshot
    #[arg(short, long, default_value = "./gdeltnet-registry.bin")]
    registry: PathBuf,

    /// Analysis configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Format of the metric and community row exports
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the day and month artifacts of one month
    BuildMonth {
        /// Month (YYYYMM)
        month: String,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Build every month of a year that has export files
    BuildYear {
        /// Year (YYYY)
        year: String,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Compute the graph metrics of a year
    AnalyzeYear {
        /// Year (YYYY)
        year: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Detect communities and list their representatives
    Communities {
        /// Years to analyse (YYYY); all registry years when omitted
        years: Vec<String>,

        /// Output file for the community rows [default: communities.<format>]
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show registry statistics
    Stats,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Country table (TSV with an Alpha3_code column); required for a new registry
    #[arg(long)]
    countries: Option<PathBuf>,

    /// Manifest of export files, one `<timestamp>\t<path>` per line
    #[arg(long)]
    manifest: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::BuildMonth { month, input } => {
            let month = MonthKey::parse(&month)?;
            let registry = open_registry(&cli.registry, input.countries.as_deref())?;
            let pipeline = pipeline(&input.manifest, Arc::clone(&registry), &config)?;
            let report = pipeline.build_month(month)?;
            registry.save_snapshot(&cli.registry)?;
            print_json(&report)?;
            check_written(std::slice::from_ref(&report))?;
        }

        Commands::BuildYear { year, input } => {
            let year = parse_year(&year)?;
            let registry = open_registry(&cli.registry, input.countries.as_deref())?;
            let pipeline = pipeline(&input.manifest, Arc::clone(&registry), &config)?;
            let reports = pipeline.build_year(year)?;
            registry.save_snapshot(&cli.registry)?;
            print_json(&reports)?;
            check_written(&reports)?;
        }

        Commands::AnalyzeYear { year, out_dir } => {
            let year = parse_year(&year)?;
            let registry = load_registry(&cli.registry)?;
            let mut analysis = YearAnalysis::prepare(&registry, year, &config)
                .with_context(|| format!("Failed to prepare year {}", year))?;
            analysis.estimate_metrics();

            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {:?}", out_dir))?;
            let metrics_path = out_dir.join(format!("metrics_{}.json", year));
            write_json(&metrics_path, &analysis.metrics_document()?)?;
            let rows_path = out_dir.join(format!("metric_rows_{}.{}", year, cli.format.extension()));
            write_rows(&rows_path, &analysis.metric_rows()?, cli.format)?;

            println!("✓ Metrics for {} written to {:?}", year, out_dir);
            for month in analysis.months() {
                println!(
                    "  {}: {} alliance edges, {} hostility edges",
                    month,
                    analysis.edges(month, Polarity::Alliance)?.len(),
                    analysis.edges(month, Polarity::Hostility)?.len(),
                );
            }
        }

        Commands::Communities { years, out } => {
            let years = years
                .iter()
                .map(|y| parse_year(y))
                .collect::<gdeltnet_core::Result<Vec<i32>>>()?;
            let filter = (!years.is_empty()).then_some(years.as_slice());

            let registry = load_registry(&cli.registry)?;
            let run = CommunityRun::execute(&registry, &config, filter)?;
            for skipped in run.skipped() {
                println!("! {} skipped: {}", skipped.year, skipped.reason);
            }

            let rows = run.rows(None)?;
            let out = out.unwrap_or_else(|| {
                PathBuf::from(format!("communities.{}", cli.format.extension()))
            });
            write_rows(&out, &rows, cli.format)?;
            println!("✓ {} community representatives written to {:?}", rows.len(), out);
            for name in run.representatives(None)? {
                println!("  {}", name);
            }
        }

        Commands::Stats => {
            let registry = load_registry(&cli.registry)?;
            let stats = registry.stats();
            println!("Registry: {:?}", cli.registry);
            println!("  Countries: {}", registry.dim());
            println!("  Days:      {}", stats.days);
            println!("  Months:    {}", stats.months);
            println!("  Years:     {:?}", registry.years());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        let level = if verbose { Level::DEBUG } else { Level::INFO };
        tracing_subscriber::fmt().with_max_level(level).init();
    }
}

/// Defaults, then the optional TOML file, then `GDELTNET_*` overrides.
fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => AnalysisConfig::from_path(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => AnalysisConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("Invalid GDELTNET_* override")?;
    Ok(config)
}

fn load_countries(path: &Path) -> Result<CountryIndex> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let index = CountryIndex::from_tsv_column(file, COUNTRY_COLUMN)
        .with_context(|| format!("Failed to read countries from {:?}", path))?;
    Ok(index)
}

fn load_registry(path: &Path) -> Result<ArtifactRegistry> {
    ArtifactRegistry::load_snapshot(path)
        .with_context(|| format!("Failed to load registry {:?}", path))
}

/// Existing registry snapshot, or a new registry over the country table.
fn open_registry(path: &Path, countries: Option<&Path>) -> Result<Arc<ArtifactRegistry>> {
    let registry = if path.exists() {
        let registry = load_registry(path)?;
        if let Some(countries) = countries {
            let index = load_countries(countries)?;
            if index.codes() != registry.countries().codes() {
                bail!(
                    "Country table {:?} does not match the registry {:?}",
                    countries,
                    path
                );
            }
        }
        registry
    } else {
        let Some(countries) = countries else {
            bail!("No registry at {:?}; pass --countries to create one", path);
        };
        let index = load_countries(countries)?;
        info!(countries = index.len(), "creating registry");
        ArtifactRegistry::new(Arc::new(index))
    };
    Ok(Arc::new(registry))
}

fn pipeline(
    manifest: &Path,
    registry: Arc<ArtifactRegistry>,
    config: &AnalysisConfig,
) -> Result<MonthPipeline> {
    let file = File::open(manifest).with_context(|| format!("Failed to open {:?}", manifest))?;
    let base_dir = manifest.parent().unwrap_or_else(|| Path::new("."));
    let mut source = GdeltExportSource::new(Arc::clone(registry.countries()));
    let files = source
        .register_manifest(file, base_dir)
        .with_context(|| format!("Invalid manifest {:?}", manifest))?;
    info!(files, "export files registered");
    Ok(MonthPipeline::new(Arc::new(source), registry, config))
}

fn check_written(reports: &[MonthBuildReport]) -> Result<()> {
    if reports.is_empty() {
        bail!("No export files for the requested period");
    }
    for report in reports.iter().filter(|r| !r.month_written) {
        eprintln!("! {}: no day could be built", report.month);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(path, &rows),
        OutputFormat::Csv => {
            let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
            write_csv(file, rows).with_context(|| format!("Failed to write {:?}", path))?;
            Ok(())
        }
    }
}
