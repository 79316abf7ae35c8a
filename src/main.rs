pub mod types;
pub mod errors;
pub mod config;
pub mod data;
pub mod normalize;
pub mod filter;
pub mod render;
pub mod dashboard;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::dashboard::ChartOutput;
use crate::types::{FilterSelection, PlotBackend, PopulationDisplay, TypeFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive dashboard on localhost
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Render one view of the map to a file
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Volcano type to keep, or "All"
        #[arg(short = 't', long = "type", default_value = "All")]
        volcano_type: String,
        /// matplotlib (SVG) or plotly (HTML)
        #[arg(short, long, default_value = "matplotlib")]
        backend: PlotBackend,
        /// Scale markers by population: yes or no
        #[arg(short, long, default_value = "yes")]
        population: PopulationDisplay,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// List the volcano type options
    Types {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

struct Startup {
    config: config::AppConfig,
    boundary: normalize::GeoBoundary,
    cache: data::DatasetCache,
}

/// Loads config, dataset and boundaries up front so bad inputs fail before anything is shown.
fn start(config_path: &Path) -> anyhow::Result<Startup> {
    let config = config::AppConfig::load_from_file(config_path)?;

    let mut cache = data::DatasetCache::new();
    let raw = cache
        .get_or_load(&config.input.data_csv)
        .with_context(|| format!("Failed to load volcano data from {:?}", config.input.data_csv))?;

    let boundary = normalize::load_boundaries(&config.input.boundaries, &config.input.boundary_name_property)
        .with_context(|| format!("Failed to load boundaries from {:?}", config.input.boundaries))?;

    let unmatched = normalize::unmatched_countries(&normalize::normalize_countries(&raw), &boundary);
    if !unmatched.is_empty() {
        warn!(
            "{} countries have no boundary outline: {}",
            unmatched.len(),
            unmatched.into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    Ok(Startup { config, boundary, cache })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            info!("Serving dashboard with config: {:?}", config);
            let Startup { config, boundary, cache } = start(&config)?;

            server::start_server(server::AppState {
                config,
                boundary,
                cache: Mutex::new(cache),
            })
            .await?;
        }
        Commands::Render { config, volcano_type, backend, population, output } => {
            let Startup { config, boundary, mut cache } = start(&config)?;
            let selection = FilterSelection {
                type_filter: TypeFilter::from(volcano_type.as_str()),
                population,
                backend,
                show_data: false,
            };

            let view = dashboard::run_pipeline(&mut cache, &boundary, &config, &selection)?;
            let body = match &view.chart {
                ChartOutput::Static(chart) => chart.svg.clone(),
                ChartOutput::Interactive(figure) => figure.to_html()?,
            };
            std::fs::write(&output, body)
                .with_context(|| format!("Failed to write {:?}", output))?;

            info!(
                "Rendered {} volcanoes ({} backend) to {:?}",
                view.matched_rows,
                backend.label(),
                output
            );
        }
        Commands::Types { config } => {
            let Startup { config, mut cache, .. } = start(&config)?;
            let raw = cache.get_or_load(&config.input.data_csv)?;
            for option in filter::distinct_types(&normalize::normalize_countries(&raw)) {
                println!("{}", option);
            }
        }
    }

    Ok(())
}
