#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line livability scoring.
//!
//! Scores one location against the configured reference data and prints
//! the result as JSON, or lists the district and city names the datasets
//! know about.
//!
//! Logging goes through [`livability_cli_utils::init_logger`] so log lines
//! and the training progress bar share the terminal cleanly.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use livability_cli_utils::{IndicatifProgress, MultiProgress};
use livability_crime::CrimeScorer;
use livability_dataset::Table;
use livability_disaster::district_names;
use livability_house::sales::SalesData;
use livability_score_models::Coordinates;
use livability_scoring::{ScoreRequest, ScoringConfig, build_aggregator};

#[derive(Parser)]
#[command(name = "livability")]
#[command(about = "Score how livable a location is")]
struct Cli {
    /// Config file; defaults to `$LIVABILITY_CONFIG` or `livability.toml`
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a location and print the aggregate as JSON
    Score {
        /// District name in the crime dataset
        #[arg(long)]
        crime_district: String,

        /// District name in the disaster datasets
        #[arg(long)]
        disaster_district: String,

        /// Postal code used for the development-proximity score
        #[arg(long)]
        pincode: String,

        /// Area name in the sales dataset
        #[arg(long)]
        city: String,

        /// Latitude of the location
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude of the location
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
    /// List the districts in the crime and disaster datasets
    Districts,
    /// List the areas in the sales dataset
    Cities,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = livability_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ScoringConfig::load(path)?,
        None => ScoringConfig::from_env()?,
    };

    match cli.command {
        Commands::Score {
            crime_district,
            disaster_district,
            pincode,
            city,
            lat,
            lng,
        } => {
            let location = Coordinates::new(lat, lng);
            if !location.is_valid() {
                return Err(format!("Invalid coordinates: {lat}, {lng}").into());
            }

            let request = ScoreRequest {
                crime_district,
                disaster_district,
                pincode,
                city,
                location,
            };
            score(&config, &multi, &request).await?;
        }
        Commands::Districts => {
            let crime = read_table(&config, &config.datasets.crime)?;
            let disasters = read_table(&config, &config.datasets.all_disasters)?;

            println!("Crime districts:");
            for district in CrimeScorer::new(&crime).districts() {
                println!("  {district}");
            }
            println!();
            println!("Disaster districts:");
            for district in district_names(&disasters) {
                println!("  {district}");
            }
        }
        Commands::Cities => {
            let sales = read_table(&config, &config.datasets.sales)?;
            let data = SalesData::from_table(&sales, config.reference_year())?;
            for city in data.areas().classes() {
                println!("{city}");
            }
        }
    }

    Ok(())
}

async fn score(
    config: &ScoringConfig,
    multi: &MultiProgress,
    request: &ScoreRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::work_bar(multi, "Training price model");
    let aggregator = build_aggregator(config, &progress)?;

    let result = aggregator.score(request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(map) = &result.map_file {
        log::info!("Development map written to {}", map.display());
    }

    Ok(())
}

fn read_table(config: &ScoringConfig, file: &str) -> Result<Table, Box<dyn std::error::Error>> {
    let path = config.dataset_path(file);
    Table::from_csv_path(&path).map_err(|e| format!("{}: {e}", path.display()).into())
}
