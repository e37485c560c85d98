use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;

use wxdata_core::{
    Config, DateRange, GeoPoint, Granularity, MeteostatClient, OpenMeteoClient, ProcessedStore,
    ProviderId, RawStore, preprocess, storage,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxdata", version, about = "Fetch historical and forecast weather data")]
pub struct Cli {
    /// Root directory for raw and processed files. Overrides `data_dir` from
    /// the config file; defaults to `data`.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for a provider in the config file.
    Configure {
        /// Provider short name, e.g. "meteostat".
        provider: String,
    },

    /// Fetch historical Meteostat data and save the raw JSON.
    Historical {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: String,

        /// Location name used in file names.
        #[arg(long, default_value = "location")]
        name: String,

        #[arg(long, value_enum, default_value_t = GranularityArg::Daily)]
        granularity: GranularityArg,
    },

    /// Fetch current weather and forecast from Open-Meteo and save the raw JSON.
    Forecast {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Location name used in file names.
        #[arg(long, default_value = "location")]
        name: String,

        /// How many hours ahead to fetch.
        #[arg(long, default_value_t = 24)]
        hours: u32,
    },

    /// Flatten a raw JSON file into CSV tables.
    Preprocess {
        /// Which API produced the file: meteostat or openmeteo.
        #[arg(long)]
        source: String,

        /// Path to the raw JSON file.
        #[arg(long)]
        file: PathBuf,

        /// Base name for the output CSV files.
        #[arg(long, default_value = "dataset")]
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GranularityArg {
    Daily,
    Hourly,
    Both,
}

impl GranularityArg {
    pub fn granularities(self) -> &'static [Granularity] {
        match self {
            GranularityArg::Daily => &[Granularity::Daily],
            GranularityArg::Hourly => &[Granularity::Hourly],
            GranularityArg::Both => Granularity::all(),
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load().context("Failed to load configuration")?.apply_env();
        let data_dir = self.data_dir.unwrap_or_else(|| config.data_dir());

        match self.command {
            Command::Configure { provider } => configure(&provider)?,
            Command::Historical { lat, lon, start, end, name, granularity } => {
                let range = DateRange::parse(&start, &end)?;
                let client = MeteostatClient::from_config(&config)?;
                let store = RawStore::new(&data_dir);
                let point = GeoPoint::new(lat, lon);

                for &g in granularity.granularities() {
                    let response = client
                        .fetch(point, range, g)
                        .await
                        .with_context(|| format!("Failed to fetch {g} Meteostat data for {range}"))?;
                    info!("Fetched {} {g} records", response.len());

                    let path = store.save_meteostat(&response, &name, g, range, Utc::now())?;
                    println!("Saved {}", path.display());
                }
            }
            Command::Forecast { lat, lon, name, hours } => {
                let client = OpenMeteoClient::from_config(&config)?;
                let data = client
                    .fetch_current_and_forecast(GeoPoint::new(lat, lon), hours)
                    .await
                    .context("Failed to fetch Open-Meteo forecast")?;

                let path = RawStore::new(&data_dir).save_openmeteo(&data, &name, Utc::now())?;
                println!("Saved {}", path.display());
            }
            Command::Preprocess { source, file, name } => {
                let source = ProviderId::try_from(source.as_str())?;
                let doc = storage::load_json(&file)?;
                let tables = preprocess::flatten(source, &doc)
                    .with_context(|| format!("Failed to flatten {}", file.display()))?;

                let store = ProcessedStore::new(&data_dir);
                for (key, table) in tables {
                    let table_name = match key {
                        Some(key) => format!("{name}_{key}"),
                        None => name.clone(),
                    };
                    let path = store.save(source, &table_name, &table)?;
                    println!("Saved {}", path.display());
                }
            }
        }

        Ok(())
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    if !id.requires_api_key() {
        bail!("Provider '{id}' does not need an API key.");
    }

    // Reload without the environment overlay so env keys never get persisted.
    let mut config = Config::load().context("Failed to load configuration")?;
    if config.is_provider_configured(id) {
        println!("A key for {id} is already stored; it will be replaced.");
    }

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    let path = config.save().context("Failed to save configuration")?;

    println!("Saved {}", path.display());
    Ok(())
}
