//! CLI entry point for the city load estimator.
//!
//! Provides subcommands for running the batch load estimation over the
//! configured cities, and for inspecting a single baseline curve or weather
//! factor.

mod infra;

use crate::infra::aerodatabox::AeroDataBoxClient;
use crate::infra::openweathermap::OpenWeatherMapClient;
use anyhow::{Context, Result, bail};
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use city_load::config::{ApiKeys, RunConfig};
use city_load::load::baseload::baseline_for_city;
use city_load::load::weather::factor;
use city_load::model::WeatherSample;
use city_load::pipeline::{LoadPipeline, Sources, persist};
use city_load::tables::{AircraftTable, PopulationTable};
use clap::{Parser, Subcommand};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "city_load")]
#[command(about = "Estimates short-term customer load per city from population, flights and weather", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch inputs for all cities, estimate their load and append new rows to the tables
    Run {
        /// JSON run configuration
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Cities to process, overriding the configuration (comma separated)
        #[arg(long, value_delimiter = ',')]
        cities: Vec<String>,

        /// Hours ahead to fetch flights and weather for
        #[arg(long)]
        horizon_hours: Option<u32>,

        /// Seed for the random parts of the estimate; drawn fresh when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Directory holding the CSV tables
        #[arg(short = 'd', long)]
        data_dir: Option<PathBuf>,

        /// Optional: S3 bucket to upload the load table to (e.g., "my-bucket")
        #[arg(long)]
        s3_bucket: Option<String>,

        /// Optional: Gzip compress the load table before uploading to S3
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Log the baseline curve for one population
    Baseline {
        #[arg(long)]
        population: i64,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value = "city")]
        city: String,
    },
    /// Log the weather factor for one set of forecast values
    WeatherFactor {
        /// Rain over 3 hours, mm
        #[arg(long, default_value_t = 0.0)]
        rain: f64,

        /// Probability of precipitation, 0..1
        #[arg(long, default_value_t = 0.0)]
        rain_prob: f64,

        /// Perceived temperature, °C
        #[arg(long, allow_negative_numbers = true)]
        temp_feel: f64,

        /// Wind speed, m/s
        #[arg(long, default_value_t = 0.0)]
        windspeed: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/city_load.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("city_load.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            cities,
            horizon_hours,
            seed,
            data_dir,
            s3_bucket,
            gzip,
        } => {
            let mut run_config = match config {
                Some(path) => RunConfig::load(&path)?,
                None => RunConfig::default(),
            };
            if !cities.is_empty() {
                run_config.cities = cities;
            }
            if let Some(hours) = horizon_hours {
                run_config.horizon_hours = hours;
            }
            if let Some(dir) = data_dir {
                run_config.data_dir = dir;
            }
            if run_config.cities.is_empty() {
                bail!("no cities configured; pass --cities or a config file");
            }

            let seed = seed.unwrap_or_else(rand::random);
            run_load(&run_config, seed, s3_bucket, gzip).await?;
        }
        Commands::Baseline {
            population,
            seed,
            city,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            for row in baseline_for_city(&city, population, seed)? {
                info!(city = %row.city, hour = row.hour, baseload = ?row.baseload, "Baseline");
            }
            info!(seed, "Baseline seed");
        }
        Commands::WeatherFactor {
            rain,
            rain_prob,
            temp_feel,
            windspeed,
        } => {
            let sample = WeatherSample {
                city: String::new(),
                timestamp: Utc::now(),
                rain_mm_3h: rain,
                rain_probability: rain_prob,
                windspeed_mps: windspeed,
                feels_like_temp_c: temp_feel,
            };
            info!(factor = ?factor(&sample), "Weather factor");
        }
    }

    Ok(())
}

/// Runs the batch estimation, persists new rows, and optionally uploads the load table.
#[tracing::instrument(skip(config, s3_bucket, gzip), fields(cities = ?config.cities))]
async fn run_load(
    config: &RunConfig,
    seed: u64,
    s3_bucket: Option<String>,
    gzip: bool,
) -> Result<()> {
    let keys = ApiKeys::from_env()?;
    let weather = OpenWeatherMapClient::new(keys.openweathermap.clone())?;
    let flights = AeroDataBoxClient::new(&keys.aerodatabox, config.airport_radius_km, config.airport_limit)?;
    let aircraft = AircraftTable::load(&config.aircraft_table)?;
    let population = PopulationTable::load(&config.population_table)?;

    let sources = Sources {
        cities: &weather,
        population: &population,
        weather: &weather,
        airports: &flights,
        flights: &flights,
        aircraft: &aircraft,
    };

    info!(seed, "Starting load run");
    let report = LoadPipeline::new(sources, config)
        .run(Utc::now(), seed)
        .await?;

    for failure in &report.failures {
        warn!(
            city = %failure.city,
            airport = ?failure.airport,
            stage = %failure.stage,
            kind = ?failure.kind,
            error = %failure.message,
            "Skipped during run"
        );
    }

    let written = persist(&report, config)?;
    info!(written, data_dir = %config.data_dir.display(), "Load table updated");

    if let Some(bucket) = s3_bucket {
        let aws = aws_config::load_from_env().await;
        let s3 = aws_sdk_s3::Client::new(&aws);
        info!(bucket = %bucket, gzip, "S3 upload enabled");
        upload_load_table(&s3, &bucket, &config.load_table(), gzip).await?;
    }

    Ok(())
}

/// Uploads the load table to S3 under a dated key, optionally gzip-compressing it.
#[tracing::instrument(skip(client, path))]
async fn upload_load_table(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    path: &Path,
    gzip: bool,
) -> Result<()> {
    let file_contents =
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let date_str = Utc::now().format("%Y-%m-%d").to_string();
    let target_filename = format!("date={}.csv", date_str);

    let (body, s3_key) = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&file_contents)?;
        let compressed = encoder.finish()?;

        let key = format!("customerload/{}.gz", target_filename);
        (compressed, key)
    } else {
        let key = format!("customerload/{}", target_filename);
        (file_contents, key)
    };

    client
        .put_object()
        .bucket(bucket)
        .key(&s3_key)
        .body(ByteStream::from(body))
        .content_type("text/csv")
        .send()
        .await?;

    info!(key = %s3_key, "S3 upload complete");
    Ok(())
}
