//! CLI entry point for the fleet risk scorer.
//!
//! Provides subcommands for running one assessment cycle, re-running it on a
//! timer, checking a vehicle's fuel sensors, and looking up service status.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use fleet_risk::{
    cache::FuelMonitor,
    config::AppConfig,
    fetch::{
        BasicClient, HttpClient,
        auth::{ApiKey, UrlParam},
    },
    infra::{fixture::FixtureTelemetry, telemetry::TelemetryApiClient, weather::OpenMeteoClient},
    output::{log_priority_queue, print_json, print_pretty, write_assessments_csv},
    scoring::{
        aggregate::FleetAggregator,
        service::{HashedServiceSchedule, ServiceSchedule},
    },
    services::telemetry_api::{TelemetryApi, WeatherApi},
};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fleet_risk")]
#[command(about = "Scores fleet vehicles for risk and builds a dispatch queue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one assessment cycle for a vehicle group
    Assess {
        /// Vehicle group (defaults to TELEMETRY_GROUP_ID)
        #[arg(short, long)]
        group: Option<String>,

        /// Read telemetry from a JSON fixture instead of the API
        #[arg(long, value_name = "FILE")]
        fixture: Option<String>,

        /// Count weather in the risk score
        #[arg(short, long, default_value_t = false)]
        weather: bool,

        /// Write this cycle's assessments to a CSV file (overwritten)
        #[arg(short, long)]
        output: Option<String>,

        /// Print the full snapshot as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Maximum number of vehicles fetched concurrently
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Re-run the assessment cycle on a timer
    Watch {
        /// Vehicle group (defaults to TELEMETRY_GROUP_ID)
        #[arg(short, long)]
        group: Option<String>,

        /// Read telemetry from a JSON fixture instead of the API
        #[arg(long, value_name = "FILE")]
        fixture: Option<String>,

        /// Count weather in the risk score
        #[arg(short, long, default_value_t = false)]
        weather: bool,

        /// Seconds between cycles
        #[arg(short, long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Number of cycles to run (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        cycles: usize,

        /// Rewrite this CSV file after every cycle
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Evaluate a vehicle's recent fuel sensor data for anomalies
    Fuel {
        #[arg(short, long)]
        vehicle: String,

        /// Read telemetry from a JSON fixture instead of the API
        #[arg(long, value_name = "FILE")]
        fixture: Option<String>,
    },
    /// Show maintenance status for a vehicle
    Service {
        #[arg(short, long)]
        vehicle: String,

        /// Current odometer in km (mocked when omitted)
        #[arg(long, default_value_t = 0.0)]
        odometer: f64,
    },
}

/// Upstream collaborators plus the clock to score against.
struct Sources {
    telemetry: Arc<dyn TelemetryApi>,
    weather: Arc<dyn WeatherApi>,
    /// Fixtures pin "now" to their capture time.
    fixed_now: Option<DateTime<Utc>>,
}

impl Sources {
    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/fleet_risk.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fleet_risk.log"));

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
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Assess {
            group,
            fixture,
            weather,
            output,
            json,
            concurrency,
        } => {
            let sources = build_sources(&config, fixture.as_deref())?;
            let aggregator = build_aggregator(&config, &sources, concurrency);
            let group = resolve_group(group, &config);

            let snapshot = aggregator.run_cycle(&group, weather, sources.now()).await?;
            log_priority_queue(&snapshot.priority_queue);
            print_pretty(&snapshot);

            if let Some(path) = output {
                write_assessments_csv(&path, &snapshot.assessments)?;
                info!(path = %path, rows = snapshot.assessments.len(), "CSV export written");
            }
            if json {
                print_json(&snapshot)?;
            }
        }
        Commands::Watch {
            group,
            fixture,
            weather,
            interval,
            cycles,
            output,
        } => {
            let sources = build_sources(&config, fixture.as_deref())?;
            let aggregator = build_aggregator(&config, &sources, None);
            let group = resolve_group(group, &config);
            watch(&aggregator, &sources, &group, weather, interval, cycles, output).await?;
        }
        Commands::Fuel { vehicle, fixture } => {
            let sources = build_sources(&config, fixture.as_deref())?;
            let monitor = FuelMonitor::new(
                Arc::clone(&sources.telemetry),
                Duration::minutes(config.fuel_window_minutes),
            );
            let result = monitor.fuel_risk(&vehicle, sources.now()).await?;
            info!(
                vehicle_id = %vehicle,
                severity = ?result.severity,
                suspicious_drop = result.suspicious_drop,
                drop_amount_l = ?result.drop_amount_l,
                consumption_lph = ?result.consumption_lph,
                description = result.description.as_deref().unwrap_or(""),
                "Fuel risk"
            );
        }
        Commands::Service { vehicle, odometer } => {
            let info = HashedServiceSchedule.service_status(&vehicle, odometer);
            info!(
                vehicle_id = %vehicle,
                odometer_km = info.odometer_km,
                remaining_km = info.remaining_km,
                next_service_km = info.next_service_km,
                progress_percent = info.progress_percent,
                status = info.status.as_str(),
                "Service status"
            );
        }
    }

    Ok(())
}

/// Builds telemetry and weather collaborators from a fixture file or the
/// configured HTTP endpoints.
fn build_sources(config: &AppConfig, fixture: Option<&str>) -> Result<Sources> {
    if let Some(path) = fixture {
        let fixture = Arc::new(FixtureTelemetry::load(path)?);
        info!(path, captured_at = %fixture.captured_at(), "Using fixture telemetry");
        return Ok(Sources {
            fixed_now: Some(fixture.captured_at()),
            telemetry: fixture.clone(),
            weather: fixture,
        });
    }

    let telemetry_config = config.require_telemetry()?;
    let http = Arc::new(BasicClient::with_timeout(config.http_timeout)?);
    let authed: Box<dyn HttpClient> = match &telemetry_config.api_key_header {
        Some(header) => Box::new(ApiKey::new(
            Arc::clone(&http),
            header,
            &telemetry_config.api_key,
        )?),
        None => Box::new(UrlParam::key(Arc::clone(&http), &telemetry_config.api_key)),
    };
    let telemetry = TelemetryApiClient::new(&telemetry_config.base_url, authed)?;
    let weather = OpenMeteoClient::new(&config.weather_api_url, Box::new(http));

    Ok(Sources {
        telemetry: Arc::new(telemetry),
        weather: Arc::new(weather),
        fixed_now: None,
    })
}

fn build_aggregator(
    config: &AppConfig,
    sources: &Sources,
    concurrency: Option<usize>,
) -> FleetAggregator {
    FleetAggregator::new(
        Arc::clone(&sources.telemetry),
        Arc::clone(&sources.weather),
        Arc::new(HashedServiceSchedule),
    )
    .with_eco_lookback(Duration::hours(config.eco_lookback_hours))
    .with_concurrency(concurrency.unwrap_or(config.fetch_concurrency))
}

fn resolve_group(group: Option<String>, config: &AppConfig) -> String {
    group
        .or_else(|| config.group_id.clone())
        .unwrap_or_default()
}

/// Runs cycles until `cycles` is reached (0 = forever). Each cycle replaces
/// the previous result entirely; a failed cycle is logged and retried on the
/// next tick.
#[tracing::instrument(skip(aggregator, sources, output))]
async fn watch(
    aggregator: &FleetAggregator,
    sources: &Sources,
    group: &str,
    weather: bool,
    interval: u64,
    cycles: usize,
    output: Option<String>,
) -> Result<()> {
    if cycles == 0 {
        info!(interval, "Watching indefinitely. Press Ctrl+C to stop.");
    }

    let mut cycle = 0;
    loop {
        if cycles > 0 && cycle >= cycles {
            break;
        }
        cycle += 1;

        info!(cycle, "Starting assessment cycle");
        match aggregator.run_cycle(group, weather, sources.now()).await {
            Ok(snapshot) => {
                log_priority_queue(&snapshot.priority_queue);
                if let Some(path) = &output {
                    if let Err(e) = write_assessments_csv(path, &snapshot.assessments) {
                        error!(error = %e, "Failed to write CSV export");
                    }
                }
            }
            Err(e) => error!(error = %e, "Assessment cycle failed"),
        }

        if cycles == 0 || cycle < cycles {
            tokio::time::sleep(tokio::time::Duration::from_secs(interval)).await;
        }
    }

    info!(cycles = cycle, "Finished watching");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_rejects_zero_interval() {
        assert!(Cli::try_parse_from(["fleet_risk", "watch", "--interval", "0"]).is_err());
    }

    #[test]
    fn test_watch_accepts_positive_interval() {
        let cli = Cli::try_parse_from(["fleet_risk", "watch", "-i", "5", "-n", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Watch {
                interval: 5,
                cycles: 2,
                ..
            }
        ));
    }
}
