use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ruteo_resiliente::config::Config;
use ruteo_resiliente::pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "ruteo-resiliente",
    version,
    about = "Route a multi-office procedure over the PostGIS road network and write it as GeoJSON"
)]
struct Args {
    /// YAML configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the output directory
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Override the web data directory the route is copied to
    #[arg(long)]
    web_data_dir: Option<PathBuf>,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug,sqlx=warn" } else { "info,sqlx=warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "Failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    if let Some(out_dir) = args.out_dir {
        config.output.out_dir = out_dir;
    }
    if let Some(web_data_dir) = args.web_data_dir {
        config.output.web_data_dir = Some(web_data_dir);
    }

    tracing::info!(
        host = %config.database.host,
        database = %config.database.name,
        stops = config.stops().len(),
        "Starting route generation"
    );

    match pipeline::run(&config) {
        Ok(report) => {
            for stage in report.failed_stages() {
                tracing::warn!(stage = %stage.stage, outcome = ?stage.outcome, "Stage did not complete");
            }
            if let Some(plan) = &report.plan {
                tracing::info!(
                    total_km = %format!("{:.2}", plan.total_distance_m / 1000.0),
                    walking_minutes = plan.walking_minutes,
                    handling_minutes = plan.handling_minutes,
                    total_minutes = plan.total_minutes,
                    fallback_segments = plan.fallback_count(),
                    "Route generated"
                );
            }
            if report.last_resort {
                tracing::warn!("Only the last-resort straight-line route was written");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Route generation failed");
            ExitCode::FAILURE
        }
    }
}
