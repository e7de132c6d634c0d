//! Routing stage of the ETL: connect, check the network, route, write.
//!
//! Each stage records a typed outcome in the [`PipelineReport`]. If any stage
//! before writing fails, the last-resort straight-line route is written
//! instead, so the web app always has a route file.

use std::fmt;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::geojson_output::{last_resort_geojson, plan_to_geojson, write_geojson};
use crate::pgrouting::PgRoutingClient;
use crate::router::{route_itinerary, RoutePlan};
use crate::traits::{PathOracle, VertexLocator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    NetworkCheck,
    Route,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Connect => "connect",
            Stage::NetworkCheck => "network_check",
            Stage::Route => "route",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
    pub plan: Option<RoutePlan>,
    pub output: Option<PathBuf>,
    /// The written route is the hardcoded straight-line itinerary.
    pub last_resort: bool,
}

impl PipelineReport {
    pub fn failed_stages(&self) -> impl Iterator<Item = &StageReport> {
        self.stages
            .iter()
            .filter(|report| matches!(report.outcome, StageOutcome::Failed(_)))
    }

    fn record<T>(&mut self, stage: Stage, result: Result<T, Error>) -> Result<T, Error> {
        let outcome = match &result {
            Ok(_) => {
                info!(%stage, "Stage completed");
                StageOutcome::Completed
            }
            Err(err) => {
                error!(%stage, error = %err, "Stage failed");
                StageOutcome::Failed(err.to_string())
            }
        };
        self.stages.push(StageReport { stage, outcome });
        result
    }
}

/// Runs the routing stage against the configured PostGIS database.
pub fn run(config: &Config) -> Result<PipelineReport, Error> {
    let mut report = PipelineReport::default();
    let result = connect(config, &mut report).and_then(|client| route_with(&client, config, &mut report));
    finish(config, result, report)
}

/// Runs the routing stage against an already available engine.
pub fn run_with_engine<E>(config: &Config, engine: &E) -> Result<PipelineReport, Error>
where
    E: VertexLocator + PathOracle,
{
    let mut report = PipelineReport::default();
    let result = route_with(engine, config, &mut report);
    finish(config, result, report)
}

fn connect(config: &Config, report: &mut PipelineReport) -> Result<PgRoutingClient, Error> {
    let client = report.record(Stage::Connect, PgRoutingClient::wait_until_ready(&config.database))?;
    report.record(
        Stage::NetworkCheck,
        client.network_status().and_then(|status| status.ensure_routable()),
    )?;
    Ok(client)
}

fn route_with<E>(engine: &E, config: &Config, report: &mut PipelineReport) -> Result<RoutePlan, Error>
where
    E: VertexLocator + PathOracle,
{
    let stops = config.stops();
    let options = config.routing.route_options();
    report.record(
        Stage::Route,
        route_itinerary(&stops, engine, engine, &options).map_err(Error::from),
    )
}

fn finish(config: &Config, result: Result<RoutePlan, Error>, mut report: PipelineReport) -> Result<PipelineReport, Error> {
    let collection = match &result {
        Ok(plan) => {
            if plan.fallback_count() > 0 {
                warn!(
                    fallback = plan.fallback_count(),
                    segments = plan.segments.len(),
                    "Some segments are straight-line approximations"
                );
            }
            plan_to_geojson(plan)
        }
        Err(err) => {
            warn!(error = %err, "Writing last-resort straight-line route");
            report.last_resort = true;
            last_resort_geojson(&err.to_string())
        }
    };

    let output = &config.output;
    let path = report.record(
        Stage::Write,
        write_geojson(
            &collection,
            &output.out_dir,
            &output.file_name,
            output.web_data_dir.as_deref(),
        ),
    )?;

    report.output = Some(path);
    report.plan = result.ok();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_order_and_failures() {
        let mut report = PipelineReport::default();
        let ok: Result<u8, Error> = report.record(Stage::Connect, Ok(1));
        assert!(ok.is_ok());
        let failed: Result<u8, Error> =
            report.record(Stage::NetworkCheck, Err(Error::NetworkNotReady { edges: 0, vertices: 0 }));
        assert!(failed.is_err());

        let stages: Vec<Stage> = report.stages.iter().map(|s| s.stage).collect();
        assert_eq!(stages, vec![Stage::Connect, Stage::NetworkCheck]);
        let failed: Vec<Stage> = report.failed_stages().map(|s| s.stage).collect();
        assert_eq!(failed, vec![Stage::NetworkCheck]);
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(Stage::NetworkCheck.to_string(), "network_check");
        assert_eq!(Stage::Write.to_string(), "write");
    }
}
