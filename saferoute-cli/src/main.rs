//! Command-line interface for the SafeRoute engine.

#![forbid(unsafe_code)]

mod config;

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr, eyre};
use saferoute_core::{Coordinate, FeedbackSource, Priority, Stop};
use saferoute_maps::MapsOrchestrator;
use saferoute_optimizer::{Objective, OptimizeRequest};

use crate::config::{EngineConfig, JsonFeedbackFile};

#[derive(Debug, Parser)]
#[command(name = "saferoute", version, about = "Safety-aware route optimization")]
struct Cli {
    /// Path to the engine configuration file.
    #[arg(long, global = true, default_value = "saferoute.json")]
    config: Utf8PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Optimize a multi-stop route.
    Optimize {
        /// Starting point as "lat,lng" or a free-text address.
        #[arg(long)]
        start: String,
        /// Stop as "lat,lng" or a free-text address; repeatable, visited in
        /// the given order.
        #[arg(long = "stop", required = true)]
        stops: Vec<String>,
        /// Objective to optimize for (time, safety, distance); repeatable.
        #[arg(long = "objective")]
        objectives: Vec<Objective>,
        /// Departure time, RFC 3339 (e.g. "2026-08-07T21:30:00Z").
        #[arg(long)]
        departure: Option<String>,
    },
    /// Score a single location.
    Score {
        /// Location as "lat,lng".
        #[arg(long)]
        point: String,
        /// Timestamp for the lighting term, RFC 3339.
        #[arg(long)]
        at: Option<String>,
    },
    /// Score a path given as a series of points.
    ScoreRoute {
        /// Path vertex as "lat,lng"; repeatable, in order.
        #[arg(long = "point", required = true)]
        points: Vec<String>,
        /// Timestamp for the lighting term, RFC 3339.
        #[arg(long)]
        at: Option<String>,
    },
    /// Resolve an address to a coordinate.
    Geocode {
        /// Free-text address.
        address: String,
    },
    /// Retrain the safety model from a feedback JSON file.
    Retrain {
        /// Path to a JSON array of feedback records.
        feedback: Utf8PathBuf,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("saferoute: {err:?}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = EngineConfig::load(&cli.config)?;
    log::debug!("loaded engine config from {}", cli.config);

    match cli.command {
        Command::Optimize {
            start,
            stops,
            objectives,
            departure,
        } => {
            let (maps, _scorer, optimizer) = config.build_optimizer()?;
            let departure_time = departure.as_deref().map(parse_departure).transpose()?;
            let start = resolve_stop(&maps, "start", &start).await?;
            let mut resolved = Vec::with_capacity(stops.len());
            for (index, raw) in stops.iter().enumerate() {
                resolved.push(resolve_stop(&maps, &format!("s{}", index + 1), raw).await?);
            }
            let request = OptimizeRequest {
                start,
                stops: resolved,
                objectives,
                rider: None,
                departure_time,
            };
            let route = optimizer.optimize_route(&request).await?;
            emit(&route)
        }
        Command::Score { point, at } => {
            let scorer = config.build_scorer()?;
            let at = at.as_deref().map(parse_departure).transpose()?;
            let assessment = scorer.score_location(parse_point(&point)?, at);
            emit(&assessment)
        }
        Command::ScoreRoute { points, at } => {
            let scorer = config.build_scorer()?;
            let at = at.as_deref().map(parse_departure).transpose()?;
            let path = points
                .iter()
                .map(|raw| parse_point(raw))
                .collect::<Result<Vec<_>>>()?;
            let safety = scorer.score_route(&path, at);
            emit(&safety)
        }
        Command::Geocode { address } => {
            let maps = config.build_orchestrator()?;
            match maps.geocode(&address).await? {
                Some(coordinate) => emit(&coordinate),
                None => Err(eyre!("no provider knows the address {address:?}")),
            }
        }
        Command::Retrain { feedback } => {
            let scorer = config.build_scorer()?;
            let records = JsonFeedbackFile::new(feedback)
                .fetch_feedback()
                .wrap_err("failed to fetch feedback records")?;
            let report = scorer.retrain_with_feedback(&records)?;
            emit(&serde_json::json!({ "sample_count": report.sample_count }))
        }
    }
}

fn emit<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).wrap_err("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// Parse "lat,lng" into a validated coordinate.
fn parse_point(raw: &str) -> Result<Coordinate> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| eyre!("expected \"lat,lng\", got {raw:?}"))?;
    let latitude: f64 = lat.trim().parse().wrap_err_with(|| format!("bad latitude in {raw:?}"))?;
    let longitude: f64 = lng
        .trim()
        .parse()
        .wrap_err_with(|| format!("bad longitude in {raw:?}"))?;
    Coordinate::new(latitude, longitude).wrap_err_with(|| format!("invalid coordinate {raw:?}"))
}

fn parse_departure(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .wrap_err_with(|| format!("invalid RFC 3339 timestamp {raw:?}"))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Build a stop from "lat,lng", geocoding free-text addresses instead.
async fn resolve_stop(maps: &MapsOrchestrator, id: &str, raw: &str) -> Result<Stop> {
    let (coordinate, address) = match parse_point(raw) {
        Ok(coordinate) => (coordinate, raw.to_owned()),
        Err(_) => {
            let coordinate = maps
                .geocode(raw)
                .await?
                .ok_or_else(|| eyre!("no provider knows the address {raw:?}"))?;
            (coordinate, raw.to_owned())
        }
    };
    Stop::new(id, coordinate, address, Priority::Normal).wrap_err("invalid stop")
}
