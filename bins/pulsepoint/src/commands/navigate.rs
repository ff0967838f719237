//! Navigate command - simulated trip with live progress
//!
//! A simulated walk stands in for the device's location source. The
//! navigator runs exactly as it would with real fixes.

use super::Offline;
use crate::context::Context;
use crate::output::{format_distance, format_duration, Status};
use crate::OutputFormat;
use anyhow::{bail, Result};
use owo_colors::OwoColorize;
use pulsepoint_geo::Facility;
use pulsepoint_navigation::{
    FeedConfig, LocationFeed, Navigator, NavigatorConfig, NavigatorSnapshot, RouteProvider,
    RouteSource, SessionState, SimulatedWalk,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct Options {
    pub speed_kmh: f64,
    pub interval_ms: Option<u64>,
    pub offline: bool,
    pub timeout_secs: u64,
}

pub async fn run(ctx: &Context, query: &str, options: Options) -> Result<()> {
    if !options.speed_kmh.is_finite() || options.speed_kmh <= 0.0 {
        bail!("speed must be a positive number of km/h, got {}", options.speed_kmh);
    }

    let (facilities, target) = ctx.resolve_target(query).await?;

    if options.offline {
        drive(ctx, facilities, target.facility, RouteProvider::new(Offline), &options).await
    } else {
        let provider = RouteProvider::new(ctx.client()?.routing());
        drive(ctx, facilities, target.facility, provider, &options).await
    }
}

async fn drive<S: RouteSource>(
    ctx: &Context,
    facilities: Vec<Facility>,
    target: Facility,
    provider: RouteProvider<S>,
    options: &Options,
) -> Result<()> {
    let schema = &ctx.config.schema;
    let start = ctx.observer();
    let interval = Duration::from_millis(options.interval_ms.unwrap_or(schema.location.fix_interval_ms));

    let walk = SimulatedWalk::new(start, target.coordinate, options.speed_kmh, interval);
    let feed = LocationFeed::spawn_with_config(
        walk,
        FeedConfig::new(start)
            .with_retry_interval(Duration::from_millis(schema.location.retry_interval_ms)),
    );

    let navigator = Navigator::spawn(
        NavigatorConfig {
            arrival_threshold_km: schema.navigation.arrival_threshold_km,
            ..NavigatorConfig::default()
        },
        facilities,
        provider,
        feed.fixes(),
    );

    if ctx.format == OutputFormat::Text {
        Status::header(&format!("Navigating to {}", target.name));
    }

    let mut updates = navigator.subscribe();
    navigator.select_target(target).await?;

    let started = Instant::now();
    let deadline = tokio::time::sleep(Duration::from_secs(options.timeout_secs));
    tokio::pin!(deadline);
    let mut last_state = "";

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    bail!("navigator stopped unexpectedly");
                }
                let snapshot = Arc::clone(&updates.borrow_and_update());
                report(ctx.format, &snapshot, last_state)?;
                last_state = snapshot.session.name();

                if snapshot.arrivals > 0 {
                    break;
                }
            }
            () = &mut deadline => {
                bail!(
                    "gave up after {} without arriving",
                    format_duration(started.elapsed())
                );
            }
        }
    }

    navigator.stop().await?;
    feed.cancel();
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Trip finished");

    if ctx.format == OutputFormat::Text {
        println!();
        Status::success(&format!("Arrived in {}", format_duration(started.elapsed())));
    }
    Ok(())
}

fn report(format: OutputFormat, snapshot: &NavigatorSnapshot, last_state: &str) -> Result<()> {
    let state = snapshot.session.name();
    let distance = match &snapshot.session {
        SessionState::Active {
            distance_to_target_km,
            ..
        }
        | SessionState::Arrived {
            distance_to_target_km,
            ..
        } => Some(*distance_to_target_km),
        _ => None,
    };

    if format == OutputFormat::Json {
        let event = json!({
            "state": state,
            "observer": snapshot.observer,
            "distance_to_target_km": distance,
            "arrivals": snapshot.arrivals,
            "updated_at": snapshot.updated_at,
        });
        println!("{}", serde_json::to_string(&event)?);
        return Ok(());
    }

    if state != last_state {
        match &snapshot.session {
            SessionState::Routing { .. } => Status::info("Fetching route..."),
            SessionState::Active { path, .. } => {
                let source = if path.is_fallback() {
                    "straight line".yellow().to_string()
                } else {
                    "road route".green().to_string()
                };
                Status::info(&format!(
                    "Following {source}, {} points, {}",
                    path.points().len(),
                    format_distance(path.length_km())
                ));
            }
            SessionState::Arrived { target, .. } => {
                Status::success(&format!("Arrived at {}", target.name.bold()));
            }
            SessionState::Idle { .. } => {}
        }
    }

    if let (Some(distance), "active") = (distance, state) {
        println!(
            "  {} {} to go  {}",
            "▸".cyan(),
            format_distance(distance),
            snapshot.observer.to_string().dimmed()
        );
    }
    Ok(())
}
