//! Route command - road geometry to a facility

use super::Offline;
use crate::context::Context;
use crate::output::{format_distance, format_duration, Status};
use crate::OutputFormat;
use anyhow::Result;
use owo_colors::OwoColorize;
use pulsepoint_geo::distance_km;
use pulsepoint_navigation::{external_directions_url, RouteProvider};
use serde_json::json;
use std::time::Instant;

pub async fn run(ctx: &Context, query: &str, offline: bool) -> Result<()> {
    let (_, target) = ctx.resolve_target(query).await?;
    let origin = ctx.observer();
    let destination = target.facility.coordinate;

    let started = Instant::now();
    let path = if offline {
        RouteProvider::new(Offline).fetch_route(origin, destination).await
    } else {
        RouteProvider::new(ctx.client()?.routing())
            .fetch_route(origin, destination)
            .await
    };
    let elapsed = started.elapsed();

    let directions = external_directions_url(&origin, &destination);

    if ctx.format == OutputFormat::Json {
        let output = json!({
            "facility": target,
            "path": path,
            "length_km": path.length_km(),
            "straight_line_km": distance_km(&origin, &destination),
            "directions_url": directions,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    Status::header(&format!("Route to {}", target.facility.name));
    println!("  From:      {origin}");
    println!("  To:        {destination}");
    println!("  Points:    {}", path.points().len());
    println!("  Length:    {}", format_distance(path.length_km()).cyan());
    println!(
        "  Direct:    {}",
        format_distance(distance_km(&origin, &destination))
    );
    println!("  Fetched:   {}", format_duration(elapsed));
    println!();

    if path.is_fallback() {
        Status::warning("Routing service unavailable, showing the straight line");
    } else {
        Status::success("Road route from the routing service");
    }
    Status::info(&directions);
    Ok(())
}
