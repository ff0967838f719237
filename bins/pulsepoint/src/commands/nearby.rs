//! Nearby command - facilities sorted by distance from the observer

use crate::context::Context;
use crate::output::{format_count, format_distance, print_facility, Status};
use crate::OutputFormat;
use anyhow::{bail, Result};
use owo_colors::OwoColorize;
use pulsepoint_geo::{annotate, count_within, filter_by_radius};
use serde_json::json;

pub async fn run(ctx: &Context, radius: Option<f64>, limit: Option<usize>, server: bool) -> Result<()> {
    let search = &ctx.config.schema.search;
    let radius = radius.unwrap_or(search.default_radius_km);
    if !radius.is_finite() || radius < 0.0 {
        bail!("radius must be a non-negative number of kilometers, got {radius}");
    }

    let observer = ctx.observer();
    let view = if server {
        ctx.client()?.facilities().nearby(&observer, radius).await?
    } else {
        annotate(&ctx.load_facilities().await?, &observer)
    };

    let close_by = count_within(&view, search.close_by_radius_km);
    let mut hits = filter_by_radius(&view, radius);
    if let Some(limit) = limit {
        hits.truncate(limit);
    }

    if ctx.format == OutputFormat::Json {
        let output = json!({
            "observer": observer,
            "radius_km": radius,
            "close_by_radius_km": search.close_by_radius_km,
            "close_by": close_by,
            "facilities": hits,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    Status::header(&format!(
        "Facilities within {} of {observer}",
        format_distance(radius)
    ));

    if hits.is_empty() {
        Status::warning("No facilities in range");
    }
    for (rank, annotated) in hits.iter().enumerate() {
        print_facility(rank + 1, annotated);
    }

    println!();
    println!(
        "{} within {}",
        format_count(close_by, "facility", "facilities").bold(),
        format_distance(search.close_by_radius_km)
    );
    Ok(())
}
