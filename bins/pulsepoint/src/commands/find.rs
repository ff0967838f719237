//! Find command - nearest facility by name

use crate::context::Context;
use crate::output::{print_facility, Status};
use crate::OutputFormat;
use anyhow::Result;
use pulsepoint_navigation::external_directions_url;
use serde_json::json;

pub async fn run(ctx: &Context, query: &str) -> Result<()> {
    let (_, target) = ctx.resolve_target(query).await?;
    let directions = external_directions_url(&ctx.observer(), &target.facility.coordinate);

    if ctx.format == OutputFormat::Json {
        let output = json!({
            "facility": target,
            "directions_url": directions,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    Status::header(&format!("Nearest match for \"{query}\""));
    print_facility(1, &target);
    println!();
    Status::info(&directions);
    Ok(())
}
