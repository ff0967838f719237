//! Config command - inspect and create configuration files

use crate::context::Context;
use crate::output::Status;
use crate::OutputFormat;
use anyhow::Result;
use pulsepoint_core::config::ConfigSchema;
use pulsepoint_core::Error;
use std::path::Path;

pub fn show(ctx: &Context) -> Result<()> {
    let schema = &ctx.config.schema;

    if ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(schema)?);
        return Ok(());
    }

    match &ctx.config.path {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# Built-in defaults"),
    }
    print!("{}", toml::to_string_pretty(schema)?);
    Ok(())
}

pub fn path(ctx: &Context) -> Result<()> {
    match &ctx.config.path {
        Some(path) => println!("{}", path.display()),
        None => Status::info("No configuration file found, using built-in defaults"),
    }
    Ok(())
}

pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!("{} already exists", path.display()))
            .with_suggestion("Pass --force to overwrite it")
            .into());
    }

    let content = toml::to_string_pretty(&ConfigSchema::default())?;
    std::fs::write(path, content).map_err(Error::from)?;

    Status::success(&format!("Wrote {}", path.display()));
    Ok(())
}
