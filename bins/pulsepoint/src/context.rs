//! Shared state for every command

use crate::facilities;
use crate::OutputFormat;
use anyhow::Result;
use pulsepoint_api_client::{ClientConfig, PulsePointClient};
use pulsepoint_core::config::Config;
use pulsepoint_geo::{annotate, find_by_name_substring, AnnotatedFacility, Coordinate, Facility};
use pulsepoint_telemetry::metrics;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
    facilities_file: Option<PathBuf>,
    at: Option<Coordinate>,
}

impl Context {
    pub fn load(
        config_path: Option<&Path>,
        format: OutputFormat,
        facilities_file: Option<PathBuf>,
        at: Option<Coordinate>,
    ) -> Result<Self> {
        let config = Config::load(config_path)?;
        debug!(
            path = ?config.path,
            arrival_threshold_km = config.schema.navigation.arrival_threshold_km,
            "Configuration loaded"
        );

        Ok(Self {
            config,
            format,
            facilities_file,
            at,
        })
    }

    /// Where the observer stands: `--at`, else the configured default.
    pub fn observer(&self) -> Coordinate {
        self.at.unwrap_or_else(|| {
            let location = &self.config.schema.location;
            Coordinate::new(location.default_latitude, location.default_longitude)
        })
    }

    pub fn client(&self) -> Result<PulsePointClient> {
        let config = ClientConfig::from_schema(&self.config.schema)?;
        Ok(PulsePointClient::with_config(config)?)
    }

    /// The known facility set, from `--facilities` or the backend.
    pub async fn load_facilities(&self) -> Result<Vec<Facility>> {
        let facilities = match &self.facilities_file {
            Some(path) => facilities::from_file(path)?,
            None => self.client()?.facilities().list().await?,
        };
        metrics().gauge("facilities.loaded", facilities.len() as u64);
        Ok(facilities)
    }

    /// Facilities sorted by distance plus the nearest one matching `query`.
    pub async fn resolve_target(
        &self,
        query: &str,
    ) -> Result<(Vec<Facility>, AnnotatedFacility)> {
        let facilities = self.load_facilities().await?;
        let view = annotate(&facilities, &self.observer());

        let target = find_by_name_substring(&view, query)
            .cloned()
            .ok_or_else(|| pulsepoint_core::Error::target_not_found(query))?;
        Ok((facilities, target))
    }
}
