#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the geotag filter.
//!
//! Reads newline-delimited JSON records, enriches each one, and writes
//! them back out in the same order.

mod pipeline;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use geotag_filter::GeoTagFilter;
use geotag_filter_models::FilterConfig;
use geotag_geocoder::{BoundaryGeocoder, CachedGeocoder, NoopGeocoder, ReverseGeocoder};

#[derive(Parser)]
#[command(name = "geotag", about = "Enrich NDJSON records with geo fields")]
struct Cli {
    /// TOML config file (`properties_dig_level`, `properties_ignore_list`,
    /// `geometry_centroid_key`)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override `properties_dig_level` (negative = unlimited)
    #[arg(long, allow_hyphen_values = true)]
    dig_level: Option<i64>,
    /// Add a key to `properties_ignore_list` (repeatable)
    #[arg(long = "ignore")]
    ignore: Vec<String>,
    /// Override `geometry_centroid_key`
    #[arg(long)]
    centroid_key: Option<String>,
    /// `GeoJSON` `FeatureCollection` of boundaries used for reverse geocoding
    #[arg(long)]
    boundaries: Option<PathBuf>,
    /// Disable the reverse geocode cache
    #[arg(long)]
    no_cache: bool,
    /// Input file (defaults to stdin)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output file (defaults to stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn filter_config(&self) -> Result<FilterConfig, geotag_filter::ConfigError> {
        let mut config = match &self.config {
            Some(path) => FilterConfig::load(path)?,
            None => FilterConfig::default(),
        };

        if let Some(dig_level) = self.dig_level {
            config.properties_dig_level = dig_level;
        }
        config
            .properties_ignore_list
            .extend(self.ignore.iter().cloned());
        if let Some(key) = &self.centroid_key {
            config.geometry_centroid_key.clone_from(key);
        }

        Ok(config)
    }

    fn geocoder(&self) -> Result<Box<dyn ReverseGeocoder>, geotag_geocoder::BoundaryError> {
        let Some(path) = &self.boundaries else {
            log::info!("No boundaries configured; points will not be reverse geocoded");
            return Ok(Box::new(NoopGeocoder));
        };

        let boundaries = BoundaryGeocoder::load(path)?;
        if self.no_cache {
            Ok(Box::new(boundaries))
        } else {
            Ok(Box::new(CachedGeocoder::new(boundaries)))
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = cli.filter_config()?;
    log::debug!("Filter config: {config:?}");
    let filter = GeoTagFilter::new(config, cli.geocoder()?);

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin().lock())),
    };
    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let start = Instant::now();
    let stats = pipeline::run(&filter, reader, &mut writer)?;
    writer.flush()?;

    log::info!(
        "Processed {} records ({} passed through unparsed) in {:.2}s",
        stats.records,
        stats.unparsed,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
