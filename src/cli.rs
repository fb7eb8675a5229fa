//! Command-Line Interface Module
//!
//! Handles argument parsing and validation for the rooftop-solar application.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::site::SiteParameters;
use crate::vision::RoofSource;

// ===================== CLI =====================

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Roof description JSON file (same shape as the image analysis reply)
    #[arg(long, conflicts_with_all = ["image", "demo"])]
    pub roof: Option<PathBuf>,
    /// Rooftop image to analyze (jpg, jpeg, png or tiff, at most 10 MB)
    #[arg(long, conflicts_with = "demo")]
    pub image: Option<PathBuf>,
    /// Use the built-in demo roof (default when no roof source is given)
    #[arg(long)]
    pub demo: bool,

    /// Site latitude in decimal degrees (-90 to 90)
    #[arg(long, default_value_t = 37.7749, allow_hyphen_values = true, value_parser = parse_latitude, env = "ROOFTOP_SOLAR_LATITUDE")]
    pub latitude: f64,
    /// Site longitude in decimal degrees (-180 to 180)
    #[arg(long, default_value_t = -122.4194, allow_hyphen_values = true, value_parser = parse_longitude, env = "ROOFTOP_SOLAR_LONGITUDE")]
    pub longitude: f64,
    /// Electricity price in USD per kWh
    #[arg(long, default_value_t = 0.13, value_parser = parse_positive_f64, env = "ROOFTOP_SOLAR_ELECTRICITY_RATE")]
    pub electricity_rate: f64,
    /// Panel model from the catalog
    #[arg(long, default_value = "standard_residential", env = "ROOFTOP_SOLAR_PANEL_TYPE")]
    pub panel_type: String,
    /// Extra production derate for shading (0 < x <= 1)
    #[arg(long, default_value_t = 1.0, value_parser = parse_shading_adjustment, env = "ROOFTOP_SOLAR_SHADING_ADJUSTMENT")]
    pub shading_adjustment: f64,

    /// JSON file overriding built-in panel, cost and model parameters
    #[arg(long, env = "ROOFTOP_SOLAR_CONFIG")]
    pub config: Option<PathBuf>,
    /// OpenRouter API key for image analysis
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Write the full report as JSON
    #[arg(long)]
    pub json_out: Option<PathBuf>,
    /// Write the 25-year cash flow as CSV
    #[arg(long)]
    pub csv_out: Option<PathBuf>,
    /// Print the report to stdout as JSON instead of text
    #[arg(long)]
    pub json: bool,
    /// Include the yearly cash-flow table in the text report
    #[arg(long)]
    pub cash_flow: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Show build info from Cargo.lock at time of building
    #[arg(long)]
    pub show_build_info: bool,
}

impl Args {
    pub fn roof_source(&self) -> RoofSource {
        match (&self.roof, &self.image) {
            (Some(path), _) => RoofSource::File(path.clone()),
            (None, Some(path)) => RoofSource::Image(path.clone()),
            (None, None) => RoofSource::Demo,
        }
    }

    pub fn site(&self) -> SiteParameters {
        SiteParameters {
            latitude: self.latitude,
            longitude: self.longitude,
            electricity_rate_per_kwh: self.electricity_rate,
            panel_type: self.panel_type.clone(),
            shading_adjustment: self.shading_adjustment,
        }
    }
}

// Define the structure to match what we serialized in build.rs
#[derive(Debug, Deserialize)]
pub struct DepInfo {
    pub name: String,
    pub version: String,
    pub checksum: Option<String>,
    pub source: Option<String>,
}

// ===================== CLI VALUE PARSERS =====================

fn parse_latitude(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-90.0..=90.0).contains(&v) {
        return Err(format!("Latitude must be between -90 and 90, got {}", v));
    }
    Ok(v)
}

fn parse_longitude(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-180.0..=180.0).contains(&v) {
        return Err(format!("Longitude must be between -180 and 180, got {}", v));
    }
    Ok(v)
}

fn parse_positive_f64(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(v.is_finite() && v > 0.0) {
        return Err(format!("Value must be positive, got {}", v));
    }
    Ok(v)
}

fn parse_shading_adjustment(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(v > 0.0 && v <= 1.0) {
        return Err(format!("Shading adjustment must be in (0, 1], got {}", v));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsers_reject_out_of_range() {
        assert!(parse_latitude("91").is_err());
        assert!(parse_latitude("-33.9").is_ok());
        assert!(parse_longitude("-181").is_err());
        assert!(parse_positive_f64("0").is_err());
        assert!(parse_positive_f64("abc").is_err());
        assert!(parse_shading_adjustment("0").is_err());
        assert!(parse_shading_adjustment("1.0").is_ok());
        assert!(parse_shading_adjustment("1.1").is_err());
    }

    #[test]
    fn test_roof_sources() {
        let args = Args::try_parse_from(["rooftop-solar", "--roof", "house.json"]).unwrap();
        assert_eq!(args.roof_source(), RoofSource::File(PathBuf::from("house.json")));

        let args = Args::try_parse_from(["rooftop-solar", "--image", "roof.png"]).unwrap();
        assert_eq!(args.roof_source(), RoofSource::Image(PathBuf::from("roof.png")));

        let args = Args::try_parse_from(["rooftop-solar"]).unwrap();
        assert_eq!(args.roof_source(), RoofSource::Demo);

        assert!(Args::try_parse_from(["rooftop-solar", "--roof", "a.json", "--demo"]).is_err());
    }

    #[test]
    fn test_site_from_flags() {
        let args = Args::try_parse_from([
            "rooftop-solar",
            "--latitude",
            "-33.87",
            "--longitude",
            "151.21",
            "--electricity-rate",
            "0.30",
            "--panel-type",
            "premium",
        ])
        .unwrap();
        let site = args.site();
        assert_eq!(site.latitude, -33.87);
        assert_eq!(site.electricity_rate_per_kwh, 0.30);
        assert_eq!(site.panel_type, "premium");
        assert!(site.validate().is_ok());
    }
}
