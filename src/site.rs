//! Site parameters supplied by the user

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Location, tariff and panel choice for one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteParameters {
    /// Latitude in decimal degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in decimal degrees (-180 to 180)
    pub longitude: f64,
    /// Current electricity price (USD per kWh)
    pub electricity_rate_per_kwh: f64,
    /// Panel catalog key
    pub panel_type: String,
    /// Extra production derate for shading not visible in the image (0 < x <= 1)
    pub shading_adjustment: f64,
}

impl Default for SiteParameters {
    fn default() -> Self {
        // San Francisco
        Self {
            latitude: 37.7749,
            longitude: -122.4194,
            electricity_rate_per_kwh: 0.13,
            panel_type: "standard_residential".to_string(),
            shading_adjustment: 1.0,
        }
    }
}

impl SiteParameters {
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AnalysisError::invalid(
                "site.latitude",
                self.latitude,
                "must be between -90 and 90",
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AnalysisError::invalid(
                "site.longitude",
                self.longitude,
                "must be between -180 and 180",
            ));
        }
        if !(self.electricity_rate_per_kwh.is_finite() && self.electricity_rate_per_kwh > 0.0) {
            return Err(AnalysisError::invalid(
                "site.electricity_rate_per_kwh",
                self.electricity_rate_per_kwh,
                "must be positive",
            ));
        }
        if !(self.shading_adjustment > 0.0 && self.shading_adjustment <= 1.0) {
            return Err(AnalysisError::invalid(
                "site.shading_adjustment",
                self.shading_adjustment,
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }
}
