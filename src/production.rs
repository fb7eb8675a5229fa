//! Energy Production Model
//!
//! Converts system size and plane irradiance into annual and monthly AC
//! energy using a fixed loss chain and a seasonal profile.

use serde::{Deserialize, Serialize};

use crate::config::ProductionConfig;

const HOURS_PER_YEAR: f64 = 8760.0;
const DAYS_PER_YEAR: f64 = 365.0;

/// Energy estimate for one system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionResult {
    pub annual_kwh: f64,
    /// January first; sums to `annual_kwh`
    pub monthly_kwh: Vec<f64>,
    pub daily_average_kwh: f64,
    /// Combined loss chain factor
    pub system_efficiency: f64,
    pub capacity_factor: f64,
    pub co2_offset_tons: f64,
}

/// Estimate annual production
///
/// annual = size × yield_per_kw × multiplier × losses × shading_adjustment
pub fn estimate_production(
    system_size_kw: f64,
    irradiance_multiplier: f64,
    shading_adjustment: f64,
    config: &ProductionConfig,
) -> ProductionResult {
    let system_efficiency = config.losses.combined();
    let annual = (system_size_kw
        * config.base_annual_yield_per_kw
        * irradiance_multiplier
        * system_efficiency
        * shading_adjustment)
        .max(0.0);

    let monthly_kwh = config.normalized_weights().iter().map(|w| annual * w).collect();

    let capacity_factor =
        if system_size_kw > 0.0 { annual / (system_size_kw * HOURS_PER_YEAR) } else { 0.0 };

    ProductionResult {
        annual_kwh: annual,
        monthly_kwh,
        daily_average_kwh: annual / DAYS_PER_YEAR,
        system_efficiency,
        capacity_factor,
        co2_offset_tons: annual * config.co2_tons_per_kwh,
    }
}
