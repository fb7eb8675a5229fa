//! Irradiance Model
//!
//! Estimates the annual plane-of-array irradiance for a roof plane from the
//! site latitude and the plane's tilt and azimuth.
//!
//! The base value comes from a latitude band table (kWh/m²/year). Two
//! orientation factors scale it down:
//! - tilt factor, peaking when the tilt equals the absolute latitude
//! - azimuth factor, peaking at due south (180°)
//!
//! Both factors carry an additive floor so the result never reaches zero.

use serde::{Deserialize, Serialize};

use crate::config::IrradianceConfig;

// ===================== CONSTANTS =====================

/// Reference irradiance at standard test conditions (W/m²), used to express
/// annual irradiance as equivalent peak-sun hours
const STC_IRRADIANCE: f64 = 1000.0;

const TILT_FLOOR: f64 = 0.1;
const AZIMUTH_FLOOR: f64 = 0.2;
const DUE_SOUTH_DEG: f64 = 180.0;

// ===================== RESULTS =====================

/// Irradiance estimate for a single roof plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrradianceResult {
    /// Base irradiance for the latitude band (kWh/m²/year)
    pub base_irradiance: f64,
    /// Orientation-adjusted irradiance on the plane (kWh/m²/year)
    pub annual_irradiance: f64,
    /// Average daily irradiance on the plane (kWh/m²/day)
    pub daily_average: f64,
    /// Annual irradiance relative to 1000 W/m² (dimensionless multiplier)
    pub peak_sun_hours: f64,
    pub tilt_factor: f64,
    pub azimuth_factor: f64,
}

impl IrradianceResult {
    /// Multiplier applied to the per-kW base yield
    pub fn multiplier(&self) -> f64 {
        self.peak_sun_hours
    }
}

// ===================== FACTORS =====================

/// Annual irradiance for the latitude band containing `latitude`
pub fn base_irradiance(latitude: f64, config: &IrradianceConfig) -> f64 {
    let abs_lat = latitude.abs();
    config
        .bands
        .iter()
        .find(|band| abs_lat < band.max_abs_latitude)
        .map(|band| band.annual_kwh_per_m2)
        .unwrap_or(config.high_latitude_kwh_per_m2)
}

/// Tilt factor: `cos(tilt - |latitude|) * 0.9 + 0.1`, clamped to [0.1, 1.0]
pub fn tilt_factor(latitude: f64, tilt_deg: f64) -> f64 {
    let deviation = (tilt_deg - latitude.abs()).to_radians();
    (deviation.cos() * (1.0 - TILT_FLOOR) + TILT_FLOOR).clamp(TILT_FLOOR, 1.0)
}

/// Azimuth factor: `cos(azimuth - 180) * 0.8 + 0.2`, clamped to [0.2, 1.0]
pub fn azimuth_factor(azimuth_deg: f64) -> f64 {
    let deviation = (azimuth_deg - DUE_SOUTH_DEG).to_radians();
    (deviation.cos() * (1.0 - AZIMUTH_FLOOR) + AZIMUTH_FLOOR).clamp(AZIMUTH_FLOOR, 1.0)
}

// ===================== MODEL =====================

/// Calculate the irradiance estimate for one roof plane
///
/// # Arguments
/// * `latitude` - Site latitude in degrees
/// * `tilt_deg` - Plane tilt from horizontal in degrees
/// * `azimuth_deg` - Plane facing direction in degrees (180 = South)
/// * `config` - Latitude band table
///
/// # Returns
/// IrradianceResult with a strictly positive multiplier
pub fn irradiance(
    latitude: f64,
    tilt_deg: f64,
    azimuth_deg: f64,
    config: &IrradianceConfig,
) -> IrradianceResult {
    let base = base_irradiance(latitude, config);
    let tilt = tilt_factor(latitude, tilt_deg);
    let azimuth = azimuth_factor(azimuth_deg);
    let annual = base * tilt * azimuth;

    IrradianceResult {
        base_irradiance: base,
        annual_irradiance: annual,
        daily_average: annual / 365.0,
        peak_sun_hours: annual / STC_IRRADIANCE,
        tilt_factor: tilt,
        azimuth_factor: azimuth,
    }
}

// ===================== TESTS =====================
