//! Analysis Configuration Module
//!
//! Panel catalog, cost model, financial assumptions and lookup tables.
//! Built-in defaults can be partially overridden by a JSON file; the result is
//! validated once and then passed by reference into every component.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::roof::ShadingLevel;

// ===================== PANEL CATALOG =====================

/// Catalog entry for one panel model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    /// Rated power per panel (W)
    pub wattage: f64,
    /// Module efficiency (0.0 - 1.0)
    pub efficiency: f64,
    /// Equipment cost (USD per W)
    pub cost_per_watt: f64,
    /// Footprint of one panel (m²)
    pub area_per_panel: f64,
}

fn default_panels() -> BTreeMap<String, PanelSpec> {
    let mut panels = BTreeMap::new();
    panels.insert(
        "standard_residential".to_string(),
        PanelSpec { wattage: 400.0, efficiency: 0.20, cost_per_watt: 3.50, area_per_panel: 1.65 },
    );
    panels.insert(
        "high_efficiency".to_string(),
        PanelSpec { wattage: 450.0, efficiency: 0.22, cost_per_watt: 4.00, area_per_panel: 1.65 },
    );
    panels.insert(
        "premium".to_string(),
        PanelSpec { wattage: 500.0, efficiency: 0.24, cost_per_watt: 4.50, area_per_panel: 1.65 },
    );
    panels
}

// ===================== INSTALLATION COSTS =====================

/// How installation cost is derived from the equipment cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum InstallationPricing {
    /// Per-watt labour and inverter costs plus fixed fees
    Itemized {
        base_cost_per_watt: f64,
        inverter_cost_per_watt: f64,
        electrical_cost: f64,
        permit_cost: f64,
        inspection_cost: f64,
        labor_cost_per_hour: f64,
        install_hours_per_kw: f64,
    },
    /// Installation as a fraction of equipment cost
    Ratio { ratio: f64 },
}

impl Default for InstallationPricing {
    fn default() -> Self {
        InstallationPricing::Itemized {
            base_cost_per_watt: 1.50,
            inverter_cost_per_watt: 0.30,
            electrical_cost: 2000.0,
            permit_cost: 500.0,
            inspection_cost: 300.0,
            labor_cost_per_hour: 75.0,
            install_hours_per_kw: 8.0,
        }
    }
}

// ===================== FINANCIAL ASSUMPTIONS =====================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialConfig {
    /// Federal tax credit as a fraction of total cost
    pub federal_tax_credit: f64,
    /// Yearly electricity price escalation
    pub annual_rate_increase: f64,
    /// Yearly fractional output loss of the panels
    pub system_degradation: f64,
    /// Discount rate for NPV
    pub discount_rate: f64,
    /// IRR solver tolerance (on the rate and on NPV)
    pub irr_tolerance: f64,
    /// IRR solver iteration bound
    pub irr_max_iterations: u32,
}

impl Default for FinancialConfig {
    fn default() -> Self {
        Self {
            federal_tax_credit: 0.30,
            annual_rate_increase: 0.03,
            system_degradation: 0.005,
            discount_rate: 0.06,
            irr_tolerance: 1e-6,
            irr_max_iterations: 200,
        }
    }
}

// ===================== LAYOUT =====================

/// Fraction of installable panels kept for each shading level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingFactors {
    pub none: f64,
    pub minimal: f64,
    pub light: f64,
    pub moderate: f64,
    pub heavy: f64,
}

impl Default for ShadingFactors {
    fn default() -> Self {
        Self { none: 1.0, minimal: 0.95, light: 0.90, moderate: 0.80, heavy: 0.60 }
    }
}

impl ShadingFactors {
    pub fn factor(&self, level: ShadingLevel) -> f64 {
        match level {
            ShadingLevel::None => self.none,
            ShadingLevel::Minimal => self.minimal,
            ShadingLevel::Light => self.light,
            ShadingLevel::Moderate => self.moderate,
            ShadingLevel::Heavy => self.heavy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Share of usable area left after row and edge clearances
    pub spacing_factor: f64,
    /// Panels lost per obstruction instance
    pub obstruction_panel_penalty: f64,
    /// Usable area below which the roof is not considered (m²)
    pub min_usable_area_sqm: f64,
    pub shading: ShadingFactors,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing_factor: 0.85,
            obstruction_panel_penalty: 2.5,
            min_usable_area_sqm: 20.0,
            shading: ShadingFactors::default(),
        }
    }
}

// ===================== PRODUCTION =====================

/// Loss chain between panel nameplate and metered AC energy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemLosses {
    pub inverter_efficiency: f64,
    pub dc_losses: f64,
    pub ac_losses: f64,
    pub soiling_factor: f64,
    pub temperature_factor: f64,
}

impl Default for SystemLosses {
    fn default() -> Self {
        Self {
            inverter_efficiency: 0.96,
            dc_losses: 0.95,
            ac_losses: 0.98,
            soiling_factor: 0.95,
            temperature_factor: 0.90,
        }
    }
}

impl SystemLosses {
    pub fn combined(&self) -> f64 {
        self.inverter_efficiency
            * self.dc_losses
            * self.ac_losses
            * self.soiling_factor
            * self.temperature_factor
    }
}

/// Seasonal production profile, January first (not necessarily normalized)
const DEFAULT_MONTHLY_WEIGHTS: [f64; 12] =
    [0.7, 0.8, 0.9, 1.1, 1.2, 1.3, 1.3, 1.2, 1.1, 0.9, 0.7, 0.6];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// kWh per installed kW for each unit of irradiance multiplier
    pub base_annual_yield_per_kw: f64,
    pub losses: SystemLosses,
    pub monthly_weights: [f64; 12],
    /// Grid emissions avoided per kWh (metric tons CO₂)
    pub co2_tons_per_kwh: f64,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            base_annual_yield_per_kw: 365.0,
            losses: SystemLosses::default(),
            monthly_weights: DEFAULT_MONTHLY_WEIGHTS,
            co2_tons_per_kwh: 0.0004,
        }
    }
}

impl ProductionConfig {
    /// Monthly weights scaled so they sum to exactly 1.0
    pub fn normalized_weights(&self) -> [f64; 12] {
        let sum: f64 = self.monthly_weights.iter().sum();
        if (sum - 1.0).abs() < 1e-12 || sum <= 0.0 {
            return self.monthly_weights;
        }
        self.monthly_weights.map(|w| w / sum)
    }
}

// ===================== IRRADIANCE =====================

/// Annual irradiance for latitudes strictly below `max_abs_latitude`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatitudeBand {
    pub max_abs_latitude: f64,
    pub annual_kwh_per_m2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrradianceConfig {
    /// Bands sorted by ascending latitude limit
    pub bands: Vec<LatitudeBand>,
    /// Irradiance poleward of the last band
    pub high_latitude_kwh_per_m2: f64,
}

impl Default for IrradianceConfig {
    fn default() -> Self {
        Self {
            bands: vec![
                LatitudeBand { max_abs_latitude: 25.0, annual_kwh_per_m2: 2000.0 },
                LatitudeBand { max_abs_latitude: 35.0, annual_kwh_per_m2: 1800.0 },
                LatitudeBand { max_abs_latitude: 45.0, annual_kwh_per_m2: 1600.0 },
            ],
            high_latitude_kwh_per_m2: 1400.0,
        }
    }
}

// ===================== SITE CRITERIA =====================

/// Thresholds used when judging a roof plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteCriteria {
    pub min_tilt_deg: f64,
    pub max_tilt_deg: f64,
    pub optimal_azimuth_deg: f64,
    pub azimuth_tolerance_deg: f64,
    /// Below this roof/optimal multiplier ratio, tilted racking is suggested
    pub min_orientation_efficiency: f64,
}

impl Default for SiteCriteria {
    fn default() -> Self {
        Self {
            min_tilt_deg: 10.0,
            max_tilt_deg: 60.0,
            optimal_azimuth_deg: 180.0,
            azimuth_tolerance_deg: 45.0,
            min_orientation_efficiency: 0.85,
        }
    }
}

// ===================== VISION =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Largest image accepted for upload (bytes)
    pub max_image_bytes: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "anthropic/claude-3.5-sonnet".to_string(),
            timeout_secs: 60,
            max_tokens: 2000,
            temperature: 0.1,
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

// ===================== TOP LEVEL =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub panels: BTreeMap<String, PanelSpec>,
    pub installation: InstallationPricing,
    pub financial: FinancialConfig,
    pub layout: LayoutConfig,
    pub production: ProductionConfig,
    pub irradiance: IrradianceConfig,
    pub criteria: SiteCriteria,
    pub vision: VisionConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            panels: default_panels(),
            installation: InstallationPricing::default(),
            financial: FinancialConfig::default(),
            layout: LayoutConfig::default(),
            production: ProductionConfig::default(),
            irradiance: IrradianceConfig::default(),
            criteria: SiteCriteria::default(),
            vision: VisionConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load overrides from a JSON file on top of the built-in defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: AnalysisConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        debug!(path = %path.display(), panels = config.panels.len(), "loaded configuration");
        Ok(config)
    }

    /// Look up a panel by catalog key
    pub fn panel(&self, panel_type: &str) -> Result<PanelSpec> {
        self.panels.get(panel_type).copied().ok_or_else(|| AnalysisError::UnknownPanelType {
            requested: panel_type.to_string(),
            available: self.panels.keys().cloned().collect::<Vec<_>>().join(", "),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.panels.is_empty() {
            return Err(AnalysisError::Config("panel catalog is empty".into()));
        }
        for (name, p) in &self.panels {
            if !(p.wattage > 0.0 && p.area_per_panel > 0.0 && p.cost_per_watt >= 0.0) {
                return Err(AnalysisError::Config(format!(
                    "panel '{}' needs positive wattage and area and non-negative cost",
                    name
                )));
            }
            if !(0.0..=1.0).contains(&p.efficiency) {
                return Err(AnalysisError::Config(format!(
                    "panel '{}' efficiency {} not in 0.0-1.0",
                    name, p.efficiency
                )));
            }
        }

        let layout = &self.layout;
        if !(layout.spacing_factor > 0.0 && layout.spacing_factor <= 1.0) {
            return Err(AnalysisError::Config(format!(
                "spacing_factor {} not in (0, 1]",
                layout.spacing_factor
            )));
        }
        if layout.obstruction_panel_penalty < 0.0 || layout.min_usable_area_sqm < 0.0 {
            return Err(AnalysisError::Config(
                "obstruction penalty and minimum area must be non-negative".into(),
            ));
        }
        let factors = ShadingLevel::ALL.map(|level| layout.shading.factor(level));
        if factors.iter().any(|f| !(*f > 0.0 && *f <= 1.0)) {
            return Err(AnalysisError::Config("shading factors must be in (0, 1]".into()));
        }
        if factors.windows(2).any(|w| w[1] > w[0]) {
            return Err(AnalysisError::Config(
                "shading factors must not increase with shading severity".into(),
            ));
        }

        let weights = &self.production.monthly_weights;
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnalysisError::Config("monthly weights must be non-negative".into()));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(AnalysisError::Config("monthly weights sum to zero".into()));
        }
        if self.production.base_annual_yield_per_kw <= 0.0 {
            return Err(AnalysisError::Config("base_annual_yield_per_kw must be positive".into()));
        }

        if self.irradiance.bands.windows(2).any(|w| w[1].max_abs_latitude <= w[0].max_abs_latitude)
        {
            return Err(AnalysisError::Config("irradiance bands must ascend by latitude".into()));
        }
        if self.irradiance.bands.iter().any(|b| b.annual_kwh_per_m2 <= 0.0)
            || self.irradiance.high_latitude_kwh_per_m2 <= 0.0
        {
            return Err(AnalysisError::Config("irradiance values must be positive".into()));
        }

        let f = &self.financial;
        if !(0.0..1.0).contains(&f.federal_tax_credit) {
            return Err(AnalysisError::Config(format!(
                "federal_tax_credit {} not in [0, 1)",
                f.federal_tax_credit
            )));
        }
        if f.discount_rate <= -1.0 || f.irr_tolerance <= 0.0 || f.irr_max_iterations == 0 {
            return Err(AnalysisError::Config("invalid discount rate or IRR solver settings".into()));
        }
        if let InstallationPricing::Ratio { ratio } = self.installation
            && ratio < 0.0
        {
            return Err(AnalysisError::Config("installation ratio must be non-negative".into()));
        }
        Ok(())
    }
}

// ===================== TESTS =====================
