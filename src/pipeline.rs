//! Analysis Pipeline
//!
//! Runs the calculation stages in order for one roof and one site and
//! collects their results into a single report.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, PanelSpec};
use crate::error::Result;
use crate::finance::{self, FinancialResult};
use crate::irradiance::{self, IrradianceResult};
use crate::layout::{self, LayoutResult};
use crate::orientation::{self, OrientationConstraints, OrientationOptimum};
use crate::production::{self, ProductionResult};
use crate::roof::RoofDescription;
use crate::site::SiteParameters;
use crate::summary::{self, SolarSummary};

/// Where the roof description came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    Vision { model: String },
    File { path: String },
    Demo,
    /// Demo roof substituted after the vision request failed
    Fallback { reason: String },
}

impl Provenance {
    pub fn describe(&self) -> String {
        match self {
            Provenance::Vision { model } => format!("image analysis ({})", model),
            Provenance::File { path } => format!("roof file {}", path),
            Provenance::Demo => "demo roof".to_string(),
            Provenance::Fallback { reason } => format!("demo roof (image analysis failed: {})", reason),
        }
    }
}

/// Roof description tagged with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedRoof {
    pub roof: RoofDescription,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPanel {
    pub panel_type: String,
    #[serde(flatten)]
    pub spec: PanelSpec,
}

/// Complete result of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub provenance: Provenance,
    pub roof: RoofDescription,
    pub site: SiteParameters,
    pub panel: SelectedPanel,
    pub irradiance: IrradianceResult,
    pub orientation: OrientationOptimum,
    /// Roof plane multiplier relative to the site optimum
    pub orientation_efficiency: f64,
    pub layout: LayoutResult,
    pub production: ProductionResult,
    pub financial: FinancialResult,
    pub summary: SolarSummary,
}

/// Run every stage for a roof and site
///
/// Degenerate roofs produce a "not suitable" report; only invalid inputs
/// and unknown panel types are errors.
pub fn analyze(sourced: SourcedRoof, site: &SiteParameters, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let SourcedRoof { roof, provenance } = sourced;
    roof.validate().and_then(|()| site.validate()).inspect_err(|e| {
        warn!(field = e.field().unwrap_or("unknown"), error = %e, "input rejected");
    })?;
    let panel = config.panel(&site.panel_type)?;

    info!(source = %provenance.describe(), panel = %site.panel_type, "starting analysis");

    let irradiance =
        irradiance::irradiance(site.latitude, roof.tilt_degrees, roof.azimuth_deg(), &config.irradiance);
    debug!(
        annual = irradiance.annual_irradiance,
        tilt_factor = irradiance.tilt_factor,
        azimuth_factor = irradiance.azimuth_factor,
        "irradiance"
    );

    let constraints = OrientationConstraints::default()
        .with_tilt_range(config.criteria.min_tilt_deg, config.criteria.max_tilt_deg);
    let optimum = orientation::optimal_orientation(site.latitude, &constraints, &config.irradiance);
    let orientation_efficiency = optimum.efficiency_of(irradiance.multiplier());
    debug!(
        tilt = optimum.tilt_deg,
        azimuth = optimum.azimuth_deg,
        efficiency = orientation_efficiency,
        "optimal orientation"
    );

    let layout = layout::estimate_layout(&roof, &panel, &config.layout);
    debug!(panels = layout.panel_count, size_kw = layout.system_size_kw, "layout");

    let production = production::estimate_production(
        layout.system_size_kw,
        irradiance.multiplier(),
        site.shading_adjustment,
        &config.production,
    );
    debug!(annual_kwh = production.annual_kwh, "production");

    let financial = finance::project(
        layout.system_size_kw,
        production.annual_kwh,
        site,
        &panel,
        &config.installation,
        &config.financial,
    );
    debug!(net_cost = financial.costs.net_cost, npv = financial.npv, payback = %financial.payback, "financials");

    let summary = summary::summarize(
        &roof,
        &layout,
        &production,
        &financial,
        orientation_efficiency,
        &config.criteria,
    );
    info!(rating = %summary.rating, size_kw = layout.system_size_kw, "analysis complete");

    Ok(AnalysisReport {
        provenance,
        roof,
        site: site.clone(),
        panel: SelectedPanel { panel_type: site.panel_type.clone(), spec: panel },
        irradiance,
        orientation: optimum,
        orientation_efficiency,
        layout,
        production,
        financial,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::finance::Payback;
    use crate::roof::ObstructionCounts;
    use crate::summary::Feasibility;

    fn demo() -> SourcedRoof {
        SourcedRoof { roof: RoofDescription::demo_fixture(), provenance: Provenance::Demo }
    }

    #[test]
    fn test_demo_report() {
        let report = analyze(demo(), &SiteParameters::default(), &AnalysisConfig::default()).unwrap();

        assert_eq!(report.layout.panel_count, 52);
        assert!(
            report.production.annual_kwh > 9000.0 && report.production.annual_kwh < 9150.0,
            "Annual {}",
            report.production.annual_kwh
        );
        assert_eq!(report.financial.cash_flow.len(), 25);
        assert_eq!(report.financial.payback, Payback::BeyondHorizon);
        assert!(report.orientation_efficiency > 0.95 && report.orientation_efficiency <= 1.0);
        assert_eq!(report.summary.rating, Feasibility::ConsiderWithCaution);
    }

    #[test]
    fn test_unknown_panel_is_an_error() {
        let site = SiteParameters { panel_type: "thin_film".to_string(), ..Default::default() };
        let err = analyze(demo(), &site, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownPanelType { .. }));
    }

    #[test]
    fn test_invalid_roof_is_rejected_before_calculation() {
        let mut sourced = demo();
        sourced.roof.usable_area_sqm = 500.0;
        let err = analyze(sourced, &SiteParameters::default(), &AnalysisConfig::default()).unwrap_err();
        assert_eq!(err.field(), Some("roof.usable_area_sqm"));
    }

    #[test]
    fn test_zero_area_roof_reports_not_suitable() {
        let mut sourced = demo();
        sourced.roof.usable_area_sqm = 0.0;
        let report = analyze(sourced, &SiteParameters::default(), &AnalysisConfig::default()).unwrap();
        assert_eq!(report.layout.panel_count, 0);
        assert_eq!(report.financial.costs.net_cost, 0.0);
        assert_eq!(report.financial.irr, None);
        assert_eq!(report.summary.rating, Feasibility::NotSuitable);
    }

    #[test]
    fn test_saturated_obstructions_leave_no_panels() {
        let mut sourced = demo();
        sourced.roof.obstructions = ObstructionCounts { chimneys: u32::MAX, vents: 1, ..Default::default() };
        let report = analyze(sourced, &SiteParameters::default(), &AnalysisConfig::default()).unwrap();
        assert_eq!(report.layout.panel_count, 0);
        assert_eq!(report.layout.panels_lost_to_obstructions, 78.0);
    }

    #[test]
    fn test_provenance_serializes_with_source_tag() {
        let json = serde_json::to_string(&Provenance::Fallback { reason: "timeout".into() }).unwrap();
        assert_eq!(json, r#"{"source":"fallback","reason":"timeout"}"#);
    }
}
