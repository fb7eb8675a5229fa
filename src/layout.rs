//! Panel Layout Estimation
//!
//! Estimates how many panels fit on the usable roof area after spacing
//! clearances, obstruction losses and shading derating.

use serde::{Deserialize, Serialize};

use crate::config::{LayoutConfig, PanelSpec};
use crate::roof::RoofDescription;

/// Panel placement estimate for one roof
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub panel_count: u32,
    /// Nameplate DC capacity (kW)
    pub system_size_kw: f64,
    /// Panels that fit the spaced usable area before any losses
    pub max_panels_by_area: u32,
    /// Panel equivalents removed for obstructions
    pub panels_lost_to_obstructions: f64,
    pub shading_factor: f64,
    pub spacing_factor: f64,
    /// Area covered by the installed panels (m²)
    pub total_panel_area_sqm: f64,
    /// Installed panel area as a share of the usable roof area (%)
    pub roof_coverage_pct: f64,
    /// Installed panels relative to `max_panels_by_area`
    pub layout_efficiency: f64,
    /// False when the usable area is below the configured minimum
    pub suitable: bool,
}

impl LayoutResult {
    fn empty(spacing_factor: f64, shading_factor: f64) -> Self {
        Self {
            panel_count: 0,
            system_size_kw: 0.0,
            max_panels_by_area: 0,
            panels_lost_to_obstructions: 0.0,
            shading_factor,
            spacing_factor,
            total_panel_area_sqm: 0.0,
            roof_coverage_pct: 0.0,
            layout_efficiency: 0.0,
            suitable: false,
        }
    }
}

/// Estimate the panel layout for a roof
///
/// # Arguments
/// * `roof` - Validated roof description
/// * `panel` - Selected panel model
/// * `config` - Spacing, obstruction and shading parameters
///
/// # Returns
/// LayoutResult; a roof that is too small yields zero panels, not an error
pub fn estimate_layout(roof: &RoofDescription, panel: &PanelSpec, config: &LayoutConfig) -> LayoutResult {
    let shading_factor = config.shading.factor(roof.shading_level);

    if roof.usable_area_sqm < config.min_usable_area_sqm {
        return LayoutResult::empty(config.spacing_factor, shading_factor);
    }

    let effective_area = roof.usable_area_sqm * config.spacing_factor;
    let max_by_area = (effective_area / panel.area_per_panel).floor().max(0.0);
    let penalty = f64::from(roof.obstructions.total()) * config.obstruction_panel_penalty;

    let after_obstructions = (max_by_area - penalty).max(0.0);
    let panel_count = (after_obstructions * shading_factor).floor() as u32;

    let total_panel_area = f64::from(panel_count) * panel.area_per_panel;
    let roof_coverage_pct = if roof.usable_area_sqm > 0.0 {
        total_panel_area / roof.usable_area_sqm * 100.0
    } else {
        0.0
    };
    let layout_efficiency =
        if max_by_area > 0.0 { f64::from(panel_count) / max_by_area } else { 0.0 };

    LayoutResult {
        panel_count,
        system_size_kw: f64::from(panel_count) * panel.wattage / 1000.0,
        max_panels_by_area: max_by_area as u32,
        panels_lost_to_obstructions: penalty.min(max_by_area),
        shading_factor,
        spacing_factor: config.spacing_factor,
        total_panel_area_sqm: total_panel_area,
        roof_coverage_pct,
        layout_efficiency,
        suitable: true,
    }
}
