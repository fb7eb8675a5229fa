//! Recommendation Summary
//!
//! Threshold logic that turns the numeric results into ratings and advice.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SiteCriteria;
use crate::finance::{FinancialResult, Payback};
use crate::layout::LayoutResult;
use crate::production::ProductionResult;
use crate::roof::{RoofCondition, RoofDescription, ShadingLevel};

const SMALL_SYSTEM_KW: f64 = 3.0;
const LARGE_SYSTEM_KW: f64 = 10.0;

const NEXT_STEPS: [&str; 5] = [
    "Get professional site assessment",
    "Obtain multiple installer quotes",
    "Check local permitting requirements",
    "Verify utility net metering policies",
    "Consider financing options",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Rating {
    fn score(self) -> f64 {
        match self {
            Rating::Excellent => 4.0,
            Rating::Good => 3.0,
            Rating::Fair => 2.0,
            Rating::Poor => 1.0,
        }
    }

    fn from_score(score: f64) -> Self {
        if score >= 3.5 {
            Rating::Excellent
        } else if score >= 2.5 {
            Rating::Good
        } else if score >= 1.5 {
            Rating::Fair
        } else {
            Rating::Poor
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::Fair => "fair",
            Rating::Poor => "poor",
        })
    }
}

/// Overall verdict on the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feasibility {
    HighlyRecommended,
    Recommended,
    ConsiderWithCaution,
    NotRecommended,
    /// No panels fit the roof
    NotSuitable,
}

impl fmt::Display for Feasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feasibility::HighlyRecommended => "Highly Recommended",
            Feasibility::Recommended => "Recommended",
            Feasibility::ConsiderWithCaution => "Consider with Caution",
            Feasibility::NotRecommended => "Not Recommended",
            Feasibility::NotSuitable => "Not Suitable",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarSummary {
    pub rating: Feasibility,
    pub roof_rating: Rating,
    pub financial_rating: Rating,
    pub advantages: Vec<String>,
    pub challenges: Vec<String>,
    pub recommendations: Vec<String>,
    /// Items to resolve before installation
    pub priority_items: Vec<String>,
    pub next_steps: Vec<String>,
}

fn condition_rating(condition: RoofCondition) -> Rating {
    match condition {
        RoofCondition::Excellent => Rating::Excellent,
        RoofCondition::Good => Rating::Good,
        RoofCondition::Fair => Rating::Fair,
        RoofCondition::Poor => Rating::Poor,
    }
}

fn shading_rating(level: ShadingLevel) -> Rating {
    match level {
        ShadingLevel::None | ShadingLevel::Minimal => Rating::Excellent,
        ShadingLevel::Light => Rating::Good,
        ShadingLevel::Moderate => Rating::Fair,
        ShadingLevel::Heavy => Rating::Poor,
    }
}

fn orientation_rating(efficiency: f64) -> Rating {
    if efficiency >= 0.95 {
        Rating::Excellent
    } else if efficiency >= 0.85 {
        Rating::Good
    } else if efficiency >= 0.70 {
        Rating::Fair
    } else {
        Rating::Poor
    }
}

/// Rate the roof from condition, shading and orientation
pub fn roof_rating(roof: &RoofDescription, layout: &LayoutResult, orientation_efficiency: f64) -> Rating {
    if layout.panel_count == 0 {
        return Rating::Poor;
    }
    let score = (condition_rating(roof.roof_condition).score()
        + shading_rating(roof.shading_level).score()
        + orientation_rating(orientation_efficiency).score())
        / 3.0;
    Rating::from_score(score)
}

/// Rate the investment from the payback period
pub fn financial_rating(payback: Payback) -> Rating {
    match payback.years() {
        Some(y) if y < 7.0 => Rating::Excellent,
        Some(y) if y < 10.0 => Rating::Good,
        Some(y) if y < 15.0 => Rating::Fair,
        _ => Rating::Poor,
    }
}

fn feasibility(roof: Rating, financial: Rating) -> Feasibility {
    let total = (roof.score() + financial.score()) / 2.0;
    if total >= 3.5 {
        Feasibility::HighlyRecommended
    } else if total >= 2.5 {
        Feasibility::Recommended
    } else if total >= 1.5 {
        Feasibility::ConsiderWithCaution
    } else {
        Feasibility::NotRecommended
    }
}

fn payback_advice(payback: Payback) -> &'static str {
    match financial_rating(payback) {
        Rating::Excellent => "Excellent financial return - highly recommended",
        Rating::Good => "Good financial return - recommended",
        Rating::Fair => "Moderate return - consider if environmental benefits are important",
        Rating::Poor => "Long payback period - may not be financially optimal",
    }
}

/// Assemble ratings and advice for a completed analysis
///
/// # Arguments
/// * `roof` - Roof the analysis ran on
/// * `layout` - Panel layout estimate
/// * `production` - Energy estimate
/// * `financial` - Cost and cash-flow projection
/// * `orientation_efficiency` - Roof plane multiplier relative to the site optimum
/// * `criteria` - Tilt and azimuth windows considered favourable
pub fn summarize(
    roof: &RoofDescription,
    layout: &LayoutResult,
    production: &ProductionResult,
    financial: &FinancialResult,
    orientation_efficiency: f64,
    criteria: &SiteCriteria,
) -> SolarSummary {
    let mut advantages = Vec::new();
    let mut challenges = Vec::new();
    let mut recommendations = Vec::new();
    let mut priority_items = Vec::new();

    let roof_rating = roof_rating(roof, layout, orientation_efficiency);
    let financial_rating = financial_rating(financial.payback);

    if !layout.suitable || layout.panel_count == 0 {
        challenges.push(format!(
            "Usable area of {:.0} m² leaves no room for panels",
            roof.usable_area_sqm
        ));
        recommendations.push("Rooftop solar is not practical for this roof".to_string());
        return SolarSummary {
            rating: Feasibility::NotSuitable,
            roof_rating,
            financial_rating,
            advantages,
            challenges,
            recommendations,
            priority_items,
            next_steps: NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
        };
    }

    // Roof structure
    match roof.roof_condition {
        RoofCondition::Excellent | RoofCondition::Good => {
            advantages.push(format!("Roof in {} condition", condition_rating(roof.roof_condition)));
        }
        RoofCondition::Fair | RoofCondition::Poor => {
            challenges.push(format!("Roof in {} condition", condition_rating(roof.roof_condition)));
            recommendations
                .push("Consider roof repairs or replacement before solar installation".to_string());
            priority_items.push("roof_condition".to_string());
        }
    }

    // Orientation
    let azimuth_off = (roof.azimuth_deg() - criteria.optimal_azimuth_deg).abs();
    if azimuth_off <= criteria.azimuth_tolerance_deg {
        advantages.push(format!("{}-facing main roof plane", capitalize(&roof.primary_direction.to_string())));
    } else {
        challenges.push(format!("Main roof plane faces {}", roof.primary_direction));
    }
    if (criteria.min_tilt_deg..=criteria.max_tilt_deg).contains(&roof.tilt_degrees) {
        advantages.push(format!("Roof pitch of {:.0}° suits fixed mounting", roof.tilt_degrees));
    } else {
        challenges.push(format!("Roof pitch of {:.0}° is outside the ideal range", roof.tilt_degrees));
    }
    if orientation_efficiency < criteria.min_orientation_efficiency {
        recommendations.push(format!(
            "Roof reaches {:.0}% of the best orientation - consider tilted racking",
            orientation_efficiency * 100.0
        ));
    }
    if roof.multiple_orientations {
        challenges.push("Multiple roof orientations; estimate uses the main plane only".to_string());
    }

    // Obstructions and shading
    let obstructions = roof.obstructions.total();
    if obstructions == 0 {
        advantages.push("No roof obstructions".to_string());
    } else {
        challenges.push(format!("{} roof obstructions reduce panel space", obstructions));
    }
    if roof.shading_level <= ShadingLevel::Minimal {
        advantages.push("Little or no shading".to_string());
    } else if roof.shading_level >= ShadingLevel::Moderate {
        challenges.push(format!("{} shading", capitalize(&roof.shading_level.to_string())));
        recommendations.push("Consider tree trimming or removal to reduce shading".to_string());
        recommendations
            .push("Evaluate micro-inverters or power optimizers for shaded areas".to_string());
    }

    // Financials
    recommendations.push(payback_advice(financial.payback).to_string());
    if financial.npv > 0.0 {
        advantages.push(format!("Positive 25-year net present value (${:.0})", financial.npv));
    }
    if production.annual_kwh > 0.0 && financial.costs.net_cost > financial.savings.lifetime_savings {
        challenges.push("Lifetime savings do not cover the net system cost".to_string());
    }

    // System size
    if layout.system_size_kw < SMALL_SYSTEM_KW {
        recommendations.push("Small system size - consider if it meets your energy needs".to_string());
    } else if layout.system_size_kw > LARGE_SYSTEM_KW {
        recommendations.push("Large system - verify electrical panel capacity".to_string());
    }

    SolarSummary {
        rating: feasibility(roof_rating, financial_rating),
        roof_rating,
        financial_rating,
        advantages,
        challenges,
        recommendations,
        priority_items,
        next_steps: NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::finance;
    use crate::layout::estimate_layout;
    use crate::production::estimate_production;
    use crate::site::SiteParameters;

    fn run(roof: &RoofDescription, rate: f64, efficiency: f64) -> SolarSummary {
        let config = AnalysisConfig::default();
        let panel = config.panel("standard_residential").unwrap();
        let site = SiteParameters { electricity_rate_per_kwh: rate, ..Default::default() };
        let layout = estimate_layout(roof, &panel, &config.layout);
        let production = estimate_production(layout.system_size_kw, 1.5644, 1.0, &config.production);
        let financial = finance::project(
            layout.system_size_kw,
            production.annual_kwh,
            &site,
            &panel,
            &config.installation,
            &config.financial,
        );
        summarize(roof, &layout, &production, &financial, efficiency, &config.criteria)
    }

    #[test]
    fn test_demo_roof_at_low_rate() {
        let summary = run(&RoofDescription::demo_fixture(), 0.13, 0.978);

        assert_eq!(summary.roof_rating, Rating::Good);
        assert_eq!(summary.financial_rating, Rating::Poor);
        assert_eq!(summary.rating, Feasibility::ConsiderWithCaution);
        assert!(summary.recommendations.iter().any(|r| r.starts_with("Long payback period")));
        assert!(summary.recommendations.iter().any(|r| r.contains("tree trimming")));
        assert!(summary.recommendations.iter().any(|r| r.starts_with("Large system")));
        assert!(summary.priority_items.is_empty());
        assert_eq!(summary.next_steps.len(), 5);
    }

    #[test]
    fn test_poor_roof_is_a_priority() {
        let roof = RoofDescription { roof_condition: RoofCondition::Poor, ..RoofDescription::demo_fixture() };
        let summary = run(&roof, 0.13, 0.978);
        assert_eq!(summary.priority_items, vec!["roof_condition".to_string()]);
        assert!(summary.recommendations[0].contains("roof repairs"));
    }

    #[test]
    fn test_empty_roof_is_not_suitable() {
        let roof = RoofDescription {
            roof_area_sqm: 20.0,
            usable_area_sqm: 10.0,
            ..RoofDescription::demo_fixture()
        };
        let summary = run(&roof, 0.13, 0.978);
        assert_eq!(summary.rating, Feasibility::NotSuitable);
        assert_eq!(summary.roof_rating, Rating::Poor);
    }

    #[test]
    fn test_low_orientation_suggests_racking() {
        let summary = run(&RoofDescription::demo_fixture(), 0.13, 0.5);
        assert!(summary.recommendations.iter().any(|r| r.contains("tilted racking")));
    }

    #[test]
    fn test_financial_rating_thresholds() {
        assert_eq!(financial_rating(Payback::Years(6.9)), Rating::Excellent);
        assert_eq!(financial_rating(Payback::Years(7.0)), Rating::Good);
        assert_eq!(financial_rating(Payback::Years(14.9)), Rating::Fair);
        assert_eq!(financial_rating(Payback::Years(15.0)), Rating::Poor);
        assert_eq!(financial_rating(Payback::BeyondHorizon), Rating::Poor);
    }

    #[test]
    fn test_feasibility_thresholds() {
        assert_eq!(feasibility(Rating::Excellent, Rating::Good), Feasibility::HighlyRecommended);
        assert_eq!(feasibility(Rating::Good, Rating::Good), Feasibility::Recommended);
        assert_eq!(feasibility(Rating::Good, Rating::Poor), Feasibility::ConsiderWithCaution);
        assert_eq!(feasibility(Rating::Poor, Rating::Poor), Feasibility::NotRecommended);
        assert_eq!(Feasibility::ConsiderWithCaution.to_string(), "Consider with Caution");
    }
}
