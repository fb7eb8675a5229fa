//! Financial Projection Module
//!
//! System costs, a fixed 25-year cash flow with electricity price escalation
//! and panel degradation, and the derived NPV, IRR and payback figures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{FinancialConfig, InstallationPricing, PanelSpec};
use crate::site::SiteParameters;

// ===================== CONSTANTS =====================

/// Length of the cash-flow projection (years)
pub const PROJECTION_YEARS: u32 = 25;

/// IRR search bracket
const IRR_LOWER: f64 = -0.99;
const IRR_UPPER: f64 = 10.0;

// ===================== RESULTS =====================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub equipment_cost: f64,
    pub installation_cost: f64,
    pub total_cost: f64,
    pub tax_credit: f64,
    pub net_cost: f64,
    /// Total cost per installed watt (0 for an empty system)
    pub cost_per_watt: f64,
}

/// One year of the projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlowYear {
    pub year: u32,
    pub production_kwh: f64,
    pub electricity_rate: f64,
    pub annual_savings: f64,
    pub cumulative_savings: f64,
    /// Cumulative savings minus net cost
    pub net_benefit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub first_year_savings: f64,
    pub monthly_savings: f64,
    pub lifetime_savings: f64,
    /// Return over the projection as a percentage of net cost
    pub roi_pct: f64,
}

/// Time for cumulative savings to recover the net cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payback {
    Years(f64),
    BeyondHorizon,
}

impl Payback {
    pub fn years(self) -> Option<f64> {
        match self {
            Payback::Years(y) => Some(y),
            Payback::BeyondHorizon => None,
        }
    }
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payback::Years(y) => write!(f, "{:.1} years", y),
            Payback::BeyondHorizon => write!(f, "beyond {} years", PROJECTION_YEARS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialResult {
    pub costs: CostBreakdown,
    pub cash_flow: Vec<CashFlowYear>,
    pub npv: f64,
    /// None when the cash flow has no sign change or the solver does not converge
    pub irr: Option<f64>,
    pub payback: Payback,
    pub savings: SavingsSummary,
}

// ===================== COSTS =====================

/// Calculate equipment, installation and net cost
///
/// An empty system costs nothing, fixed fees included.
pub fn system_costs(
    system_size_kw: f64,
    panel: &PanelSpec,
    installation: &InstallationPricing,
    financial: &FinancialConfig,
) -> CostBreakdown {
    if system_size_kw <= 0.0 {
        return CostBreakdown {
            equipment_cost: 0.0,
            installation_cost: 0.0,
            total_cost: 0.0,
            tax_credit: 0.0,
            net_cost: 0.0,
            cost_per_watt: 0.0,
        };
    }

    let watts = system_size_kw * 1000.0;
    let equipment = watts * panel.cost_per_watt;

    let installation_cost = match *installation {
        InstallationPricing::Itemized {
            base_cost_per_watt,
            inverter_cost_per_watt,
            electrical_cost,
            permit_cost,
            inspection_cost,
            labor_cost_per_hour,
            install_hours_per_kw,
        } => {
            watts * (base_cost_per_watt + inverter_cost_per_watt)
                + electrical_cost
                + permit_cost
                + inspection_cost
                + system_size_kw * install_hours_per_kw * labor_cost_per_hour
        }
        InstallationPricing::Ratio { ratio } => equipment * ratio,
    };

    let total = equipment + installation_cost;
    let tax_credit = total * financial.federal_tax_credit;

    CostBreakdown {
        equipment_cost: equipment,
        installation_cost,
        total_cost: total,
        tax_credit,
        net_cost: total - tax_credit,
        cost_per_watt: total / watts,
    }
}

// ===================== CASH FLOW METRICS =====================

/// Present value of yearly savings (year 1 discounted once) minus the initial cost
pub fn net_present_value(rate: f64, initial_cost: f64, savings: &[f64]) -> f64 {
    let discounted: f64 = savings
        .iter()
        .enumerate()
        .map(|(i, s)| s / (1.0 + rate).powi(i as i32 + 1))
        .sum();
    discounted - initial_cost
}

/// Internal rate of return by bisection on the NPV function
///
/// # Arguments
/// * `initial_cost` - Year 0 outflow
/// * `savings` - Inflows for years 1..n
/// * `tolerance` - Convergence threshold on both rate interval and NPV
/// * `max_iterations` - Iteration bound
///
/// # Returns
/// Some(rate) in [-0.99, 10], or None when the bracket has no sign change
/// or the iteration bound is reached first
pub fn internal_rate_of_return(
    initial_cost: f64,
    savings: &[f64],
    tolerance: f64,
    max_iterations: u32,
) -> Option<f64> {
    let npv = |r: f64| net_present_value(r, initial_cost, savings);

    let mut a = IRR_LOWER;
    let mut b = IRR_UPPER;
    let mut fa = npv(a);
    let fb = npv(b);

    if !fa.is_finite() || !fb.is_finite() {
        return None;
    }
    // An all-zero flow has no root even though NPV is exactly 0 everywhere
    if fa == 0.0 && fb == 0.0 || fa.signum() == fb.signum() {
        return None;
    }

    for _ in 0..max_iterations {
        let m = (a + b) / 2.0;
        let fm = npv(m);

        if !fm.is_finite() {
            return None;
        }

        if fm.abs() < tolerance || (b - a) / 2.0 < tolerance {
            return Some(m);
        }

        if fm.signum() == fa.signum() {
            a = m;
            fa = fm;
        } else {
            b = m;
        }
    }

    None
}

/// Fractional payback year, interpolated within the year the net cost is recovered
fn payback_period(net_cost: f64, cash_flow: &[CashFlowYear]) -> Payback {
    if !cash_flow.iter().any(|y| y.annual_savings > 0.0) {
        return Payback::BeyondHorizon;
    }
    if net_cost <= 0.0 {
        return Payback::Years(0.0);
    }

    let mut previous = 0.0;
    for year in cash_flow {
        if year.cumulative_savings >= net_cost && year.annual_savings > 0.0 {
            let fraction = (net_cost - previous) / year.annual_savings;
            return Payback::Years(f64::from(year.year - 1) + fraction);
        }
        previous = year.cumulative_savings;
    }
    Payback::BeyondHorizon
}

// ===================== PROJECTION =====================

/// Build the full financial projection for a system
///
/// # Arguments
/// * `system_size_kw` - Nameplate capacity
/// * `annual_kwh` - First-year production
/// * `site` - Supplies the starting electricity rate
/// * `panel` - Supplies the equipment price
/// * `installation` - Installation cost convention
/// * `financial` - Credit, escalation, degradation, discount and solver settings
pub fn project(
    system_size_kw: f64,
    annual_kwh: f64,
    site: &SiteParameters,
    panel: &PanelSpec,
    installation: &InstallationPricing,
    financial: &FinancialConfig,
) -> FinancialResult {
    let costs = system_costs(system_size_kw, panel, installation, financial);

    let mut cumulative = 0.0;
    let cash_flow: Vec<CashFlowYear> = (1..=PROJECTION_YEARS)
        .map(|year| {
            let elapsed = (year - 1) as i32;
            let production = annual_kwh * (1.0 - financial.system_degradation).powi(elapsed);
            let rate =
                site.electricity_rate_per_kwh * (1.0 + financial.annual_rate_increase).powi(elapsed);
            let savings = production * rate;
            cumulative += savings;
            CashFlowYear {
                year,
                production_kwh: production,
                electricity_rate: rate,
                annual_savings: savings,
                cumulative_savings: cumulative,
                net_benefit: cumulative - costs.net_cost,
            }
        })
        .collect();

    let yearly: Vec<f64> = cash_flow.iter().map(|y| y.annual_savings).collect();
    let npv = net_present_value(financial.discount_rate, costs.net_cost, &yearly);
    let irr = internal_rate_of_return(
        costs.net_cost,
        &yearly,
        financial.irr_tolerance,
        financial.irr_max_iterations,
    );
    let payback = payback_period(costs.net_cost, &cash_flow);

    let first_year = yearly.first().copied().unwrap_or(0.0);
    let lifetime: f64 = yearly.iter().sum();
    let roi_pct =
        if costs.net_cost > 0.0 { (lifetime - costs.net_cost) / costs.net_cost * 100.0 } else { 0.0 };

    FinancialResult {
        costs,
        cash_flow,
        npv,
        irr,
        payback,
        savings: SavingsSummary {
            first_year_savings: first_year,
            monthly_savings: first_year / 12.0,
            lifetime_savings: lifetime,
            roi_pct,
        },
    }
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    fn site_with_rate(rate: f64) -> SiteParameters {
        SiteParameters { electricity_rate_per_kwh: rate, ..Default::default() }
    }

    fn demo_projection(rate: f64) -> FinancialResult {
        let config = AnalysisConfig::default();
        let panel = config.panel("standard_residential").unwrap();
        project(20.8, 9076.0, &site_with_rate(rate), &panel, &config.installation, &config.financial)
    }

    #[test]
    fn test_itemized_costs_for_demo_system() {
        let config = AnalysisConfig::default();
        let panel = config.panel("standard_residential").unwrap();
        let costs = system_costs(20.8, &panel, &config.installation, &config.financial);

        assert!((costs.equipment_cost - 72_800.0).abs() < 1e-6);
        // 20800 W * 1.80 + 2800 fixed + 20.8 kW * 8 h * 75
        assert!((costs.installation_cost - 52_720.0).abs() < 1e-6, "{}", costs.installation_cost);
        assert!((costs.total_cost - 125_520.0).abs() < 1e-6);
        assert!((costs.net_cost - 87_864.0).abs() < 1e-6, "Net {}", costs.net_cost);
        assert!((costs.cost_per_watt - 125_520.0 / 20_800.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_installation() {
        let config = AnalysisConfig::default();
        let panel = config.panel("standard_residential").unwrap();
        let pricing = InstallationPricing::Ratio { ratio: 0.5 };
        let costs = system_costs(10.0, &panel, &pricing, &config.financial);
        assert!((costs.installation_cost - costs.equipment_cost * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_projection_has_full_horizon() {
        let result = demo_projection(0.13);
        assert_eq!(result.cash_flow.len(), PROJECTION_YEARS as usize);
        assert_eq!(result.cash_flow[0].year, 1);
        assert!(result.cash_flow.windows(2).all(|w| w[1].cumulative_savings >= w[0].cumulative_savings));
        // Degradation and escalation both apply from year 2
        assert!(result.cash_flow[1].production_kwh < result.cash_flow[0].production_kwh);
        assert!(result.cash_flow[1].electricity_rate > result.cash_flow[0].electricity_rate);
    }

    #[test]
    fn test_low_rate_never_pays_back() {
        let result = demo_projection(0.13);
        assert_eq!(result.payback, Payback::BeyondHorizon);
        assert!(result.npv < 0.0);
        assert!(result.savings.lifetime_savings < result.costs.net_cost);
    }

    #[test]
    fn test_higher_rate_shortens_payback() {
        let low = demo_projection(0.40).payback.years().unwrap();
        let high = demo_projection(0.45).payback.years().unwrap();
        assert!(high < low, "Payback at 0.45 ({}) should beat 0.40 ({})", high, low);
        assert!(low > 0.0 && low < 25.0);
    }

    #[test]
    fn test_irr_zeroes_npv() {
        let result = demo_projection(0.45);
        let irr = result.irr.expect("profitable system should have an IRR");
        let yearly: Vec<f64> = result.cash_flow.iter().map(|y| y.annual_savings).collect();
        let npv_at_irr = net_present_value(irr, result.costs.net_cost, &yearly);
        // Rate tolerance 1e-6 bounds the NPV residual well under 0.01 % of cost
        assert!(npv_at_irr.abs() < result.costs.net_cost * 1e-4, "NPV at IRR {} is {}", irr, npv_at_irr);
    }

    #[test]
    fn test_zero_production() {
        let result = demo_projection_with_kwh(0.0);
        assert!((result.npv + result.costs.net_cost).abs() < 1e-9);
        assert_eq!(result.irr, None);
        assert_eq!(result.payback, Payback::BeyondHorizon);
    }

    fn demo_projection_with_kwh(kwh: f64) -> FinancialResult {
        let config = AnalysisConfig::default();
        let panel = config.panel("standard_residential").unwrap();
        project(20.8, kwh, &site_with_rate(0.13), &panel, &config.installation, &config.financial)
    }

    #[test]
    fn test_empty_system_costs_nothing() {
        let config = AnalysisConfig::default();
        let panel = config.panel("standard_residential").unwrap();
        let result =
            project(0.0, 0.0, &site_with_rate(0.13), &panel, &config.installation, &config.financial);

        assert_eq!(result.costs.total_cost, 0.0);
        assert_eq!(result.costs.cost_per_watt, 0.0);
        assert_eq!(result.npv, 0.0);
        assert_eq!(result.savings.roi_pct, 0.0);
        assert_eq!(result.payback, Payback::BeyondHorizon);
    }

    #[test]
    fn test_irr_known_annuity() {
        // 1000 now, 1100 next year: exactly 10 %
        let irr = internal_rate_of_return(1000.0, &[1100.0], 1e-9, 200).unwrap();
        assert!((irr - 0.10).abs() < 1e-6, "IRR {}", irr);
    }

    #[test]
    fn test_irr_undefined_when_iterations_run_out() {
        // A single halving of [-0.99, 10] cannot reach 1e-12
        assert_eq!(internal_rate_of_return(1000.0, &[1100.0], 1e-12, 1), None);
        assert!(internal_rate_of_return(1000.0, &[1100.0], 1e-12, 200).is_some());
    }

    #[test]
    fn test_payback_display() {
        assert_eq!(Payback::Years(7.34).to_string(), "7.3 years");
        assert_eq!(Payback::BeyondHorizon.to_string(), "beyond 25 years");
    }
}
