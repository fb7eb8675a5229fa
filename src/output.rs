//! Output Formatting Module
//!
//! Terminal rendering of an analysis report and the small formatting helpers
//! it uses.

use std::collections::BTreeMap;

use crate::config::PanelSpec;
use crate::finance::CashFlowYear;
use crate::pipeline::AnalysisReport;

const MONTHS: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Trees absorbing one tonne of CO₂ per year
const TREES_PER_TON_CO2: f64 = 16.0;

// ===================== FORMATTERS =====================

/// Format power for display
pub fn format_power(kw: f64) -> String {
    if kw >= 1.0 { format!("{:.2} kW", kw) } else { format!("{:.0} W", kw * 1000.0) }
}

/// Format energy for display
pub fn format_energy(kwh: f64) -> String {
    if kwh >= 10_000.0 {
        format!("{:.2} MWh", kwh / 1000.0)
    } else {
        format!("{:.0} kWh", kwh)
    }
}

/// Format a dollar amount with thousands separators, no cents
pub fn format_currency(usd: f64) -> String {
    let rounded = usd.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 { format!("-${}", grouped) } else { format!("${}", grouped) }
}

fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

// ===================== TERMINAL OUTPUT =====================

/// Print the full report to stdout.
///
/// # Arguments
/// * `report` - Completed analysis
/// * `show_cash_flow` - Include the yearly cash-flow table
pub fn print_report(report: &AnalysisReport, show_cash_flow: bool) {
    let roof = &report.roof;
    let layout = &report.layout;
    let production = &report.production;
    let financial = &report.financial;
    let summary = &report.summary;

    println!("=== Rooftop Solar Assessment ===");
    println!("Source      : {}", report.provenance.describe());
    println!("Location    : {:.4}°, {:.4}°", report.site.latitude, report.site.longitude);
    println!("Assessment  : {}", summary.rating);
    println!(
        "Ratings     : roof {} | financial {}",
        summary.roof_rating, summary.financial_rating
    );
    println!();

    println!("=== Roof ===");
    println!(
        "Area        : {:.0} m² total, {:.0} m² usable",
        roof.roof_area_sqm, roof.usable_area_sqm
    );
    println!(
        "Orientation : {} ({:.0}°) @ {:.0}° tilt",
        roof.primary_direction,
        roof.azimuth_deg(),
        roof.tilt_degrees
    );
    println!(
        "Obstructions: {} | Shading: {} | Condition: {:?}",
        roof.obstructions.total(),
        roof.shading_level,
        roof.roof_condition
    );
    println!(
        "Irradiance  : {:.0} kWh/m²/yr (tilt factor {:.3}, azimuth factor {:.3})",
        report.irradiance.annual_irradiance,
        report.irradiance.tilt_factor,
        report.irradiance.azimuth_factor
    );
    println!(
        "Best plane  : {:.1}° tilt, {:.0}° azimuth ({} of optimum reached)",
        report.orientation.tilt_deg,
        report.orientation.azimuth_deg,
        format_percent(report.orientation_efficiency)
    );
    println!();

    println!("=== System ===");
    println!(
        "Panels      : {} x {} ({:.0} W, {:.0}% efficient)",
        layout.panel_count,
        report.panel.panel_type,
        report.panel.spec.wattage,
        report.panel.spec.efficiency * 100.0
    );
    println!("Size        : {}", format_power(layout.system_size_kw));
    println!(
        "Coverage    : {:.1} m² ({:.1}% of usable area)",
        layout.total_panel_area_sqm, layout.roof_coverage_pct
    );
    println!("Annual      : {}", format_energy(production.annual_kwh));
    println!("Daily avg.  : {:.1} kWh", production.daily_average_kwh);
    println!(
        "Losses      : {} system efficiency, {} capacity factor",
        format_percent(production.system_efficiency),
        format_percent(production.capacity_factor)
    );
    println!(
        "CO₂ offset  : {:.2} t/yr (about {:.0} trees planted yearly)",
        production.co2_offset_tons,
        production.co2_offset_tons * TREES_PER_TON_CO2
    );
    println!();

    if production.annual_kwh > 0.0 {
        println!("Monthly production:");
        for (name, kwh) in MONTHS.iter().zip(&production.monthly_kwh) {
            println!("  {}  {:>10.0} kWh", name, kwh);
        }
        println!();
    }

    println!("=== Financials ===");
    println!("Equipment   : {:>12}", format_currency(financial.costs.equipment_cost));
    println!("Installation: {:>12}", format_currency(financial.costs.installation_cost));
    println!("Total       : {:>12}", format_currency(financial.costs.total_cost));
    println!("Tax credit  : {:>12}", format_currency(-financial.costs.tax_credit));
    println!("Net cost    : {:>12}", format_currency(financial.costs.net_cost));
    println!("Cost / watt : {:>12.2}", financial.costs.cost_per_watt);
    println!();
    println!(
        "Savings     : {}/yr first year, {}/month",
        format_currency(financial.savings.first_year_savings),
        format_currency(financial.savings.monthly_savings)
    );
    println!("Lifetime    : {}", format_currency(financial.savings.lifetime_savings));
    println!("NPV         : {}", format_currency(financial.npv));
    match financial.irr {
        Some(irr) => println!("IRR         : {}", format_percent(irr)),
        None => println!("IRR         : undefined"),
    }
    println!("Payback     : {}", financial.payback);
    println!("ROI         : {:.1}%", financial.savings.roi_pct);

    if show_cash_flow {
        println!();
        print_cash_flow(&financial.cash_flow);
    }

    print_list("Advantages", &summary.advantages);
    print_list("Challenges", &summary.challenges);
    print_list("Recommendations", &summary.recommendations);
    if !summary.priority_items.is_empty() {
        println!();
        println!("Priority items: {}", summary.priority_items.join(", "));
    }
    println!();
    println!("Next steps:");
    for (i, step) in summary.next_steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
}

/// Print the yearly cash-flow table
pub fn print_cash_flow(cash_flow: &[CashFlowYear]) {
    println!("Cash Flow:");
    println!("{:-<68}", "");
    println!(
        "{:<4} {:>10} {:>10} {:>12} {:>14} {:>14}",
        "Year", "kWh", "$/kWh", "Savings", "Cumulative", "Net"
    );
    println!("{:-<68}", "");
    for year in cash_flow {
        println!(
            "{:<4} {:>10.0} {:>10.3} {:>12} {:>14} {:>14}",
            year.year,
            year.production_kwh,
            year.electricity_rate,
            format_currency(year.annual_savings),
            format_currency(year.cumulative_savings),
            format_currency(year.net_benefit),
        );
    }
    println!("{:-<68}", "");
}

/// One formatted row per catalog panel, the selected one marked with '*'
fn catalog_rows(panels: &BTreeMap<String, PanelSpec>, selected: &str) -> Vec<String> {
    panels
        .iter()
        .map(|(name, spec)| {
            format!(
                "{} {:<22} {:>7.0} W {:>8.1}% {:>8.2} $/W {:>7.2} m²",
                if name == selected { '*' } else { ' ' },
                name,
                spec.wattage,
                spec.efficiency * 100.0,
                spec.cost_per_watt,
                spec.area_per_panel
            )
        })
        .collect()
}

/// Print the panel catalog for comparison with the selected model
pub fn print_panel_catalog(panels: &BTreeMap<String, PanelSpec>, selected: &str) {
    println!();
    println!("=== Panel Options ===");
    println!("  {:<22} {:>9} {:>9} {:>12} {:>10}", "Type", "Power", "Eff.", "Cost", "Area");
    println!("{:-<68}", "");
    for row in catalog_rows(panels, selected) {
        println!("{}", row);
    }
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}:", title);
    for item in items {
        println!("  - {}", item);
    }
}
