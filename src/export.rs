//! JSON report and CSV cash-flow export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::finance::{CashFlowYear, Payback};
use crate::pipeline::AnalysisReport;
use crate::summary::Feasibility;

/// Headline figures placed ahead of the detailed report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub analysis_date: DateTime<Utc>,
    pub overall_feasibility: Feasibility,
    pub system_size_kw: f64,
    pub annual_production_kwh: f64,
    pub annual_savings_usd: f64,
    pub payback: Payback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub summary: ExportSummary,
    pub detailed_analysis: AnalysisReport,
}

impl ExportDocument {
    pub fn new(report: &AnalysisReport, analysis_date: DateTime<Utc>) -> Self {
        Self {
            summary: ExportSummary {
                analysis_date,
                overall_feasibility: report.summary.rating,
                system_size_kw: report.layout.system_size_kw,
                annual_production_kwh: report.production.annual_kwh,
                annual_savings_usd: report.financial.savings.first_year_savings,
                payback: report.financial.payback,
            },
            detailed_analysis: report.clone(),
        }
    }
}

pub fn write_json<W: Write>(writer: W, document: &ExportDocument) -> Result<()> {
    serde_json::to_writer_pretty(writer, document)?;
    Ok(())
}

/// Write the cash-flow table with a header row
pub fn write_cash_flow_csv<W: Write>(writer: W, cash_flow: &[CashFlowYear]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for year in cash_flow {
        writer.serialize(year)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_json(path: &Path, document: &ExportDocument) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_json(&mut writer, document)?;
    writer.flush()?;
    info!(path = %path.display(), "JSON report written");
    Ok(())
}

pub fn save_cash_flow_csv(path: &Path, cash_flow: &[CashFlowYear]) -> Result<()> {
    write_cash_flow_csv(BufWriter::new(File::create(path)?), cash_flow)?;
    info!(path = %path.display(), rows = cash_flow.len(), "cash flow CSV written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::pipeline::{self, Provenance, SourcedRoof};
    use crate::roof::RoofDescription;
    use crate::site::SiteParameters;
    use chrono::TimeZone;
    use csv::Reader;
    use std::io::{BufReader, Read};

    fn report() -> AnalysisReport {
        let sourced = SourcedRoof { roof: RoofDescription::demo_fixture(), provenance: Provenance::Demo };
        let site = SiteParameters { electricity_rate_per_kwh: 0.45, ..Default::default() };
        pipeline::analyze(sourced, &site, &AnalysisConfig::default()).unwrap()
    }

    fn read_json<R: Read>(reader: R) -> ExportDocument {
        serde_json::from_reader(reader).unwrap()
    }

    fn read_cash_flow_csv<R: Read>(reader: R) -> Vec<CashFlowYear> {
        Reader::from_reader(reader).deserialize().collect::<std::result::Result<_, _>>().unwrap()
    }

    #[test]
    fn test_json_round_trip() {
        let report = report();
        let date = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
        let document = ExportDocument::new(&report, date);

        let mut buffer = Vec::new();
        write_json(&mut buffer, &document).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("\"overall_feasibility\""), "export was {}", text);
        assert!(text.contains("\"detailed_analysis\""));

        let parsed = read_json(buffer.as_slice());
        assert_eq!(parsed.summary.analysis_date, date);
        assert_eq!(parsed.summary.overall_feasibility, report.summary.rating);
        assert_eq!(parsed.detailed_analysis.layout.panel_count, report.layout.panel_count);
        let (a, b) = (parsed.summary.annual_production_kwh, report.production.annual_kwh);
        assert!((a - b).abs() < 1e-6 * b, "production {} vs {}", a, b);
        assert_eq!(parsed.detailed_analysis.financial.cash_flow.len(), 25);
    }

    #[test]
    fn test_csv_round_trip() {
        let report = report();
        let cash_flow = &report.financial.cash_flow;

        let mut buffer = Vec::new();
        write_cash_flow_csv(&mut buffer, cash_flow).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("year,production_kwh,electricity_rate,annual_savings"), "header was {}", text);
        assert_eq!(text.lines().count(), 26);

        let rows = read_cash_flow_csv(buffer.as_slice());
        assert_eq!(rows.len(), cash_flow.len());
        for (read, original) in rows.iter().zip(cash_flow) {
            assert_eq!(read.year, original.year);
            assert!((read.cumulative_savings - original.cumulative_savings).abs() < 1e-6);
            assert!((read.net_benefit - original.net_benefit).abs() < 1e-6);
        }
    }

    #[test]
    fn test_files_round_trip() {
        let report = report();
        let dir = std::env::temp_dir().join(format!("rooftop-solar-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let json_path = dir.join("report.json");
        let csv_path = dir.join("cash_flow.csv");

        save_json(&json_path, &ExportDocument::new(&report, Utc::now())).unwrap();
        save_cash_flow_csv(&csv_path, &report.financial.cash_flow).unwrap();

        let document = read_json(BufReader::new(File::open(&json_path).unwrap()));
        assert_eq!(document.detailed_analysis.summary, report.summary);
        let rows = read_cash_flow_csv(File::open(&csv_path).unwrap());
        assert_eq!(rows.len(), 25);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
