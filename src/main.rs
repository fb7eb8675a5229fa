use chrono::Utc;
use clap::Parser;
use tracing::{Level, debug, warn};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod config;
mod error;
mod export;
mod finance;
mod irradiance;
mod layout;
mod orientation;
mod output;
mod pipeline;
mod production;
mod roof;
mod site;
mod summary;
mod vision;

use cli::{Args, DepInfo};
use config::AnalysisConfig;
use export::ExportDocument;
use vision::{OpenRouterAnalyzer, RoofAnalyzer, RoofSource};

// ===================== MAIN =====================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.show_build_info {
        print_build_info()?;
        return Ok(());
    }

    setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    let source = args.roof_source();
    let analyzer = match (&source, args.api_key.as_deref()) {
        (RoofSource::Image(_), Some(key)) => match OpenRouterAnalyzer::new(key, &config.vision) {
            Ok(a) => Some(a),
            Err(e) => {
                warn!(error = %e, "vision client unavailable");
                None
            }
        },
        _ => None,
    };
    let analyzer_ref = analyzer.as_ref().map(|a| a as &dyn RoofAnalyzer);

    let sourced = vision::acquire_roof(&source, analyzer_ref, &config.vision)?;
    let site = args.site();
    let report = pipeline::analyze(sourced, &site, &config)?;

    if let Some(path) = &args.json_out {
        export::save_json(path, &ExportDocument::new(&report, Utc::now()))?;
    }
    if let Some(path) = &args.csv_out {
        export::save_cash_flow_csv(path, &report.financial.cash_flow)?;
    }

    if args.json {
        let document = ExportDocument::new(&report, Utc::now());
        export::write_json(std::io::stdout().lock(), &document)?;
        println!();
    } else {
        output::print_report(&report, args.cash_flow);
        output::print_panel_catalog(&config.panels, &report.panel.panel_type);
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    debug!("logging initialised at {}", level);
    Ok(())
}

fn print_build_info() -> Result<(), Box<dyn std::error::Error>> {
    println!("Built from Git commit: {}\n", env!("ROOFTOP_GIT_HASH"));
    const DEP_INFO_RAW: &str = include_str!(env!("ROOFTOP_DEPS_INFO_PATH"));
    let deps: Vec<DepInfo> = serde_json::from_str(DEP_INFO_RAW)?;

    println!("Found {} dependencies.", deps.len());
    for dep in deps {
        println!("- {} v{}", dep.name, dep.version);
        if let Some(sum) = dep.checksum {
            println!("    Checksum: {}", sum);
        }
        if let Some(src) = dep.source {
            println!("    Source:   {}", src);
        }
    }
    Ok(())
}
