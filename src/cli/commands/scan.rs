//! Scan Command
//!
//! Print the discovered bounded contexts and aggregates without writing
//! anything.
//!
//! Usage:
//!   dddwiki scan [--repo PATH] [-f json]

use tokio::runtime::Runtime;

use crate::cli::Output;
use crate::config::Config;
use crate::scanner::ScanReport;
use crate::types::Result;
use crate::wiki::DocumentationPipeline;

pub fn run(config: Config, format: &str, out: &Output) -> Result<()> {
    let domain_root = config.paths.repo.join(&config.scanner.domain_root);
    let pipeline = DocumentationPipeline::new(config, None);

    let rt = Runtime::new()?;
    let report = rt.block_on(pipeline.scan())?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report, &domain_root.display().to_string(), out);
    Ok(())
}

fn print_report(report: &ScanReport, domain_root: &str, out: &Output) {
    out.header(&format!("Domain structure of {domain_root}"));

    if report.is_empty() {
        out.warning("No bounded contexts found");
    }

    for context in &report.contexts {
        out.section(&format!(
            "{} ({} aggregate{})",
            context.name,
            context.aggregates.len(),
            if context.aggregates.len() == 1 { "" } else { "s" }
        ));
        for aggregate in &context.aggregates {
            println!("  {aggregate}");
        }
    }

    for warning in &report.warnings {
        out.warning(&warning.to_string());
    }

    out.success(&format!(
        "{} contexts, {} aggregates",
        report.contexts.len(),
        report.aggregate_count()
    ));
}
