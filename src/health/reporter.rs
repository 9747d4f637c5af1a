//! Report formatting

use std::fmt::Write;

use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use super::check::CheckStatus;
use super::runner::HealthCheckReport;

/// Renders the report as a table followed by a summary
pub fn format_report(report: &HealthCheckReport) -> String {
    let mut builder = Builder::default();
    builder.push_record(["System", "Status", "Duration", "Message"]);

    for (name, result) in &report.results {
        let duration = match result.status {
            CheckStatus::Skip => "-".to_string(),
            _ => format!("{:.2?}", result.duration),
        };
        builder.push_record([
            name.as_str(),
            &result.status.as_colored_str(),
            &duration,
            &result.message,
        ]);
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    format!("{table}\n{}", format_summary(report))
}

fn format_summary(report: &HealthCheckReport) -> String {
    let mut summary = format!("\n{}\n", "Summary".bold().underline());

    let _ = writeln!(summary, "  Total checks: {}", report.total);
    let _ = writeln!(summary, "  {} Passed: {}", "✓".green(), report.passed);
    for (count, mark, label) in [
        (report.warned, "⚠".yellow(), "Warned"),
        (report.failed, "✗".red(), "Failed"),
        (report.skipped, "-".dimmed(), "Skipped"),
    ] {
        if count > 0 {
            let _ = writeln!(summary, "  {mark} {label}: {count}");
        }
    }

    let overall = match (report.is_healthy(), report.has_warnings()) {
        (false, _) => "Overall: UNHEALTHY".red().bold(),
        (true, true) => "Overall: HEALTHY (with warnings)".yellow().bold(),
        (true, false) => "Overall: HEALTHY".green().bold(),
    };
    let _ = writeln!(summary, "\n  {overall}");

    summary
}

/// Prints the table, then the details of every check, failures first
pub fn print_report(report: &HealthCheckReport) {
    println!("{}", format_report(report));

    let mut detailed: Vec<_> = report
        .results
        .iter()
        .filter_map(|(name, result)| result.details.as_ref().map(|d| (name, result.status, d)))
        .collect();
    detailed.sort_by_key(|(_, status, _)| !status.is_fail());

    for (name, _, details) in detailed {
        println!("\n{} Details:", name.bold());
        println!("{details}");
    }
}
