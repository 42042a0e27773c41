//! Output rendering for audit reports
//!
//! Four formats: human-readable table with severity coloring, pretty JSON,
//! NDJSON (one line per block plus a closing summary line), and GitHub
//! workflow annotations for CI.

use clap::ValueEnum;
use colored::Colorize;
use serde_json::json;
use std::io::{self, Write};

use crate::contracts::{AuditReport, BlockReport, BlockStatus, Reason, Severity};
use crate::error::AuditError;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// Pretty JSON for machine processing
    Json,
    /// One JSON line per block, then one summary line
    Ndjson,
    /// GitHub Actions workflow annotations
    Github,
}

/// Render the report in the requested format
pub fn render(report: &AuditReport, format: OutputFormat) -> Result<(), AuditError> {
    match format {
        OutputFormat::Json => render_json(report),
        OutputFormat::Ndjson => render_ndjson(report),
        OutputFormat::Table => render_table(report),
        OutputFormat::Github => render_github(report),
    }
}

fn render_json(report: &AuditReport) -> Result<(), AuditError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| AuditError::SerializationError(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn render_ndjson(report: &AuditReport) -> Result<(), AuditError> {
    let mut stdout = io::stdout();
    for block in &report.blocks {
        let line = serde_json::to_string(&json!({ "record": "block", "block": block }))
            .map_err(|e| AuditError::SerializationError(e.to_string()))?;
        writeln!(stdout, "{}", line).ok();
    }
    let tail = serde_json::to_string(&json!({
        "record": "summary",
        "reportId": report.report_id,
        "mode": report.mode,
        "contractHash": report.contract_hash,
        "durationMs": report.duration_ms,
        "summary": report.summary,
    }))
    .map_err(|e| AuditError::SerializationError(e.to_string()))?;
    writeln!(stdout, "{}", tail).ok();
    stdout.flush().ok();
    Ok(())
}

fn render_table(report: &AuditReport) -> Result<(), AuditError> {
    let mut stdout = io::stdout();

    writeln!(stdout).ok();
    writeln!(stdout, "{}", "Artifact Audit Results".cyan().bold()).ok();
    writeln!(stdout, "{}", "=".repeat(60)).ok();
    writeln!(stdout, "Target: {}", report.target.cyan()).ok();
    writeln!(stdout, "Mode:   {}", report.mode).ok();
    writeln!(stdout).ok();

    for block in &report.blocks {
        render_block_row(&mut stdout, block);
    }

    writeln!(stdout).ok();
    writeln!(stdout, "{}", "Summary:".cyan().bold()).ok();
    for (severity, count) in &report.summary.by_severity {
        if *count == 0 && severity.as_str() != "CRITICAL" {
            continue;
        }
        let label = match severity.as_str() {
            "CRITICAL" => severity.red().bold(),
            "ERROR" => severity.red(),
            "WARN" => severity.yellow(),
            _ => severity.blue(),
        };
        writeln!(stdout, "  {:>9}: {}", label, count).ok();
    }
    writeln!(stdout).ok();
    writeln!(
        stdout,
        "Completed in {} ms",
        report.duration_ms.to_string().dimmed()
    )
    .ok();

    stdout.flush().ok();
    Ok(())
}

fn render_block_row(stdout: &mut io::Stdout, block: &BlockReport) {
    let status = match block.status {
        BlockStatus::Ok => "OK".green().bold(),
        BlockStatus::Error => "ERROR".red().bold(),
        BlockStatus::NotAudited => "NOT_AUDITED".yellow().bold(),
    };
    writeln!(
        stdout,
        "{} {} {}",
        status,
        block.block_id.bold(),
        block.location.dimmed()
    )
    .ok();

    for error in &block.block_errors {
        writeln!(
            stdout,
            "    {} [{}] {}",
            severity_icon(error.severity()),
            error.code().as_str().dimmed(),
            error.message()
        )
        .ok();
    }

    for field in &block.fields {
        if field.reasons.is_empty() {
            continue;
        }
        for reason in &field.reasons {
            writeln!(
                stdout,
                "    {} [{}] {} {}",
                severity_icon(reason.severity()),
                reason.code().as_str().dimmed(),
                field.path.cyan(),
                reason.message()
            )
            .ok();
        }
    }
}

fn severity_icon(severity: Severity) -> String {
    match severity {
        Severity::Critical => "x".red().bold().to_string(),
        Severity::Error => "x".red().to_string(),
        Severity::Warn => "!".yellow().to_string(),
        Severity::Info => "i".blue().to_string(),
    }
}

fn render_github(report: &AuditReport) -> Result<(), AuditError> {
    let mut stdout = io::stdout();

    let mut annotate = |location: &str, subject: &str, reason: &Reason| {
        let command = match reason.severity() {
            Severity::Critical | Severity::Error => "error",
            Severity::Warn => "warning",
            Severity::Info => "notice",
        };
        writeln!(
            stdout,
            "::{} title={}::{} {}: {}",
            command,
            reason.code().as_str(),
            location,
            subject,
            reason.message()
        )
        .ok();
    };

    for block in &report.blocks {
        for error in &block.block_errors {
            annotate(&block.location, &block.block_id, error);
        }
        for field in &block.fields {
            for reason in &field.reasons {
                annotate(&block.location, &field.path, reason);
            }
        }
    }

    stdout.flush().ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{AuditMode, BlockReport};
    use chrono::Utc;

    fn sample_report() -> AuditReport {
        AuditReport::assemble(
            AuditMode::Local,
            "base",
            "hash",
            Utc::now(),
            3,
            vec![BlockReport::audited("b1", "b1.json", "1.0", false, vec![])],
            vec![],
        )
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_all_formats_render_without_error() {
        let report = sample_report();
        for format in [
            OutputFormat::Table,
            OutputFormat::Json,
            OutputFormat::Ndjson,
            OutputFormat::Github,
        ] {
            render(&report, format).unwrap();
        }
    }

    #[test]
    fn test_report_serializes_expected_keys() {
        let report = sample_report();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("reportId").is_some());
        assert!(value.get("contractHash").is_some());
        assert!(value["summary"].get("bySeverity").is_some());
        assert_eq!(value["blocks"][0]["status"], "OK");
    }
}
