use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::domain::{AppError, EntryOutcome, EntryReport, ReportCounts, RunReport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Human-readable report: one line per entry, then the summary and failure list.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    for entry in report.entries() {
        out.push_str(&entry_line(entry));
        out.push('\n');
    }

    let counts = report.counts();
    out.push_str(&format!(
        "\nSummary: {} succeeded, {} skipped, {} failed\n",
        counts.succeeded, counts.skipped, counts.failed
    ));

    if counts.failed > 0 {
        out.push_str("\nFailures:\n");
        for entry in report.failed() {
            if let EntryOutcome::Failed { error, .. } = &entry.outcome {
                out.push_str(&format!(
                    "  - [{}] {} {}: {}\n",
                    entry.course,
                    entry.kind.as_str(),
                    entry.label,
                    error
                ));
            }
        }
    }
    out
}

fn entry_line(entry: &EntryReport) -> String {
    let prefix = format!("[{}] {} {}", entry.course, entry.kind.as_str(), entry.label);
    match &entry.outcome {
        EntryOutcome::Succeeded { detail } => format!("✅ {}: {}", prefix, detail),
        EntryOutcome::Skipped { reason } => format!("⏭️  {}: skipped ({})", prefix, reason),
        EntryOutcome::Failed { error, phase, message } => {
            format!("❌ {}: {} while {:?}: {}", prefix, error, phase, message)
        }
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    command: &'a str,
    started_at: String,
    finished_at: Option<String>,
    counts: ReportCounts,
    succeeded: Vec<&'a EntryReport>,
    skipped: Vec<&'a EntryReport>,
    failed: Vec<&'a EntryReport>,
}

fn rfc3339(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Compact JSON document describing the run.
pub fn render_json(report: &RunReport) -> Result<String, AppError> {
    let document = ReportDocument {
        command: &report.command,
        started_at: rfc3339(&report.started_at),
        finished_at: report.finished_at.as_ref().map(rfc3339),
        counts: report.counts(),
        succeeded: report.succeeded().collect(),
        skipped: report.skipped().collect(),
        failed: report.failed().collect(),
    };
    serde_json::to_string(&document).map_err(|e| AppError::Render(e.to_string()))
}

pub fn write_report<W: Write>(
    out: &mut W,
    report: &RunReport,
    format: ReportFormat,
) -> Result<(), AppError> {
    match format {
        ReportFormat::Text => write!(out, "{}", render_text(report))?,
        ReportFormat::Json => writeln!(out, "{}", render_json(report)?)?,
    }
    Ok(())
}
