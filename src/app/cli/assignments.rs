//! Assignments command implementation.

use std::path::PathBuf;

use crate::app::api::{AssignmentsOptions, ReportFormat};
use crate::app::commands::output::write_report;
use crate::domain::AppError;

pub fn run_assignments(
    courses_file: PathBuf,
    assignments_file: PathBuf,
    settings_file: Option<PathBuf>,
    format: ReportFormat,
) -> Result<i32, AppError> {
    let options = AssignmentsOptions { courses_file, assignments_file, settings_file };
    let report = crate::app::api::provision_assignments(&options)?;

    write_report(&mut std::io::stdout().lock(), &report, format)?;
    Ok(report.exit_code())
}
