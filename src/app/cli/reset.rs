//! Reset command implementation.

use std::path::PathBuf;

use crate::app::api::{ReportFormat, ResetOptions};
use crate::app::commands::output::write_report;
use crate::domain::AppError;

pub fn run_reset(
    courses_file: PathBuf,
    assignments_file: PathBuf,
    settings_file: Option<PathBuf>,
    format: ReportFormat,
) -> Result<i32, AppError> {
    let options = ResetOptions { courses_file, assignments_file, settings_file };
    let report = crate::app::api::reset_courses(&options)?;

    write_report(&mut std::io::stdout().lock(), &report, format)?;
    Ok(report.exit_code())
}
