//! Submissions command implementation.

use std::path::PathBuf;

use crate::app::api::{ReportFormat, SubmissionsOptions};
use crate::app::commands::output::write_report;
use crate::domain::AppError;

pub fn run_submissions(
    courses_file: PathBuf,
    submissions_file: PathBuf,
    settings_file: Option<PathBuf>,
    format: ReportFormat,
) -> Result<i32, AppError> {
    let options = SubmissionsOptions { courses_file, submissions_file, settings_file };
    let report = crate::app::api::provision_submissions(&options)?;

    write_report(&mut std::io::stdout().lock(), &report, format)?;
    Ok(report.exit_code())
}
