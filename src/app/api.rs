//! API Facade for the application.
//!
//! Each function loads settings and configuration (failing before any network call),
//! builds the HTTP client, and hands a context to the matching command.

use std::path::{Path, PathBuf};

use crate::app::{
    AppContext,
    commands::{assignments, reset, submissions},
};
use crate::domain::configuration::{
    DEFAULT_ASSIGNMENTS_FILE, DEFAULT_COURSES_FILE, DEFAULT_SUBMISSIONS_FILE, load_assignments,
    load_courses, load_http_settings, load_submissions,
};
use crate::services::HttpCanvasClient;

pub use crate::app::commands::output::ReportFormat;
pub use crate::domain::{AppError, CanvasSettings, RunReport};

/// Inputs for `coursekit assignments`.
#[derive(Debug, Clone)]
pub struct AssignmentsOptions {
    pub courses_file: PathBuf,
    pub assignments_file: PathBuf,
    pub settings_file: Option<PathBuf>,
}

impl Default for AssignmentsOptions {
    fn default() -> Self {
        Self {
            courses_file: PathBuf::from(DEFAULT_COURSES_FILE),
            assignments_file: PathBuf::from(DEFAULT_ASSIGNMENTS_FILE),
            settings_file: None,
        }
    }
}

/// Inputs for `coursekit submissions`.
#[derive(Debug, Clone)]
pub struct SubmissionsOptions {
    pub courses_file: PathBuf,
    pub submissions_file: PathBuf,
    pub settings_file: Option<PathBuf>,
}

impl Default for SubmissionsOptions {
    fn default() -> Self {
        Self {
            courses_file: PathBuf::from(DEFAULT_COURSES_FILE),
            submissions_file: PathBuf::from(DEFAULT_SUBMISSIONS_FILE),
            settings_file: None,
        }
    }
}

/// Inputs for `coursekit reset`.
#[derive(Debug, Clone)]
pub struct ResetOptions {
    pub courses_file: PathBuf,
    pub assignments_file: PathBuf,
    pub settings_file: Option<PathBuf>,
}

impl Default for ResetOptions {
    fn default() -> Self {
        Self {
            courses_file: PathBuf::from(DEFAULT_COURSES_FILE),
            assignments_file: PathBuf::from(DEFAULT_ASSIGNMENTS_FILE),
            settings_file: None,
        }
    }
}

/// Settings resolved relative to `root`, credentials from the environment.
fn load_settings(root: &Path, explicit: Option<&Path>) -> Result<CanvasSettings, AppError> {
    let explicit = explicit.map(|path| root.join(path));
    let http = load_http_settings(root, explicit.as_deref())?;
    let settings = CanvasSettings::from_env(http)?;
    tracing::debug!(?settings, "loaded settings");
    Ok(settings)
}

fn create_context(settings: &CanvasSettings) -> Result<AppContext<HttpCanvasClient>, AppError> {
    Ok(AppContext::new(HttpCanvasClient::new(settings)?))
}

// =============================================================================
// Assignments Command API
// =============================================================================

/// Create configured assignments in every configured course.
pub fn provision_assignments(options: &AssignmentsOptions) -> Result<RunReport, AppError> {
    provision_assignments_at(std::env::current_dir()?, options)
}

/// Create configured assignments, resolving relative paths against `root`.
pub fn provision_assignments_at(
    root: impl Into<PathBuf>,
    options: &AssignmentsOptions,
) -> Result<RunReport, AppError> {
    let root = root.into();
    let settings = load_settings(&root, options.settings_file.as_deref())?;
    let courses = load_courses(&root.join(&options.courses_file))?;
    let specs = load_assignments(&root.join(&options.assignments_file))?;

    let ctx = create_context(&settings)?;
    Ok(assignments::execute(&ctx, &courses, &specs))
}

// =============================================================================
// Submissions Command API
// =============================================================================

/// Enroll test students and create their submissions in every configured course.
pub fn provision_submissions(options: &SubmissionsOptions) -> Result<RunReport, AppError> {
    provision_submissions_at(std::env::current_dir()?, options)
}

/// Create configured submissions, resolving relative paths against `root`.
pub fn provision_submissions_at(
    root: impl Into<PathBuf>,
    options: &SubmissionsOptions,
) -> Result<RunReport, AppError> {
    let root = root.into();
    let settings = load_settings(&root, options.settings_file.as_deref())?;
    let courses = load_courses(&root.join(&options.courses_file))?;
    let specs = load_submissions(&root.join(&options.submissions_file))?;

    let ctx = create_context(&settings)?;
    Ok(submissions::execute(&ctx, &courses, &specs))
}

// =============================================================================
// Reset Command API
// =============================================================================

/// Remove generated assignments and managed sections from every configured course.
pub fn reset_courses(options: &ResetOptions) -> Result<RunReport, AppError> {
    reset_courses_at(std::env::current_dir()?, options)
}

/// Reset courses, resolving relative paths against `root`.
pub fn reset_courses_at(
    root: impl Into<PathBuf>,
    options: &ResetOptions,
) -> Result<RunReport, AppError> {
    let root = root.into();
    let settings = load_settings(&root, options.settings_file.as_deref())?;
    let courses = load_courses(&root.join(&options.courses_file))?;
    let specs = load_assignments(&root.join(&options.assignments_file))?;

    let ctx = create_context(&settings)?;
    Ok(reset::execute(&ctx, &courses, &specs))
}
