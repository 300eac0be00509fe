//! coursekit: provision assignments, test students and submissions in Canvas courses
//! from YAML configuration.

pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use app::api::{
    AssignmentsOptions, ReportFormat, ResetOptions, SubmissionsOptions, provision_assignments,
    provision_assignments_at, provision_submissions, provision_submissions_at, reset_courses,
    reset_courses_at,
};
pub use domain::{AppError, RunReport};
