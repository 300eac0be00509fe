pub mod assignments;
pub mod courses;
mod loader;
pub mod settings;
pub mod submissions;

pub use assignments::{
    AssignmentSpec, DEFAULT_ASSIGNMENTS_FILE, load_assignments, parse_assignments,
};
pub use courses::{CourseTarget, DEFAULT_COURSES_FILE, load_courses, parse_courses};
pub use settings::{
    API_KEY_VAR, API_URL_VAR, CanvasSettings, DEFAULT_SETTINGS_FILE, HttpSettings,
    load_http_settings, parse_http_settings,
};
pub use submissions::{
    DEFAULT_SUBMISSIONS_FILE, SubmissionSpec, load_submissions, parse_submissions,
};
