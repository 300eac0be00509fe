pub mod canvas;
pub mod configuration;
pub mod error;
pub mod params;
pub mod report;

pub use canvas::{
    AssignmentHandle, AssignmentRequest, CourseHandle, EnrollmentHandle, RubricHandle,
    SectionHandle, SubmissionHandle, SubmissionRequest, UserRef,
};
pub use configuration::{
    AssignmentSpec, CanvasSettings, CourseTarget, HttpSettings, SubmissionSpec,
};
pub use error::{AppError, ErrorKind, ProvisionError};
pub use params::{
    AssignmentParams, GradingType, SubmissionContent, SubmissionParams, SubmissionType,
};
pub use report::{
    EntryKind, EntryOutcome, EntryPhase, EntryProgress, EntryReport, ReportCounts, RunReport,
};
