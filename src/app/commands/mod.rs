pub mod assignments;
pub mod output;
pub mod reset;
pub mod submissions;

use crate::domain::{
    CourseHandle, CourseTarget, EntryKind, EntryProgress, EntryReport, ProvisionError,
};
use crate::ports::CanvasClient;

/// Resolve a configured course on the platform, or describe why it could not be.
pub(crate) fn lookup_course<C: CanvasClient + ?Sized>(
    client: &C,
    target: &CourseTarget,
) -> Result<CourseHandle, EntryReport> {
    let mut progress = course_entry(target);
    progress.resolving();
    client.get_course(target.course_id).map_err(|e| progress.fail(&e))
}

/// A course-level failure that stops all further work in that course.
pub(crate) fn course_failure(target: &CourseTarget, error: &ProvisionError) -> EntryReport {
    course_entry(target).fail(error)
}

fn course_entry(target: &CourseTarget) -> EntryProgress {
    EntryProgress::begin(EntryKind::Course, &target.name, format!("course {}", target.course_id))
}
