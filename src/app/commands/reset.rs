//! Undo what the assignments command set up: generated assignments, managed-section
//! enrollments, then the managed sections themselves.

use super::{course_failure, lookup_course};
use crate::app::AppContext;
use crate::domain::{
    AssignmentSpec, CourseHandle, CourseTarget, EntryKind, EntryProgress, RunReport,
    SectionHandle,
};
use crate::ports::CanvasClient;

pub fn execute<C: CanvasClient>(
    ctx: &AppContext<C>,
    courses: &[CourseTarget],
    assignments: &[AssignmentSpec],
) -> RunReport {
    let mut report = RunReport::new("reset");
    for target in courses {
        reset_course(ctx.client(), target, assignments, &mut report);
    }
    report.finish()
}

fn reset_course<C: CanvasClient + ?Sized>(
    client: &C,
    target: &CourseTarget,
    specs: &[AssignmentSpec],
    report: &mut RunReport,
) {
    let course = match lookup_course(client, target) {
        Ok(course) => course,
        Err(entry) => {
            report.push(entry);
            return;
        }
    };
    tracing::info!(course = %target.name, id = course.id, "resetting course");

    match client.list_assignments(&course) {
        Ok(existing) => {
            let names = specs.iter().flat_map(|s| s.generated_names(target.num_create_assignments));
            for name in names {
                let matching: Vec<_> = existing.iter().filter(|a| a.name == name).collect();
                if matching.is_empty() {
                    report.push(
                        EntryProgress::begin(EntryKind::Assignment, &target.name, name)
                            .skip("not present in course"),
                    );
                    continue;
                }
                // Same-named copies are all removed, one entry each.
                for assignment in matching {
                    let mut progress =
                        EntryProgress::begin(EntryKind::Assignment, &target.name, name.clone());
                    progress.creating();
                    report.push(match client.delete_assignment(&course, assignment) {
                        Ok(()) => progress.succeed(format!("deleted (id {})", assignment.id)),
                        Err(e) => progress.fail(&e),
                    });
                }
            }
        }
        Err(e) => report.push(course_failure(target, &e)),
    }

    let sections = match client.list_sections(&course) {
        Ok(sections) => sections,
        Err(e) => {
            report.push(course_failure(target, &e));
            return;
        }
    };
    for name in target.managed_sections() {
        match sections.iter().find(|s| s.name == name) {
            Some(section) => remove_section(client, &course, target, section, report),
            None => report.push(
                EntryProgress::begin(EntryKind::Section, &target.name, name)
                    .skip("not present in course"),
            ),
        }
    }
}

fn remove_section<C: CanvasClient + ?Sized>(
    client: &C,
    course: &CourseHandle,
    target: &CourseTarget,
    section: &SectionHandle,
    report: &mut RunReport,
) {
    let mut progress = EntryProgress::begin(EntryKind::Section, &target.name, section.name.clone());
    progress.resolving();
    let enrollments = match client.list_section_enrollments(section) {
        Ok(enrollments) => enrollments,
        Err(e) => {
            report.push(progress.fail(&e));
            return;
        }
    };

    let mut remaining = 0usize;
    for enrollment in &enrollments {
        let mut entry = EntryProgress::begin(
            EntryKind::Enrollment,
            &target.name,
            format!("{} in '{}'", enrollment.user, section.name),
        );
        entry.creating();
        report.push(match client.deactivate_enrollment(course, enrollment) {
            Ok(()) => entry.succeed("deleted"),
            Err(e) => {
                remaining += 1;
                entry.fail(&e)
            }
        });
    }

    if remaining > 0 {
        report.push(progress.skip(format!("{} enrollment(s) could not be removed", remaining)));
        return;
    }
    progress.creating();
    report.push(match client.delete_section(section) {
        Ok(()) => progress.succeed(format!("deleted (id {})", section.id)),
        Err(e) => progress.fail(&e),
    });
}
