//! Submission provisioning.
//!
//! Test students are enrolled into the course's test-student section the first time one of
//! their entries is about to submit, so enrollment always precedes their submissions.

use std::collections::HashMap;

use super::{course_failure, lookup_course};
use crate::app::AppContext;
use crate::domain::{
    AssignmentHandle, CourseHandle, CourseTarget, EnrollmentHandle, EntryKind, EntryProgress,
    EntryReport, ProvisionError, RunReport, SectionHandle, SubmissionRequest, SubmissionSpec,
};
use crate::ports::CanvasClient;

pub fn execute<C: CanvasClient>(
    ctx: &AppContext<C>,
    courses: &[CourseTarget],
    submissions: &[SubmissionSpec],
) -> RunReport {
    let mut report = RunReport::new("submissions");
    for target in courses {
        provision_course(ctx.client(), target, submissions, &mut report);
    }
    report.finish()
}

/// Per-course enrollment results, keyed by login.
type Enrollments = HashMap<String, Result<EnrollmentHandle, ProvisionError>>;

struct CourseScope<'a, C: ?Sized> {
    client: &'a C,
    target: &'a CourseTarget,
    course: CourseHandle,
    section: SectionHandle,
    assignments: Vec<AssignmentHandle>,
    enrollments: Enrollments,
}

fn provision_course<C: CanvasClient + ?Sized>(
    client: &C,
    target: &CourseTarget,
    specs: &[SubmissionSpec],
    report: &mut RunReport,
) {
    let course = match lookup_course(client, target) {
        Ok(course) => course,
        Err(entry) => {
            report.push(entry);
            return;
        }
    };

    let section = match find_test_section(client, &course, target) {
        Ok(section) => section,
        Err(e) => {
            report.push(course_failure(target, &e));
            return;
        }
    };

    let assignments = match client.list_assignments(&course) {
        Ok(assignments) => assignments,
        Err(e) => {
            report.push(course_failure(target, &e));
            return;
        }
    };
    tracing::info!(
        course = %target.name,
        id = course.id,
        assignments = assignments.len(),
        "provisioning submissions"
    );

    let mut scope =
        CourseScope { client, target, course, section, assignments, enrollments: HashMap::new() };
    for spec in specs {
        scope.provision_entry(spec, report);
    }
}

fn find_test_section<C: CanvasClient + ?Sized>(
    client: &C,
    course: &CourseHandle,
    target: &CourseTarget,
) -> Result<SectionHandle, ProvisionError> {
    client
        .list_sections(course)?
        .into_iter()
        .find(|section| section.name == target.test_student_section_name)
        .ok_or_else(|| ProvisionError::not_found("section", &target.test_student_section_name))
}

impl<C: CanvasClient + ?Sized> CourseScope<'_, C> {
    fn provision_entry(&mut self, spec: &SubmissionSpec, report: &mut RunReport) {
        let targets: Vec<AssignmentHandle> = match &spec.assignment_reference {
            Some(name) => match self.assignments.iter().find(|a| &a.name == name) {
                Some(assignment) => vec![assignment.clone()],
                None => {
                    let mut progress = self.entry(spec, name);
                    progress.resolving();
                    report.push(progress.fail(&ProvisionError::Reference(name.clone())));
                    return;
                }
            },
            None => {
                let wanted = spec.submission_params.submission_type();
                let matching: Vec<_> =
                    self.assignments.iter().filter(|a| a.accepts(wanted)).cloned().collect();
                if matching.is_empty() {
                    report.push(
                        self.entry(spec, "*")
                            .skip(format!("no assignment accepts {} submissions", wanted)),
                    );
                    return;
                }
                matching
            }
        };

        for assignment in targets {
            let entry = self.submit(spec, &assignment, report);
            report.push(entry);
        }
    }

    fn submit(
        &mut self,
        spec: &SubmissionSpec,
        assignment: &AssignmentHandle,
        report: &mut RunReport,
    ) -> EntryReport {
        let mut progress = self.entry(spec, &assignment.name);
        progress.resolving();

        let user = match self.enrollment(&spec.student_login_id, report) {
            Ok(enrollment) => enrollment.user.clone(),
            Err(e) => return progress.fail(&e),
        };

        progress.creating();
        let request = SubmissionRequest { user, params: spec.submission_params.clone() };
        match self.client.create_submission(&self.course, assignment.id, &request) {
            Ok(submission) => progress.succeed(format!(
                "submitted (id {}, {})",
                submission.id, submission.workflow_state
            )),
            Err(e) => progress.fail(&e),
        }
    }

    /// Enroll `login` once per course; later entries reuse the first result.
    fn enrollment(
        &mut self,
        login: &str,
        report: &mut RunReport,
    ) -> Result<&EnrollmentHandle, ProvisionError> {
        if !self.enrollments.contains_key(login) {
            let mut progress =
                EntryProgress::begin(EntryKind::Enrollment, &self.target.name, login);
            progress.creating();
            let result = self.client.enroll_student(&self.course, &self.section, login);
            report.push(match &result {
                Ok(handle) if handle.already_enrolled => {
                    progress.succeed(format!("already enrolled in '{}'", self.section.name))
                }
                Ok(_) => progress.succeed(format!("enrolled in '{}'", self.section.name)),
                Err(e) => progress.fail(e),
            });
            self.enrollments.insert(login.to_string(), result);
        }
        match self.enrollments.get(login) {
            Some(Ok(handle)) => Ok(handle),
            Some(Err(e)) => Err(e.clone()),
            None => Err(ProvisionError::not_found("enrollment", login)),
        }
    }

    fn entry(&self, spec: &SubmissionSpec, assignment: &str) -> EntryProgress {
        EntryProgress::begin(
            EntryKind::Submission,
            &self.target.name,
            format!("{} -> {}", spec.student_login_id, assignment),
        )
    }
}
