//! Assignment provisioning.
//!
//! For every course: make sure the managed sections exist, then create each configured
//! assignment (or its numbered copies) in file order. A bad entry is recorded and the
//! loop moves on.

use std::collections::HashSet;

use super::{course_failure, lookup_course};
use crate::app::AppContext;
use crate::domain::{
    AssignmentRequest, AssignmentSpec, CourseHandle, CourseTarget, EntryKind, EntryProgress,
    EntryReport, RunReport,
};
use crate::ports::CanvasClient;

pub fn execute<C: CanvasClient>(
    ctx: &AppContext<C>,
    courses: &[CourseTarget],
    assignments: &[AssignmentSpec],
) -> RunReport {
    let mut report = RunReport::new("assignments");
    for target in courses {
        provision_course(ctx.client(), target, assignments, &mut report);
    }
    report.finish()
}

fn provision_course<C: CanvasClient + ?Sized>(
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
    tracing::info!(course = %target.name, id = course.id, "provisioning assignments");

    ensure_sections(client, &course, target, report);

    let mut existing: HashSet<String> = match client.list_assignments(&course) {
        Ok(assignments) => assignments.into_iter().map(|a| a.name).collect(),
        Err(e) => {
            report.push(course_failure(target, &e));
            return;
        }
    };

    for spec in specs {
        for name in spec.generated_names(target.num_create_assignments) {
            let entry =
                provision_assignment(client, &course, &target.name, spec, name, &mut existing);
            report.push(entry);
        }
    }
}

fn ensure_sections<C: CanvasClient + ?Sized>(
    client: &C,
    course: &CourseHandle,
    target: &CourseTarget,
    report: &mut RunReport,
) {
    let sections = match client.list_sections(course) {
        Ok(sections) => sections,
        Err(e) => {
            let progress = EntryProgress::begin(EntryKind::Section, &target.name, "sections");
            report.push(progress.fail(&e));
            return;
        }
    };

    for name in target.managed_sections() {
        if sections.iter().any(|section| section.name == name) {
            continue;
        }
        let mut progress = EntryProgress::begin(EntryKind::Section, &target.name, name);
        progress.creating();
        report.push(match client.create_section(course, name) {
            Ok(section) => progress.succeed(format!("created (id {})", section.id)),
            Err(e) => progress.fail(&e),
        });
    }
}

fn provision_assignment<C: CanvasClient + ?Sized>(
    client: &C,
    course: &CourseHandle,
    course_label: &str,
    spec: &AssignmentSpec,
    name: String,
    existing: &mut HashSet<String>,
) -> EntryReport {
    let mut progress = EntryProgress::begin(EntryKind::Assignment, course_label, name.clone());
    if existing.contains(&name) {
        return progress.skip("already exists in course");
    }

    progress.resolving();
    let rubric = match &spec.rubric_id {
        Some(rubric_id) => match client.find_rubric(course, rubric_id) {
            Ok(rubric) => Some(rubric),
            Err(e) => return progress.fail(&e),
        },
        None => None,
    };

    progress.creating();
    let detail_suffix = rubric
        .as_ref()
        .map(|r| format!(" with rubric '{}'", r.title))
        .unwrap_or_default();
    let request = AssignmentRequest { name: name.clone(), params: spec.params.clone(), rubric };
    match client.create_assignment(course, &request) {
        Ok(created) => {
            existing.insert(name);
            progress.succeed(format!("created (id {}){}", created.id, detail_suffix))
        }
        Err(e) => progress.fail(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::configuration::parse_assignments;
    use crate::domain::{EntryOutcome, EntryPhase, ErrorKind, SubmissionType};
    use crate::testing::{Call, FakeCanvasClient};

    const COURSE: u64 = 101;

    fn course_with_sections() -> FakeCanvasClient {
        FakeCanvasClient::new()
            .with_course(COURSE, "CS 101")
            .with_section(COURSE, "Test Students")
            .with_section(COURSE, "Graders")
    }

    fn target() -> CourseTarget {
        CourseTarget::new("CS 101", COURSE)
    }

    fn run(client: FakeCanvasClient, specs: &[AssignmentSpec]) -> (RunReport, FakeCanvasClient) {
        let ctx = AppContext::new(client.clone());
        (execute(&ctx, &[target()], specs), client)
    }

    fn labels<'a>(entries: impl Iterator<Item = &'a EntryReport>) -> Vec<&'a str> {
        entries.map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn missing_rubric_fails_only_its_entry() {
        let specs = parse_assignments(
            "assignment.yml",
            r#"
- name: A
  params: {points_possible: 100}
- name: B
  rubric_id: R9
  params: {points_possible: 50}
"#,
        )
        .unwrap();

        let (report, client) = run(course_with_sections(), &specs);

        assert_eq!(labels(report.succeeded()), ["A"]);
        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].label, "B");
        assert_eq!(failed[0].error_kind(), Some(ErrorKind::NotFound));
        assert_ne!(report.exit_code(), 0);
        assert_eq!(client.assignment_names(COURSE), ["A"]);
    }

    #[test]
    fn later_entries_run_after_a_failure() {
        let specs = parse_assignments(
            "assignment.yml",
            "- name: One\n- name: Two\n  rubric_id: missing\n- name: Three\n",
        )
        .unwrap();

        let (report, client) = run(course_with_sections(), &specs);

        assert_eq!(labels(report.succeeded()), ["One", "Three"]);
        assert_eq!(labels(report.failed()), ["Two"]);
        assert_eq!(client.assignment_names(COURSE), ["One", "Three"]);
    }

    #[test]
    fn create_calls_match_resolved_entries() {
        let specs = parse_assignments(
            "assignment.yml",
            concat!(
                "- {name: A, rubric_id: R1}\n- {name: B, rubric_id: R2}\n",
                "- {name: C}\n- {name: D, rubric_id: R1}\n",
            ),
        )
        .unwrap();
        let client = course_with_sections().with_rubric(COURSE, "R1");

        let (_, client) = run(client, &specs);

        let creates: Vec<_> = client
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateAssignment(name) => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(creates, ["A", "C", "D"]);
    }

    #[test]
    fn rubric_is_resolved_before_creation() {
        let specs =
            parse_assignments("assignment.yml", "- {name: Essay, rubric_id: R1}\n").unwrap();
        let (report, client) = run(course_with_sections().with_rubric(COURSE, "R1"), &specs);

        let calls = client.calls();
        let find = calls.iter().position(|c| *c == Call::FindRubric("R1".into())).unwrap();
        let create =
            calls.iter().position(|c| *c == Call::CreateAssignment("Essay".into())).unwrap();
        assert!(find < create);
        match &report.entries()[0].outcome {
            EntryOutcome::Succeeded { detail } => assert!(detail.contains("Rubric R1")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn remote_failure_is_recorded_in_creating_phase() {
        let specs = parse_assignments("assignment.yml", "- {name: A}\n- {name: B}\n").unwrap();
        let (report, _) = run(course_with_sections().failing_assignment("A"), &specs);

        match &report.entries()[0].outcome {
            EntryOutcome::Failed { error, phase, .. } => {
                assert_eq!(*error, ErrorKind::Remote);
                assert_eq!(*phase, EntryPhase::Creating);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(labels(report.succeeded()), ["B"]);
    }

    #[test]
    fn existing_assignments_are_skipped() {
        let specs = parse_assignments("assignment.yml", "- {name: A}\n- {name: B}\n").unwrap();
        let client =
            course_with_sections().with_assignment(COURSE, "A", &[SubmissionType::OnPaper]);

        let (report, client) = run(client, &specs);

        assert_eq!(labels(report.skipped()), ["A"]);
        assert_eq!(labels(report.succeeded()), ["B"]);
        assert_eq!(report.exit_code(), 0);
        assert!(!client.calls().contains(&Call::CreateAssignment("A".into())));
    }

    #[test]
    fn numbered_copies_follow_course_setting() {
        let specs = parse_assignments("assignment.yml", "- {name: Lab}\n").unwrap();
        let client = course_with_sections();
        let ctx = AppContext::new(client.clone());
        let mut course = target();
        course.num_create_assignments = Some(3);

        let report = execute(&ctx, &[course], &specs);

        assert_eq!(labels(report.succeeded()), ["Lab1", "Lab2", "Lab3"]);
        assert_eq!(client.assignment_names(COURSE), ["Lab1", "Lab2", "Lab3"]);
    }

    #[test]
    fn missing_sections_are_created() {
        let specs = parse_assignments("assignment.yml", "- {name: A}\n").unwrap();
        let client =
            FakeCanvasClient::new().with_course(COURSE, "CS 101").with_section(COURSE, "Graders");

        let (report, client) = run(client, &specs);

        assert_eq!(client.section_names(COURSE), ["Graders", "Test Students"]);
        let kinds: Vec<_> = report.succeeded().map(|e| e.kind).collect();
        assert_eq!(kinds, [EntryKind::Section, EntryKind::Assignment]);
    }

    #[test]
    fn unknown_course_is_reported_and_next_course_runs() {
        let specs = parse_assignments("assignment.yml", "- {name: A}\n").unwrap();
        let client = course_with_sections();
        let ctx = AppContext::new(client.clone());
        let courses = [CourseTarget::new("Ghost", 999), target()];

        let report = execute(&ctx, &courses, &specs);

        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].kind, EntryKind::Course);
        assert_eq!(failed[0].course, "Ghost");
        assert_eq!(labels(report.succeeded()), ["A"]);
    }
}
