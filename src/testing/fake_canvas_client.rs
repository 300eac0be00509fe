use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::domain::{
    AssignmentHandle, AssignmentRequest, CourseHandle, EnrollmentHandle, ProvisionError,
    RubricHandle, SectionHandle, SubmissionHandle, SubmissionRequest, SubmissionType, UserRef,
};
use crate::ports::CanvasClient;

/// One observed call, in the order the fake received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetCourse(u64),
    ListSections(u64),
    CreateSection(String),
    DeleteSection(String),
    ListAssignments(u64),
    FindRubric(String),
    CreateAssignment(String),
    DeleteAssignment(String),
    EnrollStudent(String),
    ListSectionEnrollments(String),
    DeactivateEnrollment(u64),
    CreateSubmission { assignment_id: u64, user: UserRef },
}

#[derive(Debug, Default)]
struct FakeCourse {
    name: String,
    sections: Vec<SectionHandle>,
    assignments: Vec<AssignmentHandle>,
    rubrics: HashSet<String>,
}

#[derive(Debug, Default)]
struct State {
    courses: BTreeMap<u64, FakeCourse>,
    users: HashMap<String, u64>,
    /// (section id, login) -> enrollment id
    enrollments: BTreeMap<(u64, String), u64>,
    failing_assignments: HashSet<String>,
    failing_submissions: HashSet<String>,
    failing_logins: HashSet<String>,
    next_id: u64,
    calls: Vec<Call>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn course_mut(&mut self, course_id: u64) -> Result<&mut FakeCourse, ProvisionError> {
        self.courses
            .get_mut(&course_id)
            .ok_or_else(|| ProvisionError::not_found("course", course_id.to_string()))
    }

    fn login_of(&self, user: &UserRef) -> Option<String> {
        match user {
            UserRef::SisLogin(login) => Some(login.clone()),
            UserRef::Id(id) => {
                self.users.iter().find(|(_, uid)| *uid == id).map(|(login, _)| login.clone())
            }
        }
    }

    fn is_enrolled(&self, course_id: u64, user: &UserRef) -> bool {
        let (Some(login), Some(course)) = (self.login_of(user), self.courses.get(&course_id))
        else {
            return false;
        };
        course
            .sections
            .iter()
            .any(|section| self.enrollments.contains_key(&(section.id, login.clone())))
    }

    fn section_course(&self, section_id: u64) -> Option<u64> {
        self.courses
            .iter()
            .find(|(_, course)| course.sections.iter().any(|s| s.id == section_id))
            .map(|(id, _)| *id)
    }
}

/// In-memory grading platform that records every call it receives.
#[derive(Clone, Default)]
pub struct FakeCanvasClient {
    state: Arc<Mutex<State>>,
}

impl FakeCanvasClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn with_course(self, course_id: u64, name: &str) -> Self {
        self.with_state(|s| {
            let course = FakeCourse { name: name.to_string(), ..Default::default() };
            s.courses.insert(course_id, course);
        });
        self
    }

    pub fn with_section(self, course_id: u64, name: &str) -> Self {
        self.with_state(|s| {
            let id = s.next_id();
            let course = s.courses.get_mut(&course_id).expect("course must be added first");
            course.sections.push(SectionHandle { id, name: name.to_string() });
        });
        self
    }

    pub fn with_rubric(self, course_id: u64, rubric_id: &str) -> Self {
        self.with_state(|s| {
            let course = s.courses.get_mut(&course_id).expect("course must be added first");
            course.rubrics.insert(rubric_id.to_string());
        });
        self
    }

    pub fn with_assignment(self, course_id: u64, name: &str, types: &[SubmissionType]) -> Self {
        self.with_state(|s| {
            let id = s.next_id();
            let course = s.courses.get_mut(&course_id).expect("course must be added first");
            course.assignments.push(AssignmentHandle {
                id,
                name: name.to_string(),
                submission_types: types.iter().map(|t| t.as_str().to_string()).collect(),
            });
        });
        self
    }

    pub fn with_student(self, login_id: &str) -> Self {
        self.with_state(|s| {
            let id = s.next_id();
            s.users.insert(login_id.to_string(), id);
        });
        self
    }

    /// Make `create_assignment` answer 500 for this name.
    pub fn failing_assignment(self, name: &str) -> Self {
        self.with_state(|s| s.failing_assignments.insert(name.to_string()));
        self
    }

    /// Make `create_submission` answer 500 for this assignment name.
    pub fn failing_submission(self, assignment_name: &str) -> Self {
        self.with_state(|s| s.failing_submissions.insert(assignment_name.to_string()));
        self
    }

    /// Make `enroll_student` answer 500 for this login.
    pub fn failing_enrollment(self, login_id: &str) -> Self {
        self.with_state(|s| s.failing_logins.insert(login_id.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn assignment_names(&self, course_id: u64) -> Vec<String> {
        self.with_state(|s| {
            s.courses
                .get(&course_id)
                .map(|c| c.assignments.iter().map(|a| a.name.clone()).collect())
                .unwrap_or_default()
        })
    }

    pub fn section_names(&self, course_id: u64) -> Vec<String> {
        self.with_state(|s| {
            s.courses
                .get(&course_id)
                .map(|c| c.sections.iter().map(|a| a.name.clone()).collect())
                .unwrap_or_default()
        })
    }

    pub fn user_id(&self, login_id: &str) -> Option<u64> {
        self.with_state(|s| s.users.get(login_id).copied())
    }

    pub fn enrolled_logins(&self) -> Vec<String> {
        self.with_state(|s| s.enrollments.keys().map(|(_, login)| login.clone()).collect())
    }
}

impl CanvasClient for FakeCanvasClient {
    fn get_course(&self, course_id: u64) -> Result<CourseHandle, ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::GetCourse(course_id));
            let course = s.course_mut(course_id)?;
            Ok(CourseHandle { id: course_id, name: course.name.clone() })
        })
    }

    fn list_sections(&self, course: &CourseHandle) -> Result<Vec<SectionHandle>, ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::ListSections(course.id));
            Ok(s.course_mut(course.id)?.sections.clone())
        })
    }

    fn create_section(
        &self,
        course: &CourseHandle,
        name: &str,
    ) -> Result<SectionHandle, ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::CreateSection(name.to_string()));
            let id = s.next_id();
            let section = SectionHandle { id, name: name.to_string() };
            s.course_mut(course.id)?.sections.push(section.clone());
            Ok(section)
        })
    }

    fn delete_section(&self, section: &SectionHandle) -> Result<(), ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::DeleteSection(section.name.clone()));
            let course_id = s
                .section_course(section.id)
                .ok_or_else(|| ProvisionError::not_found("section", &section.name))?;
            s.course_mut(course_id)?.sections.retain(|existing| existing.id != section.id);
            Ok(())
        })
    }

    fn list_assignments(
        &self,
        course: &CourseHandle,
    ) -> Result<Vec<AssignmentHandle>, ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::ListAssignments(course.id));
            Ok(s.course_mut(course.id)?.assignments.clone())
        })
    }

    fn find_rubric(
        &self,
        course: &CourseHandle,
        rubric_id: &str,
    ) -> Result<RubricHandle, ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::FindRubric(rubric_id.to_string()));
            if s.course_mut(course.id)?.rubrics.contains(rubric_id) {
                let title = format!("Rubric {}", rubric_id);
                Ok(RubricHandle { id: rubric_id.to_string(), title })
            } else {
                Err(ProvisionError::not_found("rubric", rubric_id))
            }
        })
    }

    fn create_assignment(
        &self,
        course: &CourseHandle,
        request: &AssignmentRequest,
    ) -> Result<AssignmentHandle, ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::CreateAssignment(request.name.clone()));
            if s.failing_assignments.contains(&request.name) {
                return Err(ProvisionError::remote(Some(500), "Server error"));
            }
            let id = s.next_id();
            let handle = AssignmentHandle {
                id,
                name: request.name.clone(),
                submission_types: request
                    .params
                    .submission_types
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            };
            s.course_mut(course.id)?.assignments.push(handle.clone());
            Ok(handle)
        })
    }

    fn delete_assignment(
        &self,
        course: &CourseHandle,
        assignment: &AssignmentHandle,
    ) -> Result<(), ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::DeleteAssignment(assignment.name.clone()));
            let course = s.course_mut(course.id)?;
            let before = course.assignments.len();
            course.assignments.retain(|a| a.id != assignment.id);
            if course.assignments.len() == before {
                return Err(ProvisionError::not_found("assignment", &assignment.name));
            }
            Ok(())
        })
    }

    fn enroll_student(
        &self,
        _course: &CourseHandle,
        section: &SectionHandle,
        login_id: &str,
    ) -> Result<EnrollmentHandle, ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::EnrollStudent(login_id.to_string()));
            if s.failing_logins.contains(login_id) {
                return Err(ProvisionError::remote(Some(500), "Server error"));
            }
            let user_id = *s
                .users
                .get(login_id)
                .ok_or_else(|| ProvisionError::not_found("user", login_id))?;
            let key = (section.id, login_id.to_string());
            if let Some(id) = s.enrollments.get(&key) {
                return Ok(EnrollmentHandle {
                    id: Some(*id),
                    user: UserRef::Id(user_id),
                    already_enrolled: true,
                });
            }
            let id = s.next_id();
            s.enrollments.insert(key, id);
            let user = UserRef::Id(user_id);
            Ok(EnrollmentHandle { id: Some(id), user, already_enrolled: false })
        })
    }

    fn list_section_enrollments(
        &self,
        section: &SectionHandle,
    ) -> Result<Vec<EnrollmentHandle>, ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::ListSectionEnrollments(section.name.clone()));
            let enrollments = s
                .enrollments
                .iter()
                .filter(|((section_id, _), _)| *section_id == section.id)
                .map(|((_, login), id)| EnrollmentHandle {
                    id: Some(*id),
                    user: s
                        .users
                        .get(login)
                        .map(|uid| UserRef::Id(*uid))
                        .unwrap_or_else(|| UserRef::SisLogin(login.clone())),
                    already_enrolled: true,
                })
                .collect();
            Ok(enrollments)
        })
    }

    fn deactivate_enrollment(
        &self,
        _course: &CourseHandle,
        enrollment: &EnrollmentHandle,
    ) -> Result<(), ProvisionError> {
        self.with_state(|s| {
            let id = enrollment
                .id
                .ok_or_else(|| {
                    ProvisionError::not_found("enrollment", enrollment.user.to_string())
                })?;
            s.calls.push(Call::DeactivateEnrollment(id));
            let before = s.enrollments.len();
            s.enrollments.retain(|_, existing| *existing != id);
            if s.enrollments.len() == before {
                return Err(ProvisionError::not_found("enrollment", id.to_string()));
            }
            Ok(())
        })
    }

    fn create_submission(
        &self,
        course: &CourseHandle,
        assignment_id: u64,
        request: &SubmissionRequest,
    ) -> Result<SubmissionHandle, ProvisionError> {
        self.with_state(|s| {
            s.calls.push(Call::CreateSubmission { assignment_id, user: request.user.clone() });
            let name = s
                .course_mut(course.id)?
                .assignments
                .iter()
                .find(|a| a.id == assignment_id)
                .map(|a| a.name.clone())
                .ok_or_else(|| ProvisionError::Reference(assignment_id.to_string()))?;
            if s.failing_submissions.contains(&name) {
                return Err(ProvisionError::remote(Some(500), "Server error"));
            }
            if !s.is_enrolled(course.id, &request.user) {
                return Err(ProvisionError::remote(
                    Some(403),
                    format!("{} is not enrolled in this course", request.user),
                ));
            }
            let id = s.next_id();
            Ok(SubmissionHandle { id, workflow_state: "submitted".to_string() })
        })
    }
}
