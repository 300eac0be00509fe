//! Grading platform client port definition.
//!
//! Every method is a single remote operation. Provisioners depend only on this trait,
//! so they run unchanged against the HTTP adapter or an in-memory fake.

use crate::domain::{
    AssignmentHandle, AssignmentRequest, CourseHandle, EnrollmentHandle, ProvisionError,
    RubricHandle, SectionHandle, SubmissionHandle, SubmissionRequest,
};

/// Port for grading platform operations.
pub trait CanvasClient {
    /// Look up a course by its platform id.
    fn get_course(&self, course_id: u64) -> Result<CourseHandle, ProvisionError>;

    fn list_sections(&self, course: &CourseHandle) -> Result<Vec<SectionHandle>, ProvisionError>;

    fn create_section(
        &self,
        course: &CourseHandle,
        name: &str,
    ) -> Result<SectionHandle, ProvisionError>;

    fn delete_section(&self, section: &SectionHandle) -> Result<(), ProvisionError>;

    fn list_assignments(
        &self,
        course: &CourseHandle,
    ) -> Result<Vec<AssignmentHandle>, ProvisionError>;

    /// Fails with `NotFound` when the rubric does not exist in the course.
    fn find_rubric(
        &self,
        course: &CourseHandle,
        rubric_id: &str,
    ) -> Result<RubricHandle, ProvisionError>;

    /// Create an assignment and, when the request carries a rubric, associate it for grading.
    fn create_assignment(
        &self,
        course: &CourseHandle,
        request: &AssignmentRequest,
    ) -> Result<AssignmentHandle, ProvisionError>;

    fn delete_assignment(
        &self,
        course: &CourseHandle,
        assignment: &AssignmentHandle,
    ) -> Result<(), ProvisionError>;

    /// Enroll a student into a section. Enrolling an already-enrolled student succeeds.
    fn enroll_student(
        &self,
        course: &CourseHandle,
        section: &SectionHandle,
        login_id: &str,
    ) -> Result<EnrollmentHandle, ProvisionError>;

    fn list_section_enrollments(
        &self,
        section: &SectionHandle,
    ) -> Result<Vec<EnrollmentHandle>, ProvisionError>;

    /// Remove an enrollment from the course.
    fn deactivate_enrollment(
        &self,
        course: &CourseHandle,
        enrollment: &EnrollmentHandle,
    ) -> Result<(), ProvisionError>;

    /// Submit on behalf of a student.
    ///
    /// Fails with `Reference` when `assignment_id` does not name an assignment in the course.
    fn create_submission(
        &self,
        course: &CourseHandle,
        assignment_id: u64,
        request: &SubmissionRequest,
    ) -> Result<SubmissionHandle, ProvisionError>;
}
