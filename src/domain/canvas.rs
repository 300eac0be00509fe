//! Handles for objects that live on the remote grading platform.

use std::fmt;

use serde::Serialize;

use super::params::{AssignmentParams, SubmissionParams, SubmissionType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseHandle {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHandle {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubricHandle {
    pub id: String,
    pub title: String,
}

/// An assignment as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentHandle {
    pub id: u64,
    pub name: String,
    /// Raw submission type names; the platform may report types this tool does not model.
    pub submission_types: Vec<String>,
}

impl AssignmentHandle {
    pub fn accepts(&self, submission_type: SubmissionType) -> bool {
        self.submission_types.iter().any(|t| t == submission_type.as_str())
    }
}

/// How a user is addressed in API calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(u64),
    SisLogin(String),
}

impl UserRef {
    /// Value accepted by `user_id` request fields.
    pub fn as_param(&self) -> String {
        match self {
            UserRef::Id(id) => id.to_string(),
            UserRef::SisLogin(login) => format!("sis_login_id:{}", login),
        }
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRef::Id(id) => write!(f, "user {}", id),
            UserRef::SisLogin(login) => write!(f, "{}", login),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentHandle {
    /// Absent when the platform only confirmed a prior enrollment.
    pub id: Option<u64>,
    pub user: UserRef,
    pub already_enrolled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionHandle {
    pub id: u64,
    pub workflow_state: String,
}

/// Everything needed to create one assignment, rubric association included.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentRequest {
    pub name: String,
    pub params: AssignmentParams,
    pub rubric: Option<RubricHandle>,
}

/// A submission made on behalf of an enrolled student.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub user: UserRef,
    pub params: SubmissionParams,
}
