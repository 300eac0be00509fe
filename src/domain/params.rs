//! Typed assignment and submission options.
//!
//! Configuration files may only use the options modelled here; anything else is
//! rejected at load time instead of being forwarded to the platform untouched.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use url::Url;

/// Ways a student can hand in work for an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionType {
    OnlineTextEntry,
    OnlineUrl,
    OnlineUpload,
    MediaRecording,
    StudentAnnotation,
    ExternalTool,
    OnPaper,
    DiscussionTopic,
    OnlineQuiz,
    None,
}

impl SubmissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionType::OnlineTextEntry => "online_text_entry",
            SubmissionType::OnlineUrl => "online_url",
            SubmissionType::OnlineUpload => "online_upload",
            SubmissionType::MediaRecording => "media_recording",
            SubmissionType::StudentAnnotation => "student_annotation",
            SubmissionType::ExternalTool => "external_tool",
            SubmissionType::OnPaper => "on_paper",
            SubmissionType::DiscussionTopic => "discussion_topic",
            SubmissionType::OnlineQuiz => "online_quiz",
            SubmissionType::None => "none",
        }
    }
}

impl std::fmt::Display for SubmissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingType {
    Points,
    Percent,
    LetterGrade,
    GpaScale,
    PassFail,
    NotGraded,
}

/// Assignment options accepted in `params`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignmentParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submission_types: Vec<SubmissionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_type: Option<GradingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_possible: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_at: Option<String>,
    /// `-1` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_attempts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl AssignmentParams {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(points) = self.points_possible {
            if !points.is_finite() || points < 0.0 {
                return Err(format!(
                    "points_possible must be a non-negative number, got {}",
                    points
                ));
            }
        }
        for (field, value) in
            [("due_at", &self.due_at), ("unlock_at", &self.unlock_at), ("lock_at", &self.lock_at)]
        {
            if let Some(value) = value {
                DateTime::parse_from_rfc3339(value).map_err(|e| {
                    format!("{} must be an RFC 3339 timestamp, got '{}': {}", field, value, e)
                })?;
            }
        }
        if let Some(attempts) = self.allowed_attempts {
            if attempts == 0 || attempts < -1 {
                return Err(format!(
                    "allowed_attempts must be -1 (unlimited) or positive, got {}",
                    attempts
                ));
            }
        }
        if self.submission_types.contains(&SubmissionType::None)
            && self.submission_types.len() > 1
        {
            return Err("submission_types 'none' cannot be combined with other types".into());
        }
        Ok(())
    }
}

/// What a test student hands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionContent {
    OnlineTextEntry { body: String },
    OnlineUrl { url: Url },
}

impl SubmissionContent {
    pub fn submission_type(&self) -> SubmissionType {
        match self {
            SubmissionContent::OnlineTextEntry { .. } => SubmissionType::OnlineTextEntry,
            SubmissionContent::OnlineUrl { .. } => SubmissionType::OnlineUrl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionParams {
    pub content: SubmissionContent,
    pub comment: Option<String>,
}

impl SubmissionParams {
    pub fn submission_type(&self) -> SubmissionType {
        self.content.submission_type()
    }
}
