//! Test-student submissions loaded from `submissions.yml`.

use std::path::Path;

use serde::Deserialize;
use url::Url;

use super::loader::{UniqueKeys, entry_error, parse_yaml_list, read_config_file, required_text};
use crate::domain::AppError;
use crate::domain::params::{SubmissionContent, SubmissionParams, SubmissionType};

pub const DEFAULT_SUBMISSIONS_FILE: &str = "submissions.yml";

/// One test student's submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSpec {
    pub student_login_id: String,
    /// Assignment name in the target course. `None` submits to every assignment that
    /// accepts the submission type.
    pub assignment_reference: Option<String>,
    pub submission_params: SubmissionParams,
}

pub fn load_submissions(path: &Path) -> Result<Vec<SubmissionSpec>, AppError> {
    let content = read_config_file(path)?;
    parse_submissions(&path.display().to_string(), &content)
}

pub fn parse_submissions(file: &str, content: &str) -> Result<Vec<SubmissionSpec>, AppError> {
    let entries: Vec<Option<dto::SubmissionDto>> = parse_yaml_list(file, content)?;
    let mut pairs = UniqueKeys::new(file, "student/assignment pair");
    let mut specs = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let entry = entry
            .ok_or_else(|| entry_error(file, index, "empty submission entry"))?
            .normalized();
        let student_login_id =
            required_text(file, index, "student_login_id", entry.student_login_id)?;
        let assignment_reference = match entry.assignment {
            None => None,
            value => Some(required_text(file, index, "assignment", value)?),
        };
        pairs.insert(
            index,
            format!("{} -> {}", student_login_id, assignment_reference.as_deref().unwrap_or("*")),
        )?;

        let fields = match (entry.submission_params, entry.inline.is_empty()) {
            (Some(_), false) => {
                return Err(entry_error(
                    file,
                    index,
                    "submission fields must be given either inline or under \
                     `submission_params`, not both",
                ));
            }
            (Some(nested), true) => nested,
            (None, _) => entry.inline,
        };
        let submission_params =
            fields.into_params().map_err(|message| entry_error(file, index, message))?;

        specs.push(SubmissionSpec { student_login_id, assignment_reference, submission_params });
    }

    Ok(specs)
}

mod dto {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct SubmissionDto {
        #[serde(alias = "sis_login_id")]
        pub student_login_id: Option<String>,
        pub assignment: Option<String>,
        pub submission_params: Option<SubmissionFieldsDto>,
        pub submission_type: Option<SubmissionType>,
        pub body: Option<String>,
        pub url: Option<String>,
        pub comment: Option<String>,
        #[serde(skip)]
        pub inline: SubmissionFieldsDto,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct SubmissionFieldsDto {
        pub submission_type: Option<SubmissionType>,
        pub body: Option<String>,
        pub url: Option<String>,
        pub comment: Option<String>,
    }

    impl SubmissionFieldsDto {
        pub fn is_empty(&self) -> bool {
            self.submission_type.is_none()
                && self.body.is_none()
                && self.url.is_none()
                && self.comment.is_none()
        }

        pub fn into_params(self) -> Result<SubmissionParams, String> {
            let submission_type = self.submission_type.unwrap_or(SubmissionType::OnlineTextEntry);
            let content = match submission_type {
                SubmissionType::OnlineTextEntry => {
                    if self.url.is_some() {
                        return Err("`url` is only valid for online_url submissions".into());
                    }
                    match self.body {
                        Some(body) if !body.trim().is_empty() => {
                            SubmissionContent::OnlineTextEntry { body }
                        }
                        _ => return Err("online_text_entry submissions require a `body`".into()),
                    }
                }
                SubmissionType::OnlineUrl => {
                    if self.body.is_some() {
                        return Err("`body` is only valid for online_text_entry submissions".into());
                    }
                    let raw = self
                        .url
                        .ok_or_else(|| "online_url submissions require a `url`".to_string())?;
                    let url = Url::parse(&raw)
                        .map_err(|e| format!("invalid submission url '{}': {}", raw, e))?;
                    SubmissionContent::OnlineUrl { url }
                }
                other => {
                    return Err(format!(
                        "submission_type '{}' cannot be submitted by this tool \
                         (use online_text_entry or online_url)",
                        other
                    ));
                }
            };
            Ok(SubmissionParams { content, comment: self.comment })
        }
    }

    impl SubmissionDto {
        /// Gather the inline submission fields so they can be treated like `submission_params`.
        pub fn normalized(mut self) -> Self {
            self.inline = SubmissionFieldsDto {
                submission_type: self.submission_type.take(),
                body: self.body.take(),
                url: self.url.take(),
                comment: self.comment.take(),
            };
            self
        }
    }
}
