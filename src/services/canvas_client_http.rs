//! Canvas REST API client implementation using reqwest.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{LINK, RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{
    AppError, AssignmentHandle, AssignmentParams, AssignmentRequest, CanvasSettings, CourseHandle,
    EnrollmentHandle, ProvisionError, RubricHandle, SectionHandle, SubmissionContent,
    SubmissionHandle, SubmissionRequest, UserRef,
};
use crate::ports::CanvasClient;

/// Upper bound for a server-requested `Retry-After` wait.
const MAX_RETRY_AFTER_SECS: u64 = 60;

/// HTTP client for the Canvas REST API.
#[derive(Clone)]
pub struct HttpCanvasClient {
    api_key: String,
    base_url: Url,
    max_retries: u32,
    retry_delay_ms: u64,
    per_page: u32,
    client: Client,
}

impl std::fmt::Debug for HttpCanvasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCanvasClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("per_page", &self.per_page)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpCanvasClient {
    /// Create a new HTTP client from process settings.
    pub fn new(settings: &CanvasSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.http.request_timeout_seconds))
            .user_agent(concat!("coursekit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: settings.api_key.clone(),
            base_url: settings.api_url.clone(),
            max_retries: settings.http.max_retries,
            retry_delay_ms: settings.http.retry_delay_ms,
            per_page: settings.http.per_page,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProvisionError> {
        self.base_url
            .join(&format!("api/v1/{}", path))
            .map_err(|e| {
                ProvisionError::remote(None, format!("invalid endpoint '{}': {}", path, e))
            })
    }

    /// Send a request, retrying with exponential backoff.
    ///
    /// Idempotent requests retry every transient failure. Others retry only when the
    /// server throttled them, since a timeout or 5xx may hide a completed create.
    fn execute<F>(
        &self,
        describe: &str,
        idempotent: bool,
        build: F,
    ) -> Result<Response, ProvisionError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let max_attempts = self.max_retries.max(1); // Ensure at least one attempt
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(request = describe, attempt, "sending request");

            let (error, retry_after) = match build(&self.client).bearer_auth(&self.api_key).send()
            {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry_after = retry_after_secs(&response);
                    let body = response.text().unwrap_or_default();
                    let message = error_message(status, &body);
                    (ProvisionError::remote(Some(status), message), retry_after)
                }
                Err(e) => {
                    (ProvisionError::remote(None, format!("HTTP request failed: {}", e)), None)
                }
            };

            let retryable = if idempotent { error.is_transient() } else { error.is_throttled() };
            if !retryable || attempt >= max_attempts {
                return Err(error);
            }

            // Exponential backoff: base * 2^(attempt-1)
            let delay = match retry_after {
                Some(secs) => Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS)),
                None => Duration::from_millis(
                    self.retry_delay_ms.saturating_mul(2_u64.saturating_pow(attempt - 1)),
                ),
            };
            tracing::warn!(
                request = describe,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "{}; retrying",
                error
            );
            std::thread::sleep(delay);
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProvisionError> {
        let url = self.endpoint(path)?;
        let response = self.execute(&format!("GET {}", path), true, |c| c.get(url.clone()))?;
        decode(response)
    }

    /// Fetch every page of a list endpoint.
    fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ProvisionError> {
        let mut first = self.endpoint(path)?;
        first.query_pairs_mut().append_pair("per_page", &self.per_page.to_string());

        let mut items = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next.take() {
            let response = self.execute(&format!("GET {}", path), true, |c| c.get(url.clone()))?;
            next = next_link(&response).filter(|candidate| candidate != &url);
            let page: Vec<T> = decode(response)?;
            items.extend(page);
        }
        Ok(items)
    }

    fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProvisionError> {
        let url = self.endpoint(path)?;
        let describe = format!("POST {}", path);
        let response = self.execute(&describe, false, |c| c.post(url.clone()).json(body))?;
        decode(response)
    }

    fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<(), ProvisionError> {
        let mut url = self.endpoint(path)?;
        for (key, value) in query {
            url.query_pairs_mut().append_pair(key, value);
        }
        self.execute(&format!("DELETE {}", path), true, |c| c.delete(url.clone()))?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProvisionError> {
    let status = response.status().as_u16();
    response
        .json()
        .map_err(|e| {
            ProvisionError::remote(Some(status), format!("Failed to parse response: {}", e))
        })
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response.headers().get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}

fn next_link(response: &Response) -> Option<Url> {
    parse_next_link(response.headers().get(LINK)?.to_str().ok()?)
}

/// Extract the `rel="next"` target from an RFC 5988 `Link` header.
fn parse_next_link(header: &str) -> Option<Url> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param: String = param.chars().filter(|c| !c.is_whitespace()).collect();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        Url::parse(target.strip_prefix('<')?.strip_suffix('>')?).ok()
    })
}

/// Pull a readable message out of a Canvas error body.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value
            .get("errors")
            .and_then(|errors| errors.get(0))
            .and_then(|first| first.get("message"))
            .and_then(|m| m.as_str())
        {
            return message.to_string();
        }
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
        if let Some(errors) = value.get("errors") {
            return errors.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        match status {
            429 => "Rate limited".to_string(),
            s if s >= 500 => "Server error".to_string(),
            _ => "Unknown error".to_string(),
        }
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// Replace a 404 with a more specific error.
fn on_not_found(error: ProvisionError, replace: impl FnOnce() -> ProvisionError) -> ProvisionError {
    match error {
        ProvisionError::Remote { status: Some(404), .. } => replace(),
        other => other,
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiId {
    Number(u64),
    Text(String),
}

impl ApiId {
    fn into_string(self) -> String {
        match self {
            ApiId::Number(n) => n.to_string(),
            ApiId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CourseDto {
    id: u64,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SectionDto {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AssignmentDto {
    id: u64,
    name: String,
    #[serde(default)]
    submission_types: Vec<String>,
}

impl From<AssignmentDto> for AssignmentHandle {
    fn from(dto: AssignmentDto) -> Self {
        AssignmentHandle { id: dto.id, name: dto.name, submission_types: dto.submission_types }
    }
}

#[derive(Debug, Deserialize)]
struct RubricDto {
    id: ApiId,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnrollmentDto {
    id: u64,
    user_id: u64,
}

#[derive(Debug, Deserialize)]
struct SubmissionDto {
    id: u64,
    #[serde(default)]
    workflow_state: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateSectionBody<'a> {
    course_section: NamedSection<'a>,
}

#[derive(Debug, Serialize)]
struct NamedSection<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateAssignmentBody<'a> {
    assignment: AssignmentFields<'a>,
}

#[derive(Debug, Serialize)]
struct AssignmentFields<'a> {
    name: &'a str,
    #[serde(flatten)]
    params: &'a AssignmentParams,
}

#[derive(Debug, Serialize)]
struct RubricAssociationBody<'a> {
    rubric_association: RubricAssociationFields<'a>,
}

#[derive(Debug, Serialize)]
struct RubricAssociationFields<'a> {
    rubric_id: &'a str,
    association_id: u64,
    association_type: &'static str,
    use_for_grading: bool,
    purpose: &'static str,
    bookmarked: bool,
}

#[derive(Debug, Serialize)]
struct EnrollmentBody {
    enrollment: EnrollmentFields,
}

#[derive(Debug, Serialize)]
struct EnrollmentFields {
    user_id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    enrollment_state: &'static str,
}

#[derive(Debug, Serialize)]
struct SubmissionBody<'a> {
    submission: SubmissionFields<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<CommentFields<'a>>,
}

#[derive(Debug, Serialize)]
struct SubmissionFields<'a> {
    submission_type: &'static str,
    user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CommentFields<'a> {
    text_comment: &'a str,
}

impl CanvasClient for HttpCanvasClient {
    fn get_course(&self, course_id: u64) -> Result<CourseHandle, ProvisionError> {
        let dto: CourseDto = self
            .get_json(&format!("courses/{}", course_id))
            .map_err(|e| {
                on_not_found(e, || ProvisionError::not_found("course", course_id.to_string()))
            })?;
        let name = dto.name.unwrap_or_else(|| format!("course {}", dto.id));
        Ok(CourseHandle { id: dto.id, name })
    }

    fn list_sections(&self, course: &CourseHandle) -> Result<Vec<SectionHandle>, ProvisionError> {
        let sections: Vec<SectionDto> = self.get_all(&format!("courses/{}/sections", course.id))?;
        Ok(sections.into_iter().map(|s| SectionHandle { id: s.id, name: s.name }).collect())
    }

    fn create_section(
        &self,
        course: &CourseHandle,
        name: &str,
    ) -> Result<SectionHandle, ProvisionError> {
        let body = CreateSectionBody { course_section: NamedSection { name } };
        let dto: SectionDto = self.post_json(&format!("courses/{}/sections", course.id), &body)?;
        Ok(SectionHandle { id: dto.id, name: dto.name })
    }

    fn delete_section(&self, section: &SectionHandle) -> Result<(), ProvisionError> {
        self.delete(&format!("sections/{}", section.id), &[])
            .map_err(|e| on_not_found(e, || ProvisionError::not_found("section", &section.name)))
    }

    fn list_assignments(
        &self,
        course: &CourseHandle,
    ) -> Result<Vec<AssignmentHandle>, ProvisionError> {
        let assignments: Vec<AssignmentDto> =
            self.get_all(&format!("courses/{}/assignments", course.id))?;
        Ok(assignments.into_iter().map(AssignmentHandle::from).collect())
    }

    fn find_rubric(
        &self,
        course: &CourseHandle,
        rubric_id: &str,
    ) -> Result<RubricHandle, ProvisionError> {
        let dto: RubricDto = self
            .get_json(&format!("courses/{}/rubrics/{}", course.id, rubric_id))
            .map_err(|e| on_not_found(e, || ProvisionError::not_found("rubric", rubric_id)))?;
        let id = dto.id.into_string();
        let title = dto.title.unwrap_or_else(|| format!("rubric {}", id));
        Ok(RubricHandle { id, title })
    }

    fn create_assignment(
        &self,
        course: &CourseHandle,
        request: &AssignmentRequest,
    ) -> Result<AssignmentHandle, ProvisionError> {
        let body = CreateAssignmentBody {
            assignment: AssignmentFields { name: &request.name, params: &request.params },
        };
        let created: AssignmentHandle = self
            .post_json::<AssignmentDto, _>(&format!("courses/{}/assignments", course.id), &body)?
            .into();

        if let Some(rubric) = &request.rubric {
            let body = RubricAssociationBody {
                rubric_association: RubricAssociationFields {
                    rubric_id: &rubric.id,
                    association_id: created.id,
                    association_type: "Assignment",
                    use_for_grading: true,
                    purpose: "grading",
                    bookmarked: false,
                },
            };
            self.post_json::<serde_json::Value, _>(
                &format!("courses/{}/rubric_associations", course.id),
                &body,
            )
            .map_err(|e| match e {
                ProvisionError::Remote { status, message } => ProvisionError::Remote {
                    status,
                    message: format!(
                        "assignment {} created but rubric {} could not be associated: {}",
                        created.id, rubric.id, message
                    ),
                },
                other => other,
            })?;
        }

        Ok(created)
    }

    fn delete_assignment(
        &self,
        course: &CourseHandle,
        assignment: &AssignmentHandle,
    ) -> Result<(), ProvisionError> {
        self.delete(&format!("courses/{}/assignments/{}", course.id, assignment.id), &[])
            .map_err(|e| {
                on_not_found(e, || ProvisionError::not_found("assignment", &assignment.name))
            })
    }

    fn enroll_student(
        &self,
        _course: &CourseHandle,
        section: &SectionHandle,
        login_id: &str,
    ) -> Result<EnrollmentHandle, ProvisionError> {
        let user = UserRef::SisLogin(login_id.to_string());
        let body = EnrollmentBody {
            enrollment: EnrollmentFields {
                user_id: user.as_param(),
                kind: "StudentEnrollment",
                enrollment_state: "active",
            },
        };
        let already_enrolled =
            || EnrollmentHandle { id: None, user: user.clone(), already_enrolled: true };

        let path = format!("sections/{}/enrollments", section.id);
        match self.post_json::<EnrollmentDto, _>(&path, &body) {
            Ok(dto) => Ok(EnrollmentHandle {
                id: Some(dto.id),
                user: UserRef::Id(dto.user_id),
                already_enrolled: false,
            }),
            Err(ProvisionError::Remote { status: Some(409), .. }) => Ok(already_enrolled()),
            Err(ProvisionError::Remote { status: Some(400), message })
                if message.to_lowercase().contains("already") =>
            {
                Ok(already_enrolled())
            }
            Err(e) => Err(on_not_found(e, || ProvisionError::not_found("user", login_id))),
        }
    }

    fn list_section_enrollments(
        &self,
        section: &SectionHandle,
    ) -> Result<Vec<EnrollmentHandle>, ProvisionError> {
        let enrollments: Vec<EnrollmentDto> =
            self.get_all(&format!("sections/{}/enrollments", section.id))?;
        Ok(enrollments
            .into_iter()
            .map(|e| EnrollmentHandle {
                id: Some(e.id),
                user: UserRef::Id(e.user_id),
                already_enrolled: true,
            })
            .collect())
    }

    fn deactivate_enrollment(
        &self,
        course: &CourseHandle,
        enrollment: &EnrollmentHandle,
    ) -> Result<(), ProvisionError> {
        let id = enrollment
            .id
            .ok_or_else(|| ProvisionError::not_found("enrollment", enrollment.user.to_string()))?;
        self.delete(&format!("courses/{}/enrollments/{}", course.id, id), &[("task", "delete")])
            .map_err(|e| {
                on_not_found(e, || ProvisionError::not_found("enrollment", id.to_string()))
            })
    }

    fn create_submission(
        &self,
        course: &CourseHandle,
        assignment_id: u64,
        request: &SubmissionRequest,
    ) -> Result<SubmissionHandle, ProvisionError> {
        let (body, url) = match &request.params.content {
            SubmissionContent::OnlineTextEntry { body } => (Some(body.as_str()), None),
            SubmissionContent::OnlineUrl { url } => (None, Some(url.as_str())),
        };
        let payload = SubmissionBody {
            submission: SubmissionFields {
                submission_type: request.params.submission_type().as_str(),
                user_id: request.user.as_param(),
                body,
                url,
            },
            comment: request
                .params
                .comment
                .as_deref()
                .map(|text_comment| CommentFields { text_comment }),
        };

        let dto: SubmissionDto = self
            .post_json(
                &format!("courses/{}/assignments/{}/submissions", course.id, assignment_id),
                &payload,
            )
            .map_err(|e| on_not_found(e, || ProvisionError::Reference(assignment_id.to_string())))?;
        Ok(SubmissionHandle {
            id: dto.id,
            workflow_state: dto.workflow_state.unwrap_or_else(|| "submitted".to_string()),
        })
    }
}
