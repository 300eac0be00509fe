use std::io;

use thiserror::Error;

/// Library-wide fatal error type for coursekit operations.
///
/// Any of these aborts the whole run before (or instead of) touching the remote platform.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration or environment issue.
    #[error("{0}")]
    Configuration(String),

    /// Configuration file was read but its contents are invalid.
    #[error("Invalid configuration in {file}: {message}")]
    InvalidConfig { file: String, message: String },

    /// YAML document could not be parsed.
    #[error("Failed to parse {file}: {details}")]
    YamlParse { file: String, details: String },

    /// TOML settings file could not be parsed.
    #[error("Failed to parse {file}: {source}")]
    TomlParse {
        file: String,
        #[source]
        source: toml::de::Error,
    },

    /// Report serialization failed.
    #[error("Failed to render report: {0}")]
    Render(String),
}

impl AppError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    pub(crate) fn invalid<F: Into<String>, M: Into<String>>(file: F, message: M) -> Self {
        AppError::InvalidConfig { file: file.into(), message: message.into() }
    }
}

/// Entry-scoped failure raised by the remote platform or by reference resolution.
///
/// These never abort a run: provisioners record them against the entry and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    /// Referenced rubric, course, section, user or assignment does not exist.
    #[error("{what} '{id}' not found")]
    NotFound { what: String, id: String },

    /// The platform answered with a non-success status, or could not be reached.
    #[error("{}", remote_message(.status, .message))]
    Remote { status: Option<u16>, message: String },

    /// A submission points at an assignment that does not exist in the course.
    #[error("assignment '{0}' does not resolve to an assignment in this course")]
    Reference(String),
}

fn remote_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("remote error ({code}): {message}"),
        None => format!("remote error: {message}"),
    }
}

impl ProvisionError {
    pub fn not_found(what: impl Into<String>, id: impl Into<String>) -> Self {
        ProvisionError::NotFound { what: what.into(), id: id.into() }
    }

    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        ProvisionError::Remote { status, message: message.into() }
    }

    /// Taxonomy label shown in run reports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::NotFound { .. } => ErrorKind::NotFound,
            ProvisionError::Remote { .. } => ErrorKind::Remote,
            ProvisionError::Reference(_) => ErrorKind::Reference,
        }
    }

    /// 429 and 5xx responses, plus transport failures, are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ProvisionError::Remote { status: Some(code), .. } => *code == 429 || *code >= 500,
            ProvisionError::Remote { status: None, .. } => true,
            _ => false,
        }
    }

    /// The server turned the request away without acting on it (429 or 503).
    pub fn is_throttled(&self) -> bool {
        matches!(self, ProvisionError::Remote { status: Some(429 | 503), .. })
    }
}

/// Report-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorKind {
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "RemoteError")]
    Remote,
    #[serde(rename = "ReferenceError")]
    Reference,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Remote => "RemoteError",
            ErrorKind::Reference => "ReferenceError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
