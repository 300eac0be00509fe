//! Shared helpers for reading YAML configuration documents.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::domain::AppError;

/// Read a configuration file, naming it in the error when it is missing.
pub(crate) fn read_config_file(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            AppError::config_error(format!("Configuration file not found: {}", path.display()))
        } else {
            AppError::config_error(format!("Failed to read {}: {}", path.display(), err))
        }
    })
}

/// Parse a YAML document whose root is a list of entries.
///
/// An empty document is an empty list. Entry order is preserved.
pub(crate) fn parse_yaml_list<T: DeserializeOwned>(
    file: &str,
    content: &str,
) -> Result<Vec<T>, AppError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Option<Vec<T>> = serde_yaml::from_str(content)
        .map_err(|e| AppError::YamlParse { file: file.to_string(), details: e.to_string() })?;
    Ok(entries.unwrap_or_default())
}

pub(crate) fn entry_error(file: &str, index: usize, message: impl AsRef<str>) -> AppError {
    AppError::invalid(file, format!("entry {}: {}", index + 1, message.as_ref()))
}

/// Require a non-blank string field on a list entry.
pub(crate) fn required_text(
    file: &str,
    index: usize,
    field: &str,
    value: Option<String>,
) -> Result<String, AppError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Some(_) => Err(entry_error(file, index, format!("field `{}` must not be empty", field))),
        None => Err(entry_error(file, index, format!("missing required field `{}`", field))),
    }
}

/// Reject the second occurrence of a key that must be unique within a file.
pub(crate) struct UniqueKeys<'a> {
    file: &'a str,
    what: &'a str,
    seen: HashSet<String>,
}

impl<'a> UniqueKeys<'a> {
    pub(crate) fn new(file: &'a str, what: &'a str) -> Self {
        Self { file, what, seen: HashSet::new() }
    }

    pub(crate) fn insert(&mut self, index: usize, key: impl Into<String>) -> Result<(), AppError> {
        let key = key.into();
        if self.seen.contains(&key) {
            return Err(entry_error(
                self.file,
                index,
                format!("duplicate {} '{}'", self.what, key),
            ));
        }
        self.seen.insert(key);
        Ok(())
    }
}

/// A YAML scalar that may be written as a string or an integer.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum ScalarId {
    Number(u64),
    Text(String),
}

impl ScalarId {
    pub(crate) fn into_string(self) -> String {
        match self {
            ScalarId::Number(n) => n.to_string(),
            ScalarId::Text(s) => s,
        }
    }
}
