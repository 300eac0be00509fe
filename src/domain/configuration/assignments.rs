//! Assignment entries loaded from `assignment.yml`.

use std::path::Path;

use serde::Deserialize;

use super::loader::{
    ScalarId, UniqueKeys, entry_error, parse_yaml_list, read_config_file, required_text,
};
use crate::domain::AppError;
use crate::domain::params::AssignmentParams;

pub const DEFAULT_ASSIGNMENTS_FILE: &str = "assignment.yml";

/// One assignment to create in every target course.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentSpec {
    pub name: String,
    /// Rubric on the target course; existence is checked at provisioning time.
    pub rubric_id: Option<String>,
    pub params: AssignmentParams,
}

impl AssignmentSpec {
    /// Names this entry creates in a course asking for `copies` numbered copies.
    pub fn generated_names(&self, copies: Option<u32>) -> Vec<String> {
        match copies {
            None => vec![self.name.clone()],
            Some(n) => (1..=n).map(|i| format!("{}{}", self.name, i)).collect(),
        }
    }
}

pub fn load_assignments(path: &Path) -> Result<Vec<AssignmentSpec>, AppError> {
    let content = read_config_file(path)?;
    parse_assignments(&path.display().to_string(), &content)
}

pub fn parse_assignments(file: &str, content: &str) -> Result<Vec<AssignmentSpec>, AppError> {
    let entries: Vec<Option<dto::AssignmentDto>> = parse_yaml_list(file, content)?;
    let mut names = UniqueKeys::new(file, "assignment name");
    let mut specs = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let entry = entry.ok_or_else(|| entry_error(file, index, "empty assignment entry"))?;
        let name = required_text(file, index, "name", entry.name)?;
        names.insert(index, name.clone())?;

        let rubric_id = match entry.rubric_id.map(ScalarId::into_string) {
            Some(id) if id.trim().is_empty() => {
                return Err(entry_error(file, index, "field `rubric_id` must not be empty"));
            }
            other => other.map(|id| id.trim().to_string()),
        };

        let params = entry.params.unwrap_or_default();
        params.validate().map_err(|message| entry_error(file, index, message))?;

        specs.push(AssignmentSpec { name, rubric_id, params });
    }

    Ok(specs)
}

mod dto {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct AssignmentDto {
        pub name: Option<String>,
        pub rubric_id: Option<ScalarId>,
        pub params: Option<AssignmentParams>,
    }
}
