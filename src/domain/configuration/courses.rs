//! Course targets loaded from `courses.yml`.

use std::path::Path;

use serde::Deserialize;

use super::loader::{UniqueKeys, entry_error, parse_yaml_list, read_config_file, required_text};
use crate::domain::AppError;

pub const DEFAULT_COURSES_FILE: &str = "courses.yml";
pub const DEFAULT_TEST_STUDENT_SECTION: &str = "Test Students";
pub const DEFAULT_GRADER_SECTION: &str = "Graders";

/// A course that provisioning runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseTarget {
    pub name: String,
    pub course_id: u64,
    /// Number of numbered copies of each assignment. `None` creates one copy under the bare name.
    pub num_create_assignments: Option<u32>,
    pub test_student_section_name: String,
    pub grader_section_name: String,
}

impl CourseTarget {
    pub fn new(name: impl Into<String>, course_id: u64) -> Self {
        Self {
            name: name.into(),
            course_id,
            num_create_assignments: None,
            test_student_section_name: DEFAULT_TEST_STUDENT_SECTION.to_string(),
            grader_section_name: DEFAULT_GRADER_SECTION.to_string(),
        }
    }

    /// Sections the assignment command keeps in place and the reset command tears down.
    pub fn managed_sections(&self) -> [&str; 2] {
        [&self.test_student_section_name, &self.grader_section_name]
    }
}

pub fn load_courses(path: &Path) -> Result<Vec<CourseTarget>, AppError> {
    let content = read_config_file(path)?;
    parse_courses(&path.display().to_string(), &content)
}

pub fn parse_courses(file: &str, content: &str) -> Result<Vec<CourseTarget>, AppError> {
    let entries: Vec<Option<dto::CourseDto>> = parse_yaml_list(file, content)?;
    let mut ids = UniqueKeys::new(file, "canvas_id");
    let mut courses = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let entry = entry.ok_or_else(|| entry_error(file, index, "empty course entry"))?;
        let name = required_text(file, index, "name", entry.name)?;
        let course_id = entry
            .canvas_id
            .ok_or_else(|| entry_error(file, index, "missing required field `canvas_id`"))?;
        ids.insert(index, course_id.to_string())?;

        if entry.num_create_assignments == Some(0) {
            return Err(entry_error(file, index, "num_create_assignments must be at least 1"));
        }

        let test_student_section_name = section_name(
            file,
            index,
            "test_student_section_name",
            entry.test_student_section_name,
            DEFAULT_TEST_STUDENT_SECTION,
        )?;
        let grader_section_name = section_name(
            file,
            index,
            "grader_section_name",
            entry.grader_section_name,
            DEFAULT_GRADER_SECTION,
        )?;
        if test_student_section_name == grader_section_name {
            return Err(entry_error(
                file,
                index,
                "test_student_section_name and grader_section_name must differ",
            ));
        }

        courses.push(CourseTarget {
            name,
            course_id,
            num_create_assignments: entry.num_create_assignments,
            test_student_section_name,
            grader_section_name,
        });
    }

    Ok(courses)
}

fn section_name(
    file: &str,
    index: usize,
    field: &str,
    value: Option<String>,
    default: &str,
) -> Result<String, AppError> {
    match value {
        None => Ok(default.to_string()),
        value => required_text(file, index, field, value),
    }
}

mod dto {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct CourseDto {
        pub name: Option<String>,
        pub canvas_id: Option<u64>,
        pub num_create_assignments: Option<u32>,
        pub test_student_section_name: Option<String>,
        pub grader_section_name: Option<String>,
    }
}
