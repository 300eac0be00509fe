//! Shared testing utilities for coursekit CLI tests.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Testing harness providing an isolated working directory for CLI exercises.
#[allow(dead_code)]
pub struct TestContext {
    root: TempDir,
    work_dir: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    /// Create a new isolated environment.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        let work_dir = root.path().join("work");
        fs::create_dir_all(&work_dir).expect("Failed to create test work directory");

        Self { root, work_dir }
    }

    /// Path to the working directory used for CLI invocations.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Write a file relative to the working directory.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.work_dir.join(name);
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Build a command for the compiled `coursekit` binary with no Canvas credentials.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("coursekit").expect("Failed to locate coursekit binary");
        cmd.current_dir(&self.work_dir)
            .env("HOME", self.root.path())
            .env_remove("CANVAS_API_URL")
            .env_remove("CANVAS_API_KEY")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Build a command pointed at a Canvas base URL (usually a mockito server).
    pub fn cli_against(&self, api_url: &str) -> Command {
        let mut cmd = self.cli();
        cmd.env("CANVAS_API_URL", api_url).env("CANVAS_API_KEY", "test-token");
        cmd
    }

    /// Write a courses file holding a single course.
    pub fn single_course(&self, course_id: u64) {
        self.write("courses.yml", &format!("- name: CS 101\n  canvas_id: {}\n", course_id));
    }

    /// Retry quickly so transient-error tests stay fast.
    pub fn fast_retries(&self) {
        self.write("coursekit.toml", "[canvas]\nmax_retries = 2\nretry_delay_ms = 1\n");
    }
}
