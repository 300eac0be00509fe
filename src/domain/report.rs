//! Per-entry outcomes and the run report they are collected into.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::{ErrorKind, ProvisionError};

/// What an entry provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Course,
    Section,
    Assignment,
    Enrollment,
    Submission,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Course => "course",
            EntryKind::Section => "section",
            EntryKind::Assignment => "assignment",
            EntryKind::Enrollment => "enrollment",
            EntryKind::Submission => "submission",
        }
    }
}

/// Lifecycle of one entry: `Pending -> Resolving -> Creating -> {Succeeded | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryPhase {
    Pending,
    Resolving,
    Creating,
    Succeeded,
    Failed,
}

impl EntryPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, EntryPhase::Succeeded | EntryPhase::Failed)
    }

    pub fn can_advance_to(self, next: EntryPhase) -> bool {
        use EntryPhase::*;
        matches!(
            (self, next),
            (Pending, Resolving)
                | (Resolving, Creating)
                | (Creating, Succeeded)
                | (Pending | Resolving | Creating, Failed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    Succeeded { detail: String },
    /// Nothing to do, e.g. the object already exists. Not a failure.
    Skipped { reason: String },
    Failed { error: ErrorKind, phase: EntryPhase, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub kind: EntryKind,
    pub course: String,
    pub label: String,
    #[serde(flatten)]
    pub outcome: EntryOutcome,
}

impl EntryReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, EntryOutcome::Failed { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.outcome {
            EntryOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Tracks one entry through its lifecycle and produces its report line.
#[derive(Debug)]
pub struct EntryProgress {
    kind: EntryKind,
    course: String,
    label: String,
    phase: EntryPhase,
}

impl EntryProgress {
    pub fn begin(kind: EntryKind, course: &str, label: impl Into<String>) -> Self {
        Self { kind, course: course.to_string(), label: label.into(), phase: EntryPhase::Pending }
    }

    pub fn phase(&self) -> EntryPhase {
        self.phase
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn resolving(&mut self) {
        self.advance(EntryPhase::Resolving);
    }

    pub fn creating(&mut self) {
        if self.phase == EntryPhase::Pending {
            self.advance(EntryPhase::Resolving);
        }
        self.advance(EntryPhase::Creating);
    }

    pub fn succeed(mut self, detail: impl Into<String>) -> EntryReport {
        self.advance(EntryPhase::Succeeded);
        self.into_report(EntryOutcome::Succeeded { detail: detail.into() })
    }

    pub fn skip(self, reason: impl Into<String>) -> EntryReport {
        debug_assert!(!self.phase.is_terminal());
        tracing::debug!(kind = self.kind.as_str(), label = %self.label, "entry skipped");
        self.into_report(EntryOutcome::Skipped { reason: reason.into() })
    }

    /// Record a failure in the phase the entry reached.
    pub fn fail(mut self, error: &ProvisionError) -> EntryReport {
        let phase = self.phase;
        self.advance(EntryPhase::Failed);
        self.into_report(EntryOutcome::Failed {
            error: error.kind(),
            phase,
            message: error.to_string(),
        })
    }

    fn advance(&mut self, next: EntryPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal entry transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::trace!(label = %self.label, from = ?self.phase, to = ?next, "entry transition");
        self.phase = next;
    }

    fn into_report(self, outcome: EntryOutcome) -> EntryReport {
        EntryReport { kind: self.kind, course: self.course, label: self.label, outcome }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Ordered outcomes of one command run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    entries: Vec<EntryReport>,
}

impl RunReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), started_at: Utc::now(), finished_at: None, entries: vec![] }
    }

    pub fn push(&mut self, entry: EntryReport) {
        if let EntryOutcome::Failed { error, message, .. } = &entry.outcome {
            tracing::warn!(
                course = %entry.course,
                kind = entry.kind.as_str(),
                label = %entry.label,
                error = %error,
                "{}",
                message
            );
        }
        self.entries.push(entry);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn entries(&self) -> &[EntryReport] {
        &self.entries
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| matches!(e.outcome, EntryOutcome::Succeeded { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| matches!(e.outcome, EntryOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| e.is_failure())
    }

    pub fn counts(&self) -> ReportCounts {
        self.entries.iter().fold(ReportCounts::default(), |mut counts, entry| {
            match entry.outcome {
                EntryOutcome::Succeeded { .. } => counts.succeeded += 1,
                EntryOutcome::Skipped { .. } => counts.skipped += 1,
                EntryOutcome::Failed { .. } => counts.failed += 1,
            }
            counts
        })
    }

    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(EntryReport::is_failure)
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_failures() { 1 } else { 0 }
    }
}
