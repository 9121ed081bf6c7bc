//! Stage history records.
//!
//! Each finished stage attempt appends one event to the in-memory history of
//! its run. History is dropped with the run; nothing here touches disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// A single entry in a run's stage history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    /// Stage that ran
    pub stage: Stage,

    /// When the stage finished
    pub timestamp: DateTime<Utc>,

    /// How the stage ended
    pub outcome: StageOutcome,

    /// Human-readable summary (NO secrets, no inline payloads)
    pub summary: String,

    /// Time taken in milliseconds
    pub duration_ms: Option<u64>,

    /// Error message if failed
    pub error: Option<String>,
}

impl StageEvent {
    /// Create a new event with the current timestamp
    pub fn new(stage: Stage, outcome: StageOutcome, summary: impl Into<String>) -> Self {
        Self {
            stage,
            timestamp: Utc::now(),
            outcome,
            summary: summary.into(),
            duration_ms: None,
            error: None,
        }
    }

    /// Attach duration information
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Attach error information
    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

/// How a stage attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Stage succeeded and control moved forward
    Completed,

    /// Quality gate rejected the artifact; control looped back
    Rework,

    /// Collaborator call failed; the run stopped here
    Failed,
}
