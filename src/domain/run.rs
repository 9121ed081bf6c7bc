//! Run state.
//!
//! A Run is one execution of the pipeline, from trigger to Idle. It holds the
//! working script and the latest artifact of each kind; producing a new value
//! replaces the old one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::artifact::ArtifactRef;
use super::events::{StageEvent, StageOutcome};
use super::stage::Stage;

/// A single pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier for this run (log correlation only)
    pub id: Uuid,

    /// Topic the script is written about
    pub topic: String,

    /// Current script text
    pub script: Option<String>,

    /// Current synthesized audio
    pub audio: Option<ArtifactRef>,

    /// Current raw video
    pub video: Option<ArtifactRef>,

    /// Current merged output
    pub merged: Option<ArtifactRef>,

    /// Name the final asset was stored under
    pub output_name: Option<String>,

    /// Current state of the run
    pub state: RunState,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (if applicable)
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of scripts generated so far
    pub script_generations: u32,

    /// Number of times the final gate sent the run back to the start
    pub restarts: u32,

    /// Stage history, oldest first
    pub history: Vec<StageEvent>,
}

impl Run {
    /// Create a new run for a topic
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            script: None,
            audio: None,
            video: None,
            merged: None,
            output_name: None,
            state: RunState::Running,
            started_at: Utc::now(),
            completed_at: None,
            script_generations: 0,
            restarts: 0,
            history: Vec::new(),
        }
    }

    /// Install a freshly generated script, replacing the previous one
    pub fn replace_script(&mut self, script: String) {
        self.script = Some(script);
        self.script_generations += 1;
    }

    /// Drop every intermediate artifact ahead of a full restart
    pub fn discard_intermediates(&mut self) {
        self.script = None;
        self.audio = None;
        self.video = None;
        self.merged = None;
        self.restarts += 1;
    }

    /// Append a stage event to the history
    pub fn record(&mut self, event: StageEvent) {
        self.history.push(event);
    }

    /// Mark the run as completed
    pub fn complete(&mut self, output_name: String) {
        self.output_name = Some(output_name);
        self.state = RunState::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run as failed at a stage
    pub fn fail(&mut self, stage: Stage, error: String) {
        self.state = RunState::Failed { stage, error };
        self.completed_at = Some(Utc::now());
    }

    /// Stages visited so far, in order
    pub fn stage_trail(&self) -> Vec<Stage> {
        self.history.iter().map(|e| e.stage).collect()
    }

    /// Number of rework verdicts a given gate has issued
    pub fn rework_count(&self, stage: Stage) -> usize {
        self.history
            .iter()
            .filter(|e| e.stage == stage && e.outcome == StageOutcome::Rework)
            .count()
    }

    /// Check if the run is still in progress
    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running)
    }

    /// Check if the run has finished (successfully or not)
    pub fn is_finished(&self) -> bool {
        !self.is_running()
    }
}

/// State of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunState {
    /// Currently executing
    Running,

    /// Final asset persisted
    Completed,

    /// A collaborator call failed
    Failed { stage: Stage, error: String },
}

impl Default for RunState {
    fn default() -> Self {
        Self::Running
    }
}
