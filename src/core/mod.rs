//! Core orchestration logic.
//!
//! This module contains:
//! - Pipeline: Prompt templates and per-stage settings
//! - Gate: Quality gate heuristics
//! - Orchestrator: The stage state machine
//! - Scheduler: The fixed-interval trigger loop

pub mod gate;
pub mod orchestrator;
pub mod pipeline;
pub mod scheduler;

// Re-export commonly used types
pub use gate::{GateKind, KeywordGate, QualityGate, ScoreGate, Verdict};
pub use orchestrator::{output_file_name, AssetTargets, Collaborators, Orchestrator, PipelineError};
pub use pipeline::{GenerationParams, PipelineSettings, VoiceSettings};
pub use scheduler::{ScheduleReport, Scheduler};
