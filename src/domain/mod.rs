//! Domain types for the clipforge pipeline.
//!
//! This module contains the core data structures:
//! - Run: Pipeline execution state
//! - ArtifactRef: Media handles passed between collaborators
//! - Stage / StageEvent: Pipeline steps and their in-memory history

pub mod artifact;
pub mod events;
pub mod run;
pub mod stage;

// Re-export commonly used types
pub use artifact::ArtifactRef;
pub use events::{StageEvent, StageOutcome};
pub use run::{Run, RunState};
pub use stage::Stage;
