//! clipforge - Quality-gated short video generation pipeline
//!
//! Chains remote services into one short video: a text model writes a
//! script, a speech service voices it, a merge service lays the voiceover on
//! a stored background clip, and the result is uploaded to Drive. The same
//! text model grades the script and the final video; a rejected artifact
//! sends control back to an earlier stage.
//!
//! # Modules
//!
//! - `adapters`: Remote collaborators (Gemini, ElevenLabs, Drive, merge service)
//! - `core`: Orchestration logic (Orchestrator, Scheduler, quality gates)
//! - `domain`: Data structures (Run, Stage, ArtifactRef)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Produce one video
//! clipforge run --topic "deep sea creatures"
//!
//! # Produce a video every 3 hours
//! clipforge schedule
//!
//! # Check what the script gate makes of an evaluator reply
//! echo "Score: 6/10" | clipforge gate script
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use core::{Orchestrator, PipelineError, Scheduler};
pub use domain::{ArtifactRef, Run, RunState, Stage};
