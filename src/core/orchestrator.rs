//! Pipeline orchestrator.
//!
//! Drives one run through the stage sequence
//!
//! ```text
//! GenerateScript -> EvaluateScript -> SynthesizeSpeech -> [EvaluateSpeech]
//!   -> FetchRawVideo -> MergeAudioVideo -> EvaluateFinal -> PersistOutput
//! ```
//!
//! Quality gates loop back: a rejected script is regenerated, a rejected
//! voiceover is resynthesized, and a rejected final video restarts the whole
//! run. Loop-backs are unbounded. A failed collaborator call ends the run on
//! the spot; nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::adapters::http::truncate;
use crate::adapters::{
    AssetStore, CallResult, CollaboratorError, MediaMerger, SpeechSynthesizer, TextGenerator,
};
use crate::domain::{Run, Stage, StageEvent, StageOutcome};

use super::gate::{KeywordGate, QualityGate, ScoreGate, Verdict};
use super::pipeline::PipelineSettings;

/// Terminal pipeline failures
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A collaborator call failed; the run stopped at `stage`
    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: CollaboratorError,
        /// The run as it stood when it failed
        run: Box<Run>,
    },

    /// Credentials still hold placeholder values
    #[error("placeholder or missing credentials: {}", .fields.join(", "))]
    Configuration { fields: Vec<String> },
}

impl PipelineError {
    /// Stage that failed, if this is a stage failure
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            PipelineError::Configuration { .. } => None,
        }
    }
}

/// The remote capabilities a run needs
#[derive(Clone)]
pub struct Collaborators {
    /// Writes scripts and grades artifacts
    pub text: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub assets: Arc<dyn AssetStore>,
    pub merger: Arc<dyn MediaMerger>,
}

/// Fixed asset locations a run reads from and writes to
#[derive(Debug, Clone)]
pub struct AssetTargets {
    /// Asset store id of the raw background video
    pub raw_video_id: String,

    /// Asset store folder receiving finished videos
    pub output_folder_id: String,
}

/// Where control goes after a stage
#[derive(Debug)]
struct Transition {
    outcome: StageOutcome,
    next: Option<Stage>,
    summary: String,
}

impl Transition {
    fn forward(next: Stage, summary: impl Into<String>) -> Self {
        Self {
            outcome: StageOutcome::Completed,
            next: Some(next),
            summary: summary.into(),
        }
    }

    fn rework(back_to: Stage, summary: impl Into<String>) -> Self {
        Self {
            outcome: StageOutcome::Rework,
            next: Some(back_to),
            summary: summary.into(),
        }
    }

    fn finish(summary: impl Into<String>) -> Self {
        Self {
            outcome: StageOutcome::Completed,
            next: None,
            summary: summary.into(),
        }
    }
}

/// Main pipeline orchestrator
pub struct Orchestrator {
    collaborators: Collaborators,
    settings: PipelineSettings,
    targets: AssetTargets,
    script_gate: Box<dyn QualityGate>,
    media_gate: Box<dyn QualityGate>,
}

impl Orchestrator {
    /// Create an orchestrator with the stock gates
    pub fn new(
        collaborators: Collaborators,
        settings: PipelineSettings,
        targets: AssetTargets,
    ) -> Self {
        Self {
            collaborators,
            settings,
            targets,
            script_gate: Box::new(ScoreGate::default()),
            media_gate: Box::new(KeywordGate::default()),
        }
    }

    /// Replace the gate applied to scripts
    pub fn with_script_gate(mut self, gate: Box<dyn QualityGate>) -> Self {
        self.script_gate = gate;
        self
    }

    /// Replace the gate applied to the voiceover and the final video
    pub fn with_media_gate(mut self, gate: Box<dyn QualityGate>) -> Self {
        self.media_gate = gate;
        self
    }

    /// Execute one run for a topic, from script generation to persisted video
    #[instrument(skip(self))]
    pub async fn run_once(&self, topic: &str) -> Result<Run, PipelineError> {
        let mut run = Run::new(topic);
        info!(run_id = %run.id, "Starting video creation run");

        let mut stage = Stage::GenerateScript;
        loop {
            let started = Instant::now();
            let result = self.advance(&mut run, stage).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(transition) => {
                    run.record(
                        StageEvent::new(stage, transition.outcome, transition.summary)
                            .with_duration(duration_ms),
                    );

                    match transition.next {
                        Some(next) => stage = next,
                        None => {
                            info!(
                                run_id = %run.id,
                                output = run.output_name.as_deref().unwrap_or_default(),
                                scripts = run.script_generations,
                                restarts = run.restarts,
                                "Run completed successfully"
                            );
                            return Ok(run);
                        }
                    }
                }
                Err(source) => {
                    let message = source.to_string();
                    error!(run_id = %run.id, %stage, error = %message, "Stage failed, ending run");

                    run.record(
                        StageEvent::new(stage, StageOutcome::Failed, format!("{} failed", stage))
                            .with_duration(duration_ms)
                            .with_error(message.clone()),
                    );
                    run.fail(stage, message);

                    return Err(PipelineError::Stage {
                        stage,
                        source,
                        run: Box::new(run),
                    });
                }
            }
        }
    }

    /// Attempt one stage and decide where control goes next
    async fn advance(&self, run: &mut Run, stage: Stage) -> CallResult<Transition> {
        info!(%stage, "Entering stage");

        match stage {
            Stage::GenerateScript => {
                let prompt = self.settings.script_prompt(&run.topic);
                let script = self
                    .collaborators
                    .text
                    .generate(&prompt, self.settings.script_params)
                    .await?;

                if script.trim().is_empty() {
                    return Err(CollaboratorError::empty("text_generator", "script is empty"));
                }

                info!(preview = %truncate(&script, 100), "Generated script");
                run.replace_script(script);
                Ok(Transition::forward(
                    Stage::EvaluateScript,
                    format!("script #{}", run.script_generations),
                ))
            }

            Stage::EvaluateScript => {
                let prompt = self.settings.script_review_prompt(require(&run.script, "script")?);
                let critique = self
                    .collaborators
                    .text
                    .generate(&prompt, self.settings.script_review_params)
                    .await?;
                info!(critique = %critique, "Script review");

                match self.script_gate.verdict(&critique) {
                    Verdict::NeedsRework => {
                        warn!("Script score too low, regenerating");
                        run.script = None;
                        Ok(Transition::rework(Stage::GenerateScript, critique))
                    }
                    Verdict::Pass => Ok(Transition::forward(Stage::SynthesizeSpeech, critique)),
                }
            }

            Stage::SynthesizeSpeech => {
                let audio = self
                    .collaborators
                    .speech
                    .synthesize(require(&run.script, "script")?, self.settings.voice)
                    .await?;
                let summary = format!("audio {}", audio);
                run.audio = Some(audio);

                let next = if self.settings.speech_evaluation {
                    Stage::EvaluateSpeech
                } else {
                    Stage::FetchRawVideo
                };
                Ok(Transition::forward(next, summary))
            }

            Stage::EvaluateSpeech => {
                let audio = require(&run.audio, "audio")?;
                let prompt = self.settings.speech_review_prompt(&audio.to_string());
                let critique = self
                    .collaborators
                    .text
                    .generate(&prompt, self.settings.speech_review_params)
                    .await?;
                info!(critique = %critique, "Voiceover review");

                match self.media_gate.verdict(&critique) {
                    Verdict::NeedsRework => {
                        warn!("Voiceover issues detected, resynthesizing");
                        run.audio = None;
                        Ok(Transition::rework(Stage::SynthesizeSpeech, critique))
                    }
                    Verdict::Pass => Ok(Transition::forward(Stage::FetchRawVideo, critique)),
                }
            }

            Stage::FetchRawVideo => {
                let video = self
                    .collaborators
                    .assets
                    .fetch(&self.targets.raw_video_id)
                    .await?;
                let summary = format!("video {}", video);
                run.video = Some(video);
                Ok(Transition::forward(Stage::MergeAudioVideo, summary))
            }

            Stage::MergeAudioVideo => {
                let merged = self
                    .collaborators
                    .merger
                    .merge(
                        require(&run.audio, "audio")?,
                        require(&run.video, "video")?,
                        self.settings.merge_start_offset,
                    )
                    .await?;
                info!(merged = %merged, "Audio/video merge completed");
                let summary = format!("merged {}", merged);
                run.merged = Some(merged);
                Ok(Transition::forward(Stage::EvaluateFinal, summary))
            }

            Stage::EvaluateFinal => {
                let merged = require(&run.merged, "merged video")?;
                let prompt = self.settings.final_review_prompt(&merged.to_string());
                let critique = self
                    .collaborators
                    .text
                    .generate(&prompt, self.settings.final_review_params)
                    .await?;
                info!(critique = %critique, "Final review");

                match self.media_gate.verdict(&critique) {
                    Verdict::NeedsRework => {
                        warn!("Final video rejected, restarting run from script generation");
                        run.discard_intermediates();
                        Ok(Transition::rework(Stage::GenerateScript, critique))
                    }
                    Verdict::Pass => Ok(Transition::forward(Stage::PersistOutput, critique)),
                }
            }

            Stage::PersistOutput => {
                let file_name = output_file_name(&Local::now());
                let stored = self
                    .collaborators
                    .assets
                    .persist(
                        require(&run.merged, "merged video")?,
                        &self.targets.output_folder_id,
                        &file_name,
                    )
                    .await?;
                info!(file_name = %file_name, asset_id = %stored.id, "Video saved");
                run.complete(file_name.clone());
                Ok(Transition::finish(format!("stored {} as {}", file_name, stored.id)))
            }
        }
    }
}

/// A stage input the preceding stages should have produced
fn require<'a, T>(slot: &'a Option<T>, what: &str) -> CallResult<&'a T> {
    slot.as_ref()
        .ok_or_else(|| CollaboratorError::empty("run", format!("no {} available", what)))
}

/// Name for a finished video: `tiktok_<YYYYMMDD_HHMMSS>.mp4`
pub fn output_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("tiktok_{}.mp4", at.format("%Y%m%d_%H%M%S"))
}
