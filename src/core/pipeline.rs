//! Pipeline settings.
//!
//! Prompt templates and per-stage generation parameters. Defaults reproduce
//! the stock TikTok pipeline; any of them can be overridden from the
//! `pipeline:` section of the config file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::Stage;

/// Tunable behaviour of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Prompt used to write a script; `{topic}` is substituted
    #[serde(default = "default_script_prompt")]
    pub script_prompt: String,

    /// Prompt used to grade a script; `{script}` is substituted
    #[serde(default = "default_script_review_prompt")]
    pub script_review_prompt: String,

    /// Prompt used to grade the voiceover; `{audio}` is substituted
    #[serde(default = "default_speech_review_prompt")]
    pub speech_review_prompt: String,

    /// Prompt used to grade the merged video; `{video}` is substituted
    #[serde(default = "default_final_review_prompt")]
    pub final_review_prompt: String,

    #[serde(default = "default_script_params")]
    pub script_params: GenerationParams,

    #[serde(default = "default_script_review_params")]
    pub script_review_params: GenerationParams,

    #[serde(default = "default_speech_review_params")]
    pub speech_review_params: GenerationParams,

    #[serde(default = "default_final_review_params")]
    pub final_review_params: GenerationParams,

    #[serde(default)]
    pub voice: VoiceSettings,

    /// Run the voiceover gate after synthesis (off by default)
    #[serde(default)]
    pub speech_evaluation: bool,

    /// Offset passed to the merger, in seconds
    #[serde(default)]
    pub merge_start_offset: i64,
}

fn default_script_prompt() -> String {
    "Write a 60-second TikTok script that hooks viewers in the first 3 seconds and tells a compelling, shareable story about {topic}.".to_string()
}
fn default_script_review_prompt() -> String {
    "Evaluate the following TikTok script for virality: {script}. Score 1-10 and suggest improvements if under 8.".to_string()
}
fn default_speech_review_prompt() -> String {
    "Transcribe and check clarity of this voiceover. Return 'OK' or suggest fixes: {audio}".to_string()
}
fn default_final_review_prompt() -> String {
    "Assess the final video here: {video}. Check audio levels, pacing, and suggest if it meets TikTok viral standards.".to_string()
}
fn default_script_params() -> GenerationParams {
    GenerationParams::new(0.8, 250)
}
fn default_script_review_params() -> GenerationParams {
    GenerationParams::new(0.5, 150)
}
fn default_speech_review_params() -> GenerationParams {
    GenerationParams::new(0.0, 100)
}
fn default_final_review_params() -> GenerationParams {
    GenerationParams::new(0.5, 200)
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            script_prompt: default_script_prompt(),
            script_review_prompt: default_script_review_prompt(),
            speech_review_prompt: default_speech_review_prompt(),
            final_review_prompt: default_final_review_prompt(),
            script_params: default_script_params(),
            script_review_params: default_script_review_params(),
            speech_review_params: default_speech_review_params(),
            final_review_params: default_final_review_params(),
            voice: VoiceSettings::default(),
            speech_evaluation: false,
            merge_start_offset: 0,
        }
    }
}

impl PipelineSettings {
    /// Parse settings from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse pipeline settings YAML")
    }

    /// Validate templates and parameters
    pub fn validate(&self) -> Result<()> {
        let templates = [
            ("script_prompt", &self.script_prompt, "{topic}"),
            ("script_review_prompt", &self.script_review_prompt, "{script}"),
            ("speech_review_prompt", &self.speech_review_prompt, "{audio}"),
            ("final_review_prompt", &self.final_review_prompt, "{video}"),
        ];

        for (name, template, placeholder) in templates {
            if !template.contains(placeholder) {
                anyhow::bail!("{} must contain the {} placeholder", name, placeholder);
            }
        }

        for stage in [
            Stage::GenerateScript,
            Stage::EvaluateScript,
            Stage::EvaluateSpeech,
            Stage::EvaluateFinal,
        ] {
            if let Some(params) = self.params_for(stage) {
                params
                    .validate()
                    .with_context(|| format!("Invalid generation params for {}", stage))?;
            }
        }

        self.voice.validate()
    }

    /// Generation parameters for a text-producing stage
    pub fn params_for(&self, stage: Stage) -> Option<&GenerationParams> {
        match stage {
            Stage::GenerateScript => Some(&self.script_params),
            Stage::EvaluateScript => Some(&self.script_review_params),
            Stage::EvaluateSpeech => Some(&self.speech_review_params),
            Stage::EvaluateFinal => Some(&self.final_review_params),
            _ => None,
        }
    }

    pub fn script_prompt(&self, topic: &str) -> String {
        self.script_prompt.replace("{topic}", topic)
    }

    pub fn script_review_prompt(&self, script: &str) -> String {
        self.script_review_prompt.replace("{script}", script)
    }

    pub fn speech_review_prompt(&self, audio: &str) -> String {
        self.speech_review_prompt.replace("{audio}", audio)
    }

    pub fn final_review_prompt(&self, video: &str) -> String {
        self.final_review_prompt.replace("{video}", video)
    }
}

/// Sampling controls for one text generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// 0.0 to 1.0
    pub temperature: f64,

    pub max_output_tokens: u32,
}

impl GenerationParams {
    pub fn new(temperature: f64, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            anyhow::bail!("temperature {} outside 0.0..=1.0", self.temperature);
        }
        if self.max_output_tokens == 0 {
            anyhow::bail!("max_output_tokens must be positive");
        }
        Ok(())
    }
}

/// Voice shaping parameters for speech synthesis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default = "default_stability")]
    pub stability: f64,

    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f64,
}

fn default_stability() -> f64 {
    0.75
}
fn default_similarity_boost() -> f64 {
    0.85
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
        }
    }
}

impl VoiceSettings {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("stability", self.stability),
            ("similarity_boost", self.similarity_boost),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("voice {} {} outside 0.0..=1.0", name, value);
            }
        }
        Ok(())
    }
}
