//! Pipeline stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of the pipeline. Each stage calls exactly one collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    GenerateScript,
    EvaluateScript,
    SynthesizeSpeech,
    EvaluateSpeech,
    FetchRawVideo,
    MergeAudioVideo,
    EvaluateFinal,
    PersistOutput,
}

impl Stage {
    /// All stages in forward order
    pub const ALL: [Stage; 8] = [
        Stage::GenerateScript,
        Stage::EvaluateScript,
        Stage::SynthesizeSpeech,
        Stage::EvaluateSpeech,
        Stage::FetchRawVideo,
        Stage::MergeAudioVideo,
        Stage::EvaluateFinal,
        Stage::PersistOutput,
    ];

    /// Stable snake_case name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Stage::GenerateScript => "generate_script",
            Stage::EvaluateScript => "evaluate_script",
            Stage::SynthesizeSpeech => "synthesize_speech",
            Stage::EvaluateSpeech => "evaluate_speech",
            Stage::FetchRawVideo => "fetch_raw_video",
            Stage::MergeAudioVideo => "merge_audio_video",
            Stage::EvaluateFinal => "evaluate_final",
            Stage::PersistOutput => "persist_output",
        }
    }

    /// Whether this stage is a quality gate
    pub fn is_gate(&self) -> bool {
        matches!(
            self,
            Stage::EvaluateScript | Stage::EvaluateSpeech | Stage::EvaluateFinal
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
