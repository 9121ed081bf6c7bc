//! In-memory collaborators for driving the orchestrator in tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use clipforge::adapters::{
    AssetStore, CallResult, CollaboratorError, MediaMerger, SpeechSynthesizer, StoredAsset,
    TextGenerator,
};
use clipforge::core::{AssetTargets, Collaborators, GenerationParams, Orchestrator, PipelineSettings, VoiceSettings};
use clipforge::ArtifactRef;

pub const RAW_VIDEO_ID: &str = "raw-video-1";
pub const OUTPUT_FOLDER_ID: &str = "folder-1";
pub const RAW_VIDEO_URL: &str = "https://drive.example.com/raw.mp4";

pub fn script(n: u32) -> String {
    format!(
        "Script {}: Did you know an AI just beat every grandmaster alive? Here's the twist nobody saw coming, and why it changes everything you know.",
        n
    )
}

pub fn failure(service: &'static str) -> CollaboratorError {
    CollaboratorError::Status {
        service,
        status: 503,
        body: "service unavailable".to_string(),
    }
}

/// Text generator answering from a fixed queue of replies
#[derive(Default)]
pub struct ScriptedText {
    replies: Mutex<VecDeque<CallResult<String>>>,
    pub prompts: Mutex<Vec<(String, GenerationParams)>>,
}

impl ScriptedText {
    pub fn new(replies: Vec<CallResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    fn name(&self) -> &str {
        "scripted-text"
    }

    async fn generate(&self, prompt: &str, params: GenerationParams) -> CallResult<String> {
        self.prompts.lock().unwrap().push((prompt.to_string(), params));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(failure("scripted-text")))
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    pub texts: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    fn name(&self) -> &str {
        "fake-speech"
    }

    async fn synthesize(&self, text: &str, _voice: VoiceSettings) -> CallResult<ArtifactRef> {
        let mut texts = self.texts.lock().unwrap();
        texts.push(text.to_string());
        if self.fail {
            return Err(failure("fake-speech"));
        }
        Ok(ArtifactRef::inline(format!("audio-{}", texts.len()).into_bytes()))
    }
}

#[derive(Default)]
pub struct FakeAssets {
    pub fetches: Mutex<Vec<String>>,
    pub persisted: Mutex<Vec<(ArtifactRef, String, String)>>,
    pub fail_fetch: bool,
    pub fail_persist: bool,
}

#[async_trait]
impl AssetStore for FakeAssets {
    fn name(&self) -> &str {
        "fake-assets"
    }

    async fn fetch(&self, asset_id: &str) -> CallResult<ArtifactRef> {
        self.fetches.lock().unwrap().push(asset_id.to_string());
        if self.fail_fetch {
            return Err(failure("fake-assets"));
        }
        Ok(ArtifactRef::url(RAW_VIDEO_URL))
    }

    async fn persist(
        &self,
        artifact: &ArtifactRef,
        folder_id: &str,
        file_name: &str,
    ) -> CallResult<StoredAsset> {
        if self.fail_persist {
            return Err(failure("fake-assets"));
        }
        self.persisted.lock().unwrap().push((
            artifact.clone(),
            folder_id.to_string(),
            file_name.to_string(),
        ));
        Ok(StoredAsset {
            id: "stored-1".to_string(),
            name: file_name.to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeMerger {
    pub inputs: Mutex<Vec<(ArtifactRef, ArtifactRef, i64)>>,
    pub fail: bool,
}

#[async_trait]
impl MediaMerger for FakeMerger {
    fn name(&self) -> &str {
        "fake-merger"
    }

    async fn merge(
        &self,
        audio: &ArtifactRef,
        video: &ArtifactRef,
        start_offset: i64,
    ) -> CallResult<ArtifactRef> {
        let mut inputs = self.inputs.lock().unwrap();
        inputs.push((audio.clone(), video.clone(), start_offset));
        if self.fail {
            return Err(failure("fake-merger"));
        }
        Ok(ArtifactRef::url(format!("https://merge.example.com/out-{}.mp4", inputs.len())))
    }
}

/// Fakes wired into an orchestrator, kept around for assertions
pub struct Harness {
    pub text: Arc<ScriptedText>,
    pub speech: Arc<FakeSpeech>,
    pub assets: Arc<FakeAssets>,
    pub merger: Arc<FakeMerger>,
}

impl Harness {
    pub fn new(text: ScriptedText) -> Self {
        Self {
            text: Arc::new(text),
            speech: Arc::new(FakeSpeech::default()),
            assets: Arc::new(FakeAssets::default()),
            merger: Arc::new(FakeMerger::default()),
        }
    }

    pub fn with_speech(mut self, speech: FakeSpeech) -> Self {
        self.speech = Arc::new(speech);
        self
    }

    pub fn with_assets(mut self, assets: FakeAssets) -> Self {
        self.assets = Arc::new(assets);
        self
    }

    pub fn with_merger(mut self, merger: FakeMerger) -> Self {
        self.merger = Arc::new(merger);
        self
    }

    pub fn orchestrator(&self, settings: PipelineSettings) -> Orchestrator {
        Orchestrator::new(
            Collaborators {
                text: self.text.clone(),
                speech: self.speech.clone(),
                assets: self.assets.clone(),
                merger: self.merger.clone(),
            },
            settings,
            AssetTargets {
                raw_video_id: RAW_VIDEO_ID.to_string(),
                output_folder_id: OUTPUT_FOLDER_ID.to_string(),
            },
        )
    }

    pub fn speech_calls(&self) -> usize {
        self.speech.texts.lock().unwrap().len()
    }

    pub fn fetch_calls(&self) -> usize {
        self.assets.fetches.lock().unwrap().len()
    }

    pub fn merge_calls(&self) -> usize {
        self.merger.inputs.lock().unwrap().len()
    }

    pub fn persisted(&self) -> Vec<(ArtifactRef, String, String)> {
        self.assets.persisted.lock().unwrap().clone()
    }
}

/// True for `tiktok_YYYYMMDD_HHMMSS.mp4`
pub fn is_output_name(name: &str) -> bool {
    let Some(stamp) = name
        .strip_prefix("tiktok_")
        .and_then(|rest| rest.strip_suffix(".mp4"))
    else {
        return false;
    };

    stamp.len() == 15
        && stamp.char_indices().all(|(i, c)| {
            if i == 8 {
                c == '_'
            } else {
                c.is_ascii_digit()
            }
        })
}
