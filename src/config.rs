//! Configuration for clipforge.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (GEMINI_API_KEY, TTS_API_KEY, ...)
//! 2. Config file (.clipforge/config.yaml)
//! 3. Defaults (placeholder credentials, public service endpoints)
//!
//! Config file discovery:
//! - An explicit `--config` path wins
//! - Otherwise searches the current directory and parents for .clipforge/config.yaml
//! - Falls back to ~/.clipforge/config.yaml

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::{build_client, DriveClient, ElevenLabsClient, GeminiClient, MergeServiceClient};
use crate::core::{AssetTargets, Collaborators, PipelineError, PipelineSettings};

const PLACEHOLDER_GEMINI_KEY: &str = "your-gemini-api-key";
const PLACEHOLDER_TTS_KEY: &str = "your-tts-api-key";
const PLACEHOLDER_DRIVE_TOKEN: &str = "your-googledrive-api-key";
const PLACEHOLDER_MERGE_URL: &str = "https://your-merge-service.com";
const PLACEHOLDER_RAW_VIDEO_ID: &str = "YOUR_RAW_VIDEO_FILE_ID";
const PLACEHOLDER_FOLDER_ID: &str = "YOUR_OUTPUT_FOLDER_ID";

const DEFAULT_TOPIC: &str = "artificial intelligence";
const DEFAULT_INTERVAL_SECS: u64 = 3 * 60 * 60;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro-latest";
const DEFAULT_TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub pipeline: Option<PipelineSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    pub gemini_api_key: Option<String>,
    pub tts_api_key: Option<String>,
    /// OAuth access token for the Drive API
    pub drive_access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicesConfig {
    pub gemini_base_url: Option<String>,
    pub gemini_model: Option<String>,
    pub tts_url: Option<String>,
    pub drive_api_base: Option<String>,
    pub drive_upload_base: Option<String>,
    pub merge_service_url: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetsConfig {
    pub raw_video_file_id: Option<String>,
    pub output_folder_id: Option<String>,
    pub download_raw_video: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleConfig {
    pub topic: Option<String>,
    pub interval_seconds: Option<u64>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub gemini_api_key: String,
    pub tts_api_key: String,
    pub drive_access_token: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub tts_url: String,
    pub drive_api_base: String,
    pub drive_upload_base: String,
    pub merge_service_url: String,
    pub request_timeout: Duration,
    pub raw_video_file_id: String,
    pub output_folder_id: String,
    pub download_raw_video: bool,
    pub topic: String,
    pub interval: Duration,
    pub pipeline: PipelineSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Names of settings still holding placeholder or empty values
    pub fn placeholder_fields(&self) -> Vec<String> {
        let checks = [
            ("gemini_api_key", &self.gemini_api_key, PLACEHOLDER_GEMINI_KEY),
            ("tts_api_key", &self.tts_api_key, PLACEHOLDER_TTS_KEY),
            ("drive_access_token", &self.drive_access_token, PLACEHOLDER_DRIVE_TOKEN),
            ("merge_service_url", &self.merge_service_url, PLACEHOLDER_MERGE_URL),
            ("raw_video_file_id", &self.raw_video_file_id, PLACEHOLDER_RAW_VIDEO_ID),
            ("output_folder_id", &self.output_folder_id, PLACEHOLDER_FOLDER_ID),
        ];

        checks
            .into_iter()
            .filter(|(_, value, placeholder)| value.trim().is_empty() || value.as_str() == *placeholder)
            .map(|(name, _, _)| name.to_string())
            .collect()
    }

    /// Refuse to start while any credential is a placeholder
    pub fn admission_check(&self) -> Result<(), PipelineError> {
        let fields = self.placeholder_fields();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Configuration { fields })
        }
    }

    /// Build the live collaborator clients, sharing one HTTP client
    pub fn collaborators(&self) -> Result<Collaborators> {
        let client = build_client(self.request_timeout)?;

        Ok(Collaborators {
            text: Arc::new(GeminiClient::new(
                client.clone(),
                &self.gemini_api_key,
                &self.gemini_base_url,
                &self.gemini_model,
            )),
            speech: Arc::new(ElevenLabsClient::new(
                client.clone(),
                &self.tts_api_key,
                &self.tts_url,
            )),
            assets: Arc::new(
                DriveClient::new(
                    client.clone(),
                    &self.drive_access_token,
                    &self.drive_api_base,
                    &self.drive_upload_base,
                )
                .with_download_raw(self.download_raw_video),
            ),
            // The merge service shares the speech credential
            merger: Arc::new(MergeServiceClient::new(
                client,
                &self.merge_service_url,
                &self.tts_api_key,
            )),
        })
    }

    pub fn asset_targets(&self) -> AssetTargets {
        AssetTargets {
            raw_video_id: self.raw_video_file_id.clone(),
            output_folder_id: self.output_folder_id.clone(),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".clipforge").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let home_config = dirs::home_dir()?.join(".clipforge").join("config.yaml");
    home_config.exists().then_some(home_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merge a parsed file with environment overrides and defaults
fn resolve(
    file: ConfigFile,
    config_file: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let env = |key: &str| env(key).filter(|v| !v.is_empty());
    let pick = |key: &str, from_file: Option<String>, default: &str| {
        env(key)
            .or(from_file)
            .unwrap_or_else(|| default.to_string())
    };
    let pick_secs = |key: &str, from_file: Option<u64>, default: u64| -> Result<u64> {
        match env(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, raw)),
            None => Ok(from_file.unwrap_or(default)),
        }
    };

    let pipeline = file.pipeline.unwrap_or_default();
    pipeline.validate()?;

    let timeout_secs = pick_secs(
        "CLIPFORGE_TIMEOUT_SECS",
        file.services.request_timeout_seconds,
        DEFAULT_TIMEOUT_SECS,
    )?;
    if timeout_secs == 0 {
        anyhow::bail!("request timeout must be positive");
    }

    Ok(ResolvedConfig {
        gemini_api_key: pick("GEMINI_API_KEY", file.credentials.gemini_api_key, PLACEHOLDER_GEMINI_KEY),
        tts_api_key: pick("TTS_API_KEY", file.credentials.tts_api_key, PLACEHOLDER_TTS_KEY),
        drive_access_token: pick(
            "GOOGLEDRIVE_API_KEY",
            file.credentials.drive_access_token,
            PLACEHOLDER_DRIVE_TOKEN,
        ),
        gemini_base_url: pick("GEMINI_BASE_URL", file.services.gemini_base_url, DEFAULT_GEMINI_BASE_URL),
        gemini_model: pick("GEMINI_MODEL", file.services.gemini_model, DEFAULT_GEMINI_MODEL),
        tts_url: pick("TTS_URL", file.services.tts_url, DEFAULT_TTS_URL),
        drive_api_base: file
            .services
            .drive_api_base
            .unwrap_or_else(|| DEFAULT_DRIVE_API_BASE.to_string()),
        drive_upload_base: file
            .services
            .drive_upload_base
            .unwrap_or_else(|| DEFAULT_DRIVE_UPLOAD_BASE.to_string()),
        merge_service_url: pick("MERGE_SERVICE_URL", file.services.merge_service_url, PLACEHOLDER_MERGE_URL),
        request_timeout: Duration::from_secs(timeout_secs),
        raw_video_file_id: pick("RAW_VIDEO_FILE_ID", file.assets.raw_video_file_id, PLACEHOLDER_RAW_VIDEO_ID),
        output_folder_id: pick("OUTPUT_FOLDER_ID", file.assets.output_folder_id, PLACEHOLDER_FOLDER_ID),
        download_raw_video: file.assets.download_raw_video.unwrap_or(false),
        topic: pick("CLIPFORGE_TOPIC", file.schedule.topic, DEFAULT_TOPIC),
        interval: Duration::from_secs(pick_secs(
            "CLIPFORGE_INTERVAL_SECS",
            file.schedule.interval_seconds,
            DEFAULT_INTERVAL_SECS,
        )?),
        pipeline,
        config_file,
    })
}

/// Load configuration from all sources
pub fn load_config(explicit_path: Option<&Path>) -> Result<ResolvedConfig> {
    let config_file = match explicit_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let file = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    resolve(file, config_file, |key| std::env::var(key).ok())
}

/// Show only the first few characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
