//! Google Drive v3 client.
//!
//! Fetches the raw background video and uploads the finished one. Uploads use
//! the resumable protocol: one request opens a session with the file metadata,
//! a second one sends the bytes to the session URL.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{ensure_success, read_json, transport};
use super::{AssetStore, CallResult, CollaboratorError, StoredAsset};
use crate::domain::ArtifactRef;

const SERVICE: &str = "drive";
const VIDEO_MIME: &str = "video/mp4";

/// Drive REST client authenticated with an OAuth access token
pub struct DriveClient {
    client: Client,
    access_token: String,
    api_base: String,
    upload_base: String,
    /// Download raw video bytes instead of returning the content link
    download_raw: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    web_content_link: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadMetadata<'a> {
    name: &'a str,
    parents: Vec<&'a str>,
    mime_type: &'a str,
}

impl DriveClient {
    pub fn new(
        client: Client,
        access_token: impl Into<String>,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            access_token: access_token.into(),
            api_base: api_base.into(),
            upload_base: upload_base.into(),
            download_raw: false,
        }
    }

    /// Return raw video as inline bytes rather than a link
    pub fn with_download_raw(mut self, download_raw: bool) -> Self {
        self.download_raw = download_raw;
        self
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.api_base.trim_end_matches('/'), file_id)
    }

    fn upload_session_url(&self) -> String {
        format!(
            "{}/files?uploadType=resumable&fields=id,name",
            self.upload_base.trim_end_matches('/')
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Pull a merged video down so it can be re-uploaded
    async fn download(&self, url: &str) -> CallResult<Vec<u8>> {
        debug!(%url, "Downloading artifact");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let response = ensure_success(SERVICE, response).await?;
        let bytes = response.bytes().await.map_err(transport(SERVICE))?;
        Ok(bytes.to_vec())
    }

    async fn open_upload_session(&self, folder_id: &str, file_name: &str) -> CallResult<String> {
        let metadata = UploadMetadata {
            name: file_name,
            parents: vec![folder_id],
            mime_type: VIDEO_MIME,
        };

        let response = self
            .client
            .post(self.upload_session_url())
            .header("Authorization", self.bearer())
            .header("X-Upload-Content-Type", VIDEO_MIME)
            .json(&metadata)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let response = ensure_success(SERVICE, response).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| CollaboratorError::malformed(SERVICE, "upload session has no Location header"))
    }
}

#[async_trait]
impl AssetStore for DriveClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn fetch(&self, asset_id: &str) -> CallResult<ArtifactRef> {
        if self.download_raw {
            let response = self
                .client
                .get(self.file_url(asset_id))
                .query(&[("alt", "media")])
                .header("Authorization", self.bearer())
                .send()
                .await
                .map_err(transport(SERVICE))?;
            let response = ensure_success(SERVICE, response).await?;
            let bytes = response.bytes().await.map_err(transport(SERVICE))?;
            if bytes.is_empty() {
                return Err(CollaboratorError::empty(SERVICE, format!("file {} has no content", asset_id)));
            }
            return Ok(ArtifactRef::Inline(bytes.to_vec()));
        }

        let response = self
            .client
            .get(self.file_url(asset_id))
            .query(&[("fields", "id,name,webContentLink")])
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let response = ensure_success(SERVICE, response).await?;
        let file: DriveFile = read_json(SERVICE, response).await?;

        link_of(file)
    }

    async fn persist(
        &self,
        artifact: &ArtifactRef,
        folder_id: &str,
        file_name: &str,
    ) -> CallResult<StoredAsset> {
        let bytes = match artifact {
            ArtifactRef::Inline(bytes) => bytes.clone(),
            ArtifactRef::Url(url) => self.download(url).await?,
        };
        if bytes.is_empty() {
            return Err(CollaboratorError::empty(SERVICE, "nothing to upload"));
        }

        let session_url = self.open_upload_session(folder_id, file_name).await?;
        info!(file_name, size_bytes = bytes.len(), "Uploading to Drive");

        let response = self
            .client
            .put(&session_url)
            .header(CONTENT_TYPE, VIDEO_MIME)
            .body(bytes)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let response = ensure_success(SERVICE, response).await?;
        let file: DriveFile = read_json(SERVICE, response).await?;

        Ok(StoredAsset {
            id: file.id,
            name: file.name,
        })
    }
}

/// Turn file metadata into a downloadable reference
fn link_of(file: DriveFile) -> CallResult<ArtifactRef> {
    match file.web_content_link {
        Some(link) if !link.trim().is_empty() => Ok(ArtifactRef::Url(link)),
        _ => Err(CollaboratorError::empty(
            SERVICE,
            format!("file {} ({}) has no webContentLink", file.id, file.name),
        )),
    }
}
