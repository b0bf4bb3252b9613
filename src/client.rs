#![doc = "Gemini REST client: implements the core's FileStore and Generator contracts over reqwest."]
//
//! # Gemini client (CLI <-> Core)
//!
//! This module wires the [`FileStore`] and [`Generator`] traits from `neuro-rag-core::contract`
//! to the Gemini REST API:
//!
//! - `GET  v1beta/files` (paged by `nextPageToken`) for [`FileStore::list_files`]
//! - `POST upload/v1beta/files` with the resumable protocol for [`FileStore::upload_file`]
//! - `GET  v1beta/{name}` for [`FileStore::get_file`]
//! - `POST v1beta/models/{model}:generateContent` for [`Generator::generate`]
//!
//! The API key travels as the `key` query parameter. Construct a client with
//! [`GeminiClient::new`] from the loaded [`ApiConfig`].

use async_trait::async_trait;
use neuro_rag_core::contract::{
    ContentPart, FileState, FileStore, GenerateRequest, Generator, NewUpload, RemoteFile,
    TransportError,
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::load_config::ApiConfig;

const PAGE_SIZE: &str = "100";

pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api: &ApiConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(api.request_timeout)
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                e
            })?;
        tracing::info!(base_url = %api.base_url, "Initialized GeminiClient");
        Ok(GeminiClient {
            http,
            base_url: api.base_url.clone(),
            api_key: api.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Turns a non-2xx response into an error carrying the status and body.
async fn check_status(resp: Response) -> Result<Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(format!("API error {status}: {body}").into())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFile {
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    state: String,
}

impl From<WireFile> for RemoteFile {
    fn from(file: WireFile) -> Self {
        RemoteFile {
            id: file.name,
            display_name: file.display_name,
            state: parse_state(&file.state),
            uri: file.uri,
            mime_type: file.mime_type,
        }
    }
}

fn parse_state(state: &str) -> FileState {
    match state {
        "PROCESSING" => FileState::Processing,
        "ACTIVE" | "READY" => FileState::Ready,
        "FAILED" => FileState::Failed,
        _ => FileState::Unspecified,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFilesResponse {
    #[serde(default)]
    files: Vec<WireFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: WireFile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerateRequest {
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<WireFileData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<WireContent>,
}

impl From<&GenerateRequest> for WireGenerateRequest {
    fn from(req: &GenerateRequest) -> Self {
        let parts = req
            .contents
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => WirePart {
                    text: Some(text.clone()),
                    ..WirePart::default()
                },
                ContentPart::File { uri, mime_type } => WirePart {
                    file_data: Some(WireFileData {
                        mime_type: mime_type.clone(),
                        file_uri: uri.clone(),
                    }),
                    ..WirePart::default()
                },
            })
            .collect();
        WireGenerateRequest {
            contents: vec![WireContent {
                role: "user".to_string(),
                parts,
            }],
            generation_config: WireGenerationConfig {
                temperature: req.config.temperature,
                top_p: req.config.top_p,
                top_k: req.config.top_k,
            },
        }
    }
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated. Empty when the model produced none.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl FileStore for GeminiClient {
    async fn list_files(&self) -> Result<Vec<RemoteFile>, TransportError> {
        tracing::info!("Listing all files in the remote store");
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self
                .http
                .get(self.url("v1beta/files"))
                .query(&[("key", self.api_key.as_str()), ("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }
            let resp = check_status(req.send().await?).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to list files");
                e
            })?;
            let page: ListFilesResponse = resp.json().await?;
            files.extend(page.files.into_iter().map(RemoteFile::from));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        tracing::info!(count = files.len(), "Fetched all files in store");
        Ok(files)
    }

    async fn upload_file<'a>(&self, req: NewUpload<'a>) -> Result<RemoteFile, TransportError> {
        let bytes = tokio::fs::read(req.path).await.map_err(|e| {
            tracing::error!(error = ?e, path = %req.path.display(), "Failed to read file for upload");
            e
        })?;
        tracing::info!(
            display_name = req.display_name,
            bytes = bytes.len(),
            "Uploading new file"
        );

        let start = self
            .http
            .post(self.url("upload/v1beta/files"))
            .query(&[("key", self.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", req.mime_type)
            .json(&serde_json::json!({ "file": { "display_name": req.display_name } }))
            .send()
            .await?;
        let start = check_status(start).await?;
        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .ok_or("upload start response carried no x-goog-upload-url header")?
            .to_string();

        let finish = self
            .http
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let uploaded: UploadResponse = check_status(finish)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, display_name = req.display_name, "API error uploading file");
                e
            })?
            .json()
            .await?;

        let file = RemoteFile::from(uploaded.file);
        tracing::info!(id = %file.id, state = ?file.state, "Successfully uploaded file");
        Ok(file)
    }

    async fn get_file(&self, id: &str) -> Result<RemoteFile, TransportError> {
        tracing::debug!(id, "Fetching file status");
        let resp = self
            .http
            .get(self.url(&format!("v1beta/{id}")))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let file: WireFile = check_status(resp)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, id, "Failed to fetch file status");
                e
            })?
            .json()
            .await?;
        Ok(RemoteFile::from(file))
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, req: GenerateRequest) -> Result<String, TransportError> {
        let model = req.model.trim_start_matches("models/");
        tracing::info!(model, parts = req.contents.len(), "Calling generateContent");
        let resp = self
            .http
            .post(self.url(&format!("v1beta/models/{model}:generateContent")))
            .query(&[("key", self.api_key.as_str())])
            .json(&WireGenerateRequest::from(&req))
            .send()
            .await?;
        let body: GenerateResponse = check_status(resp)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, model, "generateContent failed");
                e
            })?
            .json()
            .await?;
        Ok(body.text())
    }
}
