//! Vector-search assistant collaborator: upload a document, list documents.

use std::collections::BTreeMap;
use std::fmt;

use kb_logging::{kb_debug, kb_warn};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::AssistantSettings;

/// Immediate response to an upload. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub success: bool,
    pub status: String,
    pub id: String,
}

/// One file as reported by the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub name: String,
    pub status: String,
    pub size_bytes: u64,
}

impl StoredDocument {
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AssistantError {
    pub kind: AssistantFailureKind,
    pub message: String,
}

impl AssistantError {
    pub(crate) fn new(kind: AssistantFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantFailureKind {
    /// No knowledge base is configured for this run.
    Disabled,
    MissingCredentials,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidResponse,
}

impl fmt::Display for AssistantFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantFailureKind::Disabled => write!(f, "assistant disabled"),
            AssistantFailureKind::MissingCredentials => write!(f, "missing api key"),
            AssistantFailureKind::InvalidUrl => write!(f, "invalid assistant url"),
            AssistantFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            AssistantFailureKind::Timeout => write!(f, "timeout"),
            AssistantFailureKind::Network => write!(f, "network error"),
            AssistantFailureKind::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

#[async_trait::async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Store `content` as `file_name`. Metadata keys are passed through unchecked.
    async fn upload(
        &self,
        file_name: &str,
        content: Vec<u8>,
        metadata: &BTreeMap<String, String>,
    ) -> Result<UploadResult, AssistantError>;

    async fn list_documents(&self) -> Result<Vec<StoredDocument>, AssistantError>;
}

/// Pinecone Assistant files API over reqwest.
#[derive(Clone)]
pub struct PineconeAssistant {
    settings: AssistantSettings,
    client: reqwest::Client,
}

impl fmt::Debug for PineconeAssistant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeAssistant")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PineconeAssistant {
    pub fn new(settings: AssistantSettings) -> Result<Self, AssistantError> {
        // No client-wide timeout: uploads may be configured to wait indefinitely.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| AssistantError::new(AssistantFailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    fn files_url(&self) -> Result<reqwest::Url, AssistantError> {
        let raw = format!(
            "{}/assistant/files/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.assistant_name
        );
        reqwest::Url::parse(&raw)
            .map_err(|err| AssistantError::new(AssistantFailureKind::InvalidUrl, err.to_string()))
    }

    fn api_key(&self) -> Result<&str, AssistantError> {
        self.settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AssistantError::new(
                    AssistantFailureKind::MissingCredentials,
                    "PINECONE_API_KEY is not set",
                )
            })
    }
}

#[async_trait::async_trait]
impl KnowledgeBase for PineconeAssistant {
    async fn upload(
        &self,
        file_name: &str,
        content: Vec<u8>,
        metadata: &BTreeMap<String, String>,
    ) -> Result<UploadResult, AssistantError> {
        let api_key = self.api_key()?;
        let mut url = self.files_url()?;
        let metadata_json = serde_json::to_string(metadata).map_err(|err| {
            AssistantError::new(AssistantFailureKind::InvalidResponse, err.to_string())
        })?;
        url.query_pairs_mut().append_pair("metadata", &metadata_json);

        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(content_type_for(file_name))
            .map_err(map_reqwest_error)?;
        let form = Form::new().part("file", part);

        let mut request = self
            .client
            .post(url)
            .header("Api-Key", api_key)
            .multipart(form);
        if let Some(timeout) = self.settings.upload_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let body = read_success_body(response).await?;

        let parsed: UploadResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                kb_warn!("Upload accepted but response was not JSON: {}", err);
                UploadResponse::default()
            }
        };
        kb_debug!("Upload response id={:?} status={:?}", parsed.id, parsed.status);

        Ok(UploadResult {
            success: true,
            status: parsed.status.unwrap_or_else(|| "Uploaded".to_string()),
            id: parsed.id.unwrap_or_else(|| "N/A".to_string()),
        })
    }

    async fn list_documents(&self) -> Result<Vec<StoredDocument>, AssistantError> {
        let api_key = self.api_key()?;
        let url = self.files_url()?;

        let response = self
            .client
            .get(url)
            .header("Api-Key", api_key)
            .timeout(self.settings.list_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = read_success_body(response).await?;

        let parsed: ListResponse = serde_json::from_slice(&body).map_err(|err| {
            AssistantError::new(AssistantFailureKind::InvalidResponse, err.to_string())
        })?;
        Ok(parsed
            .files
            .into_iter()
            .map(|file| StoredDocument {
                name: file.name.unwrap_or_else(|| "Unknown".to_string()),
                status: file.status.unwrap_or_else(|| "Unknown".to_string()),
                size_bytes: file.size.unwrap_or(0),
            })
            .collect())
    }
}

/// MIME type sent with an uploaded artifact, by extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext) {
        Some(ext) if ext.eq_ignore_ascii_case("md") => "text/markdown",
        _ => "text/plain",
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<Vec<u8>, AssistantError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        return Err(AssistantError::new(
            AssistantFailureKind::HttpStatus(status.as_u16()),
            String::from_utf8_lossy(&body).into_owned(),
        ));
    }
    Ok(body.to_vec())
}

fn map_reqwest_error(err: reqwest::Error) -> AssistantError {
    if err.is_timeout() {
        return AssistantError::new(AssistantFailureKind::Timeout, err.to_string());
    }
    AssistantError::new(AssistantFailureKind::Network, err.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListResponse {
    #[serde(default)]
    files: Vec<ListedFile>,
}

#[derive(Debug, Deserialize)]
struct ListedFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_artifacts_upload_as_markdown() {
        assert_eq!(content_type_for("product-catalog-2025-10-01.md"), "text/markdown");
        assert_eq!(content_type_for("documentation-2025-10-01.txt"), "text/plain");
        assert_eq!(content_type_for("noext"), "text/plain");
    }

    #[test]
    fn size_is_reported_in_kilobytes() {
        let doc = StoredDocument {
            name: "a".to_string(),
            status: "Available".to_string(),
            size_bytes: 1536,
        };
        assert_eq!(format!("{:.1}", doc.size_kb()), "1.5");
    }

    #[test]
    fn client_debug_never_shows_the_api_key() {
        let assistant = PineconeAssistant::new(AssistantSettings {
            api_key: Some("pcsk_live_secret".to_string()),
            ..AssistantSettings::default()
        })
        .unwrap();
        let debug = format!("{assistant:?}");
        assert!(!debug.contains("pcsk_live_secret"));
        assert!(debug.contains("PineconeAssistant"));
    }
}
