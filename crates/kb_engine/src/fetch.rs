use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use kb_logging::{kb_debug, kb_error, kb_info, kb_warn};
use reqwest::header::CONTENT_TYPE;

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput, IngestEvent, Stage};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Whole-request timeout; `None` waits as long as the server keeps sending.
    pub request_timeout: Option<Duration>,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            redirect_limit: 5,
            max_bytes: 20 * 1024 * 1024,
            allowed_content_types: vec![
                "application/atom+xml".to_string(),
                "application/xml".to_string(),
                "text/xml".to_string(),
                "application/rss+xml".to_string(),
            ],
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: IngestEvent);
}

/// Forwards stage events to the global logger. Byte progress goes to debug.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: IngestEvent) {
        match event {
            IngestEvent::StageStarted { stage } => kb_info!("{stage}: started"),
            IngestEvent::Progress {
                stage,
                bytes,
                records,
            } => kb_debug!("{stage}: bytes={bytes:?} records={records:?}"),
            IngestEvent::StageCompleted { stage, detail } => kb_info!("{stage}: {detail}"),
            IngestEvent::StageFailed { stage, error } => kb_error!("{stage} failed: {error}"),
            IngestEvent::StageSkipped { stage, reason } => kb_warn!("{stage} skipped: {reason}"),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, sink: &dyn ProgressSink) -> Result<FetchOutput, FetchError>;
}

/// Feed download over reqwest: bounded redirects, an XML content-type
/// allow-list and a byte cap enforced while streaming.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// One client per fetch so `hops` counts this request's redirects only.
    fn client(&self, hops: Arc<AtomicUsize>) -> Result<reqwest::Client, FetchError> {
        let limit = self.settings.redirect_limit;
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .redirect(reqwest::redirect::Policy::custom(move |attempt| {
                let followed = attempt.previous().len();
                hops.store(followed, Ordering::Relaxed);
                if followed < limit {
                    attempt.follow()
                } else {
                    attempt.error(format!("more than {limit} redirects"))
                }
            }));
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }

    /// Reject the response on its status line and headers, before any body
    /// byte is read. Returns the declared content type.
    fn screen(&self, response: &reqwest::Response) -> Result<Option<String>, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        if let Some(declared) = response.content_length() {
            if declared > self.settings.max_bytes {
                return Err(FetchError::too_large(self.settings.max_bytes, declared));
            }
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        match content_type.as_deref() {
            Some(declared) if !self.accepts(declared) => {
                kb_warn!("Refusing {} served as {}", response.url(), declared);
                Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: declared.to_string(),
                    },
                    "not an XML feed",
                ))
            }
            _ => Ok(content_type),
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, sink: &dyn ProgressSink) -> Result<FetchOutput, FetchError> {
        let target = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let hops = Arc::new(AtomicUsize::new(0));
        let response = self
            .client(hops.clone())?
            .get(target)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let content_type = self.screen(&response)?;
        let final_url = response.url().to_string();
        let bytes = read_capped(response, self.settings.max_bytes, sink).await?;
        kb_debug!("Fetched {} bytes from {}", bytes.len(), final_url);

        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url,
                redirect_count: hops.load(Ordering::Relaxed),
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

/// Stream the body, failing as soon as it grows past `max_bytes`.
async fn read_capped(
    response: reqwest::Response,
    max_bytes: u64,
    sink: &dyn ProgressSink,
) -> Result<Vec<u8>, FetchError> {
    let report = |received: usize| {
        sink.emit(IngestEvent::Progress {
            stage: Stage::Fetch,
            bytes: Some(received as u64),
            records: None,
        })
    };
    report(0);

    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let received = (body.len() + chunk.len()) as u64;
        if received > max_bytes {
            return Err(FetchError::too_large(max_bytes, received));
        }
        body.extend_from_slice(&chunk);
        report(body.len());
    }
    Ok(body)
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_redirect() {
        FailureKind::RedirectLimitExceeded
    } else {
        FailureKind::Network
    };
    FetchError::new(kind, err.to_string())
}
