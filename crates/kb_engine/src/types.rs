use std::fmt;
use std::path::PathBuf;

use kb_core::DocumentKind;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    Extract,
    Render,
    Persist,
    Upload,
    List,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Render => "render",
            Stage::Persist => "persist",
            Stage::Upload => "upload",
            Stage::List => "list",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    StageStarted {
        stage: Stage,
    },
    Progress {
        stage: Stage,
        bytes: Option<u64>,
        records: Option<usize>,
    },
    StageCompleted {
        stage: Stage,
        detail: String,
    },
    StageFailed {
        stage: Stage,
        error: String,
    },
    StageSkipped {
        stage: Stage,
        reason: String,
    },
}

/// Where a run reads its input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Remote Atom product feed.
    ProductFeed { url: String },
    /// Local CSV export of help-center articles.
    HelpCenterCsv { path: PathBuf },
}

impl SourceSpec {
    pub fn format(&self) -> SourceFormat {
        match self {
            SourceSpec::ProductFeed { .. } => SourceFormat::AtomFeed,
            SourceSpec::HelpCenterCsv { .. } => SourceFormat::CsvTable,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.format().document_kind()
    }

    pub fn location(&self) -> String {
        match self {
            SourceSpec::ProductFeed { url } => url.clone(),
            SourceSpec::HelpCenterCsv { path } => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    AtomFeed,
    CsvTable,
}

impl SourceFormat {
    pub fn document_kind(self) -> DocumentKind {
        match self {
            SourceFormat::AtomFeed => DocumentKind::ProductCatalog,
            SourceFormat::CsvTable => DocumentKind::Documentation,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::AtomFeed => f.write_str("atom-feed"),
            SourceFormat::CsvTable => f.write_str("csv-table"),
        }
    }
}

/// Undecoded input of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSource {
    pub bytes: Vec<u8>,
    pub format: SourceFormat,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn too_large(max_bytes: u64, actual: u64) -> Self {
        Self::new(
            FailureKind::TooLarge {
                max_bytes,
                actual: Some(actual),
            },
            format!("body exceeds {max_bytes} bytes"),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
