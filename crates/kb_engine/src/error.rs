use std::io;
use std::path::PathBuf;

use kb_core::{ParseError, RenderError, SchemaError};
use thiserror::Error;

use crate::{AssistantError, DecodeError, FetchError, PersistError, Stage};

/// Terminal failure of one ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("cannot read source {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot decode source: {0}")]
    Decode(#[from] DecodeError),
    #[error("malformed feed: {0}")]
    Parse(#[from] ParseError),
    #[error("invalid table: {0}")]
    Schema(#[from] SchemaError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("cannot write artifact: {0}")]
    Persist(#[from] PersistError),
    #[error("cannot read artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("upload failed: {0}")]
    Upload(AssistantError),
    #[error("listing failed: {0}")]
    List(AssistantError),
}

impl IngestError {
    pub fn stage(&self) -> Stage {
        match self {
            IngestError::Fetch(_) | IngestError::SourceRead { .. } => Stage::Fetch,
            IngestError::Decode(_) | IngestError::Parse(_) | IngestError::Schema(_) => {
                Stage::Extract
            }
            IngestError::Render(_) => Stage::Render,
            IngestError::Persist(_) => Stage::Persist,
            IngestError::ArtifactRead { .. } | IngestError::Upload(_) => Stage::Upload,
            IngestError::List(_) => Stage::List,
        }
    }
}
