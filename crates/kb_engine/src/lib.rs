//! Knowledge-base engine: IO around the pure normalization core.
mod assistant;
mod config;
mod coordinator;
mod decode;
mod error;
mod fetch;
mod persist;
mod types;

pub use assistant::{
    content_type_for, AssistantError, AssistantFailureKind, KnowledgeBase, PineconeAssistant,
    StoredDocument, UploadResult,
};
pub use config::{
    AssistantSettings, Clock, IngestConfig, DEFAULT_ASSISTANT_HOST, DEFAULT_ASSISTANT_NAME,
    DEFAULT_FEED_URL,
};
pub use coordinator::{upload_metadata, Coordinator, IngestReport, StageReport, StageStatus};
pub use decode::{decode_text, DecodeError, DecodedText};
pub use error::IngestError;
pub use fetch::{FetchSettings, Fetcher, LogProgressSink, ProgressSink, ReqwestFetcher};
pub use persist::{ensure_output_dir, read_artifact, ArtifactWriter, PersistError};
pub use types::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, IngestEvent, RawSource, SourceFormat,
    SourceSpec, Stage,
};
