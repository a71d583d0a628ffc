//! One ingestion run: fetch, extract, render, persist, upload, list.
//!
//! Stages run strictly in order. The first failing stage ends the run; a
//! failed upload leaves the written artifact in place for `upload_existing`.
//! A failed listing is reported but never fails the run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use kb_core::{
    extract_articles, extract_products, render, ArticleTable, DocArticle, DocumentKind,
    ProductRecord, Records,
};
use kb_logging::{kb_debug, kb_info, kb_warn};

use crate::{
    decode_text, read_artifact, ArtifactWriter, AssistantError, AssistantFailureKind, Fetcher,
    IngestConfig, IngestError, IngestEvent, KnowledgeBase, ProgressSink, RawSource, SourceFormat,
    SourceSpec, Stage, StoredDocument, UploadResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    pub detail: String,
}

/// Outcome of one run, stage by stage.
#[derive(Debug)]
pub struct IngestReport {
    pub kind: DocumentKind,
    pub stages: Vec<StageReport>,
    pub record_count: Option<usize>,
    pub artifact_path: Option<PathBuf>,
    pub upload: Option<UploadResult>,
    pub documents: Option<Vec<StoredDocument>>,
    pub error: Option<IngestError>,
}

impl IngestReport {
    fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            stages: Vec::new(),
            record_count: None,
            artifact_path: None,
            upload: None,
            documents: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }
}

/// Metadata attached to every upload.
pub fn upload_metadata(kind: DocumentKind, date: NaiveDate) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("source".to_string(), kind.source_tag().to_string()),
        ("type".to_string(), kind.type_tag().to_string()),
        ("upload_date".to_string(), date.format("%Y-%m-%d").to_string()),
    ])
}

enum Extracted {
    Products(Vec<ProductRecord>),
    Articles(Vec<DocArticle>),
}

impl Extracted {
    fn records(&self) -> Records<'_> {
        match self {
            Extracted::Products(products) => Records::Products(products),
            Extracted::Articles(articles) => Records::Articles(articles),
        }
    }
}

pub struct Coordinator {
    config: IngestConfig,
    fetcher: Arc<dyn Fetcher>,
    knowledge_base: Option<Arc<dyn KnowledgeBase>>,
    sink: Arc<dyn ProgressSink>,
}

impl Coordinator {
    /// `knowledge_base: None` stops every run after the persist stage.
    pub fn new(
        config: IngestConfig,
        fetcher: Arc<dyn Fetcher>,
        knowledge_base: Option<Arc<dyn KnowledgeBase>>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            fetcher,
            knowledge_base,
            sink,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub async fn run(&self, source: &SourceSpec) -> IngestReport {
        let mut report = IngestReport::new(source.kind());
        kb_info!("Ingesting {} from {}", report.kind, source.location());
        if let Err(err) = self.run_stages(source, &mut report).await {
            self.fail(&mut report, err);
        }
        report
    }

    /// Re-upload an artifact written by an earlier run.
    pub async fn upload_existing(&self, path: &Path, kind: DocumentKind) -> IngestReport {
        let mut report = IngestReport::new(kind);
        report.artifact_path = Some(path.to_path_buf());
        kb_info!("Re-uploading {} from {}", kind, path.display());
        let result = match self.knowledge_base.as_deref() {
            Some(knowledge_base) => {
                let today = (self.config.today)();
                self.upload_and_list(knowledge_base, path, kind, today, &mut report)
                    .await
            }
            None => Err(IngestError::Upload(disabled())),
        };
        if let Err(err) = result {
            self.fail(&mut report, err);
        }
        report
    }

    pub async fn list_documents(&self) -> Result<Vec<StoredDocument>, IngestError> {
        let knowledge_base = self
            .knowledge_base
            .as_deref()
            .ok_or_else(|| IngestError::List(disabled()))?;
        knowledge_base
            .list_documents()
            .await
            .map_err(IngestError::List)
    }

    async fn run_stages(
        &self,
        source: &SourceSpec,
        report: &mut IngestReport,
    ) -> Result<(), IngestError> {
        let today = (self.config.today)();

        self.start(Stage::Fetch);
        let raw = self.acquire(source).await?;
        self.complete(
            report,
            Stage::Fetch,
            format!("{} bytes from {}", raw.bytes.len(), source.location()),
        );

        self.start(Stage::Extract);
        let (extracted, encoding) = extract(&raw)?;
        let records = extracted.records();
        report.record_count = Some(records.len());
        self.sink.emit(IngestEvent::Progress {
            stage: Stage::Extract,
            bytes: None,
            records: Some(records.len()),
        });
        self.complete(
            report,
            Stage::Extract,
            format!("{} records ({encoding})", records.len()),
        );

        self.start(Stage::Render);
        let document = render(records, today, &self.config.render)?;
        self.complete(
            report,
            Stage::Render,
            format!("{} sections", document.sections().len()),
        );

        self.start(Stage::Persist);
        let path = ArtifactWriter::new(self.config.output_dir.clone()).write(&document)?;
        report.artifact_path = Some(path.clone());
        self.complete(report, Stage::Persist, path.display().to_string());

        match self.knowledge_base.as_deref() {
            Some(knowledge_base) => {
                self.upload_and_list(knowledge_base, &path, report.kind, today, report)
                    .await
            }
            None => {
                self.skip(report, Stage::Upload, "upload disabled");
                self.skip(report, Stage::List, "upload disabled");
                Ok(())
            }
        }
    }

    async fn acquire(&self, source: &SourceSpec) -> Result<RawSource, IngestError> {
        match source {
            SourceSpec::ProductFeed { url } => {
                let output = self.fetcher.fetch(url, self.sink.as_ref()).await?;
                if output.metadata.redirect_count > 0 {
                    kb_info!("Feed redirected to {}", output.metadata.final_url);
                }
                Ok(RawSource {
                    bytes: output.bytes,
                    format: SourceFormat::AtomFeed,
                    content_type: output.metadata.content_type,
                })
            }
            SourceSpec::HelpCenterCsv { path } => {
                let bytes = std::fs::read(path).map_err(|source| IngestError::SourceRead {
                    path: path.clone(),
                    source,
                })?;
                Ok(RawSource {
                    bytes,
                    format: SourceFormat::CsvTable,
                    content_type: None,
                })
            }
        }
    }

    async fn upload_and_list(
        &self,
        knowledge_base: &dyn KnowledgeBase,
        path: &Path,
        kind: DocumentKind,
        today: NaiveDate,
        report: &mut IngestReport,
    ) -> Result<(), IngestError> {
        self.start(Stage::Upload);
        let content = read_artifact(path).map_err(|source| IngestError::ArtifactRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.{}", kind.file_stem(), kind.file_extension()));
        let metadata = upload_metadata(kind, today);
        let uploaded = knowledge_base
            .upload(&file_name, content, &metadata)
            .await
            .map_err(IngestError::Upload)?;
        self.complete(
            report,
            Stage::Upload,
            format!("{} (id {}, status {})", file_name, uploaded.id, uploaded.status),
        );
        report.upload = Some(uploaded);

        if !self.config.list_after_upload {
            self.skip(report, Stage::List, "listing disabled");
            return Ok(());
        }

        self.start(Stage::List);
        if !self.config.list_delay.is_zero() {
            tokio::time::sleep(self.config.list_delay).await;
        }
        match knowledge_base.list_documents().await {
            Ok(documents) => {
                self.complete(report, Stage::List, format!("{} documents", documents.len()));
                report.documents = Some(documents);
            }
            Err(err) => {
                kb_warn!("Listing failed after a successful upload: {}", err);
                let error = IngestError::List(err).to_string();
                self.sink.emit(IngestEvent::StageFailed {
                    stage: Stage::List,
                    error: error.clone(),
                });
                report.stages.push(StageReport {
                    stage: Stage::List,
                    status: StageStatus::Failed,
                    detail: error,
                });
            }
        }
        Ok(())
    }

    fn start(&self, stage: Stage) {
        self.sink.emit(IngestEvent::StageStarted { stage });
    }

    fn complete(&self, report: &mut IngestReport, stage: Stage, detail: String) {
        self.sink.emit(IngestEvent::StageCompleted {
            stage,
            detail: detail.clone(),
        });
        report.stages.push(StageReport {
            stage,
            status: StageStatus::Succeeded,
            detail,
        });
    }

    fn skip(&self, report: &mut IngestReport, stage: Stage, reason: &str) {
        self.sink.emit(IngestEvent::StageSkipped {
            stage,
            reason: reason.to_string(),
        });
        report.stages.push(StageReport {
            stage,
            status: StageStatus::Skipped,
            detail: reason.to_string(),
        });
    }

    fn fail(&self, report: &mut IngestReport, err: IngestError) {
        let stage = err.stage();
        let error = err.to_string();
        self.sink.emit(IngestEvent::StageFailed {
            stage,
            error: error.clone(),
        });
        report.stages.push(StageReport {
            stage,
            status: StageStatus::Failed,
            detail: error,
        });
        report.error = Some(err);
    }
}

/// Decode then extract. Also returns the label of the detected encoding.
fn extract(raw: &RawSource) -> Result<(Extracted, String), IngestError> {
    let decoded = decode_text(&raw.bytes, raw.content_type.as_deref())?;
    kb_debug!("Decoded {:?} source as {}", raw.format, decoded.encoding_label);
    let extracted = match raw.format {
        SourceFormat::AtomFeed => {
            let products = extract_products(decoded.text.as_bytes())?;
            Extracted::Products(products)
        }
        SourceFormat::CsvTable => {
            let table = ArticleTable::from_csv(decoded.text.as_bytes())?;
            let articles = extract_articles(&table);
            if articles.len() < table.len() {
                kb_info!(
                    "Skipped {} unpublished rows of {}",
                    table.len() - articles.len(),
                    table.len()
                );
            }
            Extracted::Articles(articles)
        }
    };
    Ok((extracted, decoded.encoding_label))
}

fn disabled() -> AssistantError {
    AssistantError::new(
        AssistantFailureKind::Disabled,
        "no knowledge base configured",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_names_source_type_and_date() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let metadata = upload_metadata(DocumentKind::Documentation, date);
        assert_eq!(metadata["source"], "betterdocs_csv");
        assert_eq!(metadata["type"], "documentation");
        assert_eq!(metadata["upload_date"], "2025-10-01");
        assert_eq!(metadata.len(), 3);
    }
}
