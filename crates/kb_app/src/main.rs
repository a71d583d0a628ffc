mod cli;
mod status;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use kb_engine::{
    AssistantSettings, Coordinator, IngestReport, KnowledgeBase, PineconeAssistant,
    ReqwestFetcher, SourceSpec,
};
use kb_logging::{kb_error, kb_info, LevelFilter, LogDestination, DEFAULT_LOG_FILE};

use crate::cli::{Cli, Command};
use crate::status::{print_documents, StatusLines};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.verbose {
        kb_logging::initialize(LogDestination::terminal_and_default_file(), LevelFilter::Debug);
    } else {
        kb_logging::initialize(LogDestination::File(DEFAULT_LOG_FILE.into()), LevelFilter::Info);
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            kb_error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let settings = AssistantSettings::from_env();
    if cli.needs_assistant() && settings.api_key.is_none() {
        bail!("PINECONE_API_KEY is not set (use --skip-upload to render without uploading)");
    }
    let config = cli.ingest_config(settings.clone());
    kb_info!("Starting kb-ingest with {:?}", config);

    let knowledge_base: Option<Arc<dyn KnowledgeBase>> = if cli.needs_assistant() {
        let assistant =
            PineconeAssistant::new(settings).context("cannot create the assistant client")?;
        Some(Arc::new(assistant))
    } else {
        None
    };
    let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
    let coordinator = Coordinator::new(
        config,
        fetcher,
        knowledge_base,
        Arc::new(StatusLines::default()),
    );

    let report = match cli.command {
        Command::Products { feed_url } => {
            coordinator
                .run(&SourceSpec::ProductFeed { url: feed_url })
                .await
        }
        Command::Docs { csv } => {
            coordinator
                .run(&SourceSpec::HelpCenterCsv { path: csv })
                .await
        }
        Command::Upload { file, kind } => coordinator.upload_existing(&file, kind.into()).await,
        Command::List => {
            let documents = coordinator
                .list_documents()
                .await
                .context("cannot list the knowledge base")?;
            print_documents(&documents);
            return Ok(true);
        }
    };

    Ok(summarize(&report))
}

fn summarize(report: &IngestReport) -> bool {
    if let Some(documents) = &report.documents {
        print_documents(documents);
    }
    match &report.error {
        None => {
            println!("Done: {}", report.kind);
            true
        }
        Some(err) => {
            eprintln!("Run failed at {}: {}", err.stage(), err);
            if let Some(path) = report.artifact_path.as_ref().filter(|p| p.is_file()) {
                eprintln!(
                    "Rendered file kept at {}; retry with `kb-ingest upload {} --kind {}`",
                    path.display(),
                    path.display(),
                    kind_flag(report.kind)
                );
            }
            false
        }
    }
}

fn kind_flag(kind: kb_core::DocumentKind) -> &'static str {
    match kind {
        kb_core::DocumentKind::ProductCatalog => "catalog",
        kb_core::DocumentKind::Documentation => "docs",
    }
}
