use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use kb_core::DocumentKind;
use kb_engine::{AssistantSettings, IngestConfig, DEFAULT_FEED_URL};

/// Build knowledge-base documents from the store's product feed and
/// help-center export, and upload them to the assistant.
#[derive(Parser, Debug, Clone)]
#[command(name = "kb-ingest", version)]
pub struct Cli {
    /// Directory for the rendered audit copies
    #[arg(long, global = true, env = "KB_OUTPUT_DIR", default_value = "./output")]
    pub output_dir: PathBuf,

    /// Do not list the knowledge base after uploading
    #[arg(long, global = true)]
    pub no_list: bool,

    /// Seconds to wait between upload and listing
    #[arg(long, global = true, default_value_t = 10)]
    pub list_delay_secs: u64,

    /// Render and persist only; never contact the assistant
    #[arg(long, global = true)]
    pub skip_upload: bool,

    /// Log debug output to the terminal as well as the log file
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ingest the Atom product feed as the product catalog
    Products {
        #[arg(long, env = "KB_FEED_URL", default_value = DEFAULT_FEED_URL)]
        feed_url: String,
    },
    /// Ingest a help-center CSV export as the documentation file
    Docs {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Upload an already rendered artifact again
    Upload {
        file: PathBuf,
        #[arg(long, value_enum)]
        kind: KindArg,
    },
    /// Show the files currently held by the assistant
    List,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Catalog,
    Docs,
}

impl From<KindArg> for DocumentKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Catalog => DocumentKind::ProductCatalog,
            KindArg::Docs => DocumentKind::Documentation,
        }
    }
}

impl Cli {
    pub fn ingest_config(&self, assistant: AssistantSettings) -> IngestConfig {
        IngestConfig {
            output_dir: self.output_dir.clone(),
            assistant,
            list_after_upload: !self.no_list,
            list_delay: Duration::from_secs(self.list_delay_secs),
            ..IngestConfig::default()
        }
    }

    /// Whether the chosen command talks to the assistant at all.
    pub fn needs_assistant(&self) -> bool {
        match self.command {
            Command::Upload { .. } | Command::List => true,
            Command::Products { .. } | Command::Docs { .. } => !self.skip_upload,
        }
    }
}
