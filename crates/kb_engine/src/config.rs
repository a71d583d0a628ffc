use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use kb_core::RenderOptions;

use crate::FetchSettings;

pub const DEFAULT_FEED_URL: &str = "https://portablespas.co.nz/collections/all.atom";
pub const DEFAULT_ASSISTANT_HOST: &str = "https://prod-1-data.ke.pinecone.io";
pub const DEFAULT_ASSISTANT_NAME: &str = "portable-spas";

/// Source of the calendar date stamped into artifacts and metadata.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone, PartialEq, Eq)]
pub struct AssistantSettings {
    pub base_url: String,
    pub assistant_name: String,
    pub api_key: Option<String>,
    /// `None` blocks until the assistant answers.
    pub upload_timeout: Option<Duration>,
    pub list_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ASSISTANT_HOST.to_string(),
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            api_key: None,
            upload_timeout: None,
            list_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for AssistantSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantSettings")
            .field("base_url", &self.base_url)
            .field("assistant_name", &self.assistant_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("upload_timeout", &self.upload_timeout)
            .field("list_timeout", &self.list_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl AssistantSettings {
    /// Read `PINECONE_API_KEY`, `PINECONE_ASSISTANT_NAME` and
    /// `PINECONE_ASSISTANT_HOST` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();
        Self {
            base_url: non_empty("PINECONE_ASSISTANT_HOST").unwrap_or(defaults.base_url),
            assistant_name: non_empty("PINECONE_ASSISTANT_NAME").unwrap_or(defaults.assistant_name),
            api_key: non_empty("PINECONE_API_KEY"),
            ..defaults
        }
    }
}

#[derive(Clone)]
pub struct IngestConfig {
    pub output_dir: PathBuf,
    pub fetch: FetchSettings,
    pub assistant: AssistantSettings,
    pub render: RenderOptions,
    pub list_after_upload: bool,
    /// Fixed wait between upload and list so the store can finish processing.
    pub list_delay: Duration,
    pub today: Clock,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            fetch: FetchSettings::default(),
            assistant: AssistantSettings::default(),
            render: RenderOptions::default(),
            list_after_upload: true,
            list_delay: Duration::from_secs(10),
            today: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }
}

impl IngestConfig {
    /// Pin the clock to one date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.today = Arc::new(move || date);
        self
    }
}

impl fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestConfig")
            .field("output_dir", &self.output_dir)
            .field("fetch", &self.fetch)
            .field("assistant_name", &self.assistant.assistant_name)
            .field("render", &self.render)
            .field("list_after_upload", &self.list_after_upload)
            .field("list_delay", &self.list_delay)
            .field("today", &(self.today)())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_falls_back_to_defaults_for_blank_values() {
        let env: HashMap<&str, &str> = [
            ("PINECONE_API_KEY", "secret"),
            ("PINECONE_ASSISTANT_NAME", "  "),
        ]
        .into_iter()
        .collect();
        let settings = AssistantSettings::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.assistant_name, DEFAULT_ASSISTANT_NAME);
        assert_eq!(settings.base_url, DEFAULT_ASSISTANT_HOST);
        assert_eq!(settings.upload_timeout, None);
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let mut config = IngestConfig::default()
            .with_date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        config.assistant.api_key = Some("secret".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("2025-10-01"));
    }

    #[test]
    fn settings_debug_redacts_the_api_key() {
        let settings = AssistantSettings {
            api_key: Some("pcsk_live_secret".to_string()),
            ..AssistantSettings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("pcsk_live_secret"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains(DEFAULT_ASSISTANT_NAME));

        let unset = format!("{:?}", AssistantSettings::default());
        assert!(unset.contains("api_key: None"));
    }
}
