use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "hn_summarizer.toml";
const ENV_PREFIX: &str = "HNS";

/// Run settings: built-in defaults, then `hn_summarizer.toml`, then `HNS_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub listing_url: String,
    pub article_count: usize,
    pub summarizer_url: String,
    pub input_selector: String,
    pub submit_selector: String,
    pub result_selector: String,
    pub summary_timeout_secs: u64,
    /// Prefix the summarization service puts in front of its own failures.
    pub error_marker: String,
    pub max_words: usize,
    pub headless: bool,
    pub csv_path: PathBuf,
    pub xlsx_path: PathBuf,
    pub sheet_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            listing_url: "https://news.ycombinator.com".into(),
            article_count: 10,
            summarizer_url: "https://summaraise.netlify.app/".into(),
            input_selector: ".url_input".into(),
            submit_selector: ".submit_btn".into(),
            result_selector: ".summary_box".into(),
            summary_timeout_secs: 10,
            error_marker: "Something wrong happened..".into(),
            max_words: 400,
            headless: false,
            csv_path: PathBuf::from("hacker-news-top-10-articles.csv"),
            xlsx_path: PathBuf::from("hacker-news-top-10-articles.xlsx"),
            sheet_name: "Hacker News Top 10 Articles".into(),
        }
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        anyhow::ensure!(settings.article_count > 0, "article_count must be at least 1");
        Ok(settings)
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs(self.summary_timeout_secs)
    }
}
