use std::future::Future;
use std::time::Duration;

use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use thiserror::Error;
use tracing::debug;

use super::{Summarizer, SummaryOutcome};
use crate::browser::{BrowserError, BrowserSession};
use crate::settings::Settings;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("no summary appeared within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error("page interaction failed: {0}")]
    Interaction(#[from] CdpError),
}

/// Where the summarization form lives and how to read its answer.
#[derive(Debug, Clone)]
pub struct SummarizerEndpoint {
    pub url: String,
    pub input_selector: String,
    pub submit_selector: String,
    pub result_selector: String,
    pub timeout: Duration,
    pub error_marker: String,
}

impl SummarizerEndpoint {
    pub fn from_settings(settings: &Settings) -> Self {
        SummarizerEndpoint {
            url: settings.summarizer_url.clone(),
            input_selector: settings.input_selector.clone(),
            submit_selector: settings.submit_selector.clone(),
            result_selector: settings.result_selector.clone(),
            timeout: settings.summary_timeout(),
            error_marker: settings.error_marker.clone(),
        }
    }
}

/// Submits links to the summarization form through the run's browser session.
pub struct BrowserSummarizer<'s> {
    session: &'s mut BrowserSession,
    endpoint: SummarizerEndpoint,
}

impl<'s> BrowserSummarizer<'s> {
    pub fn new(session: &'s mut BrowserSession, endpoint: SummarizerEndpoint) -> Self {
        BrowserSummarizer { session, endpoint }
    }

    /// One navigate → fill → submit → wait cycle. No retries.
    async fn submit(&mut self, link: &str) -> Result<String, SummarizeError> {
        self.session.goto(&self.endpoint.url).await?;

        let page = self.session.page();
        let limit = self.endpoint.timeout;
        let input = bounded(limit, wait_for_element(page, &self.endpoint.input_selector)).await?;
        input.click().await?.type_str(link).await?;
        let button = bounded(limit, wait_for_element(page, &self.endpoint.submit_selector)).await?;
        button.click().await?;

        bounded(limit, wait_for_text(page, &self.endpoint.result_selector)).await
    }
}

impl Summarizer for BrowserSummarizer<'_> {
    async fn summarize(&mut self, link: &str) -> SummaryOutcome {
        match self.submit(link).await {
            Ok(text) => {
                debug!(link, chars = text.len(), "Summary received");
                SummaryOutcome::from_text(&text, &self.endpoint.error_marker)
            }
            Err(SummarizeError::Timeout(_)) => SummaryOutcome::Timeout,
            Err(e) => SummaryOutcome::TransportError(e.to_string()),
        }
    }
}

async fn bounded<T>(limit: Duration, wait: impl Future<Output = T>) -> Result<T, SummarizeError> {
    tokio::time::timeout(limit, wait)
        .await
        .map_err(|_| SummarizeError::Timeout(limit))
}

/// Run `check` every [`POLL_INTERVAL`] until it yields a value.
async fn poll_until<T, F, Fut>(mut check: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    loop {
        if let Some(found) = check().await {
            return found;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Poll until the form control is mounted.
async fn wait_for_element(page: &Page, selector: &str) -> Element {
    poll_until(|| async move { page.find_element(selector).await.ok() }).await
}

/// Poll until the result region exists and shows some text.
async fn wait_for_text(page: &Page, selector: &str) -> String {
    poll_until(|| async move {
        let element = page.find_element(selector).await.ok()?;
        ready_text(element.inner_text().await)
    })
    .await
}

/// A node that is mid re-render fails to read; that counts as not there yet.
fn ready_text(read: Result<Option<String>, CdpError>) -> Option<String> {
    match read {
        Ok(Some(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Result region not readable yet");
            None
        }
    }
}
