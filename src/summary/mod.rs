pub mod client;
pub mod normalize;

pub use client::{BrowserSummarizer, SummarizerEndpoint};
pub use normalize::Normalizer;

/// What one summarization attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Success(String),
    Timeout,
    /// The service answered, but with its own failure message.
    ServiceError(String),
    /// Navigation or page interaction failed before any answer arrived.
    TransportError(String),
}

impl SummaryOutcome {
    /// Classify the text read from the result region.
    pub fn from_text(text: &str, error_marker: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || is_service_error(text, error_marker) {
            SummaryOutcome::ServiceError(text.to_string())
        } else {
            SummaryOutcome::Success(text.to_string())
        }
    }
}

pub(crate) fn is_service_error(text: &str, error_marker: &str) -> bool {
    !error_marker.is_empty() && text.trim_start().starts_with(error_marker)
}

/// Produces one summary per link. Implementations are called strictly one at a time.
#[allow(async_fn_in_trait)]
pub trait Summarizer {
    async fn summarize(&mut self, link: &str) -> SummaryOutcome;
}
