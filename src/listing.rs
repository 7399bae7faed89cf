use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::browser::{BrowserError, BrowserSession};
use crate::records::{Record, RecordError};

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error("Failed to read listing rows: {0}")]
    Extract(String),
    #[error("Listing row has an unreadable rank: '{0}'")]
    Rank(String),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("Expected {expected} listing rows, found {found}")]
    TooFew { expected: usize, found: usize },
}

/// Fields as they come out of the page, before validation.
#[derive(Debug, Deserialize)]
struct ListingRow {
    rank: String,
    title: String,
    link: String,
}

impl ListingRow {
    fn into_record(self) -> Result<Record, ListingError> {
        let rank = parse_rank(&self.rank).ok_or_else(|| ListingError::Rank(self.rank.clone()))?;
        Ok(Record::new(rank, &self.title, &self.link)?)
    }
}

/// Collect the top `count` entries of the front page, in page order.
pub async fn scrape_listing(
    session: &BrowserSession,
    listing_url: &str,
    count: usize,
) -> Result<Vec<Record>, ListingError> {
    info!("Fetching listing: {}", listing_url);
    session.goto(listing_url).await?;

    let rows: Vec<ListingRow> = session
        .page()
        .evaluate(extract_script(count).as_str())
        .await
        .map_err(|e| ListingError::Extract(e.to_string()))?
        .into_value()
        .map_err(|e| ListingError::Extract(e.to_string()))?;

    if rows.len() < count {
        return Err(ListingError::TooFew {
            expected: count,
            found: rows.len(),
        });
    }

    let records = rows
        .into_iter()
        .take(count)
        .map(ListingRow::into_record)
        .collect::<Result<Vec<_>, _>>()?;

    info!("Scraped {} articles", records.len());
    Ok(records)
}

/// Page-side extraction over `.athing` rows; `href` is read as a property so it is absolute.
fn extract_script(count: usize) -> String {
    format!(
        r#"(() => Array.from(document.querySelectorAll(".athing"))
            .slice(0, {count})
            .map((row) => {{
                const rank = row.querySelector(".rank");
                const anchor = row.querySelector(".titleline a");
                return {{
                    rank: rank ? rank.textContent : "",
                    title: anchor ? anchor.textContent : "",
                    link: anchor ? anchor.href : "",
                }};
            }}))()"#,
        count = count
    )
}

/// Front-page ranks render as `"7."`.
fn parse_rank(raw: &str) -> Option<u32> {
    raw.trim()
        .trim_end_matches('.')
        .parse::<u32>()
        .ok()
        .filter(|r| *r > 0)
}
