use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("rank must be a positive integer")]
    ZeroRank,
    #[error("rank {0}: title is empty")]
    EmptyTitle(u32),
    #[error("rank {rank}: '{link}' is not an absolute URL")]
    RelativeLink { rank: u32, link: String },
}

/// One ranked listing entry. Field names double as the intermediate file header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Rank")]
    pub rank: u32,
    #[serde(rename = "Article Title")]
    pub title: String,
    #[serde(rename = "URL")]
    pub link: String,
}

impl Record {
    pub fn new(rank: u32, title: &str, link: &str) -> Result<Self, RecordError> {
        if rank == 0 {
            return Err(RecordError::ZeroRank);
        }
        let title = sanitize_title(title);
        if title.is_empty() {
            return Err(RecordError::EmptyTitle(rank));
        }
        let link = link.trim();
        if Url::parse(link).is_err() {
            return Err(RecordError::RelativeLink {
                rank,
                link: link.to_string(),
            });
        }
        Ok(Record {
            rank,
            title,
            link: link.to_string(),
        })
    }
}

/// `;` is the intermediate file delimiter, so it never survives into a title.
pub fn sanitize_title(title: &str) -> String {
    title.trim().replace(';', ",")
}

/// A record plus its display summary. The summary is set once, at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRecord {
    pub record: Record,
    pub summary: String,
}

impl EnrichedRecord {
    pub fn new(record: Record, summary: String) -> Self {
        EnrichedRecord { record, summary }
    }

    pub fn rank(&self) -> u32 {
        self.record.rank
    }

    pub fn title(&self) -> &str {
        &self.record.title
    }

    pub fn link(&self) -> &str {
        &self.record.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolons_replaced() {
        let r = Record::new(1, "Rust; the good parts; again", "https://example.com/a").unwrap();
        assert_eq!(r.title, "Rust, the good parts, again");
    }

    #[test]
    fn rejects_zero_rank() {
        assert_eq!(
            Record::new(0, "Title", "https://example.com"),
            Err(RecordError::ZeroRank)
        );
    }

    #[test]
    fn rejects_blank_title() {
        assert_eq!(
            Record::new(3, "   ", "https://example.com"),
            Err(RecordError::EmptyTitle(3))
        );
    }

    #[test]
    fn rejects_relative_link() {
        let err = Record::new(2, "Ask HN", "item?id=1").unwrap_err();
        assert!(matches!(err, RecordError::RelativeLink { rank: 2, .. }));
    }
}
