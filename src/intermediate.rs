//! The `;`-delimited file that sits between scraping and the report.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use thiserror::Error;
use tracing::info;

use crate::records::{Record, RecordError};

const DELIMITER: u8 = b';';

#[derive(Debug, Error)]
pub enum IntermediateError {
    #[error("intermediate file: {0}")]
    Csv(#[from] csv::Error),
    #[error("intermediate file line {line}: {source}")]
    Record {
        line: u64,
        #[source]
        source: RecordError,
    },
    #[error("intermediate file line {line}: expected rank {expected}, found {found}")]
    RankOrder { line: u64, expected: u32, found: u32 },
    #[error("intermediate file {0} has no records")]
    Empty(String),
}

/// Write records with a `Rank;Article Title;URL` header line.
pub fn write_records(path: &Path, records: &[Record]) -> Result<(), IntermediateError> {
    let mut writer = WriterBuilder::new().delimiter(DELIMITER).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read records back, re-validating every row. Ranks must run 1, 2, 3... in file order.
pub fn read_records(path: &Path) -> Result<Vec<Record>, IntermediateError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize::<Record>() {
        let row = row?;
        let line = records.len() as u64 + 2;
        let expected = records.len() as u32 + 1;
        if row.rank != expected {
            return Err(IntermediateError::RankOrder {
                line,
                expected,
                found: row.rank,
            });
        }
        let record = Record::new(row.rank, &row.title, &row.link)
            .map_err(|source| IntermediateError::Record { line, source })?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(IntermediateError::Empty(path.display().to_string()));
    }
    Ok(records)
}
