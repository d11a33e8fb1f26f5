//! Playback of recorded sample streams.
//!
//! Input is CSV with a `timestamp_ms,red,ir` header. Lines starting with `#`
//! are comments.

use serde::Deserialize;
use std::collections::VecDeque;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use super::{SampleSource, SensorSample};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("timestamp went backwards at row {row}: {ts} < {prev}")]
    NonMonotonic { row: usize, ts: u32, prev: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReplayRow {
    pub timestamp_ms: u32,
    pub red: u32,
    pub ir: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    rows: VecDeque<ReplayRow>,
}

impl ReplaySource {
    pub fn from_rows(rows: impl IntoIterator<Item = ReplayRow>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse CSV rows, rejecting timestamps that run backwards.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReplayError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = VecDeque::new();
        let mut prev: Option<u32> = None;
        for (i, record) in csv_reader.deserialize::<ReplayRow>().enumerate() {
            let row = record?;
            if let Some(prev) = prev {
                if row.timestamp_ms < prev {
                    return Err(ReplayError::NonMonotonic {
                        row: i + 1,
                        ts: row.timestamp_ms,
                        prev,
                    });
                }
            }
            prev = Some(row.timestamp_ms);
            rows.push_back(row);
        }

        log::debug!("Loaded {} replay rows", rows.len());
        Ok(Self { rows })
    }

    /// Timestamp of the next pending row.
    pub fn peek_timestamp(&self) -> Option<u32> {
        self.rows.front().map(|r| r.timestamp_ms)
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl SampleSource for ReplaySource {
    fn available(&mut self) -> bool {
        !self.rows.is_empty()
    }

    fn read_sample(&mut self) -> SensorSample {
        match self.rows.pop_front() {
            Some(row) => SensorSample::new(row.red, row.ir),
            None => SensorSample::invalid(),
        }
    }
}
