//! Loads selected segments and merges them into one chronological series.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::catalog::{Catalog, CatalogError, SegmentEntry};
use crate::sample::Sample;
use crate::segment::format::{self, FormatError};

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("failed to read segment {path}")]
    ReadSegment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("segment {path} has no header line")]
    MissingHeader { path: PathBuf },

    #[error("segment {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("no records between {start} and {end}")]
    EmptyWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// Either half of the query path failing. The variants stay distinguishable so
/// "nothing recorded before the end" and "coverage exists but the window is
/// empty" read differently to the caller.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Time-ordered samples inside one query window. Built fresh per query, never
/// persisted, and never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Largest gpu count across samples. Segments written by runs with
    /// different device counts merge into one series; consumers must treat a
    /// sample's missing device columns as absent, never as zero.
    pub fn max_device_count(&self) -> usize {
        self.samples
            .iter()
            .map(|sample| sample.gpus.len())
            .max()
            .unwrap_or(0)
    }
}

/// Loads every selected segment fully, keeps records inside `[start, end]`
/// (inclusive on both ends), and sorts the result by timestamp.
///
/// Selected segments are globally ordered against each other except where the
/// floor segment overlaps the window boundary, so a stable full sort is
/// required rather than a merge step. Records sharing a timestamp are all
/// preserved, never deduplicated.
pub fn merge(
    entries: &[SegmentEntry],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Series, MergeError> {
    let mut samples = Vec::new();
    for entry in entries {
        let contents =
            fs::read_to_string(&entry.path).map_err(|source| MergeError::ReadSegment {
                path: entry.path.clone(),
                source,
            })?;
        let mut lines = contents.lines();
        let header = lines.next().ok_or_else(|| MergeError::MissingHeader {
            path: entry.path.clone(),
        })?;
        let device_count = format::parse_header(header).map_err(|source| MergeError::Format {
            path: entry.path.clone(),
            source,
        })?;

        for line in lines {
            let sample = format::parse_record(line).map_err(|source| MergeError::Format {
                path: entry.path.clone(),
                source,
            })?;
            if sample.gpus.len() != device_count {
                return Err(MergeError::Format {
                    path: entry.path.clone(),
                    source: FormatError::MalformedRecord {
                        line: line.to_string(),
                        reason: format!(
                            "expected {device_count} gpu column pairs, found {}",
                            sample.gpus.len()
                        ),
                    },
                });
            }
            if sample.timestamp >= start && sample.timestamp <= end {
                samples.push(sample);
            }
        }
    }

    if samples.is_empty() {
        return Err(MergeError::EmptyWindow { start, end });
    }
    samples.sort_by_key(|sample| sample.timestamp);
    Ok(Series { samples })
}

/// One-call query path: scan the directory, select candidate segments, merge
/// their records over the window. Fails outright rather than returning a
/// partial series.
pub fn load_series(
    dir: &Path,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Series, QueryError> {
    let catalog = Catalog::scan(dir)?;
    let selected = catalog.select(start, end)?;
    Ok(merge(selected, start, end)?)
}
