//! Chronological index of segment files, derived purely from filenames.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::segment::format;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read log directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("foreign entry `{name}` in {path}: every file must be named <timestamp>.<ext>")]
    ForeignEntry { path: PathBuf, name: String },

    #[error("no segments found in {path}")]
    NoSegments { path: PathBuf },

    #[error("no data recorded before {end}")]
    NoDataBeforeEnd { end: NaiveDateTime },
}

/// One segment on disk, its creation timestamp parsed from the file stem.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentEntry {
    pub created_at: NaiveDateTime,
    pub path: PathBuf,
}

/// Sorted index over the segment files of one log directory, built fresh per
/// query.
///
/// The directory must be exclusively managed by the writer: one entry whose
/// name does not parse as a timestamp fails the whole scan, because a foreign
/// file means the directory cannot be trusted and skipping it could silently
/// misattribute data.
#[derive(Debug)]
pub struct Catalog {
    entries: Vec<SegmentEntry>,
}

impl Catalog {
    pub fn scan(dir: &Path) -> Result<Self, CatalogError> {
        let read_dir = fs::read_dir(dir).map_err(|source| CatalogError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| CatalogError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let foreign = || CatalogError::ForeignEntry {
                path: dir.to_path_buf(),
                name: entry.file_name().to_string_lossy().into_owned(),
            };
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| foreign())?;
            let created_at = format::parse_timestamp(stem).map_err(|_| foreign())?;
            entries.push(SegmentEntry { created_at, path });
        }

        if entries.is_empty() {
            return Err(CatalogError::NoSegments {
                path: dir.to_path_buf(),
            });
        }
        entries.sort_by_key(|entry| entry.created_at);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SegmentEntry] {
        &self.entries
    }

    /// Selects the contiguous run of segments that could hold records inside
    /// `[start, end]`.
    ///
    /// The segment created just before `start` is included because its records
    /// run from its creation time onward, and the first segment created at or
    /// after `end` is included as well. The selection is deliberately one
    /// segment wider than the window on each side; callers filter records,
    /// not segments, so the extra segments cost a read but never correctness.
    pub fn select(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<&[SegmentEntry], CatalogError> {
        let earliest = self.entries.first().expect("catalog is never empty");
        if earliest.created_at > end {
            return Err(CatalogError::NoDataBeforeEnd { end });
        }

        let insertion = self.entries.partition_point(|entry| entry.created_at < start);
        let floor = insertion.saturating_sub(1);
        let ceiling = floor + self.entries[floor..].partition_point(|entry| entry.created_at < end);
        let upper = ceiling.min(self.entries.len() - 1);
        Ok(&self.entries[floor..=upper])
    }
}
