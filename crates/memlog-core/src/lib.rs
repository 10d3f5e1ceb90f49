//! Core of the memory-usage logger: sample types, the durable append-only
//! segment writer, the filename-derived segment catalog, and the window merge
//! that reassembles one chronological series out of many per-run segments.
//!
//! Platform probing (NVML, sysinfo) and the CLI live in the `memlog` binary
//! crate behind the [`MemorySampler`] and [`Clock`] seams defined here.

pub mod catalog;
pub mod sample;
pub mod segment;
pub mod series;

pub use catalog::{Catalog, CatalogError, SegmentEntry};
pub use sample::{Clock, MemorySampler, Reading, Sample, SystemClock};
pub use segment::format;
pub use segment::format::FormatError;
pub use segment::writer::{record_samples, SegmentError, SegmentWriter};
pub use series::{load_series, merge, MergeError, QueryError, Series};
