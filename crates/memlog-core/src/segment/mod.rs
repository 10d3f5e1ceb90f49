//! Append-only log segments: the on-disk text format and the durable writer.

pub mod format;
pub mod writer;

pub use format::FormatError;
pub use writer::{record_samples, SegmentError, SegmentWriter};
