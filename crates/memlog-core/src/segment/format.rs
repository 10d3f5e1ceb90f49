//! On-disk text format shared by segment records and segment filenames.
//!
//! A segment holds one header line describing its column layout, then one
//! record line per sample. The same timestamp string is used inside records
//! and as the segment filename (sans extension), which is what lets the
//! catalog order segments without ever opening them.

use chrono::NaiveDateTime;

use crate::sample::{Reading, Sample};

/// Fixed, sortable, filesystem-safe timestamp format, used identically for
/// record fields and segment filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extension given to segment files by the writer.
pub const SEGMENT_EXTENSION: &str = "csv";

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid timestamp `{value}`, expected the form 20260831_094500")]
    InvalidTimestamp { value: String },

    #[error("malformed header `{line}`")]
    MalformedHeader { line: String },

    #[error("malformed record `{line}`: {reason}")]
    MalformedRecord { line: String, reason: String },
}

pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, FormatError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
        FormatError::InvalidTimestamp {
            value: value.to_string(),
        }
    })
}

/// Header line for a segment that records `device_count` gpus.
pub fn encode_header(device_count: usize) -> String {
    let mut header = String::from("DateTime,CPU_Used_MB,CPU_Total_MB");
    for index in 0..device_count {
        header.push_str(&format!(",GPU_{index}_Used_MB,GPU_{index}_Total_MB"));
    }
    header
}

/// Recovers the gpu count from a segment's header line.
pub fn parse_header(line: &str) -> Result<usize, FormatError> {
    let malformed = || FormatError::MalformedHeader {
        line: line.to_string(),
    };

    let columns: Vec<&str> = line.split(',').collect();
    if columns.len() < 3
        || columns[..3] != ["DateTime", "CPU_Used_MB", "CPU_Total_MB"]
        || (columns.len() - 3) % 2 != 0
    {
        return Err(malformed());
    }

    let device_count = (columns.len() - 3) / 2;
    for index in 0..device_count {
        if columns[3 + 2 * index] != format!("GPU_{index}_Used_MB")
            || columns[4 + 2 * index] != format!("GPU_{index}_Total_MB")
        {
            return Err(malformed());
        }
    }
    Ok(device_count)
}

/// One record line (no terminator): timestamp, cpu pair, then one used/total
/// pair per gpu.
pub fn encode_record(sample: &Sample) -> String {
    let mut line = format!(
        "{},{},{}",
        format_timestamp(sample.timestamp),
        bytes_to_mb(sample.cpu.used_bytes),
        bytes_to_mb(sample.cpu.total_bytes),
    );
    for gpu in &sample.gpus {
        line.push_str(&format!(
            ",{},{}",
            bytes_to_mb(gpu.used_bytes),
            bytes_to_mb(gpu.total_bytes)
        ));
    }
    line
}

pub fn parse_record(line: &str) -> Result<Sample, FormatError> {
    let malformed = |reason: String| FormatError::MalformedRecord {
        line: line.to_string(),
        reason,
    };

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 3 {
        return Err(malformed("fewer than three fields".to_string()));
    }
    if (fields.len() - 1) % 2 != 0 {
        return Err(malformed("unpaired used/total field".to_string()));
    }

    let parse_mb = |field: &str| {
        field
            .parse::<f64>()
            .map(mb_to_bytes)
            .map_err(|_| malformed(format!("non-numeric field `{field}`")))
    };

    let timestamp = parse_timestamp(fields[0])?;
    let cpu = Reading::new(parse_mb(fields[1])?, parse_mb(fields[2])?);
    let mut gpus = Vec::with_capacity((fields.len() - 3) / 2);
    for pair in fields[3..].chunks(2) {
        gpus.push(Reading::new(parse_mb(pair[0])?, parse_mb(pair[1])?));
    }

    Ok(Sample {
        timestamp,
        cpu,
        gpus,
    })
}

// One MiB is a power of two, so dividing by it only shifts the f64 exponent:
// the conversion is exact for any byte count below 2^53 and the record text
// round-trips losslessly (f64's Display prints the shortest string that
// parses back to the same value).
fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

fn mb_to_bytes(mb: f64) -> u64 {
    (mb * BYTES_PER_MB as f64) as u64
}
