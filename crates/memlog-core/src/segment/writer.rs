//! Durable append-only segment writer and the sampling tick loop.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::sample::{self, Clock, MemorySampler, Sample};
use crate::segment::format;

#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error("failed to create log directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open segment {path} for exclusive append")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append record to {path}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to sync {path} to stable storage")]
    Sync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Exclusive owner of one append-only segment file, named by its creation
/// timestamp.
///
/// Every append is written and fsynced before control returns, so a crash at
/// any point leaves the segment consistent up to the last whole record. The
/// writer never buffers more than one record and never rewrites earlier ones.
pub struct SegmentWriter {
    file: File,
    path: PathBuf,
    created_at: NaiveDateTime,
    device_count: usize,
}

impl SegmentWriter {
    /// Creates `<dir>/<created_at>.csv` and writes its header line. The
    /// directory is created if absent. An already-existing segment file is
    /// refused rather than reopened.
    pub fn create(
        dir: &Path,
        created_at: NaiveDateTime,
        device_count: usize,
    ) -> Result<Self, SegmentError> {
        fs::create_dir_all(dir).map_err(|source| SegmentError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(format!(
            "{}.{}",
            format::format_timestamp(created_at),
            format::SEGMENT_EXTENSION
        ));
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .map_err(|source| SegmentError::Open {
                path: path.clone(),
                source,
            })?;

        let mut writer = Self {
            file,
            path,
            created_at,
            device_count,
        };
        writer.write_line(&format::encode_header(device_count))?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn device_count(&self) -> usize {
        self.device_count
    }

    /// Appends one record and forces it to stable storage before returning.
    /// Returns the record line for echoing.
    pub fn append(&mut self, sample: &Sample) -> Result<String, SegmentError> {
        if !sample.cpu.is_plausible() {
            tracing::warn!(
                used_bytes = sample.cpu.used_bytes,
                total_bytes = sample.cpu.total_bytes,
                "cpu reading exceeds its own total"
            );
        }
        for (index, gpu) in sample.gpus.iter().enumerate() {
            if !gpu.is_plausible() {
                tracing::warn!(
                    index,
                    used_bytes = gpu.used_bytes,
                    total_bytes = gpu.total_bytes,
                    "gpu reading exceeds its own total"
                );
            }
        }

        let line = format::encode_record(sample);
        self.write_line(&line)?;
        Ok(line)
    }

    fn write_line(&mut self, line: &str) -> Result<(), SegmentError> {
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.write_all(b"\n"))
            .map_err(|source| SegmentError::Append {
                path: self.path.clone(),
                source,
            })?;
        self.file.sync_all().map_err(|source| SegmentError::Sync {
            path: self.path.clone(),
            source,
        })
    }
}

/// Runs the sampling tick loop until `shutdown` receives a signal or loses all
/// of its senders.
///
/// One tick captures a full sample, appends it durably, and optionally echoes
/// the raw record line to stdout. A failed device query logs a warning and
/// skips the tick, keeping the segment valid; only I/O failures on the segment
/// itself end the loop. Ticks are paced by a fixed period with no catch-up
/// scheduling, so sampling latency shows up as drift, never as a burst.
///
/// Returns the number of records appended.
pub fn record_samples<S, C>(
    writer: &mut SegmentWriter,
    sampler: &mut S,
    clock: &C,
    period: Duration,
    echo: bool,
    shutdown: &Receiver<()>,
) -> Result<usize, SegmentError>
where
    S: MemorySampler,
    C: Clock,
{
    let mut appended = 0;
    loop {
        match sample::capture(sampler, clock.now()) {
            Ok(sample) => {
                let line = writer.append(&sample)?;
                appended += 1;
                if echo {
                    println!("{line}");
                }
            }
            Err(error) => {
                tracing::warn!(%error, "sampling failed, skipping this tick");
            }
        }

        match shutdown.recv_timeout(period) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(appended),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::mpsc::{self, Sender};

    use chrono::{Duration as TimeDelta, NaiveDate};
    use tempfile::TempDir;

    use super::*;
    use crate::sample::Reading;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 31)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn sample_at(timestamp: NaiveDateTime, used_mb: u64) -> Sample {
        Sample {
            timestamp,
            cpu: Reading::new(used_mb * 1024 * 1024, 16 * 1024 * 1024 * 1024),
            gpus: vec![Reading::new(used_mb * 2 * 1024 * 1024, 8 * 1024 * 1024 * 1024)],
        }
    }

    /// Clock that advances a fixed step on every call.
    struct SteppedClock {
        base: NaiveDateTime,
        step: TimeDelta,
        calls: Cell<i32>,
    }

    impl Clock for SteppedClock {
        fn now(&self) -> NaiveDateTime {
            let call = self.calls.get();
            self.calls.set(call + 1);
            self.base + self.step * call
        }
    }

    /// Sampler returning fixed readings that requests shutdown after a set
    /// number of captures, and optionally fails one tick.
    struct ScriptedSampler {
        captures: usize,
        stop_after: usize,
        fail_on_capture: Option<usize>,
        shutdown: Sender<()>,
    }

    impl MemorySampler for ScriptedSampler {
        type Error = String;

        fn device_count(&self) -> usize {
            1
        }

        fn sample_cpu(&mut self) -> Result<Reading, Self::Error> {
            self.captures += 1;
            if self.captures == self.stop_after {
                self.shutdown.send(()).expect("receiver alive");
            }
            if self.fail_on_capture == Some(self.captures) {
                return Err("device busy".to_string());
            }
            Ok(Reading::new(1024 * 1024, 4 * 1024 * 1024))
        }

        fn sample_gpu(&mut self, _index: usize) -> Result<Reading, Self::Error> {
            Ok(Reading::new(2 * 1024 * 1024, 8 * 1024 * 1024))
        }
    }

    #[test]
    fn create_writes_header_and_names_file_after_creation_time() {
        let dir = TempDir::new().unwrap();
        let writer = SegmentWriter::create(dir.path(), base_time(), 2).unwrap();

        assert_eq!(
            writer.path(),
            dir.path().join("20260831_100000.csv").as_path()
        );
        let contents = fs::read_to_string(writer.path()).unwrap();
        assert_eq!(contents, format!("{}\n", format::encode_header(2)));
    }

    #[test]
    fn create_builds_missing_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let writer = SegmentWriter::create(&nested, base_time(), 0).unwrap();
        assert!(writer.path().exists());
    }

    #[test]
    fn create_refuses_an_existing_segment() {
        let dir = TempDir::new().unwrap();
        let _first = SegmentWriter::create(dir.path(), base_time(), 0).unwrap();
        let second = SegmentWriter::create(dir.path(), base_time(), 0);
        assert!(matches!(second, Err(SegmentError::Open { .. })));
    }

    #[test]
    fn appended_records_read_back_in_order() {
        let dir = TempDir::new().unwrap();
        let mut writer = SegmentWriter::create(dir.path(), base_time(), 1).unwrap();

        let samples: Vec<Sample> = (0..4)
            .map(|i| sample_at(base_time() + TimeDelta::seconds(5 * i), 100 + i as u64))
            .collect();
        for sample in &samples {
            writer.append(sample).unwrap();
        }

        let contents = fs::read_to_string(writer.path()).unwrap();
        let mut lines = contents.lines();
        let device_count = format::parse_header(lines.next().unwrap()).unwrap();
        assert_eq!(device_count, 1, "header gpu count should match the writer");

        let read_back: Vec<Sample> = lines
            .map(|line| format::parse_record(line).unwrap())
            .collect();
        assert_eq!(read_back, samples);
    }

    #[test]
    fn tick_loop_appends_once_per_tick_until_shutdown() {
        let dir = TempDir::new().unwrap();
        let mut writer = SegmentWriter::create(dir.path(), base_time(), 1).unwrap();
        let clock = SteppedClock {
            base: base_time(),
            step: TimeDelta::seconds(5),
            calls: Cell::new(0),
        };
        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        let mut sampler = ScriptedSampler {
            captures: 0,
            stop_after: 3,
            fail_on_capture: None,
            shutdown: shutdown_tx,
        };

        // A long period proves pacing comes from the shutdown channel, not
        // from sleeping out the timeout.
        let appended = record_samples(
            &mut writer,
            &mut sampler,
            &clock,
            Duration::from_secs(60),
            false,
            &shutdown_rx,
        )
        .unwrap();
        assert_eq!(appended, 3);

        let contents = fs::read_to_string(writer.path()).unwrap();
        let timestamps: Vec<NaiveDateTime> = contents
            .lines()
            .skip(1)
            .map(|line| format::parse_record(line).unwrap().timestamp)
            .collect();
        assert_eq!(
            timestamps,
            vec![
                base_time(),
                base_time() + TimeDelta::seconds(5),
                base_time() + TimeDelta::seconds(10),
            ]
        );
    }

    #[test]
    fn tick_loop_skips_a_failed_capture_and_keeps_going() {
        let dir = TempDir::new().unwrap();
        let mut writer = SegmentWriter::create(dir.path(), base_time(), 1).unwrap();
        let clock = SteppedClock {
            base: base_time(),
            step: TimeDelta::seconds(5),
            calls: Cell::new(0),
        };
        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        let mut sampler = ScriptedSampler {
            captures: 0,
            stop_after: 3,
            fail_on_capture: Some(2),
            shutdown: shutdown_tx,
        };

        let appended = record_samples(
            &mut writer,
            &mut sampler,
            &clock,
            Duration::from_millis(1),
            false,
            &shutdown_rx,
        )
        .unwrap();
        assert_eq!(appended, 2, "the failed tick must be skipped, not fatal");

        let contents = fs::read_to_string(writer.path()).unwrap();
        assert_eq!(contents.lines().count(), 3, "header plus two records");
    }
}
