//! Thin consumer of a merged series: renders it back out as one CSV table.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use memlog_core::{format, Series};

/// Writes the series as one table spanning the union of device columns.
///
/// Samples from runs with fewer devices leave their extra columns empty: a
/// missing device is absent, never zero.
pub fn write_series(series: &Series, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            render(series, &mut writer)?;
            writer.flush()?;
            tracing::info!(path = %path.display(), "series written");
            Ok(())
        }
        None => render(series, &mut io::stdout().lock()),
    }
}

fn render(series: &Series, writer: &mut impl Write) -> Result<()> {
    let device_count = series.max_device_count();
    writeln!(writer, "{}", format::encode_header(device_count))?;
    for sample in series.samples() {
        let mut line = format::encode_record(sample);
        for _ in sample.gpus.len()..device_count {
            line.push_str(",,");
        }
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use memlog_core::{merge, Reading, Sample, SegmentWriter};
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn renders_the_union_of_device_columns() {
        let dir = TempDir::new().unwrap();
        let t0 = NaiveDate::from_ymd_opt(2026, 8, 30)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let t1 = t0 + chrono::Duration::seconds(30);

        let mut no_gpus = SegmentWriter::create(dir.path(), t0, 0).unwrap();
        no_gpus
            .append(&Sample {
                timestamp: t0,
                cpu: Reading::new(1024 * 1024, 2 * 1024 * 1024),
                gpus: vec![],
            })
            .unwrap();
        let mut one_gpu = SegmentWriter::create(dir.path(), t1, 1).unwrap();
        one_gpu
            .append(&Sample {
                timestamp: t1,
                cpu: Reading::new(1024 * 1024, 2 * 1024 * 1024),
                gpus: vec![Reading::new(3 * 1024 * 1024, 4 * 1024 * 1024)],
            })
            .unwrap();

        let entries = [
            memlog_core::SegmentEntry {
                created_at: t0,
                path: no_gpus.path().to_path_buf(),
            },
            memlog_core::SegmentEntry {
                created_at: t1,
                path: one_gpu.path().to_path_buf(),
            },
        ];
        let series = merge(&entries, t0, t1).unwrap();

        let mut rendered = Vec::new();
        render(&series, &mut rendered).unwrap();
        let text = String::from_utf8(rendered).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format::encode_header(1));
        assert_eq!(lines[1], "20260830_090000,1,2,,");
        assert_eq!(lines[2], "20260830_090030,1,2,3,4");
    }
}
