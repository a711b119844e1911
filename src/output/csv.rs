//! CSV artifact writer

use super::{artifact_stem, ensure_dir, SeriesWriter};
use crate::market::MarketDescriptor;
use crate::resample::ResampledSeries;
use chrono::SecondsFormat;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Writes `timestamp,iso_time,probability` rows, one per bucket
pub struct CsvWriter;

impl SeriesWriter for CsvWriter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write(
        &self,
        market: &MarketDescriptor,
        series: &ResampledSeries,
        dir: &Path,
    ) -> anyhow::Result<Option<PathBuf>> {
        ensure_dir(dir)?;
        let path = dir.join(format!("{}.csv", artifact_stem(market)));

        let mut body = String::from("timestamp,iso_time,probability\n");
        for point in &series.points {
            let _ = writeln!(
                body,
                "{},{},{:.6}",
                point.timestamp.timestamp(),
                point.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                point.probability
            );
        }

        std::fs::write(&path, body)?;
        Ok(Some(path))
    }
}
