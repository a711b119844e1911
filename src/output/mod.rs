//! Artifact writers for resampled series
//!
//! Each writer takes one resampled series plus its market descriptor and a
//! destination directory. Writer failures are isolated per writer per
//! market; the pipeline records them without aborting.

mod csv;
mod html;
mod svg;

pub use csv::CsvWriter;
pub use html::HtmlWriter;
pub use svg::SvgWriter;

use crate::market::MarketDescriptor;
use crate::resample::{ResampledSeries, SeriesPoint};
use std::path::{Path, PathBuf};

/// A single artifact writer
pub trait SeriesWriter: Send + Sync {
    /// Short name used in logs and the run summary
    fn name(&self) -> &'static str;

    /// Write the series into `dir`, returning the written path.
    ///
    /// Returns `Ok(None)` when the writer has nothing to emit (chart writers
    /// skip empty series).
    fn write(
        &self,
        market: &MarketDescriptor,
        series: &ResampledSeries,
        dir: &Path,
    ) -> anyhow::Result<Option<PathBuf>>;
}

/// Filesystem-safe artifact stem: lowercase alphanumerics and dashes
pub fn sanitize_filename(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.to_lowercase().chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "market".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Artifact stem for one market: sanitized "title-id"
pub fn artifact_stem(market: &MarketDescriptor) -> String {
    sanitize_filename(&format!("{}-{}", market.title, market.id))
}

pub(crate) fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Shared pixel geometry for the SVG and HTML charts (960x320, 50px padding,
/// values clamped to [0,1] for placement only)
pub(crate) struct ChartGeometry {
    min_ts: i64,
    max_ts: i64,
}

pub(crate) const CHART_WIDTH: u32 = 960;
pub(crate) const CHART_HEIGHT: u32 = 320;
pub(crate) const CHART_PADDING: u32 = 50;

impl ChartGeometry {
    /// Geometry over a non-empty point slice
    pub(crate) fn new(points: &[SeriesPoint]) -> Self {
        let min_ts = points.first().map(|p| p.timestamp.timestamp()).unwrap_or(0);
        let mut max_ts = points.last().map(|p| p.timestamp.timestamp()).unwrap_or(0);
        if max_ts == min_ts {
            max_ts += 1;
        }
        Self { min_ts, max_ts }
    }

    pub(crate) fn x_for(&self, ts: i64) -> f64 {
        let span = (self.max_ts - self.min_ts) as f64;
        f64::from(CHART_PADDING)
            + (ts - self.min_ts) as f64 / span * f64::from(CHART_WIDTH - 2 * CHART_PADDING)
    }

    pub(crate) fn y_for(&self, probability: f64) -> f64 {
        let clamped = probability.clamp(0.0, 1.0);
        f64::from(CHART_HEIGHT - CHART_PADDING)
            - clamped * f64::from(CHART_HEIGHT - 2 * CHART_PADDING)
    }
}
