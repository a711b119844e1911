//! Interactive HTML chart writer
//!
//! Self-contained page embedding the SVG chart and a hover tooltip driven by
//! the resampled points, which are inlined as `[epoch, probability, x, y]`
//! rows.

use super::{artifact_stem, ensure_dir, ChartGeometry, SeriesWriter, CHART_HEIGHT, CHART_PADDING, CHART_WIDTH};
use crate::market::MarketDescriptor;
use crate::resample::{ResampledSeries, SeriesPoint};
use std::path::{Path, PathBuf};

pub struct HtmlWriter;

impl SeriesWriter for HtmlWriter {
    fn name(&self) -> &'static str {
        "html"
    }

    fn write(
        &self,
        market: &MarketDescriptor,
        series: &ResampledSeries,
        dir: &Path,
    ) -> anyhow::Result<Option<PathBuf>> {
        if series.points.is_empty() {
            return Ok(None);
        }
        ensure_dir(dir)?;
        let path = dir.join(format!("{}.html", artifact_stem(market)));
        std::fs::write(&path, render_html(&market.title, &series.points)?)?;
        Ok(Some(path))
    }
}

/// Pure markup generation. Non-finite probabilities serialize as `null` in
/// the embedded point array; `serde_json::json!` never fails on them.
pub fn render_html(title: &str, points: &[SeriesPoint]) -> anyhow::Result<String> {
    let geometry = ChartGeometry::new(points);
    let rows: Vec<serde_json::Value> = points
        .iter()
        .map(|point| {
            let epoch = point.timestamp.timestamp();
            serde_json::json!([
                epoch,
                round_to(point.probability, 1e6),
                round_to(geometry.x_for(epoch), 1e2),
                round_to(geometry.y_for(point.probability), 1e2),
            ])
        })
        .collect();
    let data = serde_json::to_string(&rows)?;

    let title = escape_html(title);
    Ok(TEMPLATE
        .replace("__WIDTH__", &CHART_WIDTH.to_string())
        .replace("__HEIGHT__", &CHART_HEIGHT.to_string())
        .replace("__AXIS_Y__", &(CHART_HEIGHT - CHART_PADDING).to_string())
        .replace("__RIGHT__", &(CHART_WIDTH - CHART_PADDING).to_string())
        .replace("__PADDING__", &CHART_PADDING.to_string())
        .replace("__TITLE__", &title)
        .replace("__DATA__", &data))
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

const TEMPLATE: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>__TITLE__ win probability</title>
  <style>
    body { font-family: Arial, sans-serif; }
    #chart { position: relative; width: __WIDTH__px; }
    #tooltip {
      position: absolute;
      background: rgba(0,0,0,0.8);
      color: #fff;
      padding: 6px 8px;
      border-radius: 4px;
      font-size: 12px;
      pointer-events: none;
      display: none;
      transform: translate(-50%, -120%);
    }
  </style>
</head>
<body>
  <h3>__TITLE__</h3>
  <div id="chart">
    <svg id="svg" xmlns="http://www.w3.org/2000/svg" width="__WIDTH__" height="__HEIGHT__">
      <rect width="100%" height="100%" fill="#ffffff"></rect>
      <line x1="__PADDING__" y1="__AXIS_Y__" x2="__RIGHT__" y2="__AXIS_Y__" stroke="#cccccc"></line>
      <line x1="__PADDING__" y1="__PADDING__" x2="__PADDING__" y2="__AXIS_Y__" stroke="#cccccc"></line>
      <polyline id="line" fill="none" stroke="#0b5fff" stroke-width="2"></polyline>
      <circle id="cursor" r="4" fill="#0b5fff"></circle>
    </svg>
    <div id="tooltip"></div>
  </div>
  <script>
    const data = __DATA__;
    const svg = document.getElementById('svg');
    const line = document.getElementById('line');
    const cursor = document.getElementById('cursor');
    const tooltip = document.getElementById('tooltip');
    line.setAttribute('points', data.map(d => `${d[2]},${d[3]}`).join(' '));

    function findNearest(x) {
      let best = data[0];
      let min = Math.abs(x - best[2]);
      for (const d of data) {
        const dist = Math.abs(x - d[2]);
        if (dist < min) {
          min = dist;
          best = d;
        }
      }
      return best;
    }

    svg.addEventListener('mousemove', (event) => {
      const rect = svg.getBoundingClientRect();
      const x = event.clientX - rect.left;
      const nearest = findNearest(x);
      cursor.setAttribute('cx', nearest[2]);
      cursor.setAttribute('cy', nearest[3]);
      tooltip.style.left = `${nearest[2]}px`;
      tooltip.style.top = `${nearest[3]}px`;
      const date = new Date(nearest[0] * 1000).toISOString();
      tooltip.textContent = `${date} | ${(nearest[1] * 100).toFixed(2)}%`;
      tooltip.style.display = 'block';
    });

    svg.addEventListener('mouseleave', () => {
      tooltip.style.display = 'none';
    });
  </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::super::tests::{market, series};
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn embeds_point_data_and_title() {
        let s = series(vec![(0, 0.4), (100, 0.6)]);
        let html = render_html("Lakers Game 5", &s.points).unwrap();
        assert!(html.contains("<h3>Lakers Game 5</h3>"));
        assert!(html.contains("const data = [[0,0.4,50.0,"));
        assert!(html.contains("[100,0.6,910.0,"));
        assert!(!html.contains("__DATA__"));
        assert!(!html.contains("__TITLE__"));
    }

    #[test]
    fn template_retains_chart_background_and_hash_colors() {
        let s = series(vec![(0, 0.5)]);
        let html = render_html("t", &s.points).unwrap();
        assert!(html.contains(r##"<rect width="100%" height="100%" fill="#ffffff">"##));
        assert!(html.contains(r##"stroke="#0b5fff""##));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn non_finite_probability_becomes_null_in_data() {
        let s = series(vec![(0, f64::NAN)]);
        let html = render_html("t", &s.points).unwrap();
        assert!(html.contains("const data = [[0,null,50.0,null]]"));
    }

    #[test]
    fn escapes_title_markup() {
        let s = series(vec![(0, 0.5)]);
        let html = render_html("<script>alert(1)</script>", &s.points).unwrap();
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn writer_skips_empty_series() {
        let dir = TempDir::new().unwrap();
        let result = HtmlWriter
            .write(&market(), &series(vec![]), dir.path())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn writer_emits_html_file() {
        let dir = TempDir::new().unwrap();
        let path = HtmlWriter
            .write(&market(), &series(vec![(0, 0.4), (10, 0.6)]), dir.path())
            .unwrap()
            .unwrap();
        assert_eq!(path.extension().unwrap(), "html");
        assert!(std::fs::read_to_string(path).unwrap().contains("tooltip"));
    }
}
