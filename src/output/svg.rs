//! Static SVG chart writer

use super::{
    artifact_stem, ensure_dir, ChartGeometry, SeriesWriter, CHART_HEIGHT, CHART_PADDING,
    CHART_WIDTH,
};
use crate::market::MarketDescriptor;
use crate::resample::{ResampledSeries, SeriesPoint};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Renders the series as a polyline chart with axis lines and labels
pub struct SvgWriter;

impl SeriesWriter for SvgWriter {
    fn name(&self) -> &'static str {
        "svg"
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
        let path = dir.join(format!("{}.svg", artifact_stem(market)));
        std::fs::write(&path, render_svg(&market.title, &series.points))?;
        Ok(Some(path))
    }
}

/// Pure markup generation so the chart shape is unit-testable
pub fn render_svg(title: &str, points: &[SeriesPoint]) -> String {
    let geometry = ChartGeometry::new(points);
    let mut polyline = String::new();
    for point in points {
        let _ = write!(
            polyline,
            "{:.2},{:.2} ",
            geometry.x_for(point.timestamp.timestamp()),
            geometry.y_for(point.probability)
        );
    }
    let polyline = polyline.trim_end();

    let w = CHART_WIDTH;
    let h = CHART_HEIGHT;
    let pad = CHART_PADDING;
    let title = escape_xml(title);

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">
<rect width="100%" height="100%" fill="#ffffff"/>
<text x="{pad}" y="24" font-size="16" font-family="Arial">{title}</text>
<line x1="{pad}" y1="{axis_y}" x2="{right}" y2="{axis_y}" stroke="#cccccc"/>
<line x1="{pad}" y1="{pad}" x2="{pad}" y2="{axis_y}" stroke="#cccccc"/>
<polyline fill="none" stroke="#0b5fff" stroke-width="2" points="{polyline}"/>
<text x="{pad}" y="{label_y}" font-size="12" font-family="Arial">start</text>
<text x="{right}" y="{label_y}" font-size="12" text-anchor="end" font-family="Arial">end</text>
<text x="{tick_x}" y="{pad}" font-size="12" text-anchor="end" font-family="Arial">100%</text>
<text x="{tick_x}" y="{axis_y}" font-size="12" text-anchor="end" font-family="Arial">0%</text>
</svg>
"##,
        axis_y = h - pad,
        right = w - pad,
        label_y = h - pad + 24,
        tick_x = pad - 8,
    )
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::super::tests::{market, series};
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn renders_polyline_with_one_pair_per_point() {
        let s = series(vec![(0, 0.4), (10, 0.5), (20, 0.6)]);
        let svg = render_svg("Lakers", &s.points);
        assert!(svg.contains("<polyline"));
        let points_attr = svg
            .split("points=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        assert_eq!(points_attr.split_whitespace().count(), 3);
    }

    #[test]
    fn escapes_markup_in_title() {
        let s = series(vec![(0, 0.5)]);
        let svg = render_svg("Lakers <&> \"5\"", &s.points);
        assert!(svg.contains("Lakers &lt;&amp;&gt; &quot;5&quot;"));
        assert!(!svg.contains("<&>"));
    }

    #[test]
    fn writer_skips_empty_series() {
        let dir = TempDir::new().unwrap();
        let result = SvgWriter.write(&market(), &series(vec![]), dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn writer_emits_svg_file() {
        let dir = TempDir::new().unwrap();
        let path = SvgWriter
            .write(&market(), &series(vec![(0, 0.4), (10, 0.6)]), dir.path())
            .unwrap()
            .unwrap();
        assert_eq!(path.extension().unwrap(), "svg");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<svg"));
        assert!(content.contains("Will the Lakers win Game 5?"));
    }
}
