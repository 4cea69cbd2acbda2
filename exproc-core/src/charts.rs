use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

use plotters::prelude::*;
use serde::Serialize;

use crate::consts::{DEFAULT_PLOT_HEIGHT, DEFAULT_PLOT_WIDTH, TIMESTAMP_COLUMN};
use crate::error::{Error, Result};
use crate::merge::MergedTable;

const PRIMARY_COLOR: RGBColor = RGBColor(31, 119, 180);
const SECONDARY_COLOR: RGBColor = RGBColor(214, 39, 40);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    RpsVsCpu,
    RpsVsMem,
    ResponseTimeVsCpu,
    ResponseTimeVsMem,
}

impl ChartKind {
    pub const MERGED: [ChartKind; 2] = [ChartKind::RpsVsCpu, ChartKind::RpsVsMem];
    pub const PER_REQUEST: [ChartKind; 2] =
        [ChartKind::ResponseTimeVsCpu, ChartKind::ResponseTimeVsMem];

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::RpsVsCpu => "rps_vs_cpu.png",
            ChartKind::RpsVsMem => "rps_vs_mem.png",
            ChartKind::ResponseTimeVsCpu => "response_time_vs_cpu.png",
            ChartKind::ResponseTimeVsMem => "response_time_vs_mem.png",
        }
    }

    /// Left axis.
    pub fn primary_column(self) -> &'static str {
        match self {
            ChartKind::RpsVsCpu | ChartKind::RpsVsMem => "rps_loadgen",
            ChartKind::ResponseTimeVsCpu | ChartKind::ResponseTimeVsMem => "response_time_mean",
        }
    }

    /// Right axis.
    pub fn secondary_column(self) -> &'static str {
        match self {
            ChartKind::RpsVsCpu | ChartKind::ResponseTimeVsCpu => "cpu_server",
            ChartKind::RpsVsMem | ChartKind::ResponseTimeVsMem => "mem_server",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    fn from_column(table: &MergedTable, column: &str) -> Result<Self> {
        Ok(Series {
            label: column.to_string(),
            points: table
                .column(column)?
                .into_iter()
                .map(|(ts, v)| (ts as f64, v))
                .filter(|(_, v)| v.is_finite())
                .collect(),
        })
    }

    fn y_range(&self) -> Range<f64> {
        padded_range(self.points.iter().map(|(_, y)| *y))
    }
}

/// Two metrics over time sharing the x axis, each with its own y axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DualAxisChart {
    pub kind: ChartKind,
    pub x_label: String,
    pub primary: Series,
    pub secondary: Series,
}

impl DualAxisChart {
    pub fn from_table(kind: ChartKind, table: &MergedTable) -> Result<Self> {
        Ok(DualAxisChart {
            kind,
            x_label: TIMESTAMP_COLUMN.to_string(),
            primary: Series::from_column(table, kind.primary_column())?,
            secondary: Series::from_column(table, kind.secondary_column())?,
        })
    }

    pub fn x_range(&self) -> Range<f64> {
        padded_range(
            self.primary
                .points
                .iter()
                .chain(self.secondary.points.iter())
                .map(|(x, _)| *x),
        )
    }
}

/// Min..max of the finite values, widened when empty or flat so the
/// coordinate system stays non-degenerate.
pub fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        0.0..1.0
    } else if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.05 };
        (lo - pad)..(hi + pad)
    } else {
        lo..hi
    }
}

pub trait ChartRenderer {
    fn render(&self, chart: &DualAxisChart, dest: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct PngRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for PngRenderer {
    fn default() -> Self {
        Self {
            width: DEFAULT_PLOT_WIDTH,
            height: DEFAULT_PLOT_HEIGHT,
        }
    }
}

fn chart_err<E: Display>(e: E) -> Error {
    Error::Chart(e.to_string())
}

impl ChartRenderer for PngRenderer {
    fn render(&self, chart: &DualAxisChart, dest: &Path) -> Result<()> {
        let root = BitMapBackend::new(dest, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let x_range = chart.x_range();
        let mut ctx = ChartBuilder::on(&root)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .right_y_label_area_size(60)
            .build_cartesian_2d(x_range.clone(), chart.primary.y_range())
            .map_err(chart_err)?
            .set_secondary_coord(x_range, chart.secondary.y_range());

        ctx.configure_mesh()
            .disable_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.primary.label.as_str())
            .x_label_formatter(&|x| format!("{:.0}", x))
            .axis_desc_style(("sans-serif", 14).into_font().color(&PRIMARY_COLOR))
            .label_style(("sans-serif", 12).into_font().color(&PRIMARY_COLOR))
            .draw()
            .map_err(chart_err)?;

        ctx.configure_secondary_axes()
            .y_desc(chart.secondary.label.as_str())
            .axis_desc_style(("sans-serif", 14).into_font().color(&SECONDARY_COLOR))
            .label_style(("sans-serif", 12).into_font().color(&SECONDARY_COLOR))
            .draw()
            .map_err(chart_err)?;

        ctx.draw_series(LineSeries::new(
            chart.primary.points.iter().copied(),
            PRIMARY_COLOR.stroke_width(2),
        ))
        .map_err(chart_err)?;

        ctx.draw_secondary_series(LineSeries::new(
            chart.secondary.points.iter().copied(),
            SECONDARY_COLOR.stroke_width(2),
        ))
        .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergedRow;

    fn table() -> MergedTable {
        MergedTable::new(
            vec![
                "cpu_server".to_string(),
                "mem_server".to_string(),
                "rps_loadgen".to_string(),
            ],
            vec![
                MergedRow {
                    timestamp: 10,
                    values: vec![40.0, 1024.0, 95.0],
                },
                MergedRow {
                    timestamp: 11,
                    values: vec![f64::NAN, 1030.0, 101.0],
                },
            ],
        )
    }

    #[test]
    fn rps_vs_cpu_series() {
        let chart = DualAxisChart::from_table(ChartKind::RpsVsCpu, &table()).unwrap();

        assert_eq!(chart.x_label, "timestamp");
        assert_eq!(chart.primary.label, "rps_loadgen");
        assert_eq!(chart.primary.points, vec![(10.0, 95.0), (11.0, 101.0)]);
        assert_eq!(chart.secondary.label, "cpu_server");
        assert_eq!(chart.secondary.points, vec![(10.0, 40.0)]);
        assert_eq!(chart.x_range(), 10.0..11.0);
    }

    #[test]
    fn response_time_chart_needs_aggregated_table() {
        let err = DualAxisChart::from_table(ChartKind::ResponseTimeVsMem, &table()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column, .. } if column == "response_time_mean"));
    }

    #[test]
    fn chart_files() {
        let names: Vec<&str> = ChartKind::MERGED
            .iter()
            .chain(ChartKind::PER_REQUEST.iter())
            .map(|k| k.file_name())
            .collect();
        assert_eq!(
            names,
            [
                "rps_vs_cpu.png",
                "rps_vs_mem.png",
                "response_time_vs_cpu.png",
                "response_time_vs_mem.png"
            ]
        );
        assert_eq!(ChartKind::ResponseTimeVsMem.secondary_column(), "mem_server");
    }

    #[test]
    fn png_renderer_writes_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(ChartKind::RpsVsMem.file_name());
        let chart = DualAxisChart::from_table(ChartKind::RpsVsMem, &table()).unwrap();

        PngRenderer::default().render(&chart, &dest).unwrap();

        let bytes = std::fs::read(&dest).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn ranges_never_degenerate() {
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
        assert_eq!(padded_range([0.0].into_iter()), -1.0..1.0);
        assert_eq!(padded_range([100.0, 100.0].into_iter()), 95.0..105.0);
        assert_eq!(padded_range([3.0, f64::NAN, 1.0].into_iter()), 1.0..3.0);
    }
}
