use crate::error::ChartError;
use crate::loader::CellValue;
use crate::range::AxisBounds;
use crate::series::Series;
use crate::viewer::ChartViewer;
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// matplotlib's tab10 palette
const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Output size of a rendered chart
///
/// The figure is laid out in inches and rasterised at `dpi`, so a higher
/// resolution keeps proportions and scales fonts and line widths with it.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
}

impl Default for ExportOptions {
    /// 12 x 8 inch figure at 300 dpi
    fn default() -> Self {
        Self {
            width_in: 12.0,
            height_in: 8.0,
            dpi: 300,
        }
    }
}

impl ExportOptions {
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi,
            ..Self::default()
        }
    }

    /// Small image refreshed after every toggle
    pub fn preview() -> Self {
        Self::with_dpi(100)
    }

    pub fn pixels(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f64).round() as u32,
            (self.height_in * self.dpi as f64).round() as u32,
        )
    }

    /// Size in pixels of a length given in typographic points
    fn px(&self, points: f64) -> u32 {
        ((points * self.dpi as f64 / 72.0).round() as u32).max(1)
    }
}

/// How x values are placed along the axis
#[derive(Clone, Debug, PartialEq)]
pub enum XScale {
    Numeric { min: f64, max: f64 },
    /// One slot per distinct value, in order of first appearance
    Categorical(Vec<String>),
}

impl XScale {
    /// Numeric when every x value is a number, categorical otherwise
    pub fn from_series(series: &[Series]) -> Self {
        let xs = || series.iter().flat_map(|s| s.points.iter().map(|(x, _)| x));

        let numbers: Option<Vec<f64>> = xs().map(CellValue::as_f64).collect();
        if let Some(numbers) = numbers.filter(|n| !n.is_empty()) {
            let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            return XScale::Numeric { min, max };
        }

        let mut categories: Vec<String> = Vec::new();
        for x in xs() {
            let label = x.to_string();
            if !categories.contains(&label) {
                categories.push(label);
            }
        }
        XScale::Categorical(categories)
    }

    pub fn position(&self, x: &CellValue) -> Option<f64> {
        match self {
            XScale::Numeric { .. } => x.as_f64(),
            XScale::Categorical(categories) => {
                let label = x.to_string();
                categories.iter().position(|c| *c == label).map(|i| i as f64)
            }
        }
    }

    pub fn extent(&self) -> (f64, f64) {
        match self {
            XScale::Numeric { min, max } if min < max => (*min, *max),
            XScale::Numeric { min, .. } => (min - 0.5, min + 0.5),
            XScale::Categorical(categories) if categories.is_empty() => (0.0, 1.0),
            XScale::Categorical(categories) => (-0.5, categories.len() as f64 - 0.5),
        }
    }

    /// Tick label for an axis position
    pub fn label_at(&self, x: f64) -> String {
        match self {
            XScale::Numeric { .. } => format!("{}", x),
            XScale::Categorical(categories) => {
                let slot = x.round();
                if (x - slot).abs() > 1e-6 || slot < 0.0 {
                    return String::new();
                }
                categories.get(slot as usize).cloned().unwrap_or_default()
            }
        }
    }
}

/// Colour of the `index`-th of `total` series, spread evenly over the palette
pub fn series_color(index: usize, total: usize) -> RGBColor {
    let t = if total <= 1 {
        0.0
    } else {
        index as f64 / (total - 1) as f64
    };
    let slot = ((t * TAB10.len() as f64) as usize).min(TAB10.len() - 1);
    TAB10[slot]
}

/// Sibling of `source` with its extension replaced by `suffix`
///
/// `data/report.xlsx` with `_chart.png` becomes `data/report_chart.png`.
pub fn derived_path(source: impl AsRef<Path>, suffix: &str) -> PathBuf {
    let source = source.as_ref();
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chart".to_string());
    source.with_file_name(format!("{}{}", stem, suffix))
}

pub fn default_export_path(source: impl AsRef<Path>) -> PathBuf {
    derived_path(source, "_chart.png")
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

/// Contiguous runs of plottable points; a missing y value breaks the line
fn line_runs(series: &Series, scale: &XScale) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (x, y) in &series.points {
        match (scale.position(x), y) {
            (Some(x), Some(y)) => current.push((x, *y)),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Draw the visible series of `viewer` onto a drawing area
pub fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    viewer: &ChartViewer,
    options: &ExportOptions,
) -> Result<(), ChartError> {
    root.fill(&WHITE).map_err(draw_err)?;

    let scale = XScale::from_series(viewer.series());
    let (x_min, x_max) = scale.extent();
    let y = viewer
        .axis()
        .bounds
        .unwrap_or(AxisBounds { min: 0.0, max: 1.0 });

    let mut chart = ChartBuilder::on(root)
        .caption(viewer.title(), ("sans-serif", options.px(14.0) as f64).into_font())
        .margin(options.px(10.0))
        .x_label_area_size(options.px(36.0))
        .y_label_area_size(options.px(54.0))
        .build_cartesian_2d(x_min..x_max, y.min..y.max)
        .map_err(draw_err)?;

    let label_at = |x: &f64| scale.label_at(*x);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(viewer.x_label())
        .y_desc(viewer.axis().label.as_str())
        .label_style(("sans-serif", options.px(9.0) as f64).into_font())
        .axis_desc_style(("sans-serif", options.px(12.0) as f64).into_font())
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.3));
    if let XScale::Categorical(categories) = &scale {
        mesh.x_labels(categories.len().max(1));
    }
    mesh.x_label_formatter(&label_at).draw().map_err(draw_err)?;

    let total = viewer.series().len();
    let stroke = options.px(1.5);
    let swatch = options.px(14.0) as i32;
    let mut labelled = false;
    for (index, series) in viewer.series().iter().enumerate() {
        if !series.visible {
            continue;
        }
        let color = series_color(index, total);
        for (run_index, run) in line_runs(series, &scale).into_iter().enumerate() {
            let drawn = chart
                .draw_series(LineSeries::new(run, color.stroke_width(stroke)))
                .map_err(draw_err)?;
            if run_index == 0 {
                drawn.label(series.key.label()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + swatch, y)], color.stroke_width(stroke))
                });
                labelled = true;
            }
        }
    }

    if labelled {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", options.px(9.0) as f64).into_font())
            .draw()
            .map_err(draw_err)?;
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Write the chart as a PNG image
///
/// Missing parent directories are created. The image shows only the series
/// currently visible in `viewer`, on its current y axis.
///
/// # Arguments
/// * `viewer` - Chart state to draw
/// * `path` - Output file
/// * `options` - Figure size in inches and resolution in dots per inch
///
/// # Returns
/// * `Result<(), ChartError>` - `ChartError::Draw` when plotting fails
///
/// # Examples
/// ```no_run
/// use swreq::graph::{ExportOptions, export_chart};
/// use swreq::loader::load_table;
/// use swreq::series::ChartLayout;
/// use swreq::viewer::ChartViewer;
///
/// let table = load_table("usage.xlsx", "Sheet2").unwrap();
/// let viewer = ChartViewer::from_table(&table, &ChartLayout::default());
/// if let Err(e) = export_chart(&viewer, "usage_chart.png", &ExportOptions::with_dpi(150)) {
///     eprintln!("Error exporting chart: {}", e);
/// }
/// ```
pub fn export_chart(
    viewer: &ChartViewer,
    path: impl AsRef<Path>,
    options: &ExportOptions,
) -> Result<(), ChartError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    {
        let root = BitMapBackend::new(path, options.pixels()).into_drawing_area();
        draw_chart(&root, viewer, options)?;
    }
    info!("Chart saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::tests::sample_table;
    use crate::series::{ChartLayout, SeriesKey};

    fn series(points: Vec<(CellValue, Option<f64>)>) -> Series {
        Series {
            key: SeriesKey {
                group: "g".into(),
                column: "c".into(),
            },
            points,
            visible: true,
        }
    }

    #[test]
    fn pixel_size_follows_dpi() {
        assert_eq!(ExportOptions::default().pixels(), (3600, 2400));
        assert_eq!(ExportOptions::preview().pixels(), (1200, 800));
        assert_eq!(ExportOptions::with_dpi(72).px(10.0), 10);
    }

    #[test]
    fn text_x_values_are_categorical_in_first_seen_order() {
        let set = crate::series::build_series(&sample_table(), &ChartLayout::default());
        let scale = XScale::from_series(&set.series);
        assert_eq!(
            scale,
            XScale::Categorical(vec!["Jan".into(), "Feb".into(), "Mar".into()])
        );
        assert_eq!(scale.position(&CellValue::Text("Feb".into())), Some(1.0));
        assert_eq!(scale.extent(), (-0.5, 2.5));
        assert_eq!(scale.label_at(2.0), "Mar");
        assert_eq!(scale.label_at(1.5), "");
    }

    #[test]
    fn numeric_x_values_use_a_numeric_axis() {
        let s = series(vec![
            (CellValue::Int(3), Some(1.0)),
            (CellValue::Float(1.5), Some(2.0)),
        ]);
        let scale = XScale::from_series(&[s]);
        assert_eq!(scale, XScale::Numeric { min: 1.5, max: 3.0 });
        assert_eq!(scale.position(&CellValue::Int(3)), Some(3.0));

        let single = XScale::Numeric { min: 4.0, max: 4.0 };
        assert_eq!(single.extent(), (3.5, 4.5));
    }

    #[test]
    fn missing_values_split_the_line() {
        let s = series(vec![
            (CellValue::Int(1), Some(1.0)),
            (CellValue::Int(2), None),
            (CellValue::Int(3), Some(3.0)),
            (CellValue::Int(4), Some(4.0)),
        ]);
        let scale = XScale::from_series(std::slice::from_ref(&s));
        assert_eq!(
            line_runs(&s, &scale),
            vec![vec![(1.0, 1.0)], vec![(3.0, 3.0), (4.0, 4.0)]]
        );
    }

    #[test]
    fn colours_spread_over_palette() {
        assert_eq!(series_color(0, 1), TAB10[0]);
        assert_eq!(series_color(0, 12), TAB10[0]);
        assert_eq!(series_color(11, 12), TAB10[9]);
        assert_eq!(series_color(1, 2), TAB10[9]);
        assert_eq!(series_color(5, 11), TAB10[5]);
    }

    #[test]
    fn export_path_replaces_extension() {
        assert_eq!(
            default_export_path("data/report.xlsx"),
            PathBuf::from("data/report_chart.png")
        );
        assert_eq!(
            default_export_path("report.xls"),
            PathBuf::from("report_chart.png")
        );
        assert_eq!(
            derived_path("a/b.csv", "_preview.png"),
            PathBuf::from("a/b_preview.png")
        );
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn writes_png_at_requested_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/chart.png");
        let viewer = ChartViewer::from_table(&sample_table(), &ChartLayout::default());

        export_chart(&viewer, &path, &ExportOptions::with_dpi(50)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let width = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
        let height = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
        assert_eq!((width, height), (600, 400));
    }
}
