//! Chart rendering.
//!
//! [`ChartRenderer`] is the seam between the pipeline and whatever draws the
//! charts. [`PlottersRenderer`] draws with `plotters` into an RGB buffer and
//! encodes it as PNG.

use crate::config::ChartOptions;
use crate::data::Dataset;
use crate::error::RenderError;
use crate::plan::{PlotKind, PlotRequest};
use crate::stats;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A rendered chart on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub request: PlotRequest,
}

/// Something that can turn a plot request into an image file.
pub trait ChartRenderer {
    /// Render `request` from `dataset` into a file under `out_dir`.
    fn render(
        &self,
        request: &PlotRequest,
        dataset: &Dataset,
        out_dir: &Path,
    ) -> Result<Artifact, RenderError>;
}

/// Side length of one pairplot panel, in pixels
const PAIRPLOT_PANEL: u32 = 250;
/// Largest canvas width or height, in pixels
pub const MAX_CANVAS_SIDE: u32 = 10_000;
const KDE_POINTS: usize = 200;

const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);
const NAN_COLOR: RGBColor = RGBColor(200, 200, 200);
const PALETTE: [RGBColor; 10] = [
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

/// Renders charts with plotters and writes them as PNG files.
#[derive(Debug, Clone, Default)]
pub struct PlottersRenderer {
    options: ChartOptions,
}

impl PlottersRenderer {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }

    fn canvas_size(&self, request: &PlotRequest) -> (u32, u32) {
        match request.kind {
            PlotKind::Pairplot => {
                // Panels shrink once the grid would outgrow the canvas limit.
                let k = u32::try_from(request.columns.len().max(1)).unwrap_or(u32::MAX);
                let panel = PAIRPLOT_PANEL.min(MAX_CANVAS_SIDE / k);
                let side = panel.saturating_mul(k);
                (side, side)
            }
            _ => (self.options.width, self.options.height),
        }
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(
        &self,
        request: &PlotRequest,
        dataset: &Dataset,
        out_dir: &Path,
    ) -> Result<Artifact, RenderError> {
        let artifact = request.artifact_name.clone();
        let chart = ChartData::extract(request, dataset)?;

        let (width, height) = self.canvas_size(request);
        let png = Canvas::new(width, height)
            .and_then(|mut canvas| {
                canvas.draw(|root| chart.draw(root))?;
                canvas.render()
            })
            .map_err(|e| RenderError::Draw {
                artifact: artifact.clone(),
                reason: format!("{:#}", e),
            })?;

        let path = out_dir.join(format!("{}.png", artifact));
        fs::write(&path, png).map_err(|source| RenderError::Io {
            artifact: artifact.clone(),
            path: path.clone(),
            source,
        })?;

        debug!(artifact = %artifact, path = %path.display(), width, height, "rendered chart");
        Ok(Artifact {
            path,
            request: request.clone(),
        })
    }
}

/// Column data pulled out of the dataset for one request
#[derive(Debug, Clone, PartialEq)]
enum ChartData {
    Histogram {
        column: String,
        values: Vec<f64>,
    },
    Scatter {
        x: String,
        y: String,
        points: Vec<(f64, f64)>,
    },
    Heatmap {
        names: Vec<String>,
        matrix: Vec<Vec<Option<f64>>>,
    },
    Pairplot {
        names: Vec<String>,
        columns: Vec<Vec<Option<f64>>>,
    },
    Pie {
        column: String,
        counts: Vec<(String, usize)>,
    },
}

fn numeric_cells(
    dataset: &Dataset,
    artifact: &str,
    column: &str,
) -> Result<Vec<Option<f64>>, RenderError> {
    match dataset.numeric_column(column) {
        None => Err(RenderError::MissingColumn {
            artifact: artifact.to_string(),
            column: column.to_string(),
        }),
        Some(Err(value)) => Err(RenderError::NonNumeric {
            artifact: artifact.to_string(),
            column: column.to_string(),
            value,
        }),
        // NaN and infinities are treated as gaps.
        Some(Ok(cells)) => Ok(cells
            .into_iter()
            .map(|cell| cell.filter(|v| v.is_finite()))
            .collect()),
    }
}

impl ChartData {
    fn extract(request: &PlotRequest, dataset: &Dataset) -> Result<Self, RenderError> {
        let artifact = request.artifact_name.as_str();
        let no_data = || RenderError::NoData {
            artifact: artifact.to_string(),
        };
        let names: Vec<String> = request.columns.iter().map(|c| c.name.clone()).collect();

        let data = match request.kind {
            PlotKind::Histogram => {
                let column = names.first().cloned().ok_or_else(no_data)?;
                let values: Vec<f64> = numeric_cells(dataset, artifact, &column)?
                    .into_iter()
                    .flatten()
                    .collect();
                if values.is_empty() {
                    return Err(no_data());
                }
                ChartData::Histogram { column, values }
            }
            PlotKind::Scatter => {
                let [x, y] = match names.as_slice() {
                    [x, y] => [x.clone(), y.clone()],
                    _ => return Err(no_data()),
                };
                let xs = numeric_cells(dataset, artifact, &x)?;
                let ys = numeric_cells(dataset, artifact, &y)?;
                let points: Vec<(f64, f64)> = xs
                    .into_iter()
                    .zip(ys)
                    .filter_map(|(x, y)| Some((x?, y?)))
                    .collect();
                if points.is_empty() {
                    return Err(no_data());
                }
                ChartData::Scatter { x, y, points }
            }
            PlotKind::CorrelationHeatmap | PlotKind::Pairplot => {
                if names.is_empty() {
                    return Err(no_data());
                }
                let columns = names
                    .iter()
                    .map(|name| numeric_cells(dataset, artifact, name))
                    .collect::<Result<Vec<_>, _>>()?;
                if columns.iter().all(|c| c.iter().all(Option::is_none)) {
                    return Err(no_data());
                }
                if request.kind == PlotKind::Pairplot {
                    ChartData::Pairplot { names, columns }
                } else {
                    let matrix = stats::correlation_matrix(&columns);
                    ChartData::Heatmap { names, matrix }
                }
            }
            PlotKind::PieChart => {
                let column = names.first().cloned().ok_or_else(no_data)?;
                let cells = dataset.column(&column).ok_or_else(|| RenderError::MissingColumn {
                    artifact: artifact.to_string(),
                    column: column.clone(),
                })?;
                let counts = stats::value_counts(cells);
                if counts.is_empty() {
                    return Err(no_data());
                }
                ChartData::Pie { column, counts }
            }
        };

        Ok(data)
    }

    fn draw(&self, root: &Area<'_>) -> Result<()> {
        match self {
            ChartData::Histogram { column, values } => draw_histogram(
                root,
                values,
                &Panel::titled(format!("Histogram of {}", column), column, "Frequency"),
            ),
            ChartData::Scatter { x, y, points } => draw_scatter(
                root,
                points,
                &Panel::titled(format!("Scatter Plot of {} vs {}", x, y), x, y),
            ),
            ChartData::Heatmap { names, matrix } => draw_heatmap(root, names, matrix),
            ChartData::Pairplot { names, columns } => draw_pairplot(root, names, columns),
            ChartData::Pie { column, counts } => draw_pie(root, column, counts),
        }
    }
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// RGB pixel buffer that charts are drawn into
struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            anyhow::bail!(
                "Canvas size {}x{} is outside 1..={} pixels per side",
                width,
                height,
                MAX_CANVAS_SIDE
            );
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .with_context(|| format!("Canvas size {}x{} overflows", width, height))?;
        Ok(Self {
            buffer: vec![0u8; len],
            width,
            height,
        })
    }

    /// Fill with white, run `f`, then flush the drawing into the buffer
    fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&Area<'_>) -> Result<()>,
    {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;
        f(&root)?;
        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Encode the canvas as PNG
    fn render(&self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&self.buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

/// Caption and axis descriptions for one cartesian panel
struct Panel {
    caption: Option<String>,
    x_desc: String,
    y_desc: String,
    font_size: u32,
    label_area: u32,
}

impl Panel {
    fn titled(caption: String, x_desc: &str, y_desc: &str) -> Self {
        Self {
            caption: Some(caption),
            x_desc: x_desc.to_string(),
            y_desc: y_desc.to_string(),
            font_size: 14,
            label_area: 50,
        }
    }

    fn compact(x_desc: &str, y_desc: &str) -> Self {
        Self {
            caption: None,
            x_desc: x_desc.to_string(),
            y_desc: y_desc.to_string(),
            font_size: 11,
            label_area: 35,
        }
    }

    fn builder<'a, 'b>(&self, area: &'a Area<'b>) -> ChartBuilder<'a, 'b, BitMapBackend<'b>> {
        let mut builder = ChartBuilder::on(area);
        builder
            .margin(10)
            .x_label_area_size(self.label_area)
            .y_label_area_size(self.label_area + 10);
        if let Some(caption) = &self.caption {
            builder.caption(caption.as_str(), ("sans-serif", 20));
        }
        builder
    }
}

fn draw_histogram(area: &Area<'_>, values: &[f64], panel: &Panel) -> Result<()> {
    let bins = stats::histogram(values);
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Ok(());
    };
    let (lo, hi) = (first.start, last.end);
    let bin_width = first.end - first.start;

    // KDE rescaled from density to counts so it sits on top of the bars.
    let n = values.len() as f64;
    let (kde_x, kde_y) = stats::kde(values, lo, hi, KDE_POINTS);
    let kde_y: Vec<f64> = kde_y.iter().map(|d| d * n * bin_width).collect();

    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let max_kde = kde_y.iter().cloned().fold(0.0, f64::max);
    let y_max = (max_count.max(max_kde) * 1.05).max(1.0);

    let mut chart = panel
        .builder(area)
        .build_cartesian_2d(lo..hi, 0.0..y_max)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc(panel.x_desc.as_str())
        .y_desc(panel.y_desc.as_str())
        .label_style(("sans-serif", panel.font_size))
        .draw()
        .context("Failed to draw mesh")?;

    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new(
                [(b.start, 0.0), (b.end, b.count as f64)],
                BAR_COLOR.mix(0.6).filled(),
            )
        }))
        .context("Failed to draw bars")?;

    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], WHITE.stroke_width(1))
        }))
        .context("Failed to draw bar edges")?;

    if kde_x.len() > 1 {
        chart
            .draw_series(LineSeries::new(
                kde_x.into_iter().zip(kde_y),
                BAR_COLOR.stroke_width(2),
            ))
            .context("Failed to draw density curve")?;
    }

    Ok(())
}

fn draw_scatter(area: &Area<'_>, points: &[(f64, f64)], panel: &Panel) -> Result<()> {
    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let (Some((x_min, x_max)), Some((y_min, y_max))) = (stats::min_max(&xs), stats::min_max(&ys))
    else {
        return Ok(());
    };
    let (x_lo, x_hi) = stats::padded_range(x_min, x_max);
    let (y_lo, y_hi) = stats::padded_range(y_min, y_max);

    let mut chart = panel
        .builder(area)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc(panel.x_desc.as_str())
        .y_desc(panel.y_desc.as_str())
        .label_style(("sans-serif", panel.font_size))
        .draw()
        .context("Failed to draw mesh")?;

    let size = if panel.caption.is_some() { 4 } else { 2 };
    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), size, BAR_COLOR.mix(0.7).filled())),
        )
        .context("Failed to draw point series")?;

    Ok(())
}

/// Diverging blue-white-red colour for a correlation in [-1, 1]
fn coolwarm(r: f64) -> RGBColor {
    const BLUE: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const RED: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let r = r.clamp(-1.0, 1.0);
    let (from, to, t) = if r < 0.0 { (MID, BLUE, -r) } else { (MID, RED, r) };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

fn draw_heatmap(root: &Area<'_>, names: &[String], matrix: &[Vec<Option<f64>>]) -> Result<()> {
    let area = root
        .titled("Correlation Heatmap", ("sans-serif", 24))
        .context("Failed to draw title")?;
    let (width, height) = area.dim_in_pixel();
    let k = names.len().max(1) as i32;

    let left = 120;
    let bottom = 80;
    let colorbar = 90;
    let cell = ((width as i32 - left - colorbar) / k)
        .min((height as i32 - bottom - 10) / k)
        .max(1);
    let top = 10;

    let label_font = ("sans-serif", 14).into_font();
    let centered = Pos::new(HPos::Center, VPos::Center);

    for (i, row) in matrix.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            let x0 = left + j as i32 * cell;
            let y0 = top + i as i32 * cell;
            let fill = value.map(coolwarm).unwrap_or(NAN_COLOR);
            area.draw(&Rectangle::new([(x0, y0), (x0 + cell, y0 + cell)], fill.filled()))
                .context("Failed to draw cell")?;

            let (text, ink) = match value {
                Some(r) if r.abs() > 0.6 => (format!("{:.2}", r), WHITE),
                Some(r) => (format!("{:.2}", r), BLACK),
                None => ("nan".to_string(), BLACK),
            };
            area.draw(&Text::new(
                text,
                (x0 + cell / 2, y0 + cell / 2),
                label_font.color(&ink).pos(centered),
            ))
            .context("Failed to annotate cell")?;
        }
    }

    for (idx, name) in names.iter().enumerate() {
        let offset = idx as i32 * cell + cell / 2;
        area.draw(&Text::new(
            name.as_str(),
            (left - 8, top + offset),
            label_font.color(&BLACK).pos(Pos::new(HPos::Right, VPos::Center)),
        ))
        .context("Failed to draw row label")?;
        area.draw(&Text::new(
            name.as_str(),
            (left + offset, top + k * cell + 8),
            label_font.color(&BLACK).pos(Pos::new(HPos::Center, VPos::Top)),
        ))
        .context("Failed to draw column label")?;
    }

    // Colour bar from +1 (top) to -1 (bottom).
    let bar_x = left + k * cell + 20;
    let bar_h = k * cell;
    let steps = 50;
    for step in 0..steps {
        let y0 = top + bar_h * step / steps;
        let y1 = top + bar_h * (step + 1) / steps;
        let r = 1.0 - 2.0 * (step as f64 + 0.5) / steps as f64;
        area.draw(&Rectangle::new([(bar_x, y0), (bar_x + 20, y1)], coolwarm(r).filled()))
            .context("Failed to draw colour bar")?;
    }
    for (label, y) in [("1.0", top), ("0.0", top + bar_h / 2), ("-1.0", top + bar_h)] {
        area.draw(&Text::new(
            label,
            (bar_x + 26, y),
            label_font.color(&BLACK).pos(Pos::new(HPos::Left, VPos::Center)),
        ))
        .context("Failed to draw colour bar label")?;
    }

    Ok(())
}

fn draw_pairplot(root: &Area<'_>, names: &[String], columns: &[Vec<Option<f64>>]) -> Result<()> {
    let k = names.len();
    let panels = root.split_evenly((k, k));

    for (idx, area) in panels.iter().enumerate() {
        let (row, col) = (idx / k, idx % k);
        if row == col {
            let values: Vec<f64> = columns[row].iter().flatten().copied().collect();
            draw_histogram(area, &values, &Panel::compact(&names[col], "Count"))?;
        } else {
            let points: Vec<(f64, f64)> = columns[col]
                .iter()
                .zip(&columns[row])
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .collect();
            draw_scatter(area, &points, &Panel::compact(&names[col], &names[row]))?;
        }
    }

    Ok(())
}

fn draw_pie(root: &Area<'_>, column: &str, counts: &[(String, usize)]) -> Result<()> {
    let area = root
        .titled(&format!("Pie Chart of {}", column), ("sans-serif", 24))
        .context("Failed to draw title")?;
    let (width, height) = area.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = width.min(height) as f64 * 0.35;
    let total: usize = counts.iter().map(|(_, c)| c).sum();

    let label_font = ("sans-serif", 14).into_font();
    let point_at = |angle: f64, r: f64| {
        (
            (center.0 + r * angle.cos()).round() as i32,
            (center.1 - r * angle.sin()).round() as i32,
        )
    };

    // Counter-clockwise from the positive x axis.
    let mut start = 0.0f64;
    for (idx, (value, count)) in counts.iter().enumerate() {
        let fraction = *count as f64 / total as f64;
        let sweep = fraction * 2.0 * PI;
        let steps = ((sweep / 0.02).ceil() as usize).max(2);

        let mut wedge = vec![point_at(0.0, 0.0)];
        wedge.extend((0..=steps).map(|s| point_at(start + sweep * s as f64 / steps as f64, radius)));
        let color = PALETTE[idx % PALETTE.len()];
        area.draw(&Polygon::new(wedge, color.filled()))
            .context("Failed to draw wedge")?;

        let mid = start + sweep / 2.0;
        let h_pos = if mid.cos() >= 0.0 { HPos::Left } else { HPos::Right };
        area.draw(&Text::new(
            value.as_str(),
            point_at(mid, radius * 1.1),
            label_font.color(&BLACK).pos(Pos::new(h_pos, VPos::Center)),
        ))
        .context("Failed to draw wedge label")?;
        area.draw(&Text::new(
            format!("{:.1}%", fraction * 100.0),
            point_at(mid, radius * 0.6),
            label_font.color(&BLACK).pos(Pos::new(HPos::Center, VPos::Center)),
        ))
        .context("Failed to draw wedge percentage")?;

        start += sweep;
    }

    Ok(())
}
