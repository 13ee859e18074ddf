#![cfg(feature = "web")]
use crate::aggregate::Bucket;
use crate::error::{DashboardError, Result};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use std::error::Error;

/// Slice and bar colours, cycled when there are more categories.
const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            title: "Chart".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            width: 800,
            height: 400,
        }
    }
}

impl GraphOptions {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn labels(mut self, x_label: &str, y_label: &str) -> Self {
        self.x_label = x_label.to_string();
        self.y_label = y_label.to_string();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Render into an in-memory SVG document.
fn render_svg(
    options: &GraphOptions,
    draw: impl FnOnce(&DrawingArea<SVGBackend, Shift>) -> std::result::Result<(), Box<dyn Error>>,
) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        let drawn = root
            .fill(&WHITE)
            .map_err(|e| Box::new(e) as Box<dyn Error>)
            .and_then(|_| draw(&root))
            .and_then(|_| root.present().map_err(|e| Box::new(e) as Box<dyn Error>));
        drawn.map_err(|e| DashboardError::Chart(e.to_string()))?;
    }
    Ok(svg)
}

/// Placeholder shown when a section has nothing to plot.
fn draw_empty(
    root: &DrawingArea<SVGBackend, Shift>,
    options: &GraphOptions,
) -> std::result::Result<(), Box<dyn Error>> {
    let titled = root.titled(&options.title, ("sans-serif", 24))?;
    let (w, h) = titled.dim_in_pixel();
    titled.draw(&Text::new(
        "No data for the current filters",
        (w as i32 / 2 - 110, h as i32 / 2),
        ("sans-serif", 18).into_font().color(&BLACK.mix(0.6)),
    ))?;
    Ok(())
}

fn value_ceiling(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}

fn value_floor(values: impl Iterator<Item = f64>) -> f64 {
    let min = values.fold(0.0_f64, f64::min);
    if min < 0.0 { min * 1.1 } else { 0.0 }
}

/// Creates a line chart with markers, one point per bucket in order
///
/// Used for the monthly payment trend: bucket labels become the X-axis
/// categories.
///
/// # Examples
/// ```
/// use sales_dashboard::aggregate::Bucket;
/// use sales_dashboard::graph::{GraphOptions, line_chart};
///
/// let points = vec![
///     Bucket { label: "2024-01".to_string(), value: 150.0 },
///     Bucket { label: "2024-02".to_string(), value: 90.0 },
/// ];
/// let svg = line_chart(&points, &GraphOptions::titled("Monthly payments"));
/// assert!(svg.map(|s| s.contains("<svg")).unwrap_or(true));
/// ```
pub fn line_chart(points: &[Bucket], options: &GraphOptions) -> Result<String> {
    render_svg(options, |root| {
        if points.is_empty() {
            return draw_empty(root, options);
        }

        let n = points.len();
        let y_min = value_floor(points.iter().map(|p| p.value));
        let y_max = value_ceiling(points.iter().map(|p| p.value));

        let mut chart = ChartBuilder::on(root)
            .caption(&options.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(90)
            .build_cartesian_2d((0..n).into_segmented(), y_min..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_labels(n.min(24))
            .x_label_formatter(&|segment| match segment {
                SegmentValue::CenterOf(i) => points
                    .get(*i)
                    .map(|p| p.label.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|v| format!("{:.0}", v))
            .draw()?;

        let series = || {
            points
                .iter()
                .enumerate()
                .map(|(i, p)| (SegmentValue::CenterOf(i), p.value))
        };
        chart.draw_series(LineSeries::new(series(), PALETTE[0].stroke_width(2)))?;
        chart.draw_series(series().map(|point| Circle::new(point, 4, PALETTE[0].filled())))?;
        Ok(())
    })
}

/// Creates a horizontal bar chart, first bucket at the top
///
/// Used for the top products ranking.
pub fn bar_chart(bars: &[Bucket], options: &GraphOptions) -> Result<String> {
    render_svg(options, |root| {
        if bars.is_empty() {
            return draw_empty(root, options);
        }

        let n = bars.len();
        let x_max = value_ceiling(bars.iter().map(|b| b.value));

        let mut chart = ChartBuilder::on(root)
            .caption(&options.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(180)
            .build_cartesian_2d(0.0..x_max, (0..n).into_segmented())?;

        // the y axis grows upwards, so bucket i is drawn in row n - 1 - i
        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .y_labels(n)
            .y_label_formatter(&|segment| match segment {
                SegmentValue::CenterOf(row) => n
                    .checked_sub(1 + *row)
                    .and_then(|i| bars.get(i))
                    .map(|b| b.label.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .x_label_formatter(&|v| format!("{:.0}", v))
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let row = n - 1 - i;
            let mut rect = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(row)),
                    (bar.value, SegmentValue::Exact(row + 1)),
                ],
                PALETTE[0].filled(),
            );
            rect.set_margin(4, 4, 0, 0);
            rect
        }))?;
        Ok(())
    })
}

/// Creates a pie chart with percentage labels
///
/// Used for the payment status distribution. Non-positive slices are skipped.
pub fn pie_chart(slices: &[Bucket], options: &GraphOptions) -> Result<String> {
    render_svg(options, |root| {
        let slices: Vec<&Bucket> = slices.iter().filter(|s| s.value > 0.0).collect();
        if slices.is_empty() {
            return draw_empty(root, options);
        }

        let titled = root.titled(&options.title, ("sans-serif", 24))?;
        let (w, h) = titled.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = (w.min(h) as f64 / 2.0 - 40.0).max(20.0);

        let sizes: Vec<f64> = slices.iter().map(|s| s.value).collect();
        let colors: Vec<RGBColor> = (0..slices.len())
            .map(|i| PALETTE[i % PALETTE.len()])
            .collect();
        let labels: Vec<String> = slices.iter().map(|s| s.label.clone()).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
        pie.percentages(("sans-serif", 14).into_font().color(&WHITE));
        titled.draw(&pie)?;
        Ok(())
    })
}
