use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::ir::ChartPoint;
use crate::present::display_price;
use crate::OutputFormat;

const BAR_COLOR: RGBColor = RGBColor(218, 165, 32);

/// Horizontal bar chart; the first point is drawn as the topmost bar.
pub struct BarChart {
    width: u32,
    height: u32,
    title: String,
    points: Vec<ChartPoint>,
    x_max: f64,
}

impl BarChart {
    pub fn new(width: u32, height: u32, title: String, points: Vec<ChartPoint>) -> Result<Self> {
        if points.is_empty() {
            anyhow::bail!("Cannot create bar chart with no data");
        }

        let max_value = points
            .iter()
            .map(|p| p.value)
            .fold(f64::NEG_INFINITY, f64::max);

        // Bars start at zero; leave headroom for the value labels
        let x_max = if max_value > 0.0 { max_value * 1.05 } else { 1.0 };

        Ok(BarChart {
            width,
            height,
            title,
            points,
            x_max,
        })
    }

    /// Finalize and encode the chart
    pub fn render(&self, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Png => self.render_png(),
            OutputFormat::Svg => self.render_svg(),
        }
    }

    fn render_png(&self) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; (self.width * self.height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root)?;
            root.present().context("Failed to present drawing")?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }

    fn render_svg(&self) -> Result<Vec<u8>> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root)?;
            root.present().context("Failed to present drawing")?;
        }
        Ok(svg.into_bytes())
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        root.fill(&WHITE)
            .map_err(|e| anyhow!("Failed to fill background: {}", e))?;

        let n = self.points.len() as i32;

        let mut chart = ChartBuilder::on(root)
            .margin(10)
            .caption(&self.title, ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(110)
            .build_cartesian_2d(0.0..self.x_max, (0..n).into_segmented())
            .map_err(|e| anyhow!("Failed to build chart: {}", e))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(self.points.len())
            .y_label_formatter(&|v| match v {
                SegmentValue::CenterOf(pos) => self
                    .point_at(*pos)
                    .map(|p| p.label.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc("만원")
            .draw()
            .map_err(|e| anyhow!("Failed to draw mesh: {}", e))?;

        let style = BAR_COLOR.filled();
        chart
            .draw_series(self.points.iter().enumerate().map(|(idx, point)| {
                let pos = self.position_of(idx);
                let mut bar = Rectangle::new(
                    [
                        (0.0, SegmentValue::Exact(pos)),
                        (point.value, SegmentValue::Exact(pos + 1)),
                    ],
                    style,
                );
                bar.set_margin(4, 4, 0, 0);
                bar
            }))
            .map_err(|e| anyhow!("Failed to draw bars: {}", e))?;

        chart
            .draw_series(self.points.iter().enumerate().map(|(idx, point)| {
                Text::new(
                    display_price(point.value).to_string(),
                    (point.value, SegmentValue::CenterOf(self.position_of(idx))),
                    ("sans-serif", 14).into_font(),
                )
            }))
            .map_err(|e| anyhow!("Failed to draw value labels: {}", e))?;

        Ok(())
    }

    /// Segment holding the idx-th point; segment 0 is the bottom of the axis.
    fn position_of(&self, idx: usize) -> i32 {
        (self.points.len() - 1 - idx) as i32
    }

    fn point_at(&self, pos: i32) -> Option<&ChartPoint> {
        let pos = usize::try_from(pos).ok()?;
        let idx = self.points.len().checked_sub(pos + 1)?;
        self.points.get(idx)
    }
}
