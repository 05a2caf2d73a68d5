use crate::domain::model::{Operation, ResultTable, NAME, RATING, SEASON, TEAM};
use crate::domain::ports::Storage;
use crate::utils::error::ChartError;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use serde_json::Value;
use std::sync::OnceLock;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

const FONT_FAMILY: &str = "sans-serif";
static FONT: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans.ttf");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// One bar per row, labelled `"<name> (<season>)"`.
    Bar,
    /// Rating by season.
    Line,
}

impl ChartKind {
    pub fn for_operation(operation: Operation) -> Self {
        match operation {
            Operation::SeasonPitchers | Operation::SeasonTeams => ChartKind::Bar,
            Operation::Seasons => ChartKind::Line,
        }
    }
}

fn draw_error<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw {
        message: e.to_string(),
    }
}

fn ratings(table: &ResultTable) -> Result<Vec<f64>, ChartError> {
    table
        .column(RATING)
        .ok_or_else(|| draw_error("result table has no Rating column"))?
        .into_iter()
        .map(|v| v.as_f64().ok_or_else(|| draw_error(format!("non-numeric rating {}", v))))
        .collect()
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `"Gerrit Cole (2023)"` for pitchers, `"NYY (2023)"` for teams.
pub fn bar_labels(table: &ResultTable) -> Vec<String> {
    let key = table
        .column(NAME)
        .or_else(|| table.column(TEAM))
        .unwrap_or_default();
    let seasons = table.column(SEASON).unwrap_or_default();

    (0..table.len())
        .map(|i| {
            let name = key.get(i).map(|v| label_text(v)).unwrap_or_default();
            match seasons.get(i) {
                Some(season) => format!("{} ({})", name, label_text(season)),
                None => name,
            }
        })
        .collect()
}

fn axis_max(values: &[f64]) -> f64 {
    let max = values.iter().cloned().fold(0.0, f64::max);
    if max <= 0.0 {
        1.0
    } else {
        max * 1.1
    }
}

/// Chart text is drawn with the bundled font, registered once per process.
fn register_chart_font() -> Result<(), ChartError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let registered =
        *REGISTERED.get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT).is_ok());
    if registered {
        Ok(())
    } else {
        Err(draw_error("bundled chart font could not be loaded"))
    }
}

/// Renders `table` as a `WIDTH` x `HEIGHT` PNG image.
pub fn render_png(kind: ChartKind, title: &str, table: &ResultTable) -> Result<Vec<u8>, ChartError> {
    if table.is_empty() {
        return Err(ChartError::EmptyTable);
    }
    let values = ratings(table)?;
    register_chart_font()?;

    let mut pixels = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        match kind {
            ChartKind::Bar => draw_bars(&root, title, &bar_labels(table), &values)?,
            ChartKind::Line => draw_line(&root, title, &seasons(table)?, &values)?,
        }

        root.present().map_err(draw_error)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, WIDTH, HEIGHT, ColorType::Rgb8)
        .map_err(draw_error)?;
    Ok(png)
}

fn seasons(table: &ResultTable) -> Result<Vec<i32>, ChartError> {
    table
        .column(SEASON)
        .ok_or_else(|| draw_error("result table has no Season column"))?
        .into_iter()
        .map(|v| {
            v.as_i64()
                .map(|s| s as i32)
                .ok_or_else(|| draw_error(format!("non-integer season {}", v)))
        })
        .collect()
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    title: &str,
    labels: &[String],
    values: &[f64],
) -> Result<(), ChartError> {
    let n = values.len();
    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT_FAMILY, 28))
        .margin(20)
        .x_label_area_size(140)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..axis_max(values))
        .map_err(draw_error)?;

    let label_at = |x: &f64| -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_at)
        .x_label_style(
            (FONT_FAMILY, 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_desc(RATING)
        .draw()
        .map_err(draw_error)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, v)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], BLUE.mix(0.7).filled())
        }))
        .map_err(draw_error)?;

    Ok(())
}

fn draw_line<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    title: &str,
    seasons: &[i32],
    values: &[f64],
) -> Result<(), ChartError> {
    let first = seasons.iter().copied().min().unwrap_or_default();
    let last = seasons.iter().copied().max().unwrap_or_default();
    let (x_min, x_max) = if first == last {
        (first - 1, last + 1)
    } else {
        (first, last)
    };

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT_FAMILY, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0f64..axis_max(values))
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .x_desc(SEASON)
        .y_desc(RATING)
        .x_label_formatter(&|s: &i32| s.to_string())
        .draw()
        .map_err(draw_error)?;

    let points: Vec<(i32, f64)> = seasons.iter().copied().zip(values.iter().copied()).collect();

    chart
        .draw_series(LineSeries::new(points.clone(), &RED))
        .map_err(draw_error)?;
    chart
        .draw_series(points.into_iter().map(|p| Circle::new(p, 4, RED.filled())))
        .map_err(draw_error)?;

    Ok(())
}

/// Saves charts as `<operation>_<timestamp>.png` through `Storage`.
pub struct ChartRenderer<S: Storage> {
    storage: S,
}

impl<S: Storage> ChartRenderer<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn save(
        &self,
        operation: Operation,
        timestamp: &str,
        table: &ResultTable,
    ) -> Result<String, ChartError> {
        let kind = ChartKind::for_operation(operation);
        let title = match operation {
            Operation::SeasonPitchers => "Pitcher ratings",
            Operation::SeasonTeams => "Team pitcher ratings",
            Operation::Seasons => "League pitcher rating by season",
        };
        let png = render_png(kind, title, table)?;

        let file_name = format!("{}_{}.png", operation.file_stem(), timestamp);
        tracing::debug!("Writing chart {} ({} bytes)", file_name, png.len());
        self.storage.write_file(&file_name, &png).await?;

        Ok(self.storage.display_path(&file_name))
    }
}
