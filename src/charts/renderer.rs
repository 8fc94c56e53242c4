//! Static Chart Renderer
//! Renders shaped crash views to PNG with plotters and writes their data
//! alongside as JSON.
//!
//! Output files are named `{view}_{YYYYmmdd_HHMMSS}.png|json` inside the
//! configured export directory.

use crate::charts::plotter::{
    month_color_index, wedge_color, CATEGORY_PALETTE, HIGHLIGHT_COLOR, MAP_POINT_COLOR,
    MONTH_PALETTE,
};
use crate::charts::views::{month_abbrev, BarView, ChartView, LineView, MapView, PieView};
use crate::config::ExportConfig;
use anyhow::{Context, Result};
use chrono::Local;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fs;
use std::path::{Path, PathBuf};

const FONT: &str = "sans-serif";

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn color(c: (u8, u8, u8)) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn month_tick(x: &f64) -> String {
    if (x - x.round()).abs() < 1e-6 {
        month_abbrev(x.round() as u32).to_string()
    } else {
        String::new()
    }
}

/// Files written by one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedChart {
    pub png: PathBuf,
    pub json: PathBuf,
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render `view` and dump its shaped data into `config.dir`.
    pub fn export(view: &ChartView, config: &ExportConfig) -> Result<ExportedChart> {
        fs::create_dir_all(&config.dir)
            .with_context(|| format!("Failed to create {}", config.dir.display()))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let exported = Self::export_paths(&config.dir, view, &timestamp);

        Self::write_json(view, &exported.json)
            .with_context(|| format!("Failed to write {}", exported.json.display()))?;
        Self::render_png(view, &exported.png, (config.width, config.height))?;

        tracing::info!(
            png = %exported.png.display(),
            json = %exported.json.display(),
            "Exported chart"
        );
        Ok(exported)
    }

    /// Output paths for `view` stamped with `timestamp`.
    pub fn export_paths(dir: &Path, view: &ChartView, timestamp: &str) -> ExportedChart {
        let stem = format!("{}_{}", view.kind().file_stem(), timestamp);
        ExportedChart {
            png: dir.join(format!("{stem}.png")),
            json: dir.join(format!("{stem}.json")),
        }
    }

    pub fn write_json(view: &ChartView, path: &Path) -> crate::error::Result<()> {
        let json = serde_json::to_string_pretty(view)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn render_png(view: &ChartView, path: &Path, size: (u32, u32)) -> Result<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        match view {
            ChartView::Bar(bar) => Self::draw_bar(&root, bar)?,
            ChartView::Line(line) => Self::draw_line(&root, line)?,
            ChartView::Pie(pie) => Self::draw_pie(&root, pie)?,
            ChartView::Map(map) => Self::draw_map(&root, map)?,
        }

        root.present()?;
        Ok(())
    }

    fn draw_bar(root: &Area, view: &BarView) -> Result<()> {
        let max = view.max_count() as f64;
        let y_max = max * 1.1 + 1.0;

        let mut chart = ChartBuilder::on(root)
            .margin(15)
            .caption("Crashes per Month", (FONT, 28))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0.5f64..12.5f64, 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(12)
            .x_label_formatter(&month_tick)
            .x_desc("Month")
            .y_desc("Number of Crashes")
            .draw()?;

        for bar in &view.bars {
            let x = bar.month as f64;
            let value = bar.count as f64;
            let fill = color(MONTH_PALETTE[month_color_index(bar.month)]);

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.35, 0.0), (x + 0.35, value)],
                fill.filled(),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                bar.count.to_string(),
                (x, value + max * 0.02),
                TextStyle::from((FONT, 14).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom)),
            )))?;
        }

        Ok(())
    }

    fn draw_line(root: &Area, view: &LineView) -> Result<()> {
        let y_max = view
            .points
            .iter()
            .map(|p| p.count)
            .max()
            .unwrap_or(0)
            .max(view.selected.count) as f64
            * 1.1
            + 1.0;
        let line_color = color(CATEGORY_PALETTE[0]);
        let highlight = color(HIGHLIGHT_COLOR);
        let points: Vec<(f64, f64)> = view
            .points
            .iter()
            .map(|p| (p.month as f64, p.count as f64))
            .collect();

        let mut chart = ChartBuilder::on(root)
            .margin(15)
            .caption(view.caption(), (FONT, 28))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0.5f64..12.5f64, 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_labels(12)
            .x_label_formatter(&month_tick)
            .x_desc("Months")
            .y_desc("Number of Crashes")
            .draw()?;

        chart.draw_series(LineSeries::new(points.iter().copied(), line_color.stroke_width(2)))?;
        chart.draw_series(
            points
                .iter()
                .map(|&p| Cross::new(p, 5, line_color.stroke_width(2))),
        )?;
        chart.draw_series(std::iter::once(Circle::new(
            (view.selected.month as f64, view.selected.count as f64),
            7,
            highlight.filled(),
        )))?;

        Ok(())
    }

    fn draw_pie(root: &Area, view: &PieView) -> Result<()> {
        let area = root.titled(&view.title, (FONT, 28))?;
        if view.wedges.is_empty() {
            return Ok(());
        }

        let (w, h) = area.dim_in_pixel();
        let center = (w as f64 * 0.42, h as f64 / 2.0);
        let radius = (w.min(h) as f64) * 0.36;
        let to_pixel = |[x, y]: [f64; 2]| -> (i32, i32) {
            (
                (center.0 + x * radius).round() as i32,
                (center.1 - y * radius).round() as i32,
            )
        };

        for (i, wedge) in view.wedges.iter().enumerate() {
            let fill = color(wedge_color(wedge, i));
            let outline: Vec<(i32, i32)> = wedge.outline().into_iter().map(to_pixel).collect();
            area.draw(&Polygon::new(outline.clone(), fill.filled()))?;
            area.draw(&PathElement::new(outline, WHITE.stroke_width(1)))?;

            let [lx, _] = wedge.anchor(1.12);
            let h_pos = if lx >= 0.0 { HPos::Left } else { HPos::Right };
            area.draw(&Text::new(
                wedge.label.clone(),
                to_pixel(wedge.anchor(1.12)),
                TextStyle::from((FONT, 14).into_font()).pos(Pos::new(h_pos, VPos::Center)),
            ))?;
            area.draw(&Text::new(
                wedge.percent_label(),
                to_pixel(wedge.anchor(0.85)),
                TextStyle::from((FONT, 12).into_font())
                    .color(&WHITE)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            ))?;
        }

        // Legend column on the right.
        let legend_x = (w as f64 * 0.78) as i32;
        for (i, wedge) in view.wedges.iter().enumerate() {
            let y = 30 + i as i32 * 22;
            area.draw(&Rectangle::new(
                [(legend_x, y), (legend_x + 14, y + 14)],
                color(wedge_color(wedge, i)).filled(),
            ))?;
            area.draw(&Text::new(
                format!("{} ({})", wedge.label, wedge.count),
                (legend_x + 20, y + 7),
                TextStyle::from((FONT, 13).into_font()).pos(Pos::new(HPos::Left, VPos::Center)),
            ))?;
        }

        Ok(())
    }

    fn draw_map(root: &Area, view: &MapView) -> Result<()> {
        let Some(extent) = view.extent() else {
            root.titled("Accident Map", (FONT, 28))?;
            return Ok(());
        };
        let pad_lon = ((extent.max_longitude - extent.min_longitude) * 0.05).max(0.01);
        let pad_lat = ((extent.max_latitude - extent.min_latitude) * 0.05).max(0.01);
        let (r, g, b, a) = MAP_POINT_COLOR;
        let marker = RGBAColor(r, g, b, a as f64 / 255.0);

        let mut chart = ChartBuilder::on(root)
            .margin(15)
            .caption("Accident Map", (FONT, 28))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(
                (extent.min_longitude - pad_lon)..(extent.max_longitude + pad_lon),
                (extent.min_latitude - pad_lat)..(extent.max_latitude + pad_lat),
            )?;

        chart
            .configure_mesh()
            .x_desc("Longitude")
            .y_desc("Latitude")
            .draw()?;

        chart.draw_series(
            view.points
                .iter()
                .map(|p| Circle::new((p.longitude, p.latitude), 2, marker.filled())),
        )?;

        if let Some(centroid) = view.centroid {
            chart.draw_series(std::iter::once(Cross::new(
                (centroid.longitude, centroid.latitude),
                6,
                BLACK.stroke_width(2),
            )))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::views::Selection;
    use crate::data::{CrashDataset, CrashRecord};
    use chrono::NaiveDate;

    fn dataset() -> CrashDataset {
        let records = [(1, 5), (3, 3), (12, 2)]
            .iter()
            .flat_map(|&(month, n)| {
                (0..n).map(move |day| {
                    let date = NaiveDate::from_ymd_opt(2017, month, day + 1)
                        .and_then(|d| d.and_hms_opt(9, 0, 0))
                        .unwrap();
                    CrashRecord::new(
                        date,
                        42.3,
                        -71.1,
                        Some("SUFFOLK".to_string()),
                        Some("Angle".to_string()),
                        None,
                    )
                })
            })
            .collect();
        CrashDataset::from_records(records)
    }

    #[test]
    fn test_export_paths_use_view_stem() {
        let view = ChartView::build(&dataset(), &Selection::default(), 11.0).unwrap();
        let paths = StaticChartRenderer::export_paths(Path::new("out"), &view, "20170101_000000");

        let stem = view.kind().file_stem();
        assert_eq!(paths.png, Path::new("out").join(format!("{stem}_20170101_000000.png")));
        assert_eq!(paths.json, Path::new("out").join(format!("{stem}_20170101_000000.json")));
    }

    #[test]
    fn test_write_json_tags_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bar.json");
        let view = ChartView::build(&dataset(), &Selection::default(), 11.0).unwrap();

        StaticChartRenderer::write_json(&view, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["view"], "bar");
        assert_eq!(value["bars"].as_array().map(Vec::len), Some(12));
        assert_eq!(value["bars"][0]["count"], 5);
        assert_eq!(value["bars"][1]["count"], 0);
    }

    #[test]
    fn test_month_tick_skips_fractions() {
        assert_eq!(month_tick(&3.0), "Mar");
        assert_eq!(month_tick(&3.5), "");
        assert_eq!(month_tick(&0.5), "");
    }
}
