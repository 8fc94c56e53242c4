//! Chart Plotter Module
//! Draws shaped crash views interactively using egui_plot.

use crate::charts::views::{
    month_abbrev, BarView, LineView, MapPoint, MapView, PieView, PieWedge,
};
use egui::{Align2, Color32, RichText, Stroke};
use egui_plot::{
    Bar, BarChart, GridMark, Legend, Line, MarkerShape, Plot, PlotPoint, PlotPoints, Points,
    Polygon, Text,
};

const CHART_HEIGHT: f32 = 460.0;

/// Plasma-like ramp, one colour per month.
pub const MONTH_PALETTE: [(u8, u8, u8); 12] = [
    (13, 8, 135),
    (62, 4, 156),
    (99, 0, 167),
    (135, 7, 166),
    (166, 32, 152),
    (192, 58, 131),
    (213, 84, 110),
    (231, 111, 90),
    (245, 140, 70),
    (253, 173, 50),
    (249, 208, 37),
    (240, 249, 33),
];

/// Wedge colours, cycled.
pub const CATEGORY_PALETTE: [(u8, u8, u8); 10] = [
    (52, 152, 219),  // Blue
    (231, 76, 60),   // Red
    (46, 204, 113),  // Green
    (155, 89, 182),  // Purple
    (243, 156, 18),  // Orange
    (26, 188, 156),  // Teal
    (233, 30, 99),   // Pink
    (0, 188, 212),   // Cyan
    (255, 87, 34),   // Deep Orange
    (121, 85, 72),   // Brown
];

/// Collapsed "Other" wedge.
pub const OTHER_COLOR: (u8, u8, u8) = (150, 150, 150);

/// Crash markers on the map, RGBA.
pub const MAP_POINT_COLOR: (u8, u8, u8, u8) = (160, 30, 0, 160);

/// Selected month on the line graph.
pub const HIGHLIGHT_COLOR: (u8, u8, u8) = (220, 20, 60);

fn rgb(c: (u8, u8, u8)) -> Color32 {
    Color32::from_rgb(c.0, c.1, c.2)
}

/// Palette index for a month, 1-12.
pub fn month_color_index(month: u32) -> usize {
    (month.clamp(1, 12) - 1) as usize
}

/// Colour of the wedge at `index`.
pub fn wedge_color(wedge: &PieWedge, index: usize) -> (u8, u8, u8) {
    if wedge.is_other {
        OTHER_COLOR
    } else {
        CATEGORY_PALETTE[index % CATEGORY_PALETTE.len()]
    }
}

fn month_grid(_input: egui_plot::GridInput) -> Vec<GridMark> {
    (1..=12)
        .map(|m| GridMark {
            value: m as f64,
            step_size: 1.0,
        })
        .collect()
}

/// Draws crash views with egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Monthly bars with the count written above each one.
    pub fn draw_bar_chart(ui: &mut egui::Ui, view: &BarView) {
        let max = view.max_count() as f64;

        Plot::new("monthly_bar")
            .height(CHART_HEIGHT)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_label("Month")
            .y_axis_label("Number of Crashes")
            .include_x(0.5)
            .include_x(12.5)
            .include_y(0.0)
            .include_y(max * 1.1 + 1.0)
            .x_grid_spacer(month_grid)
            .x_axis_formatter(|mark, _range| month_abbrev(mark.value.round() as u32).to_string())
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = view
                    .bars
                    .iter()
                    .map(|b| {
                        Bar::new(b.month as f64, b.count as f64)
                            .width(0.7)
                            .fill(rgb(MONTH_PALETTE[month_color_index(b.month)]))
                            .name(month_abbrev(b.month))
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars));

                for b in &view.bars {
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(b.month as f64, b.count as f64 + max * 0.02),
                            RichText::new(b.count.to_string()).size(11.0),
                        )
                        .anchor(Align2::CENTER_BOTTOM),
                    );
                }
            });
    }

    /// Crash volume line with the selected month marked in red.
    pub fn draw_line_chart(ui: &mut egui::Ui, view: &LineView, show_grid: bool) {
        let points: Vec<[f64; 2]> = view
            .points
            .iter()
            .map(|p| [p.month as f64, p.count as f64])
            .collect();

        Plot::new("monthly_line")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .show_grid(show_grid)
            .x_axis_label("Months")
            .y_axis_label("Number of Crashes")
            .include_x(0.5)
            .include_x(12.5)
            .include_y(0.0)
            .x_grid_spacer(month_grid)
            .x_axis_formatter(|mark, _range| month_abbrev(mark.value.round() as u32).to_string())
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(points.iter().copied()))
                        .color(rgb(CATEGORY_PALETTE[0]))
                        .width(2.0)
                        .name("Crashes"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(points.iter().copied()))
                        .shape(MarkerShape::Cross)
                        .radius(5.0)
                        .color(rgb(CATEGORY_PALETTE[0])),
                );
                plot_ui.points(
                    Points::new(PlotPoints::new(vec![[
                        view.selected.month as f64,
                        view.selected.count as f64,
                    ]]))
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(6.0)
                    .color(rgb(HIGHLIGHT_COLOR))
                    .name(view.caption()),
                );
            });
    }

    /// Pie drawn as polygons on an equal-aspect plot, labels outside the rim
    /// and percentages inside it.
    pub fn draw_pie_chart(ui: &mut egui::Ui, view: &PieView) {
        if view.wedges.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No category data").size(16.0));
            });
            return;
        }

        Plot::new(format!("pie_{:?}", view.field))
            .height(CHART_HEIGHT)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_scroll(false)
            .include_x(-1.6)
            .include_x(1.6)
            .include_y(-1.3)
            .include_y(1.3)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for (i, wedge) in view.wedges.iter().enumerate() {
                    let color = rgb(wedge_color(wedge, i));
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::new(wedge.outline()))
                            .fill_color(color)
                            .stroke(Stroke::new(1.0, Color32::WHITE))
                            .name(&wedge.label),
                    );

                    let [lx, ly] = wedge.anchor(1.12);
                    let anchor = if lx >= 0.0 {
                        Align2::LEFT_CENTER
                    } else {
                        Align2::RIGHT_CENTER
                    };
                    plot_ui.text(
                        Text::new(PlotPoint::new(lx, ly), RichText::new(&wedge.label).size(11.0))
                            .anchor(anchor),
                    );

                    let [px, py] = wedge.anchor(0.85);
                    plot_ui.text(Text::new(
                        PlotPoint::new(px, py),
                        RichText::new(wedge.percent_label())
                            .size(10.0)
                            .strong()
                            .color(Color32::WHITE),
                    ));
                }
            });
    }

    /// One marker per crash, framed on the centroid at the configured zoom.
    /// Hovering shows the nearest crash's timestamp and severity.
    pub fn draw_map(ui: &mut egui::Ui, view: &MapView) {
        let Some(centroid) = view.centroid else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No crash locations").size(16.0));
            });
            return;
        };

        let half_span = view.view_span_degrees() / 2.0;
        let (r, g, b, a) = MAP_POINT_COLOR;
        let points: PlotPoints = view
            .points
            .iter()
            .map(|p| [p.longitude, p.latitude])
            .collect();

        Plot::new("accident_map")
            .height(CHART_HEIGHT)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .include_x(centroid.longitude - half_span)
            .include_x(centroid.longitude + half_span)
            .include_y(centroid.latitude - half_span)
            .include_y(centroid.latitude + half_span)
            .label_formatter(move |_name, value| {
                view.nearest(value.x, value.y)
                    .map(MapPoint::tooltip)
                    .unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(points)
                        .radius(2.5)
                        .filled(true)
                        .color(Color32::from_rgba_unmultiplied(r, g, b, a))
                        .name("Crashes"),
                );
            });
    }
}
