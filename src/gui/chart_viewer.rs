//! Chart Viewer Widget
//! Central panel showing the selected view with its caption and a short
//! commentary line.

use crate::charts::{month_name, BarView, ChartPlotter, ChartView, LineView, MapView, PieView};
use crate::stats::OTHER_THRESHOLD_PERCENT;
use egui::{Color32, RichText, ScrollArea};

const TITLE: &str = "Vehicle Crash Data in MA throughout 2017";

/// Central chart display.
pub struct ChartViewer {
    pub show_grid: bool,
}

impl ChartViewer {
    pub fn new(show_grid: bool) -> Self {
        Self { show_grid }
    }

    /// Draw `view`, or a placeholder when nothing could be built.
    pub fn show(&self, ui: &mut egui::Ui, view: Option<&ChartView>) {
        ui.label(RichText::new(TITLE).size(24.0).strong());
        ui.add_space(10.0);

        let Some(view) = view else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Frame::none()
                    .rounding(8.0)
                    .fill(ui.visuals().widgets.noninteractive.bg_fill)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(view_heading(view)).size(18.0).strong());
                        ui.add_space(8.0);

                        match view {
                            ChartView::Bar(bar) => ChartPlotter::draw_bar_chart(ui, bar),
                            ChartView::Line(line) => {
                                ChartPlotter::draw_line_chart(ui, line, self.show_grid)
                            }
                            ChartView::Pie(pie) => ChartPlotter::draw_pie_chart(ui, pie),
                            ChartView::Map(map) => ChartPlotter::draw_map(ui, map),
                        }
                    });

                ui.add_space(10.0);
                ui.label(
                    RichText::new(commentary(view))
                        .size(13.0)
                        .color(Color32::LIGHT_GRAY),
                );
            });
    }
}

fn view_heading(view: &ChartView) -> String {
    match view {
        ChartView::Bar(_) => "Crashes per Month".to_string(),
        ChartView::Line(line) => line.caption(),
        ChartView::Pie(pie) => pie.title.clone(),
        ChartView::Map(_) => "Accident Map".to_string(),
    }
}

const BAR_NOTE: &str = "Each bar is one month's crash total.";
const LINE_NOTE: &str =
    "The line follows crash volume month by month; the red marker is the selected month.";
const PIE_NOTE: &str = "Each wedge is one category's share of all crashes.";
const MAP_NOTE: &str = "Each red dot is one crash.";

/// Fixed note for the view followed by what the loaded data shows.
pub fn commentary(view: &ChartView) -> String {
    let (note, detail) = match view {
        ChartView::Bar(bar) => (BAR_NOTE, bar_commentary(bar)),
        ChartView::Line(line) => (LINE_NOTE, line_commentary(line)),
        ChartView::Pie(pie) => (PIE_NOTE, pie_commentary(pie)),
        ChartView::Map(map) => (MAP_NOTE, map_commentary(map)),
    };
    format!("{note} {detail}")
}

fn bar_commentary(view: &BarView) -> String {
    let busiest = view.bars.iter().max_by(|a, b| {
        a.count.cmp(&b.count).then(b.month.cmp(&a.month))
    });
    match busiest {
        Some(top) if top.count > 0 => format!(
            "{} had the highest crash total with {} crashes. \
             Months without crashes are drawn at zero.",
            month_name(top.month).unwrap_or("?"),
            top.count
        ),
        _ => "No crashes were recorded.".to_string(),
    }
}

/// Month-over-month changes are taken across the full year, with months
/// that have no crashes counted as zero.
fn line_commentary(view: &LineView) -> String {
    let mut year = [0i64; 12];
    for p in view.points.iter().filter(|p| (1..=12).contains(&p.month)) {
        year[p.month as usize - 1] = p.count as i64;
    }
    let sharpest = year
        .windows(2)
        .zip(2u32..)
        .map(|(w, month)| (month, w[1] - w[0]))
        .filter(|&(_, delta)| delta > 0)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)));

    let mut text = match sharpest {
        Some((month, delta)) => format!(
            "The sharpest increase was into {} (+{} crashes).",
            month_name(month).unwrap_or("?"),
            delta
        ),
        None => "Crash volume never rose from one month to the next.".to_string(),
    };
    if !view.selected_present {
        text.push_str(" The selected month has no recorded crashes.");
    }
    text
}

fn pie_commentary(view: &PieView) -> String {
    let leader = view.wedges.iter().find(|w| !w.is_other);
    let mut text = match leader {
        Some(top) => format!(
            "{} is leading with {} of total crashes.",
            top.label,
            top.percent_label()
        ),
        None => "No category data.".to_string(),
    };
    if let Some(other) = view.wedges.iter().find(|w| w.is_other) {
        text.push_str(&format!(
            " Categories under {}% are grouped into Other ({}).",
            OTHER_THRESHOLD_PERCENT,
            other.percent_label()
        ));
    }
    text
}

fn map_commentary(view: &MapView) -> String {
    match view.centroid {
        Some(c) => format!(
            "{} crashes plotted, centred on {:.3}, {:.3}. \
             Hover a dot for its time and severity.",
            view.points.len(),
            c.latitude,
            c.longitude
        ),
        None => "No crash locations to plot.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{MonthPoint, PieWedge};

    fn point(month: u32, count: usize) -> MonthPoint {
        MonthPoint { month, count }
    }

    fn wedge(label: &str, percent: f64, is_other: bool) -> PieWedge {
        PieWedge {
            label: label.to_string(),
            count: percent as usize,
            percent,
            start_angle: 0.0,
            end_angle: percent * 3.6,
            exploded: is_other,
            is_other,
        }
    }

    #[test]
    fn test_bar_commentary_names_busiest_month() {
        let view = BarView {
            bars: vec![point(1, 5), point(2, 0), point(10, 9), point(12, 9)],
        };
        let text = commentary(&ChartView::Bar(view));
        assert!(text.starts_with(BAR_NOTE));
        assert!(text.contains("October had the highest crash total with 9"));
    }

    #[test]
    fn test_bar_commentary_empty() {
        let view = BarView {
            bars: (1..=12).map(|m| point(m, 0)).collect(),
        };
        assert!(commentary(&ChartView::Bar(view)).ends_with("No crashes were recorded."));
    }

    #[test]
    fn test_line_commentary_sharpest_increase() {
        let view = LineView {
            points: vec![point(1, 5), point(3, 3), point(10, 8), point(12, 10)],
            selected: point(2, 0),
            selected_present: false,
        };
        let text = commentary(&ChartView::Line(view));
        assert!(text.contains("The sharpest increase was into December (+10 crashes)."));
        assert!(text.ends_with("The selected month has no recorded crashes."));
    }

    #[test]
    fn test_line_commentary_counts_gap_months_as_zero() {
        // March sits at 0 between February and April
        let view = LineView {
            points: vec![point(1, 5), point(2, 4), point(4, 6)],
            selected: point(4, 6),
            selected_present: true,
        };
        let text = commentary(&ChartView::Line(view));
        assert!(text.contains("The sharpest increase was into April (+6 crashes)."));
        assert!(!text.contains("no recorded crashes"));
    }

    #[test]
    fn test_line_commentary_single_month_rises_from_zero() {
        let view = LineView {
            points: vec![point(7, 3)],
            selected: point(7, 3),
            selected_present: true,
        };
        assert!(commentary(&ChartView::Line(view))
            .contains("The sharpest increase was into July (+3 crashes)."));
    }

    #[test]
    fn test_line_commentary_without_points() {
        let view = LineView {
            points: Vec::new(),
            selected: point(1, 0),
            selected_present: false,
        };
        let text = commentary(&ChartView::Line(view));
        assert!(text.contains("Crash volume never rose from one month to the next."));
    }

    #[test]
    fn test_pie_commentary_mentions_other() {
        let view = PieView {
            field: crate::data::CategoryField::County,
            title: "Accidents by County".to_string(),
            wedges: vec![wedge("MIDDLESEX", 60.0, false), wedge("Other", 2.0, true)],
            total: 62,
        };
        let text = commentary(&ChartView::Pie(view));
        assert!(text.contains("MIDDLESEX is leading with 60.0%"));
        assert!(text.contains("Other (2.0%)"));
    }

    #[test]
    fn test_map_commentary_without_points() {
        let view = MapView {
            centroid: None,
            points: Vec::new(),
            zoom: 11.0,
        };
        assert_eq!(
            commentary(&ChartView::Map(view)),
            format!("{MAP_NOTE} No crash locations to plot.")
        );
    }
}
