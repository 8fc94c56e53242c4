//! Chart Views Module
//! Shapes aggregated crash data into the structures each chart draws from.
//! Drawing itself lives in the plotter (interactive) and renderer (PNG).

use crate::data::{CategoryField, CrashDataset};
use crate::error::{Error, Result};
use crate::stats::{CategoryKey, CrashAggregator, OTHER_THRESHOLD_PERCENT};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Pie wedges start at 12 o'clock and run counter-clockwise.
pub const PIE_START_ANGLE: f64 = 90.0;

/// Radial offset of exploded wedges, as a fraction of the radius.
pub const EXPLODE_FRACTION: f64 = 0.1;

/// Arc resolution for wedge outlines, in degrees.
const ARC_STEP_DEGREES: f64 = 2.0;

/// Full month name for 1-12.
pub fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
}

/// Three-letter month label for axis ticks.
pub fn month_abbrev(month: u32) -> &'static str {
    month_name(month).map(|m| &m[..3]).unwrap_or("")
}

fn validate_month(month: u32) -> Result<u32> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(Error::SelectionOutOfRange { month })
    }
}

/// A (month, crash count) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthPoint {
    pub month: u32,
    pub count: usize,
}

/// Crash volume across the year with one month highlighted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
    /// One point per month that has crashes.
    pub points: Vec<MonthPoint>,
    pub selected: MonthPoint,
    /// False when the selected month has no crash records.
    pub selected_present: bool,
}

impl LineView {
    /// Build the line graph for `selected_month`.
    ///
    /// A month with no records is reported as zero crashes. A value outside
    /// 1-12 is an error.
    pub fn build(dataset: &CrashDataset, selected_month: u32) -> Result<Self> {
        let month = validate_month(selected_month)?;
        let monthly = CrashAggregator::monthly_counts(dataset);

        let (count, selected_present) = match monthly.count_for(month) {
            Ok(count) => (count, true),
            Err(Error::SelectionOutOfRange { month }) => {
                debug!("No crashes recorded for month {}, reporting zero", month);
                (0, false)
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            points: monthly
                .iter()
                .map(|(month, count)| MonthPoint { month, count })
                .collect(),
            selected: MonthPoint { month, count },
            selected_present,
        })
    }

    /// Caption such as "Total crashes in March: 812".
    pub fn caption(&self) -> String {
        format!(
            "Total crashes in {}: {}",
            month_name(self.selected.month).unwrap_or("?"),
            self.selected.count
        )
    }
}

/// Twelve monthly bars, zero-height where a month has no crashes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarView {
    pub bars: Vec<MonthPoint>,
}

impl BarView {
    pub fn build(dataset: &CrashDataset) -> Self {
        let monthly = CrashAggregator::monthly_counts(dataset);
        Self {
            bars: (1..=12)
                .map(|month| MonthPoint {
                    month,
                    count: monthly.get(month).unwrap_or(0),
                })
                .collect(),
        }
    }

    pub fn max_count(&self) -> usize {
        self.bars.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

/// One labelled wedge of a pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieWedge {
    pub label: String,
    pub count: usize,
    pub percent: f64,
    /// Degrees, counter-clockwise from the positive x axis.
    pub start_angle: f64,
    pub end_angle: f64,
    /// Drawn pulled away from the centre for visibility.
    pub exploded: bool,
    pub is_other: bool,
}

impl PieWedge {
    pub fn mid_angle(&self) -> f64 {
        (self.start_angle + self.end_angle) / 2.0
    }

    /// "12.3%"
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.percent)
    }

    /// Point on the wedge bisector at `fraction` of a unit radius, including
    /// any explode offset. The pie centre is the origin.
    pub fn anchor(&self, fraction: f64) -> [f64; 2] {
        let [ox, oy] = self.explode_offset();
        let theta = self.mid_angle().to_radians();
        [ox + fraction * theta.cos(), oy + fraction * theta.sin()]
    }

    /// Closed outline of the wedge on a unit-radius pie centred at the origin.
    pub fn outline(&self) -> Vec<[f64; 2]> {
        let [ox, oy] = self.explode_offset();
        let sweep = self.end_angle - self.start_angle;
        let steps = ((sweep / ARC_STEP_DEGREES).ceil() as usize).max(1);

        let mut points = Vec::with_capacity(steps + 2);
        points.push([ox, oy]);
        for i in 0..=steps {
            let theta = (self.start_angle + sweep * i as f64 / steps as f64).to_radians();
            points.push([ox + theta.cos(), oy + theta.sin()]);
        }
        points
    }

    fn explode_offset(&self) -> [f64; 2] {
        if !self.exploded {
            return [0.0, 0.0];
        }
        let theta = self.mid_angle().to_radians();
        [EXPLODE_FRACTION * theta.cos(), EXPLODE_FRACTION * theta.sin()]
    }
}

/// Share of crashes per county or collision type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieView {
    pub field: CategoryField,
    pub title: String,
    pub wedges: Vec<PieWedge>,
    pub total: usize,
}

impl PieView {
    pub fn build(dataset: &CrashDataset, field: CategoryField) -> Self {
        let counts = CrashAggregator::category_counts(dataset, field);

        let mut angle = PIE_START_ANGLE;
        let wedges = counts
            .buckets
            .iter()
            .map(|bucket| {
                let sweep = 360.0 * bucket.percent / 100.0;
                let wedge = PieWedge {
                    label: bucket.key.label().to_string(),
                    count: bucket.count,
                    percent: bucket.percent,
                    start_angle: angle,
                    end_angle: angle + sweep,
                    exploded: bucket.percent < OTHER_THRESHOLD_PERCENT,
                    is_other: bucket.key == CategoryKey::Other,
                };
                angle += sweep;
                wedge
            })
            .collect();

        debug!(
            ?field,
            categories = counts.buckets.len(),
            collapsed = counts.collapsed.len(),
            other = counts.other().map(|b| b.count),
            "Built pie view"
        );

        Self {
            field,
            title: field.title().to_string(),
            wedges,
            total: counts.total,
        }
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One crash on the map with its tooltip data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub crash_date: NaiveDateTime,
    pub severity: Option<String>,
}

impl MapPoint {
    /// Hover text: timestamp on one line, severity on the next.
    pub fn tooltip(&self) -> String {
        format!(
            "{}\n{}",
            self.crash_date.format("%Y-%m-%d %H:%M"),
            self.severity.as_deref().unwrap_or("Unknown severity")
        )
    }
}

/// Bounding box of the plotted points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoExtent {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

/// Every crash as a point, framed on the dataset centroid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// Mean position; `None` for an empty dataset.
    pub centroid: Option<GeoPoint>,
    pub points: Vec<MapPoint>,
    /// Initial zoom in web-map levels.
    pub zoom: f64,
}

impl MapView {
    pub fn build(dataset: &CrashDataset, zoom: f64) -> Self {
        let centroid = (!dataset.is_empty()).then(|| GeoPoint {
            latitude: mean(dataset.iter().map(|r| r.latitude)),
            longitude: mean(dataset.iter().map(|r| r.longitude)),
        });

        Self {
            centroid,
            points: dataset
                .records()
                .iter()
                .map(|r| MapPoint {
                    latitude: r.latitude,
                    longitude: r.longitude,
                    crash_date: r.crash_date,
                    severity: r.severity.clone(),
                })
                .collect(),
            zoom,
        }
    }

    /// Degrees of longitude visible at the configured zoom (360 / 2^zoom).
    pub fn view_span_degrees(&self) -> f64 {
        360.0 / 2f64.powf(self.zoom)
    }

    pub fn extent(&self) -> Option<GeoExtent> {
        let first = self.points.first()?;
        let init = GeoExtent {
            min_latitude: first.latitude,
            max_latitude: first.latitude,
            min_longitude: first.longitude,
            max_longitude: first.longitude,
        };
        Some(self.points.iter().fold(init, |e, p| GeoExtent {
            min_latitude: e.min_latitude.min(p.latitude),
            max_latitude: e.max_latitude.max(p.latitude),
            min_longitude: e.min_longitude.min(p.longitude),
            max_longitude: e.max_longitude.max(p.longitude),
        }))
    }

    /// Point closest to (`longitude`, `latitude`) in plain degree space.
    pub fn nearest(&self, longitude: f64, latitude: f64) -> Option<&MapPoint> {
        self.points.iter().min_by(|a, b| {
            let da = (a.longitude - longitude).powi(2) + (a.latitude - latitude).powi(2);
            let db = (b.longitude - longitude).powi(2) + (b.latitude - latitude).powi(2);
            da.total_cmp(&db)
        })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    use statrs::statistics::Statistics;
    values.collect::<Vec<f64>>().mean()
}

/// The four dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ViewKind {
    #[default]
    Bar,
    Pie,
    Line,
    Map,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [ViewKind::Bar, ViewKind::Pie, ViewKind::Line, ViewKind::Map];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bar => "Bar Plot",
            Self::Pie => "Pie Chart",
            Self::Line => "Line Graph",
            Self::Map => "Accident Map",
        }
    }

    /// File-name stem for exports.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Bar => "monthly_bar",
            Self::Pie => "category_pie",
            Self::Line => "monthly_line",
            Self::Map => "accident_map",
        }
    }
}

/// What the user has picked in the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Selection {
    pub view: ViewKind,
    /// 1-12, used by the line graph.
    pub month: u32,
    pub pie_field: CategoryField,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            view: ViewKind::default(),
            month: 1,
            pie_field: CategoryField::default(),
        }
    }
}

/// A shaped view ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ChartView {
    Line(LineView),
    Bar(BarView),
    Pie(PieView),
    Map(MapView),
}

impl ChartView {
    /// Run the view selected in `selection` against the session dataset.
    pub fn build(dataset: &CrashDataset, selection: &Selection, map_zoom: f64) -> Result<Self> {
        Ok(match selection.view {
            ViewKind::Line => Self::Line(LineView::build(dataset, selection.month)?),
            ViewKind::Bar => Self::Bar(BarView::build(dataset)),
            ViewKind::Pie => Self::Pie(PieView::build(dataset, selection.pie_field)),
            ViewKind::Map => Self::Map(MapView::build(dataset, map_zoom)),
        })
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            Self::Line(_) => ViewKind::Line,
            Self::Bar(_) => ViewKind::Bar,
            Self::Pie(_) => ViewKind::Pie,
            Self::Map(_) => ViewKind::Map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CrashRecord;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::NaiveDate;

    fn record(month: u32, lat: f64, lon: f64, county: &str) -> CrashRecord {
        let date = NaiveDate::from_ymd_opt(2017, month, 9)
            .and_then(|d| d.and_hms_opt(7, 15, 0))
            .unwrap();
        CrashRecord::new(
            date,
            lat,
            lon,
            Some(county.to_string()),
            Some("Single vehicle crash".to_string()),
            Some("Non-fatal injury".to_string()),
        )
    }

    fn months_dataset(counts: &[(u32, usize)]) -> CrashDataset {
        let records = counts
            .iter()
            .flat_map(|&(month, n)| (0..n).map(move |_| record(month, 42.0, -71.0, "SUFFOLK")))
            .collect();
        CrashDataset::from_records(records)
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
        assert_eq!(month_abbrev(9), "Sep");
        assert_eq!(month_abbrev(0), "");
    }

    #[test]
    fn test_line_view_present_month() {
        let dataset = months_dataset(&[(1, 5), (3, 3), (12, 2)]);
        let view = LineView::build(&dataset, 3).unwrap();

        assert_eq!(
            view.points,
            vec![
                MonthPoint { month: 1, count: 5 },
                MonthPoint { month: 3, count: 3 },
                MonthPoint { month: 12, count: 2 },
            ]
        );
        assert_eq!(view.selected, MonthPoint { month: 3, count: 3 });
        assert!(view.selected_present);
        assert_eq!(view.caption(), "Total crashes in March: 3");
    }

    #[test]
    fn test_line_view_absent_month_reports_zero() {
        let dataset = months_dataset(&[(1, 5), (3, 3), (12, 2)]);
        let view = LineView::build(&dataset, 2).unwrap();

        assert_eq!(view.selected, MonthPoint { month: 2, count: 0 });
        assert!(!view.selected_present);
        assert_eq!(view.points.len(), 3);
        assert_eq!(view.caption(), "Total crashes in February: 0");
    }

    #[test]
    fn test_line_view_rejects_non_month() {
        let dataset = months_dataset(&[(1, 1)]);
        assert!(matches!(
            LineView::build(&dataset, 0),
            Err(Error::SelectionOutOfRange { month: 0 })
        ));
        assert!(matches!(
            LineView::build(&dataset, 13),
            Err(Error::SelectionOutOfRange { month: 13 })
        ));
    }

    #[test]
    fn test_bar_view_fills_all_twelve_months() {
        let dataset = months_dataset(&[(1, 5), (3, 3), (12, 2)]);
        let view = BarView::build(&dataset);

        assert_eq!(view.bars.len(), 12);
        let counts: Vec<_> = view.bars.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![5, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0, 2]);
        assert!(view.bars.iter().zip(1..=12).all(|(b, m)| b.month == m));
        assert_eq!(view.max_count(), 5);
    }

    #[test]
    fn test_bar_view_empty_dataset() {
        let view = BarView::build(&CrashDataset::default());
        assert_eq!(view.bars.len(), 12);
        assert_eq!(view.max_count(), 0);
    }

    #[test]
    fn test_pie_view_wedges_cover_full_circle() {
        let mut records = Vec::new();
        for (county, n) in [("MIDDLESEX", 60), ("WORCESTER", 38), ("NANTUCKET", 2)] {
            records.extend((0..n).map(|_| record(5, 42.0, -71.0, county)));
        }
        let view = PieView::build(&CrashDataset::from_records(records), CategoryField::County);

        assert_eq!(view.title, "Accidents by County");
        assert_eq!(view.total, 100);
        assert_eq!(view.wedges.len(), 3);
        assert_abs_diff_eq!(view.wedges[0].start_angle, PIE_START_ANGLE);
        assert_abs_diff_eq!(
            view.wedges.last().unwrap().end_angle,
            PIE_START_ANGLE + 360.0,
            epsilon = 1e-9
        );
        for pair in view.wedges.windows(2) {
            assert_abs_diff_eq!(pair[0].end_angle, pair[1].start_angle);
        }

        let other = view.wedges.last().unwrap();
        assert!(other.is_other);
        assert_eq!(other.label, "Other");
        assert!(other.exploded);
        assert_eq!(other.percent_label(), "2.0%");
        assert!(!view.wedges[0].exploded);
    }

    #[test]
    fn test_pie_wedge_geometry() {
        let wedge = PieWedge {
            label: "A".to_string(),
            count: 1,
            percent: 25.0,
            start_angle: 90.0,
            end_angle: 180.0,
            exploded: false,
            is_other: false,
        };
        let outline = wedge.outline();
        assert_eq!(outline[0], [0.0, 0.0]);
        let first = outline[1];
        assert_abs_diff_eq!(first[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(first[1], 1.0, epsilon = 1e-12);
        let last = *outline.last().unwrap();
        assert_abs_diff_eq!(last[0], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(last[1], 0.0, epsilon = 1e-12);

        let exploded = PieWedge {
            exploded: true,
            ..wedge
        };
        let [x, y] = exploded.outline()[0];
        let expected = EXPLODE_FRACTION * 135f64.to_radians().cos();
        assert_abs_diff_eq!(x, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(y, -expected, epsilon = 1e-12);
    }

    #[test]
    fn test_map_view_centroid_and_points() {
        let dataset = CrashDataset::from_records(vec![
            record(1, 42.0, -71.0, "SUFFOLK"),
            record(2, 42.4, -71.4, "ESSEX"),
            record(3, 42.2, -72.2, "HAMPDEN"),
        ]);
        let view = MapView::build(&dataset, 11.0);

        let centroid = view.centroid.unwrap();
        assert_relative_eq!(centroid.latitude, 42.2, epsilon = 1e-9);
        assert_relative_eq!(centroid.longitude, -71.533_333_333_333, epsilon = 1e-9);
        assert_eq!(view.points.len(), 3);
        assert_eq!(view.points[1].severity.as_deref(), Some("Non-fatal injury"));
        assert_eq!(view.points[0].tooltip(), "2017-01-09 07:15\nNon-fatal injury");

        let extent = view.extent().unwrap();
        assert_relative_eq!(extent.min_latitude, 42.0);
        assert_relative_eq!(extent.max_latitude, 42.4);
        assert_relative_eq!(extent.min_longitude, -72.2);
        assert_relative_eq!(extent.max_longitude, -71.0);

        let nearest = view.nearest(-72.1, 42.25).unwrap();
        assert_relative_eq!(nearest.longitude, -72.2);
    }

    #[test]
    fn test_map_view_empty_dataset() {
        let view = MapView::build(&CrashDataset::default(), 11.0);
        assert!(view.centroid.is_none());
        assert!(view.extent().is_none());
        assert!(view.nearest(0.0, 0.0).is_none());
    }

    #[test]
    fn test_map_view_span() {
        let view = MapView::build(&CrashDataset::default(), 1.0);
        assert_relative_eq!(view.view_span_degrees(), 180.0);
    }

    #[test]
    fn test_chart_view_dispatch() {
        let dataset = months_dataset(&[(1, 5), (3, 3), (12, 2)]);
        for kind in ViewKind::ALL {
            let selection = Selection {
                view: kind,
                month: 2,
                pie_field: CategoryField::CollisionType,
            };
            let view = ChartView::build(&dataset, &selection, 11.0).unwrap();
            assert_eq!(view.kind(), kind);
        }
    }

    #[test]
    fn test_chart_view_is_idempotent() {
        let dataset = months_dataset(&[(4, 2), (7, 9)]);
        let selection = Selection {
            view: ViewKind::Line,
            month: 7,
            pie_field: CategoryField::County,
        };
        assert_eq!(
            ChartView::build(&dataset, &selection, 11.0).unwrap(),
            ChartView::build(&dataset, &selection, 11.0).unwrap()
        );
    }

    #[test]
    fn test_chart_view_serializes_with_tag() {
        let dataset = months_dataset(&[(1, 1)]);
        let view = ChartView::build(&dataset, &Selection::default(), 11.0).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["view"], "bar");
        assert_eq!(json["bars"].as_array().unwrap().len(), 12);
    }
}
