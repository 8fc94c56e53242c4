//! Charts module - view shaping and rendering

mod plotter;
mod renderer;
mod views;

pub use plotter::ChartPlotter;
pub use renderer::StaticChartRenderer;
pub use views::{
    month_name, BarView, ChartView, LineView, MapView, MonthPoint, PieView, PieWedge, Selection,
    ViewKind,
};
