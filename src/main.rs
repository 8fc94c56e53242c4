//! Crash Dashboard - Vehicle Crash CSV Dashboard & Interactive Chart Viewer
//!
//! Loads a year of vehicle-crash records from CSV and shows them as a
//! monthly bar plot, a category pie chart, a line graph and a point map.

mod charts;
mod config;
mod data;
mod error;
mod gui;
mod logging;
mod stats;

use anyhow::Context;
use config::Config;
use eframe::egui;
use gui::DashboardApp;

fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    logging::init_logging(config.logging.verbosity);
    tracing::info!(data = %config.data.path.display(), "Starting crash dashboard");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.display.window_width, config.display.window_height])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("Crash Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Crash Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run dashboard: {e}"))
}
