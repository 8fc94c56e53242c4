//! Crash Dashboard Main Application
//! Main window with control panel and chart viewer. The dataset is loaded
//! once and reused for every interaction until the user opens another file.

use crate::charts::{ChartView, Selection, StaticChartRenderer};
use crate::config::Config;
use crate::data::{CrashDataset, CrashLoader};
use crate::gui::control_panel::SummaryPanel;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::CrashAggregator;
use egui::SidePanel;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Main application window.
pub struct DashboardApp {
    config: Config,
    loader: CrashLoader,
    dataset: Option<CrashDataset>,
    selection: Selection,
    /// Last built view and the selection it was built for.
    cached: Option<(Selection, Option<ChartView>)>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl DashboardApp {
    /// Create the app and load the configured dataset. A failed load leaves
    /// the app running with an error status.
    pub fn new(config: Config) -> Self {
        let mut app = Self {
            loader: CrashLoader::new(config.data.columns.clone()),
            chart_viewer: ChartViewer::new(config.display.show_grid),
            control_panel: ControlPanel::new(),
            dataset: None,
            selection: Selection::default(),
            cached: None,
            config,
        };
        let path = app.config.data.path.clone();
        app.load(&path);
        app
    }

    pub fn dataset(&self) -> Option<&CrashDataset> {
        self.dataset.as_ref()
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn status(&self) -> (&str, bool) {
        (&self.control_panel.status, self.control_panel.status_is_error)
    }

    /// Load `path` into the session. On failure the previous dataset stays.
    pub fn load(&mut self, path: &Path) -> bool {
        match self.loader.load(path) {
            Ok(dataset) => {
                let monthly = CrashAggregator::monthly_counts(&dataset);
                let stats = CrashAggregator::summary_stats(&monthly);
                info!(months = monthly.len(), total = stats.total, "Session dataset ready");
                self.control_panel.summary =
                    Some(SummaryPanel::new(&monthly, stats, dataset.dropped_rows()));
                self.control_panel.csv_path = dataset.source().map(Path::to_path_buf);
                self.control_panel.set_status(format!(
                    "Loaded {} crashes ({} dropped)",
                    dataset.len(),
                    dataset.dropped_rows()
                ));
                self.dataset = Some(dataset);
                self.cached = None;
                true
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load crash data");
                self.control_panel.set_error(format!("Error: {e}"));
                false
            }
        }
    }

    /// Rebuild the cached view if the selection or dataset changed.
    fn refresh_view(&mut self) {
        let Some(dataset) = self.dataset.as_ref() else {
            self.cached = None;
            return;
        };
        if matches!(&self.cached, Some((key, _)) if *key == self.selection) {
            return;
        }

        debug!(selection = ?self.selection, "Building view");
        let built = match ChartView::build(dataset, &self.selection, self.config.display.map_zoom) {
            Ok(view) => Some(view),
            Err(e) => {
                error!(error = %e, "Failed to build view");
                self.control_panel.set_error(format!("Error: {e}"));
                None
            }
        };
        self.cached = Some((self.selection, built));
    }

    /// View for the current selection.
    pub fn current_view(&mut self) -> Option<&ChartView> {
        self.refresh_view();
        self.cached.as_ref().and_then(|(_, view)| view.as_ref())
    }

    fn handle_open_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.load(&path);
        }
    }

    fn handle_export(&mut self) {
        let export = self.config.export.clone();
        let Some(view) = self.current_view().cloned() else {
            self.control_panel.set_error("Nothing to export");
            return;
        };

        match StaticChartRenderer::export(&view, &export) {
            Ok(exported) => {
                self.control_panel
                    .set_status(format!("Exported {}", exported.png.display()));
                if export.open_after_export {
                    if let Err(e) = open::that(&exported.png) {
                        warn!(path = %exported.png.display(), error = %e, "Failed to open export");
                    }
                }
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Export failed");
                self.control_panel.set_error(format!("Export failed: {e:#}"));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let before = self.selection;
                    let action = self.control_panel.show(ui, &mut self.selection);
                    if before != self.selection {
                        info!(from = ?before, to = ?self.selection, "Selection changed");
                    }

                    match action {
                        ControlPanelAction::OpenCsv => self.handle_open_csv(),
                        ControlPanelAction::Export => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.refresh_view();
            let view = self.cached.as_ref().and_then(|(_, view)| view.as_ref());
            self.chart_viewer.show(ui, view);
        });
    }
}
