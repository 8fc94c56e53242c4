//! Control Panel Widget
//! Left side panel with the view selector, month slider, pie detail
//! selector, summary statistics and file actions.

use crate::charts::{month_name, Selection, ViewKind};
use crate::data::CategoryField;
use crate::stats::{MonthlyCount, SummaryStats};
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Totals shown under the selectors, recomputed whenever the dataset changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryPanel {
    pub stats: SummaryStats,
    /// (month, count) with the highest count, earliest month on ties.
    pub busiest: Option<(u32, usize)>,
    /// (month, count) with the lowest count, earliest month on ties.
    pub quietest: Option<(u32, usize)>,
    pub dropped_rows: usize,
}

impl SummaryPanel {
    pub fn new(monthly: &MonthlyCount, stats: SummaryStats, dropped_rows: usize) -> Self {
        if monthly.is_empty() {
            return Self {
                stats,
                busiest: None,
                quietest: None,
                dropped_rows,
            };
        }
        let busiest = stats
            .max
            .and_then(|max| monthly.iter().find(|&(_, count)| count == max));
        let quietest = stats
            .min
            .and_then(|min| monthly.iter().find(|&(_, count)| count == min));
        Self {
            stats,
            busiest,
            quietest,
            dropped_rows,
        }
    }
}

fn month_line((month, count): (u32, usize)) -> String {
    format!("{} ({})", month_name(month).unwrap_or("?"), count)
}

/// Left side control panel.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub summary: Option<SummaryPanel>,
    pub status: String,
    pub status_is_error: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            csv_path: None,
            summary: None,
            status: "Ready".to_string(),
            status_is_error: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_is_error = false;
    }

    pub fn set_error(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_is_error = true;
    }

    /// Draw the control panel. `selection` is edited in place.
    pub fn show(&mut self, ui: &mut egui::Ui, selection: &mut Selection) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        let has_data = self.summary.is_some();

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚗 Crash Dashboard")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Massachusetts 2017")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file loaded".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(if has_data {
                        Color32::WHITE
                    } else {
                        Color32::GRAY
                    }));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Open CSV…").clicked() {
                            action = ControlPanelAction::OpenCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== View =====
        ui.label(RichText::new("📊 View").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 110.0;
        let combo_width = 150.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Data view:"));
            ComboBox::from_id_salt("view_kind")
                .width(combo_width)
                .selected_text(selection.view.label())
                .show_ui(ui, |ui| {
                    for kind in ViewKind::ALL {
                        ui.selectable_value(&mut selection.view, kind, kind.label());
                    }
                });
        });

        match selection.view {
            ViewKind::Line => {
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    ui.add_sized([label_width, 20.0], egui::Label::new("Month:"));
                    ui.add(egui::Slider::new(&mut selection.month, 1..=12).custom_formatter(
                        |n, _| month_name(n as u32).unwrap_or_default().to_string(),
                    ));
                });
            }
            ViewKind::Pie => {
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    ui.add_sized([label_width, 20.0], egui::Label::new("Detail view:"));
                    ComboBox::from_id_salt("pie_field")
                        .width(combo_width)
                        .selected_text(selection.pie_field.label())
                        .show_ui(ui, |ui| {
                            for field in CategoryField::ALL {
                                ui.selectable_value(&mut selection.pie_field, field, field.label());
                            }
                        });
                });
            }
            ViewKind::Bar | ViewKind::Map => {}
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Summary =====
        ui.label(RichText::new("📈 Summary").size(14.0).strong());
        ui.add_space(5.0);

        match &self.summary {
            Some(summary) => {
                egui::Grid::new("summary_grid")
                    .num_columns(2)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("Total crashes:");
                        ui.label(RichText::new(summary.stats.total.to_string()).strong());
                        ui.end_row();

                        ui.label("Busiest month:");
                        ui.label(summary.busiest.map(month_line).unwrap_or_else(|| "-".into()));
                        ui.end_row();

                        ui.label("Quietest month:");
                        ui.label(summary.quietest.map(month_line).unwrap_or_else(|| "-".into()));
                        ui.end_row();

                        if summary.dropped_rows > 0 {
                            ui.label("Rows dropped:");
                            ui.label(
                                RichText::new(summary.dropped_rows.to_string())
                                    .color(Color32::GRAY),
                            );
                            ui.end_row();
                        }
                    });
            }
            None => {
                ui.label(RichText::new("No data").color(Color32::GRAY));
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Actions =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(has_data, |ui| {
                let button = egui::Button::new(RichText::new("💾 Export").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(10.0);

        let status_color = if self.status_is_error {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by the control panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    OpenCsv,
    Export,
}
