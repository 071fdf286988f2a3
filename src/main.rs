mod screens;

use eframe::egui;
use scoregrid::GridStore;
use screens::load_data::LoadDataAction;
use screens::scoreboard::ScoreboardAction;
use std::fs;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

enum ScoregridState {
    LoadData,
    Scoreboard,
}

struct ScoregridApp {
    state: ScoregridState,
    data_path: Option<String>,
    store: Option<GridStore>,
}

impl Default for ScoregridApp {
    fn default() -> Self {
        Self {
            state: ScoregridState::LoadData,
            data_path: None,
            store: None,
        }
    }
}

impl eframe::App for ScoregridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            match self.state {
                ScoregridState::LoadData => {
                    ui.vertical_centered(|ui| {
                        if let LoadDataAction::Continue = screens::load_data::ui(ui, &mut self.data_path)
                        {
                            if let Some(page) = screens::load_data::take_parsed_page() {
                                if let Some(config) = screens::load_data::take_parsed_config() {
                                    self.store = Some(GridStore::new(page, config));
                                    screens::scoreboard::reset();
                                    info!("Transition: LoadData -> Scoreboard");
                                    self.state = ScoregridState::Scoreboard;
                                } else {
                                    warn!("Cannot continue: parsed config is missing");
                                }
                            } else {
                                info!("Cannot continue: parsed page is missing");
                            }
                        }
                    });
                }
                ScoregridState::Scoreboard => {
                    if let Some(store) = self.store.as_mut() {
                        match screens::scoreboard::ui(ui, store) {
                            ScoreboardAction::LoadAnother => {
                                info!("Transition: Scoreboard -> LoadData");
                                self.store = None;
                                self.state = ScoregridState::LoadData;
                            }
                            ScoreboardAction::Stay => {}
                        }
                    } else {
                        ui.colored_label(
                            egui::Color32::RED,
                            "Scoreboard data missing. Go back to Load Data.",
                        );
                    }
                }
            }
        });
    }
}

fn init_tracing() -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true);

    let _ = fs::create_dir_all("logs");
    let file_appender = tracing_appender::rolling::daily("logs", "scoregrid.log");
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_target(true);

    let init_result = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let Err(err) = init_result {
        eprintln!("tracing init failed: {err}");
        return None;
    }

    Some(file_guard)
}

fn main() -> eframe::Result<()> {
    let _log_guard = init_tracing();
    info!("Starting Scoregrid");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Scoregrid",
        options,
        Box::new(|cc| {
            let mut style = (*cc.egui_ctx.style()).clone();
            style
                .text_styles
                .insert(egui::TextStyle::Heading, egui::FontId::proportional(26.0));
            style
                .text_styles
                .insert(egui::TextStyle::Body, egui::FontId::proportional(16.0));
            style
                .text_styles
                .insert(egui::TextStyle::Button, egui::FontId::proportional(16.0));
            style.spacing.button_padding = egui::vec2(8.0, 4.0);
            cc.egui_ctx.set_style(style);

            Ok(Box::new(ScoregridApp::default()))
        }),
    )
}
