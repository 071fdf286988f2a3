use eframe::egui;
use rfd::FileDialog;
use scoregrid::models::Page;
use scoregrid::services::config_loader::{self, GridConfig};
use scoregrid::services::feed_parser::{FeedEvent, spawn_feed_parser};
use std::path::Path;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Mutex, OnceLock};
use tracing_unwrap::ResultExt;

pub enum LoadDataAction {
    Stay,
    Continue,
}

#[derive(Default)]
struct ParseUiState {
    receiver: Option<Receiver<FeedEvent>>,
    is_parsing: bool,
    parsed_successfully: bool,
    parsed_path: Option<String>,
    lines_read: u64,
    error_count: u64,
    parse_failed_message: Option<String>,
    errors: Vec<String>,
    warnings: Vec<String>,
    warnings_acknowledged: bool,
    parsed_page: Option<Page>,
    parsed_config: Option<GridConfig>,
}

impl ParseUiState {
    fn reset(&mut self) {
        self.parsed_successfully = false;
        self.lines_read = 0;
        self.error_count = 0;
        self.parse_failed_message = None;
        self.errors.clear();
        self.warnings.clear();
        self.warnings_acknowledged = false;
        self.parsed_page = None;
    }

    fn fail(&mut self, folder_path: String, headline: &str, errors: Vec<String>) {
        self.reset();
        self.is_parsing = false;
        self.parsed_path = Some(folder_path);
        self.parse_failed_message = Some(headline.to_string());
        self.errors = errors;
        self.parsed_config = None;
        self.receiver = None;
    }

    fn push_error(&mut self, message: String) {
        self.errors.push(message);
        if self.errors.len() > 8 {
            self.errors.remove(0);
        }
    }
}

static PARSE_STATE: OnceLock<Mutex<ParseUiState>> = OnceLock::new();

fn parse_state() -> &'static Mutex<ParseUiState> {
    PARSE_STATE.get_or_init(|| Mutex::new(ParseUiState::default()))
}

fn validate_feed_path(feed_path: &str) -> Result<(), Vec<String>> {
    let feed = Path::new(feed_path);

    if !feed.exists() {
        return Err(vec![format!("Feed file does not exist: {}", feed.display())]);
    }

    if !feed.is_file() {
        return Err(vec![format!("Path is not a file: {}", feed.display())]);
    }

    let config_toml = feed
        .parent()
        .map(|folder| folder.join("config.toml"))
        .filter(|config| config.exists() && !config.is_file());
    if let Some(config_toml) = config_toml {
        return Err(vec![format!(
            "config.toml exists but is not a file: {}",
            config_toml.display()
        )]);
    }

    Ok(())
}

pub fn take_parsed_page() -> Option<Page> {
    let mut state = parse_state().lock().expect_or_log("parse state lock poisoned");
    state.parsed_page.take()
}

pub fn take_parsed_config() -> Option<GridConfig> {
    let mut state = parse_state().lock().expect_or_log("parse state lock poisoned");
    state.parsed_config.take()
}

fn pump_parser_events(state: &mut ParseUiState) {
    loop {
        let event = {
            let Some(rx) = &state.receiver else {
                break;
            };
            rx.try_recv()
        };

        match event {
            Ok(FeedEvent::Started) => {
                state.is_parsing = true;
                state.reset();
            }
            Ok(FeedEvent::Progress { lines_read }) => {
                state.lines_read = lines_read;
            }
            Ok(FeedEvent::LineError { line_no, message }) => {
                state.error_count += 1;
                state.push_error(format!("Line {line_no}: {message}"));
            }
            Ok(FeedEvent::Finished {
                lines_read,
                error_count,
                page,
                warnings,
            }) => {
                state.is_parsing = false;
                state.lines_read = lines_read;
                state.error_count = error_count;
                state.parsed_successfully = error_count == 0;
                state.warnings_acknowledged = false;
                if error_count > 0 {
                    state.parse_failed_message =
                        Some(format!("Parsing finished with {error_count} error(s)"));
                    state.parsed_page = None;
                    state.parsed_config = None;
                    state.warnings.clear();
                } else {
                    state.parse_failed_message = None;
                    state.parsed_page = Some(*page);
                    state.warnings = warnings;
                }
                state.receiver = None;
                break;
            }
            Ok(FeedEvent::Failed { message }) => {
                state.is_parsing = false;
                state.parsed_successfully = false;
                state.parse_failed_message = Some(message.clone());
                state.push_error(message);
                state.warnings.clear();
                state.warnings_acknowledged = false;
                state.parsed_page = None;
                state.parsed_config = None;
                state.receiver = None;
                break;
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                state.is_parsing = false;
                state.reset();
                state.parse_failed_message = Some("Parser thread disconnected".to_string());
                state.parsed_config = None;
                state.receiver = None;
                break;
            }
        }
    }
}

pub fn ui(ui: &mut egui::Ui, data_path: &mut Option<String>) -> LoadDataAction {
    ui.heading("Scoregrid");
    ui.add_space(8.0);
    ui.label("Select a scoreboard feed (.ndjson)");
    ui.add_space(12.0);

    ui.label("Feed file:");
    let mut selected_path = data_path.clone().unwrap_or_default();
    let response = ui.add_sized(
        [900.0, 28.0],
        egui::TextEdit::singleline(&mut selected_path).hint_text("Enter feed path..."),
    );
    if response.changed() {
        let trimmed = selected_path.trim().to_string();
        if trimmed.is_empty() {
            *data_path = None;
        } else {
            *data_path = Some(trimmed);
        }
    }
    ui.add_space(8.0);

    if ui.button("Choose file").clicked()
        && let Some(path) = FileDialog::new()
            .set_directory(".")
            .add_filter("Scoreboard feed", &["ndjson", "jsonl", "json"])
            .pick_file()
    {
        *data_path = Some(path.display().to_string());
    }

    let current_path = data_path
        .as_deref()
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(ToOwned::to_owned);

    let mut state = parse_state().lock().expect_or_log("parse state lock poisoned");

    if current_path != state.parsed_path && !state.is_parsing {
        state.reset();
        state.receiver = None;
        state.parsed_config = None;
    }

    if state.is_parsing {
        pump_parser_events(&mut state);
        ui.ctx().request_repaint();
    }

    ui.add_space(8.0);
    let can_parse = current_path.is_some() && !state.is_parsing;
    if ui
        .add_enabled(can_parse, egui::Button::new("Parse"))
        .clicked()
        && let Some(feed_path) = current_path.clone()
    {
        let feed_folder = Path::new(&feed_path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        match validate_feed_path(&feed_path) {
            Ok(()) => match config_loader::load_grid_config(&feed_folder) {
                Ok(config) => {
                    let parser_config = config.clone();
                    state.reset();
                    state.is_parsing = true;
                    state.parsed_path = Some(feed_path.clone());
                    state.parsed_config = Some(config);
                    state.receiver = Some(spawn_feed_parser(feed_path, parser_config));
                    ui.ctx().request_repaint();
                }
                Err(err) => {
                    state.fail(feed_path, "Invalid config.toml", vec![format!("{err:#}")]);
                }
            },
            Err(validation_errors) => {
                state.fail(feed_path, "Invalid feed path", validation_errors);
            }
        }
    }

    ui.add_space(8.0);
    if state.is_parsing {
        ui.horizontal(|ui| {
            ui.add(egui::Spinner::new());
            ui.label(format!(
                "Parsing... lines: {} | errors: {}",
                state.lines_read, state.error_count
            ));
        });
    } else if state.parsed_successfully {
        ui.colored_label(
            egui::Color32::LIGHT_GREEN,
            format!("Parse completed. lines: {} | errors: 0", state.lines_read),
        );
    } else if let Some(msg) = &state.parse_failed_message {
        ui.colored_label(egui::Color32::LIGHT_RED, msg);
    }

    if !state.errors.is_empty() {
        ui.add_space(8.0);
        egui::Frame::group(ui.style())
            .fill(egui::Color32::from_rgb(58, 22, 22))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(180, 60, 60)))
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Parse Errors").strong());
                for err in &state.errors {
                    ui.colored_label(egui::Color32::from_rgb(255, 170, 170), err);
                }
            });
    }

    if !state.warnings.is_empty() {
        ui.add_space(8.0);
        egui::Frame::group(ui.style())
            .fill(egui::Color32::from_rgb(56, 48, 20))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(190, 160, 70)))
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Parse Warnings").strong());
                for warning in &state.warnings {
                    ui.colored_label(egui::Color32::from_rgb(255, 220, 140), warning);
                }
            });

        ui.add_space(8.0);
        if !state.warnings_acknowledged && ui.button("Proceed despite warnings").clicked() {
            state.warnings_acknowledged = true;
        }
    }

    ui.add_space(8.0);
    let can_continue = state.parsed_successfully
        && !state.is_parsing
        && current_path.is_some()
        && current_path == state.parsed_path
        && (state.warnings.is_empty() || state.warnings_acknowledged);
    if ui
        .add_enabled(can_continue, egui::Button::new("Continue"))
        .clicked()
    {
        return LoadDataAction::Continue;
    }

    LoadDataAction::Stay
}
