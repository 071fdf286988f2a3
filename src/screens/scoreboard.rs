use std::cell::RefCell;
use std::collections::HashMap;

use eframe::egui;
use scoregrid::models::{ElementId, Page, Row, Table};
use scoregrid::services::grid_flow::{GridEvent, GridStore, RenderInstructions};
use scoregrid::services::sort_engine::SortOutcome;
use tracing::{info, warn};

pub enum ScoreboardAction {
    Stay,
    LoadAnother,
}

#[derive(Default)]
struct ScoreboardUiState {
    instructions: Option<RenderInstructions>,
    last_sort: Option<SortOutcome>,
    last_error: Option<String>,
}

thread_local! {
    static SCOREBOARD_UI_STATE: RefCell<ScoreboardUiState> = RefCell::new(ScoreboardUiState::default());
}

/// Drops cached instructions; call when a different store is shown.
pub fn reset() {
    SCOREBOARD_UI_STATE.with(|cell| *cell.borrow_mut() = ScoreboardUiState::default());
}

pub fn ui(ui: &mut egui::Ui, store: &mut GridStore) -> ScoreboardAction {
    SCOREBOARD_UI_STATE.with(|cell| {
        let mut state = cell.borrow_mut();
        let instructions = state
            .instructions
            .get_or_insert_with(|| store.render_all())
            .clone();

        let mut pending: Vec<GridEvent> = Vec::new();
        let mut action = ScoreboardAction::Stay;

        ui.horizontal(|ui| {
            ui.heading(&store.page().title);
            if ui.button("Load another feed").clicked() {
                action = ScoreboardAction::LoadAnother;
            }
        });
        ui.add_space(8.0);

        render_selection_bar(ui, store.page(), &instructions, &mut pending);

        if let Some(err) = &state.last_error {
            ui.colored_label(egui::Color32::LIGHT_RED, err);
        }
        if let Some(sort) = &state.last_sort {
            ui.label(describe_sort(sort));
        }
        ui.add_space(8.0);

        let row_height = store.config().presentation.row_height;
        let cell_offset = store.config().sort_cell_offset;
        egui::ScrollArea::both()
            .id_salt("scoreboard_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for table in &store.page().tables {
                    render_table(
                        ui,
                        table,
                        &instructions,
                        cell_offset,
                        row_height,
                        &mut pending,
                    );
                    ui.add_space(12.0);
                }
                render_elements(ui, store.page(), &instructions);
            });

        for event in pending {
            match store.handle(event) {
                Ok(next) => {
                    if let Some(sort) = &next.sort {
                        state.last_sort = Some(sort.clone());
                    }
                    state.last_error = None;
                    state.instructions = Some(next);
                }
                Err(err) => {
                    warn!("Grid event rejected: {err}");
                    state.last_error = Some(err.to_string());
                }
            }
        }

        if matches!(action, ScoreboardAction::LoadAnother) {
            info!("Leaving scoreboard for another feed");
        }
        action
    })
}

fn describe_sort(sort: &SortOutcome) -> String {
    let flipped = if sort.auto_flipped {
        ", already ascending so flipped"
    } else {
        ""
    };
    format!(
        "Sorted {} by column {} {:?} ({} swaps{})",
        sort.table_id,
        sort.column + 1,
        sort.applied,
        sort.swaps,
        flipped
    )
}

fn render_selection_bar(
    ui: &mut egui::Ui,
    page: &Page,
    instructions: &RenderInstructions,
    pending: &mut Vec<GridEvent>,
) {
    let selection = &instructions.selection;

    ui.horizontal_wrapped(|ui| {
        ui.label("Player:");
        if ui
            .selectable_label(selection.active_participant.is_none(), "All")
            .clicked()
        {
            pending.push(GridEvent::ParticipantReset);
        }
        for participant in page.participants() {
            let selected = selection.active_participant.as_ref() == Some(&participant);
            if ui
                .selectable_label(selected, participant.as_str())
                .clicked()
            {
                pending.push(GridEvent::ParticipantClick {
                    participant_id: participant.clone(),
                });
            }
        }
    });

    ui.horizontal_wrapped(|ui| {
        ui.label("Round:");
        if ui
            .selectable_label(selection.active_round.is_none(), "All rounds")
            .clicked()
        {
            pending.push(GridEvent::RoundReset);
        }
        for round in page.rounds() {
            let selected = selection.active_round == Some(round);
            if ui.selectable_label(selected, format!("R{round}")).clicked() {
                pending.push(GridEvent::RoundSelect { round_id: round });
            }
        }
    });
}

fn render_table(
    ui: &mut egui::Ui,
    table: &Table,
    instructions: &RenderInstructions,
    cell_offset: usize,
    row_height: f32,
    pending: &mut Vec<GridEvent>,
) {
    let rows_by_id: HashMap<&str, &Row> = table
        .rows
        .iter()
        .map(|row| (row.id.as_str(), row))
        .collect();
    let ordered: Vec<&Row> = match instructions.row_order(&table.id) {
        Some(ids) => ids
            .iter()
            .filter_map(|id| rows_by_id.get(id.as_str()).copied())
            .collect(),
        None => table.rows.iter().collect(),
    };
    let visible_rows: Vec<&Row> = ordered
        .into_iter()
        .filter(|row| {
            instructions.is_visible(&ElementId::Row {
                table: table.id.clone(),
                row: row.id.clone(),
            })
        })
        .collect();
    let cell_visible = |row: &Row, index: usize| {
        instructions.is_visible(&ElementId::Cell {
            table: table.id.clone(),
            row: row.id.clone(),
            column: index,
        })
    };
    let header_visible = |column: usize| {
        instructions.is_visible(&ElementId::Header {
            table: table.id.clone(),
            column,
        })
    };

    // A collapsed round keeps its summary column even though its header is hidden.
    let width = table
        .rows
        .first()
        .map(|row| row.cells.len())
        .unwrap_or(cell_offset + table.columns.len());
    let shown: Vec<usize> = (0..width)
        .filter(|&index| match index.checked_sub(cell_offset) {
            Some(column) if column < table.columns.len() => {
                header_visible(column) || visible_rows.iter().any(|row| cell_visible(row, index))
            }
            _ => true,
        })
        .collect();
    let column_of = |index: usize| {
        index
            .checked_sub(cell_offset)
            .filter(|column| *column < table.columns.len())
    };
    let indicator = instructions.sort_indicators.get(&table.id);

    egui::Grid::new(&table.id)
        .striped(true)
        .min_row_height(row_height)
        .show(ui, |ui| {
            let mut seen_rounds = Vec::new();
            for &index in &shown {
                let group = column_of(index)
                    .and_then(|column| table.columns[column].round)
                    .filter(|round| !seen_rounds.contains(round))
                    .and_then(|round| table.groups.iter().find(|group| group.round == round));
                let Some(group) = group else {
                    ui.label("");
                    continue;
                };
                seen_rounds.push(group.round);
                let visible = instructions.is_visible(&ElementId::GroupHeader {
                    table: table.id.clone(),
                    round: group.round,
                });
                if !visible {
                    ui.label("");
                    continue;
                }
                let collapse = instructions.collapse_for(group.round);
                let label = collapse.map(|c| c.label.as_str()).unwrap_or_default();
                let response = ui
                    .link(format!("{} · {}", group.title, label))
                    .on_hover_text(format!(
                        "spans {} column(s)",
                        collapse.map(|c| c.colspan).unwrap_or(1)
                    ));
                if response.clicked() {
                    pending.push(GridEvent::RoundToggle {
                        round_id: group.round,
                    });
                }
            }
            ui.end_row();

            for &index in &shown {
                match column_of(index) {
                    Some(column) if header_visible(column) => {
                        let arrow = indicator
                            .filter(|indicator| indicator.column == column)
                            .map(|indicator| indicator.direction.arrow())
                            .unwrap_or("");
                        let label = format!("{} {}", table.columns[column].label, arrow);
                        if ui.button(label.trim_end()).clicked() {
                            pending.push(GridEvent::HeaderClick {
                                table_id: table.id.clone(),
                                column,
                            });
                        }
                    }
                    Some(_) => {
                        ui.label("");
                    }
                    None => {
                        ui.strong(table.leading.get(index).map(String::as_str).unwrap_or(""));
                    }
                }
            }
            ui.end_row();

            for row in &visible_rows {
                for &index in &shown {
                    match row.cell(index) {
                        Some(cell) if cell_visible(row, index) => {
                            ui.label(&cell.text);
                        }
                        _ => {
                            ui.label("");
                        }
                    }
                }
                ui.end_row();
            }
        });
}

fn render_elements(ui: &mut egui::Ui, page: &Page, instructions: &RenderInstructions) {
    let visible: Vec<_> = page
        .elements
        .iter()
        .filter(|element| instructions.is_visible(&ElementId::Element(element.id.clone())))
        .collect();
    if visible.is_empty() {
        return;
    }

    ui.separator();
    ui.strong("Charts & line scores");
    for element in visible {
        let round = element
            .round
            .map(|round| format!(" R{round}"))
            .unwrap_or_default();
        ui.label(format!("[{:?}{}] {}", element.kind, round, element.text));
    }
}
