use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GridError;
use crate::models::{ElementId, Page, ParticipantId, RoundId};
use crate::services::config_loader::GridConfig;
use crate::services::row_comparator::CompareContext;
use crate::services::selection::{CollapseState, CollapseUpdate, SelectionState};
use crate::services::sort_engine::{self, SortIndicator, SortOutcome, SortState};
use crate::services::value_classifier;
use crate::services::visibility_filter;

/// A user interaction, as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GridEvent {
    HeaderClick { table_id: String, column: usize },
    ParticipantClick { participant_id: ParticipantId },
    ParticipantReset,
    RoundSelect { round_id: RoundId },
    RoundReset,
    RoundToggle { round_id: RoundId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOrder {
    pub table_id: String,
    pub row_ids: Vec<String>,
}

/// Everything the host needs to redraw after an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderInstructions {
    pub row_orders: Vec<RowOrder>,
    pub visibility: BTreeMap<ElementId, bool>,
    pub sort_indicators: BTreeMap<String, SortIndicator>,
    pub collapse: Vec<CollapseUpdate>,
    pub selection: SelectionState,
    /// Set when the event was a header click.
    pub sort: Option<SortOutcome>,
}

impl RenderInstructions {
    /// Unknown ids are treated as visible.
    pub fn is_visible(&self, id: &ElementId) -> bool {
        self.visibility.get(id).copied().unwrap_or(true)
    }

    pub fn row_order(&self, table_id: &str) -> Option<&[String]> {
        self.row_orders
            .iter()
            .find(|order| order.table_id == table_id)
            .map(|order| order.row_ids.as_slice())
    }

    pub fn collapse_for(&self, round: RoundId) -> Option<&CollapseUpdate> {
        self.collapse.iter().find(|update| update.round == round)
    }
}

/// Owns the page and all interaction state; the only way to mutate either is
/// [`GridStore::handle`].
#[derive(Debug, Clone)]
pub struct GridStore {
    page: Page,
    config: GridConfig,
    sort: SortState,
    selection: SelectionState,
    collapse: CollapseState,
}

impl GridStore {
    pub fn new(page: Page, config: GridConfig) -> Self {
        let collapse = CollapseState::from_page(&page, &config.collapse);
        info!(
            "Grid store ready: {} table(s), {} element(s)",
            page.tables.len(),
            page.elements.len()
        );
        Self {
            page,
            config,
            sort: SortState::default(),
            selection: SelectionState::default(),
            collapse,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Applies one event. On error nothing has changed.
    pub fn handle(&mut self, event: GridEvent) -> Result<RenderInstructions, GridError> {
        debug!("Handling grid event {:?}", event);
        let sort = match event {
            GridEvent::HeaderClick { table_id, column } => Some(self.sort_column(&table_id, column)?),
            GridEvent::ParticipantClick { participant_id } => {
                self.selection.select_participant(participant_id);
                None
            }
            GridEvent::ParticipantReset => {
                self.selection.reset_participant();
                None
            }
            GridEvent::RoundSelect { round_id } => {
                self.selection.select_round(round_id);
                None
            }
            GridEvent::RoundReset => {
                self.selection.reset_round();
                None
            }
            GridEvent::RoundToggle { round_id } => {
                self.collapse.toggle(round_id)?;
                None
            }
        };

        let mut instructions = self.render_all();
        instructions.sort = sort;
        Ok(instructions)
    }

    /// Instructions for the current state, e.g. for the first paint.
    pub fn render_all(&self) -> RenderInstructions {
        let row_orders = self
            .page
            .tables
            .iter()
            .map(|table| RowOrder {
                table_id: table.id.clone(),
                row_ids: table.row_ids(),
            })
            .collect();

        let sort_indicators = self
            .page
            .tables
            .iter()
            .filter_map(|table| {
                self.sort
                    .indicator(&table.id)
                    .map(|indicator| (table.id.clone(), indicator))
            })
            .collect();

        RenderInstructions {
            row_orders,
            visibility: visibility_filter::compute_visibility(
                &self.page,
                &self.selection,
                &self.collapse,
            ),
            sort_indicators,
            collapse: self.collapse.updates(),
            selection: self.selection.clone(),
            sort: None,
        }
    }

    fn sort_column(&mut self, table_id: &str, column: usize) -> Result<SortOutcome, GridError> {
        let page_year = self.page.year;
        let Some(table) = self.page.table_mut(table_id) else {
            warn!("Sort ignored: table {} not found", table_id);
            return Err(GridError::TableNotFound(table_id.to_string()));
        };

        let year = table
            .year
            .or(page_year)
            .or(self.config.reference_year)
            .unwrap_or_else(value_classifier::current_year);
        let ctx = CompareContext {
            cell_offset: self.config.sort_cell_offset,
            year,
        };

        sort_engine::sort_table(table, &mut self.sort, column, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, ColumnHeader, Row, SortDirection, Table};

    fn store() -> GridStore {
        let page = Page {
            title: "Open".to_string(),
            year: Some(2025),
            tables: vec![Table {
                id: "scores-table-1".to_string(),
                year: None,
                leading: vec!["Player".to_string()],
                columns: vec![ColumnHeader {
                    label: "Total".to_string(),
                    round: None,
                    hideable: false,
                }],
                groups: vec![],
                rows: ["4", "-2", "1"]
                    .iter()
                    .enumerate()
                    .map(|(i, total)| Row {
                        id: format!("r{i}"),
                        player: None,
                        round: None,
                        cells: vec![Cell::text(format!("p{i}")), Cell::text(*total)],
                    })
                    .collect(),
            }],
            elements: vec![],
        };
        GridStore::new(page, GridConfig::default())
    }

    #[test]
    fn events_deserialize_from_host_json() {
        let event: GridEvent =
            serde_json::from_str(r#"{"kind": "headerClick", "tableId": "t", "column": 2}"#)
                .unwrap();
        assert_eq!(
            event,
            GridEvent::HeaderClick {
                table_id: "t".to_string(),
                column: 2
            }
        );

        let event: GridEvent =
            serde_json::from_str(r#"{"kind": "roundToggle", "roundId": "3"}"#).unwrap();
        assert_eq!(event, GridEvent::RoundToggle { round_id: RoundId(3) });

        let event: GridEvent = serde_json::from_str(r#"{"kind": "participantReset"}"#).unwrap();
        assert_eq!(event, GridEvent::ParticipantReset);
    }

    #[test]
    fn header_click_reports_order_and_indicator() {
        let mut store = store();
        let instructions = store
            .handle(GridEvent::HeaderClick {
                table_id: "scores-table-1".to_string(),
                column: 0,
            })
            .unwrap();

        assert_eq!(
            instructions.row_order("scores-table-1"),
            Some(["r1", "r2", "r0"].map(String::from).as_slice())
        );
        assert_eq!(
            instructions.sort_indicators["scores-table-1"],
            SortIndicator {
                column: 0,
                direction: SortDirection::Ascending
            }
        );
        assert!(instructions.sort.is_some());
    }

    #[test]
    fn unknown_table_is_an_error_without_changes() {
        let mut store = store();
        let before = store.render_all();
        let err = store
            .handle(GridEvent::HeaderClick {
                table_id: "scores-table-9".to_string(),
                column: 0,
            })
            .unwrap_err();
        assert_eq!(err, GridError::TableNotFound("scores-table-9".to_string()));
        assert_eq!(store.render_all(), before);
    }

    #[test]
    fn instructions_serialize_for_the_host() {
        let store = store();
        let json = serde_json::to_value(store.render_all()).unwrap();
        assert_eq!(json["visibility"]["row:scores-table-1/r0"], true);
        assert_eq!(json["row_orders"][0]["row_ids"][0], "r0");
    }
}
