use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::GridError;
use crate::models::{Row, SortDirection, Table};
use crate::services::row_comparator::{self, CompareContext};

/// The one sorted column of a table and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortIndicator {
    pub column: usize,
    pub direction: SortDirection,
}

/// Per-table sort indicators. A table holds at most one, so setting a
/// column clears every other column of that table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    by_table: HashMap<String, SortIndicator>,
}

impl SortState {
    pub fn indicator(&self, table_id: &str) -> Option<SortIndicator> {
        self.by_table.get(table_id).copied()
    }

    pub fn direction(&self, table_id: &str, column: usize) -> Option<SortDirection> {
        self.indicator(table_id)
            .filter(|indicator| indicator.column == column)
            .map(|indicator| indicator.direction)
    }

    fn set(&mut self, table_id: &str, indicator: SortIndicator) {
        self.by_table.insert(table_id.to_string(), indicator);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOutcome {
    pub table_id: String,
    pub column: usize,
    /// Direction chosen from the header's previous state.
    pub requested: SortDirection,
    /// Direction actually applied, after a possible auto-flip.
    pub applied: SortDirection,
    pub auto_flipped: bool,
    pub swaps: usize,
    pub before_order: Vec<String>,
    pub after_order: Vec<String>,
}

/// Next direction for a header click: only an ascending column turns descending.
pub fn next_direction(previous: Option<SortDirection>) -> SortDirection {
    match previous {
        Some(SortDirection::Ascending) => SortDirection::Descending,
        _ => SortDirection::Ascending,
    }
}

/// Handles a click on sortable header `column` of `table`.
///
/// Fails without touching the table or the state when the column does not
/// exist.
pub fn sort_table(
    table: &mut Table,
    state: &mut SortState,
    column: usize,
    ctx: &CompareContext,
) -> Result<SortOutcome, GridError> {
    if column >= table.columns.len() {
        let err = GridError::ColumnOutOfRange {
            table_id: table.id.clone(),
            column,
            columns: table.columns.len(),
        };
        warn!("Sort ignored: {err}");
        return Err(err);
    }

    let requested = next_direction(state.direction(&table.id, column));
    let before_order = table.row_ids();

    let (applied, swaps, auto_flipped) =
        restart_bubble_sort(&mut table.rows, column, requested, ctx);

    // The header keeps the requested direction even when the scan flipped.
    state.set(
        &table.id,
        SortIndicator {
            column,
            direction: requested,
        },
    );

    debug!(
        "Sorted table {} on column {}: requested={:?} applied={:?} swaps={}",
        table.id, column, requested, applied, swaps
    );

    Ok(SortOutcome {
        table_id: table.id.clone(),
        column,
        requested,
        applied,
        auto_flipped,
        swaps,
        before_order,
        after_order: table.row_ids(),
    })
}

/// Swaps the first out-of-order adjacent pair and rescans from the top until
/// a scan finds nothing. If the very first ascending scan finds nothing, the
/// direction flips to descending once.
///
/// Returns the applied direction, the swap count and whether it flipped.
pub fn restart_bubble_sort(
    rows: &mut [Row],
    column: usize,
    direction: SortDirection,
    ctx: &CompareContext,
) -> (SortDirection, usize, bool) {
    let mut direction = direction;
    let mut swaps = 0usize;
    let mut flipped = false;

    loop {
        let out_of_order = (0..rows.len().saturating_sub(1)).find(|&i| {
            row_comparator::should_swap(&rows[i], &rows[i + 1], column, direction, ctx)
        });

        match out_of_order {
            Some(i) => {
                rows.swap(i, i + 1);
                swaps += 1;
            }
            None if swaps == 0 && direction == SortDirection::Ascending && !flipped => {
                direction = SortDirection::Descending;
                flipped = true;
            }
            None => break,
        }
    }

    (direction, swaps, flipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, ColumnHeader};

    const CTX: CompareContext = CompareContext {
        cell_offset: 1,
        year: 2025,
    };

    fn table(values: &[&str]) -> Table {
        Table {
            id: "scores-table-1".to_string(),
            year: None,
            leading: vec!["Player".to_string()],
            columns: vec![ColumnHeader {
                label: "Score".to_string(),
                round: None,
                hideable: false,
            }],
            groups: vec![],
            rows: values
                .iter()
                .enumerate()
                .map(|(i, value)| Row {
                    id: format!("r{i}"),
                    player: None,
                    round: None,
                    cells: vec![Cell::text(format!("p{i}")), Cell::text(*value)],
                })
                .collect(),
        }
    }

    fn column_values(table: &Table) -> Vec<String> {
        table.rows.iter().map(|row| row.cells[1].text.clone()).collect()
    }

    #[test]
    fn direction_toggles_only_from_ascending() {
        assert_eq!(next_direction(None), SortDirection::Ascending);
        assert_eq!(
            next_direction(Some(SortDirection::Ascending)),
            SortDirection::Descending
        );
        assert_eq!(
            next_direction(Some(SortDirection::Descending)),
            SortDirection::Ascending
        );
    }

    #[test]
    fn unsorted_numbers_sort_ascending_first() {
        let mut t = table(&["10", "2", "33"]);
        let mut state = SortState::default();
        let outcome = sort_table(&mut t, &mut state, 0, &CTX).unwrap();

        assert_eq!(column_values(&t), vec!["2", "10", "33"]);
        assert_eq!(outcome.applied, SortDirection::Ascending);
        assert!(!outcome.auto_flipped);
        assert_eq!(outcome.before_order, vec!["r0", "r1", "r2"]);
        assert_eq!(outcome.after_order, vec!["r1", "r0", "r2"]);
    }

    #[test]
    fn already_ascending_flips_to_descending() {
        let mut t = table(&["1", "2", "3"]);
        let mut state = SortState::default();
        let outcome = sort_table(&mut t, &mut state, 0, &CTX).unwrap();

        assert!(outcome.auto_flipped);
        assert_eq!(outcome.requested, SortDirection::Ascending);
        assert_eq!(outcome.applied, SortDirection::Descending);
        assert_eq!(column_values(&t), vec!["3", "2", "1"]);
        assert_eq!(
            state.direction("scores-table-1", 0),
            Some(SortDirection::Ascending)
        );
    }

    #[test]
    fn flipped_column_stays_descending_on_next_click() {
        let mut t = table(&["2", "10", "33"]);
        let mut state = SortState::default();
        sort_table(&mut t, &mut state, 0, &CTX).unwrap();
        assert_eq!(t.row_ids(), vec!["r2", "r1", "r0"]);

        let outcome = sort_table(&mut t, &mut state, 0, &CTX).unwrap();
        assert_eq!(outcome.requested, SortDirection::Descending);
        assert_eq!(outcome.applied, SortDirection::Descending);
        assert!(!outcome.auto_flipped);
        assert_eq!(outcome.swaps, 0);
        assert_eq!(t.row_ids(), vec!["r2", "r1", "r0"]);
        assert_eq!(
            state.direction("scores-table-1", 0),
            Some(SortDirection::Descending)
        );
    }

    #[test]
    fn second_click_sorts_descending() {
        let mut t = table(&["10", "2", "33"]);
        let mut state = SortState::default();
        sort_table(&mut t, &mut state, 0, &CTX).unwrap();
        let outcome = sort_table(&mut t, &mut state, 0, &CTX).unwrap();

        assert_eq!(outcome.requested, SortDirection::Descending);
        assert_eq!(column_values(&t), vec!["33", "10", "2"]);
    }

    #[test]
    fn ties_keep_their_relative_order() {
        let mut t = table(&["5", "1", "5", "1"]);
        let mut state = SortState::default();
        sort_table(&mut t, &mut state, 0, &CTX).unwrap();
        assert_eq!(t.row_ids(), vec!["r1", "r3", "r0", "r2"]);
    }

    #[test]
    fn bad_column_leaves_everything_untouched() {
        let mut t = table(&["10", "2"]);
        let mut state = SortState::default();
        let err = sort_table(&mut t, &mut state, 3, &CTX).unwrap_err();

        assert!(matches!(err, GridError::ColumnOutOfRange { column: 3, .. }));
        assert_eq!(column_values(&t), vec!["10", "2"]);
        assert_eq!(state.indicator("scores-table-1"), None);
    }

    #[test]
    fn empty_and_single_row_tables_are_fine() {
        let mut state = SortState::default();
        let mut empty = table(&[]);
        let outcome = sort_table(&mut empty, &mut state, 0, &CTX).unwrap();
        assert_eq!(outcome.swaps, 0);

        let mut single = table(&["4"]);
        let outcome = sort_table(&mut single, &mut state, 0, &CTX).unwrap();
        assert_eq!(outcome.swaps, 0);
        assert_eq!(single.row_ids(), vec!["r0"]);
    }

    #[test]
    fn mixed_date_pairs_can_stay_unordered() {
        // Known limitation: "N/A" next to a date is never swapped, so the
        // dates on either side of it are not ordered against each other.
        let mut t = table(&["3/10 9:00am", "N/A", "3/2 2:15pm"]);
        let mut state = SortState::default();
        let outcome = sort_table(&mut t, &mut state, 0, &CTX).unwrap();

        assert_eq!(outcome.swaps, 0);
        assert_eq!(column_values(&t), vec!["3/10 9:00am", "N/A", "3/2 2:15pm"]);
    }
}
