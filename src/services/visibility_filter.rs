use std::collections::BTreeMap;

use crate::models::{ElementId, Page, ParticipantId, RoundId};
use crate::services::selection::{CollapseState, SelectionState};

/// Tags that decide whether one thing is shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tags<'a> {
    pub player: Option<&'a ParticipantId>,
    pub round: Option<RoundId>,
    pub hideable: bool,
}

/// Participant axis AND round axis AND not folded away by a collapsed round.
pub fn is_visible(tags: Tags<'_>, selection: &SelectionState, collapse: &CollapseState) -> bool {
    let collapsed = tags.hideable && tags.round.is_some_and(|round| collapse.is_collapsed(round));
    selection.participant_allows(tags.player) && selection.round_allows(tags.round) && !collapsed
}

/// Visibility of every row, cell, header, group header and element on the page.
pub fn compute_visibility(
    page: &Page,
    selection: &SelectionState,
    collapse: &CollapseState,
) -> BTreeMap<ElementId, bool> {
    let mut visibility = BTreeMap::new();

    for table in &page.tables {
        for group in &table.groups {
            let visible = selection.round_allows(Some(group.round));
            visibility.insert(
                ElementId::GroupHeader {
                    table: table.id.clone(),
                    round: group.round,
                },
                visible,
            );
        }

        for (column, header) in table.columns.iter().enumerate() {
            let tags = Tags {
                player: None,
                round: header.round,
                hideable: header.hideable,
            };
            visibility.insert(
                ElementId::Header {
                    table: table.id.clone(),
                    column,
                },
                is_visible(tags, selection, collapse),
            );
        }

        for row in &table.rows {
            let row_visible = is_visible(
                Tags {
                    player: row.player.as_ref(),
                    round: row.round,
                    hideable: false,
                },
                selection,
                collapse,
            );
            visibility.insert(
                ElementId::Row {
                    table: table.id.clone(),
                    row: row.id.clone(),
                },
                row_visible,
            );

            for (column, cell) in row.cells.iter().enumerate() {
                let tags = Tags {
                    player: cell.player.as_ref(),
                    round: cell.round,
                    hideable: cell.hideable,
                };
                visibility.insert(
                    ElementId::Cell {
                        table: table.id.clone(),
                        row: row.id.clone(),
                        column,
                    },
                    row_visible && is_visible(tags, selection, collapse),
                );
            }
        }
    }

    for element in &page.elements {
        let tags = Tags {
            player: element.player.as_ref(),
            round: element.round,
            hideable: false,
        };
        visibility.insert(
            ElementId::Element(element.id.clone()),
            is_visible(tags, selection, collapse),
        );
    }

    visibility
}
