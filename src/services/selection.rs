use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::GridError;
use crate::models::{Page, ParticipantId, RoundId};
use crate::services::config_loader::CollapseConfig;

/// Active participant and round. `None` on an axis means no filtering on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub active_participant: Option<ParticipantId>,
    pub active_round: Option<RoundId>,
}

impl SelectionState {
    pub fn select_participant(&mut self, id: ParticipantId) {
        debug!("Participant selected: {}", id);
        self.active_participant = Some(id);
    }

    pub fn reset_participant(&mut self) {
        debug!("Participant filter cleared");
        self.active_participant = None;
    }

    pub fn select_round(&mut self, id: RoundId) {
        debug!("Round selected: {}", id);
        self.active_round = Some(id);
    }

    pub fn reset_round(&mut self) {
        debug!("Round filter cleared");
        self.active_round = None;
    }

    pub fn participant_allows(&self, tag: Option<&ParticipantId>) -> bool {
        match (&self.active_participant, tag) {
            (Some(active), Some(tag)) => active == tag,
            _ => true,
        }
    }

    pub fn round_allows(&self, tag: Option<RoundId>) -> bool {
        match (self.active_round, tag) {
            (Some(active), Some(tag)) => active == tag,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundCollapse {
    pub collapsed: bool,
    pub label: String,
}

/// What the host redraws for one round group after a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollapseUpdate {
    pub round: RoundId,
    pub collapsed: bool,
    pub colspan: u32,
    pub label: String,
    pub secondary_headers_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseState {
    rounds: BTreeMap<RoundId, RoundCollapse>,
    labels: CollapseConfig,
}

impl CollapseState {
    /// One expanded entry per round that has a group header anywhere on the page.
    pub fn from_page(page: &Page, labels: &CollapseConfig) -> Self {
        let mut rounds = BTreeMap::new();
        for group in page.tables.iter().flat_map(|table| table.groups.iter()) {
            rounds.entry(group.round).or_insert_with(|| RoundCollapse {
                collapsed: false,
                label: group
                    .label
                    .clone()
                    .unwrap_or_else(|| labels.expand_label.clone()),
            });
        }
        Self {
            rounds,
            labels: labels.clone(),
        }
    }

    pub fn is_collapsed(&self, round: RoundId) -> bool {
        self.rounds.get(&round).is_some_and(|entry| entry.collapsed)
    }

    /// Flips the round and its label text.
    pub fn toggle(&mut self, round: RoundId) -> Result<CollapseUpdate, GridError> {
        let Some(entry) = self.rounds.get_mut(&round) else {
            warn!("Collapse toggle ignored: no group for round {}", round);
            return Err(GridError::RoundNotFound(round));
        };

        entry.collapsed = !entry.collapsed;
        entry.label = if entry.label == self.labels.expand_label {
            self.labels.shrink_label.clone()
        } else {
            self.labels.expand_label.clone()
        };

        debug!(
            "Round {} collapsed={} label={:?}",
            round, entry.collapsed, entry.label
        );

        Ok(Self::describe(&self.labels, round, entry))
    }

    pub fn updates(&self) -> Vec<CollapseUpdate> {
        self.rounds
            .iter()
            .map(|(round, entry)| Self::describe(&self.labels, *round, entry))
            .collect()
    }

    fn describe(labels: &CollapseConfig, round: RoundId, entry: &RoundCollapse) -> CollapseUpdate {
        CollapseUpdate {
            round,
            collapsed: entry.collapsed,
            colspan: if entry.collapsed {
                labels.collapsed_colspan
            } else {
                labels.expanded_colspan
            },
            label: entry.label.clone(),
            secondary_headers_visible: !entry.collapsed,
        }
    }
}
