use std::fmt;

use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Round number as rendered in `data-round` attributes (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RoundId(pub u32);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for RoundId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Markup attributes carry rounds as strings, the scoring side as numbers.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(RoundId(n)),
            Raw::Text(s) => s
                .trim()
                .parse::<u32>()
                .map(RoundId)
                .map_err(|err| serde::de::Error::custom(format!("invalid round '{s}': {err}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CellRepr")]
pub struct Cell {
    pub text: String,
    pub round: Option<RoundId>,
    pub player: Option<ParticipantId>,
    /// Hidden while its round group is collapsed.
    pub hideable: bool,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            round: None,
            player: None,
            hideable: false,
        }
    }

    pub fn in_round(text: impl Into<String>, round: RoundId, hideable: bool) -> Self {
        Self {
            text: text.into(),
            round: Some(round),
            player: None,
            hideable,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CellRepr {
    Plain(String),
    Tagged {
        text: String,
        #[serde(default)]
        round: Option<RoundId>,
        #[serde(default)]
        player: Option<ParticipantId>,
        #[serde(default)]
        hideable: bool,
    },
}

impl From<CellRepr> for Cell {
    fn from(repr: CellRepr) -> Self {
        match repr {
            CellRepr::Plain(text) => Cell::text(text),
            CellRepr::Tagged {
                text,
                round,
                player,
                hideable,
            } => Cell {
                text,
                round,
                player,
                hideable,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    #[serde(default)]
    pub player: Option<ParticipantId>,
    #[serde(default)]
    pub round: Option<RoundId>,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

/// Sortable header cell (second header row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnHeader {
    pub label: String,
    #[serde(default)]
    pub round: Option<RoundId>,
    #[serde(default)]
    pub hideable: bool,
}

/// Top header spanning the columns of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundGroupHeader {
    pub round: RoundId,
    pub title: String,
    /// Initial collapse label as rendered by the server.
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    /// Calendar year for date-like cells; they carry none themselves.
    #[serde(default)]
    pub year: Option<i32>,
    /// Labels of the non-sortable leading columns.
    #[serde(default)]
    pub leading: Vec<String>,
    #[serde(default)]
    pub columns: Vec<ColumnHeader>,
    #[serde(default)]
    pub groups: Vec<RoundGroupHeader>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Table {
    pub fn row_ids(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.id.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Chart,
    Linescore,
    LinescoreRow,
    #[default]
    #[serde(other)]
    Other,
}

/// Free-standing tagged element outside the tables (charts, line scores).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub kind: ElementKind,
    #[serde(default)]
    pub player: Option<ParticipantId>,
    #[serde(default)]
    pub round: Option<RoundId>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub year: Option<i32>,
    pub tables: Vec<Table>,
    pub elements: Vec<Element>,
}

impl Page {
    pub fn table_mut(&mut self, table_id: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|table| table.id == table_id)
    }

    /// Participants in first-appearance order.
    pub fn participants(&self) -> Vec<ParticipantId> {
        let mut seen = Vec::new();
        let row_tags = self
            .tables
            .iter()
            .flat_map(|table| table.rows.iter())
            .filter_map(|row| row.player.as_ref());
        let element_tags = self.elements.iter().filter_map(|e| e.player.as_ref());
        for player in row_tags.chain(element_tags) {
            if !seen.contains(player) {
                seen.push(player.clone());
            }
        }
        seen
    }

    /// Rounds in ascending order, from group headers, columns, rows and elements.
    pub fn rounds(&self) -> Vec<RoundId> {
        let mut rounds: Vec<RoundId> = self
            .tables
            .iter()
            .flat_map(|table| {
                table
                    .groups
                    .iter()
                    .map(|group| Some(group.round))
                    .chain(table.columns.iter().map(|column| column.round))
                    .chain(table.rows.iter().map(|row| row.round))
            })
            .chain(self.elements.iter().map(|element| element.round))
            .flatten()
            .collect();
        rounds.sort();
        rounds.dedup();
        rounds
    }
}

/// Identifies anything the host can show or hide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementId {
    Row { table: String, row: String },
    Cell { table: String, row: String, column: usize },
    Header { table: String, column: usize },
    GroupHeader { table: String, round: RoundId },
    Element(String),
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Row { table, row } => write!(f, "row:{table}/{row}"),
            ElementId::Cell { table, row, column } => write!(f, "cell:{table}/{row}/{column}"),
            ElementId::Header { table, column } => write!(f, "header:{table}/{column}"),
            ElementId::GroupHeader { table, round } => write!(f, "group:{table}/{round}"),
            ElementId::Element(id) => write!(f, "element:{id}"),
        }
    }
}

impl Serialize for ElementId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Page,
    Table,
    Row,
    Element,
}

/// One line of the scoreboard feed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeedRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PageInfo {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RowRecord {
    pub table_id: String,
    #[serde(flatten)]
    pub row: Row,
}

pub trait HasId {
    fn id(&self) -> &str;
}

impl HasId for Table {
    fn id(&self) -> &str {
        &self.id
    }
}

impl HasId for Element {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_id_accepts_numbers_and_strings() {
        let from_number: RoundId = serde_json::from_str("2").unwrap();
        let from_text: RoundId = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(from_number, RoundId(2));
        assert_eq!(from_text, RoundId(3));
        assert!(serde_json::from_str::<RoundId>("\"R1\"").is_err());
    }

    #[test]
    fn cell_deserializes_from_plain_string_or_tagged_object() {
        let cells: Vec<Cell> = serde_json::from_str(
            r#"["Alice", {"text": "3/4 10:30am", "round": "1", "hideable": true}]"#,
        )
        .unwrap();
        assert_eq!(cells[0], Cell::text("Alice"));
        assert_eq!(cells[1], Cell::in_round("3/4 10:30am", RoundId(1), true));
    }

    #[test]
    fn element_ids_serialize_as_strings() {
        let id = ElementId::Cell {
            table: "scores-table-1".to_string(),
            row: "r2".to_string(),
            column: 4,
        };
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"cell:scores-table-1/r2/4\"");
    }

    #[test]
    fn unknown_element_kind_falls_back_to_other() {
        let element: Element =
            serde_json::from_str(r#"{"id": "x", "kind": "sparkline", "text": "t"}"#).unwrap();
        assert_eq!(element.kind, ElementKind::Other);
    }

    #[test]
    fn page_lists_participants_and_rounds_once() {
        let page = Page {
            title: "Masters".to_string(),
            year: None,
            tables: vec![Table {
                id: "t".to_string(),
                year: None,
                leading: vec![],
                columns: vec![ColumnHeader {
                    label: "Score".to_string(),
                    round: Some(RoundId(2)),
                    hideable: false,
                }],
                groups: vec![RoundGroupHeader {
                    round: RoundId(1),
                    title: "Round 1".to_string(),
                    label: None,
                }],
                rows: vec![
                    Row {
                        id: "a".to_string(),
                        player: Some(ParticipantId::new("bob")),
                        round: None,
                        cells: vec![],
                    },
                    Row {
                        id: "b".to_string(),
                        player: Some(ParticipantId::new("alice")),
                        round: None,
                        cells: vec![],
                    },
                ],
            }],
            elements: vec![Element {
                id: "chart-bob".to_string(),
                kind: ElementKind::Chart,
                player: Some(ParticipantId::new("bob")),
                round: Some(RoundId(1)),
                text: String::new(),
            }],
        };

        assert_eq!(
            page.participants(),
            vec![ParticipantId::new("bob"), ParticipantId::new("alice")]
        );
        assert_eq!(page.rounds(), vec![RoundId(1), RoundId(2)]);
    }
}
