use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::mpsc::{self, Receiver, Sender};

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::models::{self, Element, FeedRecord, Page, PageInfo, RecordType, RowRecord, Table};
use crate::services::config_loader::GridConfig;

#[derive(Debug)]
pub enum FeedEvent {
    Started,
    Progress {
        lines_read: u64,
    },
    LineError {
        line_no: u64,
        message: String,
    },
    Finished {
        lines_read: u64,
        error_count: u64,
        page: Box<Page>,
        warnings: Vec<String>,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Default)]
struct FeedState {
    info: Option<PageInfo>,
    tables: Vec<Table>,
    table_index: HashMap<String, usize>,
    elements: Vec<Element>,
    element_index: HashMap<String, usize>,
    warnings: Vec<String>,
}

fn decode<T: DeserializeOwned>(
    name: &str,
    line_no: u64,
    data: serde_json::Value,
) -> Result<T, String> {
    serde_json::from_value(data.clone()).map_err(|err| {
        format!(
            "Line {}: failed to parse {} payload: {} | data: {}",
            line_no, name, err, data
        )
    })
}

/// Inserts or replaces by id, keeping first-appearance order.
fn upsert<T>(name: &str, items: &mut Vec<T>, index: &mut HashMap<String, usize>, item: T) -> bool
where
    T: models::HasId,
{
    match index.get(item.id()) {
        Some(&position) => {
            warn!("Updating existing {} {}", name, item.id());
            items[position] = item;
            true
        }
        None => {
            index.insert(item.id().to_string(), items.len());
            items.push(item);
            false
        }
    }
}

fn handle_record(state: &mut FeedState, line_no: u64, record: FeedRecord) -> Result<(), String> {
    let Some(data) = record.data else {
        warn!(
            "Empty data for record {:?} on line {}",
            record.record_type, line_no
        );
        return Ok(());
    };

    if record.record_type != RecordType::Page && state.info.is_none() {
        return Err("Wrong feed: page not defined yet".to_string());
    }

    match record.record_type {
        RecordType::Page => {
            let info: PageInfo = decode("page", line_no, data)?;
            if state.info.is_some() {
                info!("Updating page info");
            } else {
                info!("New page parsed: {}", info.title);
            }
            state.info = Some(info);
        }
        RecordType::Table => {
            let table: Table = decode("table", line_no, data)?;
            let table_id = table.id.clone();
            if upsert("table", &mut state.tables, &mut state.table_index, table) {
                state
                    .warnings
                    .push(format!("Line {line_no}: table {table_id} defined twice"));
            }
        }
        RecordType::Row => {
            let record: RowRecord = decode("row", line_no, data)?;
            let Some(&position) = state.table_index.get(&record.table_id) else {
                let warning = format!(
                    "Line {}: skipping row {} for unknown table {}",
                    line_no, record.row.id, record.table_id
                );
                warn!("{warning}");
                state.warnings.push(warning);
                return Ok(());
            };
            let table = &mut state.tables[position];
            match table.rows.iter().position(|row| row.id == record.row.id) {
                Some(existing) => {
                    let warning = format!(
                        "Line {}: row {} in table {} replaced",
                        line_no, record.row.id, record.table_id
                    );
                    warn!("{warning}");
                    state.warnings.push(warning);
                    table.rows[existing] = record.row;
                }
                None => table.rows.push(record.row),
            }
        }
        RecordType::Element => {
            let element: Element = decode("element", line_no, data)?;
            let element_id = element.id.clone();
            if upsert(
                "element",
                &mut state.elements,
                &mut state.element_index,
                element,
            ) {
                state
                    .warnings
                    .push(format!("Line {line_no}: element {element_id} defined twice"));
            }
        }
    }

    Ok(())
}

fn parse_feed_line(tx: &Sender<FeedEvent>, line_no: u64, line: &str, state: &mut FeedState) -> u64 {
    if line.trim().is_empty() {
        return 0;
    }

    let result = serde_json::from_str::<FeedRecord>(line)
        .map_err(|err| err.to_string())
        .and_then(|record| handle_record(state, line_no, record));

    match result {
        Ok(()) => 0,
        Err(message) => {
            let _ = tx.send(FeedEvent::LineError { line_no, message });
            1
        }
    }
}

/// Every row of a table must have the same number of cells.
pub fn validate_page(page: &Page) -> Result<(), String> {
    for table in &page.tables {
        let Some(first) = table.rows.first() else {
            continue;
        };
        let width = first.cells.len();
        if let Some(row) = table.rows.iter().find(|row| row.cells.len() != width) {
            return Err(format!(
                "Table {}: row {} has {} cells, expected {}",
                table.id,
                row.id,
                row.cells.len(),
                width
            ));
        }
    }
    Ok(())
}

/// Result of reading a whole feed.
#[derive(Debug)]
pub struct ParsedFeed {
    pub lines_read: u64,
    pub error_count: u64,
    pub page: Page,
    pub warnings: Vec<String>,
}

/// Reads the feed line by line, reporting progress and line errors on `tx`.
pub fn parse_feed<R: BufRead>(
    reader: R,
    tx: &Sender<FeedEvent>,
    progress_every_lines: u64,
) -> Result<ParsedFeed, String> {
    let mut lines_read: u64 = 0;
    let mut error_count: u64 = 0;
    let mut state = FeedState::default();

    for line_result in reader.lines() {
        let line = line_result.map_err(|err| format!("Failed while reading feed: {err}"))?;
        lines_read += 1;
        error_count += parse_feed_line(tx, lines_read, &line, &mut state);

        if progress_every_lines > 0 && lines_read.is_multiple_of(progress_every_lines) {
            let _ = tx.send(FeedEvent::Progress { lines_read });
        }
    }

    let info = state
        .info
        .ok_or_else(|| "Feed has no page record".to_string())?;
    let page = Page {
        title: info.title,
        year: info.year,
        tables: state.tables,
        elements: state.elements,
    };
    validate_page(&page)?;

    info!(
        "Feed parsed: {} line(s), {} table(s), {} element(s), {} error(s)",
        lines_read,
        page.tables.len(),
        page.elements.len(),
        error_count
    );

    Ok(ParsedFeed {
        lines_read,
        error_count,
        page,
        warnings: state.warnings,
    })
}

pub fn spawn_feed_parser(path: String, config: GridConfig) -> Receiver<FeedEvent> {
    let (tx, rx) = mpsc::channel::<FeedEvent>();

    std::thread::spawn(move || {
        let _ = tx.send(FeedEvent::Started);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                let _ = tx.send(FeedEvent::Failed {
                    message: format!("Failed to open file '{path}': {err}"),
                });
                return;
            }
        };

        let progress_every = config.presentation.progress_every_lines;
        match parse_feed(BufReader::new(file), &tx, progress_every) {
            Ok(parsed) => {
                let _ = tx.send(FeedEvent::Finished {
                    lines_read: parsed.lines_read,
                    error_count: parsed.error_count,
                    page: Box::new(parsed.page),
                    warnings: parsed.warnings,
                });
            }
            Err(message) => {
                let _ = tx.send(FeedEvent::Failed { message });
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FEED: &str = r#"{"type": "page", "data": {"title": "The Open", "year": 2025}}
{"type": "table", "data": {"id": "scores-table-1", "leading": ["Player"], "columns": [{"label": "Total"}]}}
{"type": "row", "data": {"table_id": "scores-table-1", "id": "r1", "player": "alice", "cells": ["Scheffler", "-7"]}}
{"type": "row", "data": {"table_id": "scores-table-1", "id": "r2", "player": "bob", "cells": ["McIlroy", "-4"]}}

{"type": "element", "data": {"id": "chart-alice", "kind": "chart", "player": "alice", "text": "-7"}}
"#;

    fn parse(feed: &str) -> (Result<ParsedFeed, String>, Vec<FeedEvent>) {
        let (tx, rx) = mpsc::channel();
        let result = parse_feed(Cursor::new(feed.to_string()), &tx, 2);
        drop(tx);
        (result, rx.iter().collect())
    }

    #[test]
    fn parses_tables_rows_and_elements() {
        let (result, events) = parse(FEED);
        let parsed = result.unwrap();

        assert_eq!(parsed.error_count, 0);
        assert_eq!(parsed.lines_read, 6);
        assert_eq!(parsed.page.title, "The Open");
        assert_eq!(parsed.page.year, Some(2025));
        assert_eq!(parsed.page.tables[0].rows.len(), 2);
        assert_eq!(parsed.page.elements[0].id, "chart-alice");
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, FeedEvent::Progress { .. }))
                .count(),
            3
        );
    }

    #[test]
    fn records_before_page_are_line_errors() {
        let feed = format!(
            "{}\n{}",
            r#"{"type": "table", "data": {"id": "t"}}"#,
            r#"{"type": "page", "data": {"title": "x"}}"#
        );
        let (result, events) = parse(&feed);
        let parsed = result.unwrap();

        assert_eq!(parsed.error_count, 1);
        assert!(parsed.page.tables.is_empty());
        assert!(events
            .iter()
            .any(|event| matches!(event, FeedEvent::LineError { line_no: 1, .. })));
    }

    #[test]
    fn malformed_json_is_counted_not_fatal() {
        let feed = format!("{FEED}{{not json\n");
        let (result, _) = parse(&feed);
        assert_eq!(result.unwrap().error_count, 1);
    }

    #[test]
    fn rows_for_unknown_tables_are_warnings() {
        let feed = format!(
            "{FEED}{}\n",
            r#"{"type": "row", "data": {"table_id": "nope", "id": "r9", "cells": []}}"#
        );
        let (result, _) = parse(&feed);
        let parsed = result.unwrap();
        assert_eq!(parsed.error_count, 0);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn uneven_rows_fail_validation() {
        let feed = format!(
            "{FEED}{}\n",
            r#"{"type": "row", "data": {"table_id": "scores-table-1", "id": "r3", "cells": ["Rahm"]}}"#
        );
        let (result, _) = parse(&feed);
        let message = result.unwrap_err();
        assert!(message.contains("row r3 has 1 cells, expected 2"));
    }

    #[test]
    fn missing_page_fails() {
        let (result, _) = parse("");
        assert_eq!(result.unwrap_err(), "Feed has no page record");
    }
}
