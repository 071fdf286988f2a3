use std::borrow::Cow;
use std::cmp::Ordering;

use crate::models::{Row, SortDirection};
use crate::services::value_classifier::{self, CellValue};

/// Everything a comparison needs besides the two rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareContext {
    /// Distance between a sortable header index and the cell it sorts.
    pub cell_offset: usize,
    pub year: i32,
}

/// Orders two display strings, or `None` when exactly one of them is a date.
///
/// Text order is by Unicode scalar value, which matches UTF-16 code unit
/// order except for characters outside the Basic Multilingual Plane.
pub fn compare_values(left: &str, right: &str, year: i32) -> Option<Ordering> {
    let left_value = value_classifier::classify(left, year);
    let right_value = value_classifier::classify(right, year);

    match (&left_value, &right_value) {
        (CellValue::Date(a), CellValue::Date(b)) => Some(a.cmp(b)),
        (CellValue::Numeric(a), CellValue::Numeric(b)) => a.partial_cmp(b),
        (CellValue::Text(a), CellValue::Text(b)) => Some(a.cmp(b)),
        // Number against text: both sides compare as lower-cased text.
        _ if !left_value.is_date() && !right_value.is_date() => {
            Some(text_key(left, &left_value).cmp(&text_key(right, &right_value)))
        }
        // Date against non-date has no ordering; the pair stays where it is.
        _ => None,
    }
}

fn text_key<'a>(raw: &str, value: &'a CellValue) -> Cow<'a, str> {
    match value {
        CellValue::Text(text) => Cow::Borrowed(text.as_str()),
        _ => Cow::Owned(raw.trim().to_lowercase()),
    }
}

/// Whether `upper` must move below `lower` for `column` in `direction`.
pub fn should_swap(
    upper: &Row,
    lower: &Row,
    column: usize,
    direction: SortDirection,
    ctx: &CompareContext,
) -> bool {
    let index = column + ctx.cell_offset;
    let (Some(upper_cell), Some(lower_cell)) = (upper.cell(index), lower.cell(index)) else {
        return false;
    };

    matches!(
        (
            direction,
            compare_values(&upper_cell.text, &lower_cell.text, ctx.year)
        ),
        (SortDirection::Ascending, Some(Ordering::Greater))
            | (SortDirection::Descending, Some(Ordering::Less))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    const CTX: CompareContext = CompareContext {
        cell_offset: 1,
        year: 2025,
    };

    fn row(id: &str, value: &str) -> Row {
        Row {
            id: id.to_string(),
            player: None,
            round: None,
            cells: vec![Cell::text(id), Cell::text(value)],
        }
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(compare_values("10", "2", 2025), Some(Ordering::Greater));
        assert_eq!(compare_values("-4", "-1", 2025), Some(Ordering::Less));
        assert_eq!(compare_values("3", "3.0", 2025), Some(Ordering::Equal));
    }

    #[test]
    fn dates_compare_chronologically() {
        assert_eq!(
            compare_values("3/10 9:00am", "3/4 10:30am", 2025),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values("3/2 2:15pm", "3/2 9:15am", 2025),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn number_against_text_compares_as_text() {
        // "10" < "e" as strings, even though 10 > 0 as par-relative scores
        assert_eq!(compare_values("10", "E", 2025), Some(Ordering::Less));
        assert_eq!(compare_values("Bob", "alice", 2025), Some(Ordering::Greater));
    }

    #[test]
    fn text_ignores_case_and_surrounding_space() {
        assert_eq!(compare_values("  WD ", "wd", 2025), Some(Ordering::Equal));
        assert_eq!(compare_values("CUT", "mdf", 2025), Some(Ordering::Less));
        assert_eq!(compare_values(" 7 ", "cut", 2025), Some(Ordering::Less));
    }

    #[test]
    fn date_against_non_date_is_unordered() {
        assert_eq!(compare_values("3/4 10:30am", "N/A", 2025), None);
        assert_eq!(compare_values("5", "3/4 10:30am", 2025), None);
    }

    #[test]
    fn swap_follows_direction() {
        let high = row("a", "33");
        let low = row("b", "2");
        assert!(should_swap(&high, &low, 0, SortDirection::Ascending, &CTX));
        assert!(!should_swap(&high, &low, 0, SortDirection::Descending, &CTX));
        assert!(should_swap(&low, &high, 0, SortDirection::Descending, &CTX));
    }

    #[test]
    fn equal_values_never_swap() {
        let a = row("a", "7");
        let b = row("b", "7");
        assert!(!should_swap(&a, &b, 0, SortDirection::Ascending, &CTX));
        assert!(!should_swap(&a, &b, 0, SortDirection::Descending, &CTX));
    }

    #[test]
    fn cell_offset_selects_compared_cell() {
        // with offset 1, column 0 looks at cells[1], not the id cell
        let a = row("z", "1");
        let b = row("a", "2");
        assert!(!should_swap(&a, &b, 0, SortDirection::Ascending, &CTX));
        let no_offset = CompareContext {
            cell_offset: 0,
            year: 2025,
        };
        assert!(should_swap(&a, &b, 0, SortDirection::Ascending, &no_offset));
    }

    #[test]
    fn missing_cell_is_left_alone() {
        let a = row("a", "9");
        let b = row("b", "1");
        assert!(!should_swap(&a, &b, 5, SortDirection::Ascending, &CTX));
    }
}
