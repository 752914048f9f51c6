use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Number of addressable rows in the editing surface ("1".."100").
pub const ROW_COUNT: usize = 100;
/// Number of addressable columns in the editing surface ("A".."Z").
pub const COLUMN_COUNT: usize = 26;

/// A single spreadsheet cell. Any attributes besides `value` that a stored
/// document carries are kept as-is. A non-string `value` is read as its
/// display text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default, deserialize_with = "value_as_text")]
    pub value: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Cell {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            extra: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// A row of cell positions; `None` is an absent position (`null` in JSON).
pub type Row = Vec<Option<Cell>>;
pub type Grid = Vec<Row>;

/// Expands `source` to exactly `ROW_COUNT` x `COLUMN_COUNT`.
///
/// Present cells are copied, including cells whose value is empty. Absent
/// positions, short rows and missing rows are filled with empty cells, and
/// anything outside the canonical extent is dropped.
pub fn pad(source: &[Row]) -> Grid {
    (0..ROW_COUNT)
        .map(|row| {
            (0..COLUMN_COUNT)
                .map(|col| Some(present_cell(source, row, col).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Shrinks `source` to the bounding box of its non-empty content, keeping at
/// least one row and one column.
///
/// Trailing rows are checked against the column count in effect at that
/// point, which is still the full width. Trailing columns are checked across
/// every row of `source`, not just the rows that survived the row trim.
pub fn trim(source: &[Row]) -> Grid {
    let mut row_count = ROW_COUNT;
    let mut column_count = COLUMN_COUNT;

    while row_count > 1 && row_is_blank(source, row_count - 1, column_count) {
        row_count -= 1;
    }

    while column_count > 1 && column_is_blank(source, column_count - 1) {
        column_count -= 1;
    }

    (0..row_count)
        .map(|row| {
            (0..column_count)
                .map(|col| present_cell(source, row, col).cloned())
                .collect()
        })
        .collect()
}

/// Returns `(rows, columns)`, taking the widest row as the column count.
pub fn dimensions(grid: &[Row]) -> (usize, usize) {
    let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
    (grid.len(), columns)
}

fn value_as_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(display_value(&Value::deserialize(deserializer)?))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn present_cell(source: &[Row], row: usize, col: usize) -> Option<&Cell> {
    source.get(row)?.get(col)?.as_ref()
}

fn is_blank(cell: Option<&Cell>) -> bool {
    cell.map_or(true, Cell::is_empty)
}

fn row_is_blank(source: &[Row], row: usize, column_count: usize) -> bool {
    let Some(cells) = source.get(row) else {
        return true;
    };
    (0..column_count).all(|col| is_blank(cells.get(col).and_then(Option::as_ref)))
}

fn column_is_blank(source: &[Row], col: usize) -> bool {
    source
        .iter()
        .all(|cells| is_blank(cells.get(col).and_then(Option::as_ref)))
}

pub fn row_labels() -> &'static [String] {
    ROW_LABELS.get_or_init(|| (1..=ROW_COUNT).map(|n| n.to_string()).collect())
}

pub fn column_labels() -> &'static [String] {
    COLUMN_LABELS.get_or_init(|| ('A'..='Z').map(String::from).collect())
}

/// Formats a zero-based position as an address such as `"C7"`.
pub fn cell_label(row: usize, col: usize) -> Option<String> {
    let column = column_labels().get(col)?;
    let row = row_labels().get(row)?;
    Some(format!("{column}{row}"))
}

/// Parses an address such as `"c7"` into a zero-based `(row, col)` pair.
pub fn parse_cell_label(label: &str) -> Option<(usize, usize)> {
    let label = label.trim();
    let mut chars = label.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let col = column_labels()
        .iter()
        .position(|c| c.starts_with(letter))?;

    let row_part = chars.as_str();
    if row_part.is_empty() || !row_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row = row_labels().iter().position(|r| r == row_part)?;
    Some((row, col))
}

static ROW_LABELS: OnceLock<Vec<String>> = OnceLock::new();
static COLUMN_LABELS: OnceLock<Vec<String>> = OnceLock::new();
