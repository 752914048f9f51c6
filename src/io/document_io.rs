use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::state::grid::{Grid, Row};
use crate::state::sheet::Sheet;

const DOCUMENT_EXTENSION: &str = ".json";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("document parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Stored form of a spreadsheet: `{ "data": [[{ "value": "..." }, null, ...], ...] }`.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentFile {
    #[serde(deserialize_with = "rows_or_null")]
    data: Grid,
}

/// A `null` row reads as an empty row, which pads to empty cells.
fn rows_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Grid, D::Error> {
    let rows = Vec::<Option<Row>>::deserialize(deserializer)?;
    Ok(rows.into_iter().map(Option::unwrap_or_default).collect())
}

/// Parses stored bytes and pads the grid for editing.
pub fn decode_document(bytes: &[u8]) -> Result<Sheet, DocumentError> {
    let text = std::str::from_utf8(bytes)?;
    let file: DocumentFile = serde_json::from_str(text)?;
    Ok(Sheet::from_grid(&file.data))
}

/// Trims the sheet and serializes it compactly for upload.
pub fn encode_document(sheet: &Sheet) -> Result<Vec<u8>, DocumentError> {
    let file = DocumentFile {
        data: sheet.to_storage(),
    };
    Ok(serde_json::to_vec(&file)?)
}

pub fn document_path(file_name: &str) -> String {
    format!("/{file_name}{DOCUMENT_EXTENSION}")
}

/// Maps a directory entry such as `"Budget.JSON"` to its document name.
pub fn file_name_from_entry(entry: &str) -> Option<&str> {
    let split = entry.len().checked_sub(DOCUMENT_EXTENSION.len())?;
    if !entry.is_char_boundary(split) {
        return None;
    }
    let (stem, extension) = entry.split_at(split);
    extension
        .eq_ignore_ascii_case(DOCUMENT_EXTENSION)
        .then_some(stem)
}
