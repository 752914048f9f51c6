use crate::state::grid::{self, Cell, Grid, Row};

/// The live editing surface: always a padded `ROW_COUNT` x `COLUMN_COUNT` grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    grid: Grid,
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Sheet {
    pub fn new() -> Self {
        Self::from_grid(&[])
    }

    pub fn from_grid(source: &[Row]) -> Self {
        Self {
            grid: grid::pad(source),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.grid.get(row)?.get(col)?.as_ref()
    }

    pub fn value(&self, row: usize, col: usize) -> &str {
        self.get(row, col).map(|cell| cell.value.as_str()).unwrap_or("")
    }

    /// Returns `false` when the position is out of range or the value is unchanged.
    pub fn set_value(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        let Some(slot) = self.grid.get_mut(row).and_then(|cells| cells.get_mut(col)) else {
            return false;
        };

        let value = value.into();
        let cell = slot.get_or_insert_with(Cell::default);
        if cell.value == value {
            return false;
        }
        cell.value = value;
        true
    }

    /// The minimal grid that gets persisted.
    pub fn to_storage(&self) -> Grid {
        grid::trim(&self.grid)
    }

    pub fn non_empty_cells(&self) -> Vec<(usize, usize, &Cell)> {
        self.grid
            .iter()
            .enumerate()
            .flat_map(|(row, cells)| {
                cells.iter().enumerate().filter_map(move |(col, cell)| {
                    cell.as_ref()
                        .filter(|cell| !cell.is_empty())
                        .map(|cell| (row, col, cell))
                })
            })
            .collect()
    }
}
