use std::collections::HashMap;

use crate::address::CellAddress;
use crate::cell::{Cell, CellValue, NumberFormat};

/// Characters a sheet name may not contain.
const FORBIDDEN_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Sheet names compare case-insensitively.
pub fn normalize_sheet_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// 1 to 31 characters, none of `[ ] : * ? / \`.
pub fn is_valid_sheet_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && trimmed.chars().count() <= 31
        && !trimmed.contains(FORBIDDEN_NAME_CHARS)
}

/// A named grid of sparse cells.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    name_key: String,
    cells: HashMap<(usize, usize), Cell>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            name_key: normalize_sheet_name(name),
            cells: HashMap::new(),
        }
    }

    pub(crate) fn name_key(&self) -> &str {
        &self.name_key
    }

    /// Set a cell from user-style input (see [`CellValue::from_input`]).
    pub fn set_value(&mut self, address: CellAddress, input: &str) -> &mut Cell {
        let cell = self.cell_mut(address);
        cell.set(input);
        cell
    }

    pub fn set_cell_value(&mut self, address: CellAddress, value: CellValue) -> &mut Cell {
        let cell = self.cell_mut(address);
        cell.value = value;
        cell
    }

    pub fn set_format(&mut self, address: CellAddress, format: NumberFormat) {
        self.cell_mut(address).format = Some(format);
    }

    pub fn set_comment(&mut self, address: CellAddress, comment: impl Into<String>) {
        self.cell_mut(address).comment = Some(comment.into());
    }

    pub fn get_cell(&self, address: CellAddress) -> Option<&Cell> {
        self.cells.get(&(address.row, address.col))
    }

    /// Existing cell at `address`, or a new blank one.
    pub fn cell_mut(&mut self, address: CellAddress) -> &mut Cell {
        self.cells.entry((address.row, address.col)).or_default()
    }

    /// Cells in row-major order.
    pub fn cells_iter(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        let mut keys: Vec<_> = self.cells.keys().copied().collect();
        keys.sort_unstable();
        keys.into_iter()
            .filter_map(move |(row, col)| {
                self.cells
                    .get(&(row, col))
                    .map(|cell| (CellAddress::new(row, col), cell))
            })
    }
}
