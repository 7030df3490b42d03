//! Table grids reconstructed from cell lists.

use super::Element;
use serde::Serialize;
use serde_json::Value;

/// Grid rows past this bound are not materialized.
pub const MAX_TABLE_ROWS: usize = 10_000;

/// Grid columns past this bound are not materialized.
pub const MAX_TABLE_COLUMNS: usize = 1_000;

/// A positioned table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCell {
    /// Zero-based row index
    pub row: usize,

    /// Zero-based column index
    pub col: usize,

    /// Number of rows this cell spans
    pub rowspan: usize,

    /// Number of columns this cell spans
    pub colspan: usize,

    /// Cell text
    pub text: String,
}

impl TableCell {
    /// Create a single-span cell.
    pub fn new(row: usize, col: usize, text: impl Into<String>) -> Self {
        Self {
            row,
            col,
            rowspan: 1,
            colspan: 1,
            text: text.into(),
        }
    }

    /// Set rowspan and return self.
    pub fn rowspan(mut self, span: usize) -> Self {
        self.rowspan = span.max(1);
        self
    }

    /// Set colspan and return self.
    pub fn colspan(mut self, span: usize) -> Self {
        self.colspan = span.max(1);
        self
    }

    /// Read a cell from either the flat `row`/`col` form or the engine's
    /// offset form (`start_row_offset_idx`, `end_row_offset_idx`, ...).
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let num = |key: &str| {
            obj.get(key)
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
        };

        let text = obj
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        if let (Some(row), Some(col)) = (num("row"), num("col")) {
            let cell = Self::new(row, col, text)
                .rowspan(num("rowspan").unwrap_or(1))
                .colspan(num("colspan").unwrap_or(1));
            return Some(cell);
        }

        let row = num("start_row_offset_idx")?;
        let col = num("start_col_offset_idx")?;
        let rowspan = num("row_span")
            .or_else(|| num("end_row_offset_idx").map(|end| end.saturating_sub(row)))
            .unwrap_or(1);
        let colspan = num("col_span")
            .or_else(|| num("end_col_offset_idx").map(|end| end.saturating_sub(col)))
            .unwrap_or(1);

        Some(Self::new(row, col, text).rowspan(rowspan).colspan(colspan))
    }

    /// End row and end column of the cell, or `None` past the grid limits.
    fn extent(&self) -> Option<(usize, usize)> {
        let end_row = self
            .row
            .checked_add(self.rowspan)
            .filter(|&end| end <= MAX_TABLE_ROWS)?;
        let end_col = self
            .col
            .checked_add(self.colspan)
            .filter(|&end| end <= MAX_TABLE_COLUMNS)?;
        Some((end_row, end_col))
    }
}

/// A rectangular grid of cell texts.
///
/// Spanned cells repeat their text in every slot they cover.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableGrid {
    rows: Vec<Vec<String>>,

    #[serde(skip)]
    skipped: usize,
}

impl TableGrid {
    /// Build a grid from positioned cells.
    ///
    /// Cells reaching past [`MAX_TABLE_ROWS`] or [`MAX_TABLE_COLUMNS`] are
    /// left out and counted in [`skipped_cells`](Self::skipped_cells).
    pub fn from_cells(cells: &[TableCell]) -> Self {
        let mut placed = Vec::with_capacity(cells.len());
        let (mut row_count, mut col_count, mut skipped) = (0, 0, 0);
        for cell in cells {
            match cell.extent() {
                Some((end_row, end_col)) => {
                    row_count = row_count.max(end_row);
                    col_count = col_count.max(end_col);
                    placed.push(cell);
                }
                None => skipped += 1,
            }
        }

        let mut rows = vec![vec![String::new(); col_count]; row_count];
        for cell in placed {
            for row in rows.iter_mut().skip(cell.row).take(cell.rowspan) {
                for slot in row.iter_mut().skip(cell.col).take(cell.colspan) {
                    slot.clone_from(&cell.text);
                }
            }
        }

        Self { rows, skipped }
    }

    /// Build a grid from a table element's `cells` or `data.table_cells`.
    ///
    /// Returns `None` when the element carries no cell list.
    pub fn from_element(element: &Element) -> Option<Self> {
        let cells = element
            .attrs
            .get("cells")
            .or_else(|| element.get_path(&["data", "table_cells"]))
            .and_then(Value::as_array)?;

        let cells: Vec<TableCell> = cells.iter().filter_map(TableCell::from_value).collect();
        if cells.is_empty() {
            log::debug!("Table {} has no readable cells", element.id);
        }
        let grid = Self::from_cells(&cells);
        if grid.skipped > 0 {
            log::warn!(
                "Table {}: {} cells outside the grid limits dropped",
                element.id,
                grid.skipped
            );
        }
        Some(grid)
    }

    /// Number of cells dropped for lying outside the grid limits.
    pub fn skipped_cells(&self) -> usize {
        self.skipped
    }

    /// Get the rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Check if the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get plain text: cells joined by tabs, rows by newlines.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
