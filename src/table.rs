//! Plain text tables used by the text output of list-like commands.
use std::{fmt::Display, iter};

/// Space between two columns.
const COLUMN_PADDING: usize = 3;

/// Rows of cells aligned on the widest cell of each column.
///
/// The last column is not padded so lines don't end with spaces.
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Column name and the function extracting the cell of an item.
pub type TableColumn<T> = (&'static str, fn(&T) -> String);

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    pub fn from_items<'a, I, T>(items: I, columns: &[TableColumn<T>]) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let header = columns.iter().map(|(name, _)| name.to_string()).collect();
        let rows = items
            .into_iter()
            .map(|item| columns.iter().map(|(_, cell)| cell(item)).collect())
            .collect();

        Self::new(header, rows)
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.header.len()];
        for row in iter::once(&self.header).chain(&self.rows) {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let widths = self.column_widths();

        for (index, row) in iter::once(&self.header).chain(&self.rows).enumerate() {
            if index > 0 {
                writeln!(f)?;
            }

            let last = row.len().saturating_sub(1);
            for (column, (cell, width)) in row.iter().zip(&widths).enumerate() {
                if column == last {
                    write!(f, "{cell}")?;
                } else {
                    write!(f, "{cell:<width$}", width = width + COLUMN_PADDING)?;
                }
            }
        }

        Ok(())
    }
}
