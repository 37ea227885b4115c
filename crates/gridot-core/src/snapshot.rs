//! Grid snapshot representation

use crate::value::CellValue;
use serde::{Deserialize, Serialize};

static EMPTY_CELL: CellValue = CellValue::Null;

/// A single row of cells.
pub type Row = Vec<CellValue>;

/// Materialized grid state.
///
/// An ordered list of rows. Rows may have different lengths; a cell past
/// the end of its row reads as [`CellValue::Null`]. Only
/// [`apply`](crate::grid::apply) mutates a snapshot, always through
/// `&mut Snapshot`.
///
/// Trailing empty cells carry no content, so two snapshots are equal when
/// their rows match once trailing `Null`s are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    rows: Vec<Row>,
}

impl Snapshot {
    /// Create an empty grid with no rows
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// A `rows` x `cols` grid of empty cells
    pub fn blank(rows: usize, cols: usize) -> Self {
        Self {
            rows: vec![vec![CellValue::Null; cols]; rows],
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Length of the longest row
    pub fn max_row_len(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Read a cell. Returns `None` only when the row itself does not exist.
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows
            .get(row)
            .map(|cells| cells.get(col).unwrap_or(&EMPTY_CELL))
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.rows.len() == other.rows.len()
            && self
                .rows
                .iter()
                .zip(&other.rows)
                .all(|(a, b)| trim_trailing_nulls(a) == trim_trailing_nulls(b))
    }
}

fn trim_trailing_nulls(cells: &[CellValue]) -> &[CellValue] {
    let end = cells.iter().rposition(|v| !v.is_null()).map_or(0, |i| i + 1);
    &cells[..end]
}

impl From<Vec<Row>> for Snapshot {
    fn from(rows: Vec<Row>) -> Self {
        Self::from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_grid() {
        let snapshot = Snapshot::blank(2, 3);
        assert_eq!(snapshot.row_count(), 2);
        assert_eq!(snapshot.max_row_len(), 3);
        assert_eq!(snapshot.get(1, 2), Some(&CellValue::Null));
    }

    #[test]
    fn test_get_sparse_rows() {
        let snapshot = Snapshot::from_rows(vec![vec!["a".into()], vec![]]);

        assert_eq!(snapshot.get(0, 0), Some(&CellValue::from("a")));
        // past the end of an existing row reads as empty
        assert_eq!(snapshot.get(0, 5), Some(&CellValue::Null));
        assert_eq!(snapshot.get(1, 0), Some(&CellValue::Null));
        assert_eq!(snapshot.get(2, 0), None);
    }

    #[test]
    fn test_equality_ignores_trailing_empty_cells() {
        let short = Snapshot::from_rows(vec![vec!["v".into(), CellValue::Null, "x".into()]]);
        let padded = Snapshot::from_rows(vec![vec![
            "v".into(),
            CellValue::Null,
            "x".into(),
            CellValue::Null,
        ]]);
        assert_eq!(short, padded);
        assert_eq!(Snapshot::from_rows(vec![vec![]]), Snapshot::blank(1, 3));

        // leading empties and row count still matter
        assert_ne!(short, Snapshot::from_rows(vec![vec![CellValue::Null, "v".into(), "x".into()]]));
        assert_ne!(Snapshot::blank(1, 1), Snapshot::blank(2, 1));
    }

    #[test]
    fn test_serializes_as_nested_arrays() {
        let snapshot = Snapshot::from_rows(vec![vec![1i64.into(), CellValue::Null]]);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, "[[1,null]]");
        assert_eq!(serde_json::from_str::<Snapshot>(&json).unwrap(), snapshot);
    }
}
