//! Operation and component types

use crate::snapshot::{Row, Snapshot};
use crate::value::CellValue;
use serde::{Deserialize, Serialize};

/// Wire names of every component kind, in declaration order.
pub const COMPONENT_TYPES: [&str; 5] = ["set", "insertRows", "insertCols", "deleteRows", "deleteCols"];

/// One cell write: `(row, col, old, new)`.
///
/// Serialized as a four element array, e.g. `[5, 0, "a", "b"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetCell(pub usize, pub usize, pub CellValue, pub CellValue);

impl SetCell {
    pub fn new(row: usize, col: usize, old: impl Into<CellValue>, new: impl Into<CellValue>) -> Self {
        SetCell(row, col, old.into(), new.into())
    }

    pub fn row(&self) -> usize {
        self.0
    }

    pub fn col(&self) -> usize {
        self.1
    }

    pub fn old(&self) -> &CellValue {
        &self.2
    }

    pub fn new_value(&self) -> &CellValue {
        &self.3
    }

    /// Same cell, old and new swapped
    pub fn inverted(&self) -> Self {
        SetCell(self.0, self.1, self.3.clone(), self.2.clone())
    }

    pub(crate) fn same_cell(&self, other: &SetCell) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

/// A single atomic edit instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Component {
    /// Replace cell values; every entry is checked against the live value
    Set { cells: Vec<SetCell> },

    /// Insert `count` empty rows before row `index`
    InsertRows { index: usize, count: usize },

    /// Insert `count` empty cells into every row at column `index`
    InsertCols { index: usize, count: usize },

    /// Remove `count` rows from `index`. `data` holds the removed rows.
    DeleteRows {
        index: usize,
        count: usize,
        #[serde(default)]
        data: Vec<Row>,
    },

    /// Remove `count` columns from `index`. `data` is column-major:
    /// `data[k][r]` is the value column `index + k` held in row `r`.
    DeleteCols {
        index: usize,
        count: usize,
        #[serde(default)]
        data: Vec<Vec<CellValue>>,
    },
}

impl Component {
    /// Wire name of this component kind
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Set { .. } => COMPONENT_TYPES[0],
            Component::InsertRows { .. } => COMPONENT_TYPES[1],
            Component::InsertCols { .. } => COMPONENT_TYPES[2],
            Component::DeleteRows { .. } => COMPONENT_TYPES[3],
            Component::DeleteCols { .. } => COMPONENT_TYPES[4],
        }
    }

    /// Whether applying this component can leave the grid untouched
    pub fn is_noop(&self) -> bool {
        match self {
            Component::Set { cells } => cells.is_empty(),
            Component::InsertRows { count, .. }
            | Component::InsertCols { count, .. }
            | Component::DeleteRows { count, .. }
            | Component::DeleteCols { count, .. } => *count == 0,
        }
    }
}

/// An ordered list of components forming one logical edit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operation {
    components: Vec<Component>,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_components(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Single `Set` component
    pub fn set(cells: impl IntoIterator<Item = SetCell>) -> Self {
        Self::from_components(vec![Component::Set {
            cells: cells.into_iter().collect(),
        }])
    }

    pub fn insert_rows(index: usize, count: usize) -> Self {
        Self::from_components(vec![Component::InsertRows { index, count }])
    }

    pub fn insert_cols(index: usize, count: usize) -> Self {
        Self::from_components(vec![Component::InsertCols { index, count }])
    }

    /// Delete rows, capturing their current content from `snapshot` so the
    /// operation can later be inverted.
    pub fn delete_rows_from(snapshot: &Snapshot, index: usize, count: usize) -> Self {
        let rows = snapshot.rows();
        let start = index.min(rows.len());
        let end = index.saturating_add(count).min(rows.len());
        let data = rows[start..end].to_vec();

        Self::from_components(vec![Component::DeleteRows { index, count, data }])
    }

    /// Delete columns, capturing the removed cells column-major.
    pub fn delete_cols_from(snapshot: &Snapshot, index: usize, count: usize) -> Self {
        let data = (index..index.saturating_add(count))
            .map(|col| {
                snapshot
                    .rows()
                    .iter()
                    .map(|row| row.get(col).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Self::from_components(vec![Component::DeleteCols { index, count, data }])
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn into_components(self) -> Vec<Component> {
        self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// True when applying the operation cannot change any snapshot
    pub fn is_noop(&self) -> bool {
        self.components.iter().all(Component::is_noop)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    /// Append a component, merging consecutive `Set` components into one.
    /// Empty `Set` components are dropped.
    pub fn push(&mut self, component: Component) {
        if let Component::Set { cells } = component {
            if cells.is_empty() {
                return;
            }
            if let Some(Component::Set { cells: last }) = self.components.last_mut() {
                last.extend(cells);
                return;
            }
            self.components.push(Component::Set { cells });
            return;
        }
        self.components.push(component);
    }
}

impl From<Vec<Component>> for Operation {
    fn from(components: Vec<Component>) -> Self {
        Self::from_components(components)
    }
}

impl FromIterator<Component> for Operation {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        let mut op = Operation::new();
        for component in iter {
            op.push(component);
        }
        op
    }
}

impl IntoIterator for Operation {
    type Item = Component;
    type IntoIter = std::vec::IntoIter<Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.into_iter()
    }
}

impl<'a> IntoIterator for &'a Operation {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_merges_adjacent_sets() {
        let mut op = Operation::set([SetCell::new(0, 0, CellValue::Null, "a")]);
        op.push(Component::Set {
            cells: vec![SetCell::new(1, 1, CellValue::Null, "b")],
        });
        assert_eq!(op.len(), 1);

        op.push(Component::InsertRows { index: 0, count: 1 });
        op.push(Component::Set {
            cells: vec![SetCell::new(0, 0, CellValue::Null, "c")],
        });
        assert_eq!(op.len(), 3);
        assert!(matches!(&op.components()[0], Component::Set { cells } if cells.len() == 2));
    }

    #[test]
    fn test_push_skips_empty_set() {
        let mut op = Operation::insert_rows(0, 1);
        op.push(Component::Set { cells: vec![] });
        assert_eq!(op.len(), 1);
    }

    #[test]
    fn test_delete_rows_captures_data() {
        let snapshot = Snapshot::from_rows(vec![
            vec!["a".into(), "b".into()],
            vec!["c".into(), "d".into()],
            vec!["e".into(), "f".into()],
        ]);
        let op = Operation::delete_rows_from(&snapshot, 1, 5);

        match &op.components()[0] {
            Component::DeleteRows { index, count, data } => {
                assert_eq!((*index, *count), (1, 5));
                assert_eq!(data, &snapshot.rows()[1..].to_vec());
            }
            other => panic!("unexpected component {:?}", other),
        }
    }

    #[test]
    fn test_delete_cols_captures_column_major() {
        let snapshot = Snapshot::from_rows(vec![
            vec![1i64.into(), 2i64.into(), 3i64.into()],
            vec![4i64.into()],
        ]);
        let op = Operation::delete_cols_from(&snapshot, 1, 2);

        let expected = vec![
            vec![CellValue::from(2i64), CellValue::Null],
            vec![CellValue::from(3i64), CellValue::Null],
        ];
        assert!(matches!(&op.components()[0], Component::DeleteCols { data, .. } if *data == expected));
    }

    #[test]
    fn test_wire_shape() {
        let op = Operation::from_components(vec![
            Component::Set {
                cells: vec![SetCell::new(5, 0, "a", "b")],
            },
            Component::InsertRows { index: 2, count: 3 },
        ]);
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"set","cells":[[5,0,"a","b"]]},{"type":"insertRows","index":2,"count":3}]"#
        );
        assert_eq!(serde_json::from_str::<Operation>(&json).unwrap(), op);
    }

    #[test]
    fn test_noop_detection() {
        assert!(Operation::new().is_noop());
        assert!(Operation::insert_cols(3, 0).is_noop());
        assert!(!Operation::insert_cols(3, 1).is_noop());
    }
}
