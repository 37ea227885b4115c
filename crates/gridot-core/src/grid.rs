//! The grid OT type: apply, compose, invert and transform over grid operations

use crate::error::{Error, Result};
use crate::operation::{Component, Operation, SetCell};
use crate::ot::{OtType, Side};
use crate::snapshot::Snapshot;
use crate::value::CellValue;
use std::collections::HashSet;
use std::iter;
use std::ops::Range;
use tracing::{debug, trace};

/// Marker type implementing [`OtType`] for 2-D grids
#[derive(Debug, Clone, Copy, Default)]
pub struct GridType;

impl OtType for GridType {
    type Snapshot = Snapshot;
    type Op = Operation;

    const NAME: &'static str = "grid";

    fn create(initial: Option<&Snapshot>) -> Snapshot {
        create(initial)
    }

    fn apply(snapshot: &mut Snapshot, op: &Operation) -> Result<()> {
        apply(snapshot, op)
    }

    fn compose(a: &Operation, b: &Operation) -> Operation {
        compose(a, b)
    }

    fn invert(op: &Operation) -> Operation {
        invert(op)
    }

    fn transform(op: &Operation, other: &Operation, side: Side) -> Operation {
        transform(op, other, side)
    }
}

/// Deep copy of `initial`, or an empty grid
pub fn create(initial: Option<&Snapshot>) -> Snapshot {
    initial.cloned().unwrap_or_default()
}

/// Apply `op` to `snapshot` in place.
///
/// Components run in order. A failing component leaves the effects of the
/// components before it in place; copy the snapshot first if the operation
/// might not apply.
pub fn apply(snapshot: &mut Snapshot, op: &Operation) -> Result<()> {
    for component in op {
        apply_component(snapshot, component)?;
    }
    Ok(())
}

fn apply_component(snapshot: &mut Snapshot, component: &Component) -> Result<()> {
    match component {
        Component::Set { cells } => {
            for cell in cells {
                apply_set(snapshot, cell)?;
            }
        }
        Component::InsertRows { index, count } => {
            let width = snapshot.max_row_len();
            let rows = snapshot.rows_mut();
            let at = (*index).min(rows.len());
            let blank = iter::repeat_with(|| vec![CellValue::Null; width]).take(*count);
            rows.splice(at..at, blank);
        }
        Component::InsertCols { index, count } => {
            for row in snapshot.rows_mut() {
                insert_nulls(row, *index, *count);
            }
        }
        Component::DeleteRows { index, count, .. } => {
            let rows = snapshot.rows_mut();
            let range = clamp(*index, *count, rows.len());
            rows.drain(range);
        }
        Component::DeleteCols { index, count, .. } => {
            for row in snapshot.rows_mut() {
                let range = clamp(*index, *count, row.len());
                row.drain(range);
            }
        }
    }
    Ok(())
}

fn apply_set(snapshot: &mut Snapshot, SetCell(row, col, old, new): &SetCell) -> Result<()> {
    let current = snapshot.get(*row, *col).ok_or_else(|| {
        debug!(row, col, "Set targets a missing row");
        Error::Apply {
            row: *row,
            col: *col,
            reason: "row does not exist".into(),
        }
    })?;

    if current != old {
        debug!(row, col, expected = %old, found = %current, "Set precondition failed");
        return Err(Error::Apply {
            row: *row,
            col: *col,
            reason: format!("expected {}, found {}", old, current),
        });
    }

    let cells = &mut snapshot.rows_mut()[*row];
    if *col >= cells.len() {
        cells.resize(col + 1, CellValue::Null);
    }
    cells[*col] = new.clone();
    Ok(())
}

/// Splice `count` empty cells at `index` if `cells` reaches that far.
/// Shorter rows are left alone.
fn insert_nulls(cells: &mut Vec<CellValue>, index: usize, count: usize) {
    if cells.len() >= index {
        cells.splice(index..index, iter::repeat(CellValue::Null).take(count));
    }
}

fn clamp(index: usize, count: usize, len: usize) -> Range<usize> {
    index.min(len)..index.saturating_add(count).min(len)
}

/// Operation equivalent to applying `op1` and then `op2`
pub fn compose(op1: &Operation, op2: &Operation) -> Operation {
    let mut composed = op1.clone();
    for component in op2 {
        composed.push(component.clone());
    }
    composed
}

/// Operation undoing `op`, given that `op` was the last one applied.
///
/// Components are inverted last to first. Deletes are undone by an insert
/// followed by a `Set` restoring the content kept in their `data`.
pub fn invert(op: &Operation) -> Operation {
    let mut inverted = Operation::new();

    for component in op.iter().rev() {
        match component {
            Component::Set { cells } => {
                inverted.push(Component::Set {
                    cells: cells.iter().rev().map(SetCell::inverted).collect(),
                });
            }
            Component::InsertRows { index, count } => {
                inverted.push(Component::DeleteRows {
                    index: *index,
                    count: *count,
                    data: vec![Vec::new(); *count],
                });
            }
            Component::InsertCols { index, count } => {
                inverted.push(Component::DeleteCols {
                    index: *index,
                    count: *count,
                    data: vec![Vec::new(); *count],
                });
            }
            Component::DeleteRows { index, count, data } => {
                inverted.push(Component::InsertRows {
                    index: *index,
                    count: *count,
                });
                let cells = data.iter().enumerate().flat_map(|(k, row)| {
                    row.iter()
                        .enumerate()
                        .map(move |(col, value)| SetCell(index + k, col, CellValue::Null, value.clone()))
                });
                inverted.push(Component::Set {
                    cells: cells.collect(),
                });
            }
            Component::DeleteCols { index, count, data } => {
                inverted.push(Component::InsertCols {
                    index: *index,
                    count: *count,
                });
                // reinserted columns are already empty
                let cells = data.iter().enumerate().flat_map(|(k, column)| {
                    column
                        .iter()
                        .enumerate()
                        .filter(|(_, value)| !value.is_null())
                        .map(move |(row, value)| SetCell(row, index + k, CellValue::Null, value.clone()))
                });
                inverted.push(Component::Set {
                    cells: cells.collect(),
                });
            }
        }
    }

    inverted
}

/// Rebase `op` so it applies after `other`.
///
/// Both operations must have been generated against the same snapshot.
/// Each component of `op` is transformed against every component of
/// `other` in turn, and `other` is carried past that component so the next
/// one meets it in the same frame. Components emptied along the way are
/// dropped.
pub fn transform(op: &Operation, other: &Operation, side: Side) -> Operation {
    let mut theirs = other.components().to_vec();
    let mut transformed = Operation::new();

    for component in op {
        let mut rebased = component.clone();
        for against in theirs.iter_mut() {
            let carried = transform_component(against.clone(), &rebased, side.opposite());
            rebased = transform_component(rebased, against, side);
            *against = carried;
        }
        if !rebased.is_noop() {
            transformed.push(rebased);
        }
    }

    trace!(
        side = %side,
        before = op.len(),
        after = transformed.len(),
        "Transformed operation"
    );
    transformed
}

fn transform_component(component: Component, against: &Component, side: Side) -> Component {
    match component {
        Component::Set { mut cells } => {
            transform_cells(&mut cells, against, side);
            Component::Set { cells }
        }
        Component::InsertRows { index, count } => Component::InsertRows {
            index: shift_insert(index, row_edit(against)),
            count,
        },
        Component::InsertCols { index, count } => Component::InsertCols {
            index: shift_insert(index, col_edit(against)),
            count,
        },
        Component::DeleteRows { index, count, mut data } => {
            track_deleted_rows(&mut data, index, against);
            let (index, count) = rebase_delete(index, count, &mut data, row_edit(against));
            Component::DeleteRows { index, count, data }
        }
        Component::DeleteCols { index, count, mut data } => {
            track_deleted_cols(&mut data, index, against);
            let (index, count) = rebase_delete(index, count, &mut data, col_edit(against));
            Component::DeleteCols { index, count, data }
        }
    }
}

fn transform_cells(cells: &mut Vec<SetCell>, against: &Component, side: Side) {
    match against {
        Component::Set { cells: theirs } => match side {
            Side::Left => {
                let mut seen = HashSet::new();
                for cell in cells.iter_mut() {
                    // repeated writes build on this operation's own earlier write
                    let (row, col) = (cell.0, cell.1);
                    if !seen.insert((row, col)) {
                        continue;
                    }
                    // their last write to a cell is what the snapshot holds
                    if let Some(their) = theirs.iter().rev().find(|t| t.0 == row && t.1 == col) {
                        cell.2 = their.3.clone();
                    }
                }
            }
            Side::Right => {
                cells.retain(|cell| {
                    let conflict = theirs.iter().any(|t| t.same_cell(cell));
                    if conflict {
                        debug!(row = cell.0, col = cell.1, "Dropping conflicting write");
                    }
                    !conflict
                });
            }
        },
        Component::InsertRows { index, count } => {
            for cell in cells.iter_mut().filter(|c| c.0 >= *index) {
                cell.0 = cell.0.saturating_add(*count);
            }
        }
        Component::InsertCols { index, count } => {
            for cell in cells.iter_mut().filter(|c| c.1 >= *index) {
                cell.1 = cell.1.saturating_add(*count);
            }
        }
        Component::DeleteRows { index, count, .. } => {
            let end = index.saturating_add(*count);
            cells.retain(|c| !(*index..end).contains(&c.0));
            for cell in cells.iter_mut().filter(|c| c.0 >= end) {
                cell.0 -= count;
            }
        }
        Component::DeleteCols { index, count, .. } => {
            let end = index.saturating_add(*count);
            cells.retain(|c| !(*index..end).contains(&c.1));
            for cell in cells.iter_mut().filter(|c| c.1 >= end) {
                cell.1 -= count;
            }
        }
    }
}

/// A structural edit seen along one axis
#[derive(Debug, Clone, Copy)]
enum AxisEdit {
    Insert { at: usize, count: usize },
    Delete { at: usize, count: usize },
}

fn row_edit(component: &Component) -> Option<AxisEdit> {
    match component {
        Component::InsertRows { index, count } => Some(AxisEdit::Insert { at: *index, count: *count }),
        Component::DeleteRows { index, count, .. } => Some(AxisEdit::Delete { at: *index, count: *count }),
        _ => None,
    }
}

fn col_edit(component: &Component) -> Option<AxisEdit> {
    match component {
        Component::InsertCols { index, count } => Some(AxisEdit::Insert { at: *index, count: *count }),
        Component::DeleteCols { index, count, .. } => Some(AxisEdit::Delete { at: *index, count: *count }),
        _ => None,
    }
}

/// Shift an insert past a concurrent edit on the same axis.
/// Only moves when the other edit ends strictly before `index`.
fn shift_insert(index: usize, edit: Option<AxisEdit>) -> usize {
    match edit {
        Some(AxisEdit::Insert { at, count }) if at.saturating_add(count) < index => index.saturating_add(count),
        Some(AxisEdit::Delete { at, count }) if at.saturating_add(count) < index => index - count,
        _ => index,
    }
}

/// Rebase a delete of `count` lines at `index` past a concurrent edit on the
/// same axis. Lines the other side already deleted leave the range, and
/// their entries leave `data`.
fn rebase_delete(
    index: usize,
    count: usize,
    data: &mut Vec<Vec<CellValue>>,
    edit: Option<AxisEdit>,
) -> (usize, usize) {
    match edit {
        Some(AxisEdit::Insert { at, count: inserted }) if at <= index => {
            (index.saturating_add(inserted), count)
        }
        Some(AxisEdit::Delete { at, count: removed }) => {
            let end = index.saturating_add(count);
            let their_end = at.saturating_add(removed);
            let overlap = index.max(at)..end.min(their_end);
            let shared = overlap.len();

            if shared > 0 {
                let from = (overlap.start - index).min(data.len());
                let to = (overlap.end - index).min(data.len());
                data.drain(from..to);
            }

            let index = if index < at {
                index
            } else if index >= their_end {
                index - removed
            } else {
                at
            };
            (index, count - shared)
        }
        // TODO: an insert landing strictly inside the deleted range would
        // need the delete split in two
        _ => (index, count),
    }
}

/// Keep the content recorded by a row delete in step with a concurrent
/// edit, so inverting the delete restores what it actually removed.
fn track_deleted_rows(data: &mut [Vec<CellValue>], index: usize, against: &Component) {
    match against {
        Component::Set { cells } => {
            for SetCell(row, col, _, new) in cells {
                let Some(removed) = row.checked_sub(index).and_then(|k| data.get_mut(k)) else {
                    continue;
                };
                let Some(len) = col.checked_add(1) else {
                    continue;
                };
                if removed.len() < len {
                    removed.resize(len, CellValue::Null);
                }
                removed[*col] = new.clone();
            }
        }
        Component::InsertCols { index: at, count } => {
            for removed in data.iter_mut() {
                insert_nulls(removed, *at, *count);
            }
        }
        Component::DeleteCols { index: at, count, .. } => {
            for removed in data.iter_mut() {
                let range = clamp(*at, *count, removed.len());
                removed.drain(range);
            }
        }
        Component::InsertRows { .. } | Component::DeleteRows { .. } => {}
    }
}

fn track_deleted_cols(data: &mut [Vec<CellValue>], index: usize, against: &Component) {
    match against {
        Component::Set { cells } => {
            for SetCell(row, col, _, new) in cells {
                let slot = col
                    .checked_sub(index)
                    .and_then(|k| data.get_mut(k))
                    .and_then(|column| column.get_mut(*row));
                if let Some(slot) = slot {
                    *slot = new.clone();
                }
            }
        }
        Component::InsertRows { index: at, count } => {
            for column in data.iter_mut() {
                let at = (*at).min(column.len());
                column.splice(at..at, iter::repeat(CellValue::Null).take(*count));
            }
        }
        Component::DeleteRows { index: at, count, .. } => {
            for column in data.iter_mut() {
                let range = clamp(*at, *count, column.len());
                column.drain(range);
            }
        }
        Component::InsertCols { .. } | Component::DeleteCols { .. } => {}
    }
}
