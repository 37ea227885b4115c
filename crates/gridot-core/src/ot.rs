//! The OT type interface and transform tie-break side

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Position of an operation relative to a concurrent one in the
/// authority's serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The transformed operation was serialized first; its writes win.
    Left,
    /// The transformed operation was serialized second; conflicting writes are dropped.
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = Error;

    /// Only the exact strings `left` and `right` are accepted.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(Error::InvalidSide(s.to_string())),
        }
    }
}

/// The functions an OT synchronization protocol needs from a document type.
///
/// Implementations are stateless: every function is pure given its inputs,
/// except that `apply` mutates the snapshot it is handed.
pub trait OtType {
    type Snapshot: Clone;
    type Op: Clone;

    /// Stable type name, exchanged with the authority
    const NAME: &'static str;

    /// Deep copy of `initial`, or the empty document
    fn create(initial: Option<&Self::Snapshot>) -> Self::Snapshot;

    fn apply(snapshot: &mut Self::Snapshot, op: &Self::Op) -> Result<()>;

    /// Operation equivalent to `a` followed by `b`
    fn compose(a: &Self::Op, b: &Self::Op) -> Self::Op;

    /// Operation undoing `op`, assuming `op` was the last one applied
    fn invert(op: &Self::Op) -> Self::Op;

    /// Rebase `op` onto `other`; both must share a base snapshot
    fn transform(op: &Self::Op, other: &Self::Op, side: Side) -> Self::Op;
}

/// Transform `op` past every operation in `history`, in order.
///
/// `op` must have been generated against the snapshot `history[0]` was
/// applied to, and `history` must be in serialization order.
pub fn rebase<T: OtType>(op: &T::Op, history: &[T::Op], side: Side) -> T::Op {
    history
        .iter()
        .fold(op.clone(), |acc, other| T::transform(&acc, other, side))
}
