//! GridOT Core - Operational Transformation for shared 2-D grids
//!
//! This crate provides the operation algebra a collaborative spreadsheet
//! needs to keep replicas convergent:
//! - Snapshot and cell value types
//! - Operations built from set / insert / delete components
//! - `create`, `apply`, `compose`, `invert` and `transform`
//! - The [`OtType`] interface an authority can be generic over
//!
//! Everything here is synchronous and pure apart from [`apply`], which
//! mutates the snapshot it is given.

pub mod error;
pub mod grid;
pub mod operation;
pub mod ot;
pub mod snapshot;
pub mod value;

pub use error::{Error, Result};
pub use grid::{apply, compose, create, invert, transform, GridType};
pub use operation::{Component, Operation, SetCell, COMPONENT_TYPES};
pub use ot::{rebase, OtType, Side};
pub use snapshot::{Row, Snapshot};
pub use value::{CellValue, Number};
