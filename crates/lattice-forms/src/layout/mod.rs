//! Six-column grid layout of bound properties.
//!
//! Items are placed left to right on a grid of
//! [`GRID_COLUMNS`](lattice_forms_core::GRID_COLUMNS) columns. Each item
//! occupies its [`ColumnSpan`](lattice_forms_core::ColumnSpan); an item that
//! does not fit on the current row starts a new one, and a row that is filled
//! exactly is closed. Items spanning [`ColumnSpan::None`](lattice_forms_core::ColumnSpan::None)
//! are left out.
//!
//! A bound form is laid out twice: the items of each group form a
//! [`Panel`], and the group panels are then placed on an outer grid using
//! each group's span.
//!
//! # Example
//!
//! ```
//! use lattice_forms::layout::GridLayout;
//! use lattice_forms_core::ColumnSpan;
//!
//! let layout = GridLayout::new(30.0);
//! let cells = layout.place([("a", ColumnSpan::Four), ("b", ColumnSpan::Half)]);
//! assert_eq!((cells[1].row, cells[1].column), (1, 0));
//! ```

mod grid;
mod item;

pub use grid::{GridCell, GridLayout, GroupFrame, Panel, PanelCell, PanelContent};
pub use item::PropertyGridItem;
