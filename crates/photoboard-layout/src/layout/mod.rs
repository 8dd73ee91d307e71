//! The layout engine: top-down subdivision of a page rectangle into
//! margin bands, header/footer, the sets grid and each set's
//! photo/text split. Idempotent: re-running with the same input
//! rectangle reproduces the same output, which keeps the capped-DPI
//! preview and the full-DPI print pass consistent.

mod grid;
mod page;
mod set;

pub(crate) use grid::{custom_cells, grid_cells};
