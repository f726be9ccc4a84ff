//! Analytics table engine. Loads denormalized metric rows, pivots them over
//! chosen dimensions, then filters, sorts and pages the result for display.

pub mod columns;
pub mod loader;
pub mod pivot;
pub mod table;

pub use columns::{Column, ColumnLayout, Dimension, Metric};
pub use loader::load_rows;
pub use pivot::pivot;
pub use table::{build_table, facet_values, ColumnFilter, SortKey, TableQuery, TableView};
