//! Backend persistence for the catalog and the selection.

pub mod cards;

pub use cards::{CardStore, StoreError, CATALOG_FILE, SELECTION_FILE};
