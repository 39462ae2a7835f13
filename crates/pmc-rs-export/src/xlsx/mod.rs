// crates/pmc-rs-export/src/xlsx/mod.rs
//! Spreadsheet exports.

pub mod anomalies;
pub mod book;
pub mod can;
pub mod sunspec;

pub use book::{Book, Cell, Sheet};
