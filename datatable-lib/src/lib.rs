//! Headless data table engine
//!
//! Filtering, sorting, selection, column visibility, row expansion, keyboard
//! navigation, infinite scroll and export for in-memory rows, with no
//! rendering attached.

pub mod actions;
pub mod error;
pub mod expansion;
pub mod export;
pub mod filter;
pub mod keyboard;
pub mod model;
pub mod options;
pub mod scroll;
pub mod selection;
pub mod sort;
pub mod visibility;

mod builder;
mod table;

pub use builder::*;
pub use table::*;
