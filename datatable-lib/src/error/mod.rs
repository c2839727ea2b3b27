//! Error types

mod export;
mod load;
mod persist;
mod report;
mod table;

pub use export::*;
pub use load::*;
pub use persist::*;
pub use report::*;
pub use table::*;
