//! Item source: the table and the background task that mutates it

mod mutator;
mod table;

pub use mutator::{run_cycle, run_mutator};
pub use table::SourceTable;
