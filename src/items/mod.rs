//! Work items
//!
//! Organizations, repositories and keywords that a report paginates over,
//! parsed from command-line arguments or item files.

mod parser;
mod types;

pub use parser::{parse_item, parse_items, parse_items_str, read_items};
pub use types::{ItemKind, WorkItem};
