//! Feed loading and normalization
//!
//! The inventory and roster feeds are delimited text files edited outside
//! this system. Reads are tolerant: a missing or unreadable file is an empty
//! table, never an error.

pub mod columns;
pub mod loader;

pub use columns::{parse_lenient_int, ColumnMap};
pub use loader::{
    backup_file, file_mtime, load_names, parse_table, read_table, resolve_path, restore_backup,
    write_table, FeedTable,
};
pub use shared::normalize_date;
