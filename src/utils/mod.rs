//! Cross-cutting utilities.

pub mod fs;

pub use fs::{
    atomic_write, ensure_dir, ensure_parent_dir, read_json_file, read_json_or_default,
    read_text_file, safe_write, write_json_file,
};
