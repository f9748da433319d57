//! User-level configuration source. Workspace files are added by the loader.

pub mod global_file;
