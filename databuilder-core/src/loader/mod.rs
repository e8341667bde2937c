//! Loaders shipped with the core crate.

pub mod fs_csv;

pub use fs_csv::{FsGraphCsvLoader, FsGraphCsvLoaderConfig};
