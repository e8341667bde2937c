//! Extractors shipped with the core crate.

pub mod csv;

pub use self::csv::{CsvExtractor, CsvExtractorConfig};
