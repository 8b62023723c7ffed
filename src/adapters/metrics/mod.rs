//! Store metrics sources.

pub mod json_file;

pub use json_file::JsonFileMetricsProvider;
