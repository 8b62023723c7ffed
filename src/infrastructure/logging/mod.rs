//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty stdout formatting
//! - Daily-rolling JSON log files

pub mod logger;

pub use logger::LoggerImpl;
