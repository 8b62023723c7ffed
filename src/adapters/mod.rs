//! Infrastructure adapters for external systems.

pub mod embeddings;
pub mod metrics;
pub mod providers;
pub mod sqlite;
