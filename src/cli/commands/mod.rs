//! CLI command implementations.

pub mod analyze;
pub mod extract;
pub mod knowledge;
pub mod route;
pub mod suggestions;
