pub mod cache;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod generator;
pub mod llm;
pub mod memory;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{AuditError, AuditResult};
pub use generator::workflow::{launch, run_audit};
