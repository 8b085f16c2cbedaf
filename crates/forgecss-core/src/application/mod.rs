//! Application layer for ForgeCSS.
//!
//! This layer contains:
//! - **Services**: The scaffolding engine and its report
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer drives the domain layer but contains no language
//! rules itself. Parsing, scoping and evaluation live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{Action, EngineOptions, ScaffoldEngine, ScaffoldReport};

// Re-export port traits (for adapter implementation)
pub use ports::{CommandOutput, CommandRunner, Filesystem, TemplateRenderer};

pub use error::ApplicationError;
