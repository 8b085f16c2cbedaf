//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `forgecss-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by the engine, implemented by infrastructure
//!   - `Filesystem`: Directory and file operations
//!   - `CommandRunner`: Allow-listed process execution
//!   - `TemplateRenderer`: Named template rendering
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (`ScaffoldEngine::run`, driven by the CLI)

pub mod output;

pub use output::{CommandOutput, CommandRunner, Filesystem, TemplateRenderer};

#[cfg(test)]
pub use output::{MockCommandRunner, MockFilesystem, MockTemplateRenderer};
