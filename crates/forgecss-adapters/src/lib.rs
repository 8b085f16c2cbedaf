//! Infrastructure adapters for ForgeCSS.
//!
//! This crate implements the ports defined in `forgecss-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod command;
pub mod filesystem;
pub mod renderer;

// Re-export commonly used adapters
pub use command::{ProcessRunner, RecordingRunner};
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use renderer::{DirectoryRenderer, SimpleRenderer};
