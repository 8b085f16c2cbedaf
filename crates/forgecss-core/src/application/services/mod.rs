//! Application services - orchestrate use cases.
//!
//! The only use case is "apply a stylesheet": [`ScaffoldEngine`] walks the
//! syntax tree and reports what it did through [`ScaffoldReport`].

pub mod report;
pub mod scaffold_engine;

pub use report::{Action, ScaffoldReport};
pub use scaffold_engine::{EngineOptions, ScaffoldEngine};
