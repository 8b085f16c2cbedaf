//! ForgeCSS Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for ForgeCSS, a
//! CSS-flavoured language for describing directory trees, generated files and
//! setup commands, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          forgecss-cli (CLI)             │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │     (ScaffoldEngine, ScaffoldReport)    │
//! │       Walks the tree, calls ports       │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │ (Filesystem, CommandRunner, Renderer)   │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   forgecss-adapters (Infrastructure)    │
//! │ (LocalFilesystem, ProcessRunner, etc)   │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │  (Parser, AST, ScopeStack, Evaluation)  │
//! │          No External Effects            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forgecss_core::prelude::*;
//!
//! // 1. Parse
//! let sheet = parse(r#"./src/ { main.rs { content: "fn main() {}"; } }"#)?;
//!
//! // 2. Run with injected adapters
//! let engine = ScaffoldEngine::new(filesystem, runner, renderer, EngineOptions::default());
//! let report = engine.run(&sheet)?;
//! println!("{} writes", report.writes());
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        Action, ApplicationError, EngineOptions, ScaffoldEngine, ScaffoldReport,
        ports::{CommandOutput, CommandRunner, Filesystem, TemplateRenderer},
    };
    pub use crate::domain::{DomainError, ParseError, Statement, Stylesheet, Value, WriteMode, parse};
    pub use crate::error::{ErrorCategory, ForgeError, ForgeResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
