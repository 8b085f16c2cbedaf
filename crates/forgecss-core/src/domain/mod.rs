// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for ForgeCSS.
//!
//! This module contains the language itself with no I/O: the grammar, the
//! syntax tree, runtime values, scoping and expression evaluation. All
//! filesystem, process and templating concerns are reached through ports
//! defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Immutable syntax**: A parsed `Stylesheet` never changes
//! - **Closed variants**: AST and values are enums matched exhaustively
//!
pub mod ast;
pub mod command;
pub mod error;
pub mod eval;
pub mod file_context;
pub mod parser;
pub mod scope;
pub mod value;

// Re-exports for convenience
pub use ast::{
    BinaryOp, Declaration, ExecRule, Expr, ForeachRule, IfRule, Interpolation, MixinDecl,
    MixinInclude, PathSegment, RootRule, Rule, Selector, Statement, StringLiteral, Stylesheet,
    UnaryOp,
};
pub use error::{DomainError, ErrorCategory};
pub use file_context::{FileContext, FileSource, WriteMode};
pub use parser::{ParseError, parse};
pub use scope::{ResolvedMixin, ScopeHandle, ScopeStack};
pub use value::Value;
