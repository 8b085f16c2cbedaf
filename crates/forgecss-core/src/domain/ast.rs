//! Abstract syntax tree for ForgeCSS programs.
//!
//! The parser produces a [`Stylesheet`]; the scaffolding engine walks it.
//! Every node is a closed enum or plain struct so consumers match
//! exhaustively. Nodes are immutable once parsed.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

// ── Program ──────────────────────────────────────────────────────────────────

/// A parsed program: statements in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stylesheet {
    pub statements: Vec<Statement>,
}

impl Stylesheet {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A single statement. Document order is a correctness invariant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    Rule(Rule),
    Declaration(Declaration),
    If(IfRule),
    Foreach(ForeachRule),
    Exec(ExecRule),
    Mixin(MixinDecl),
    Include(MixinInclude),
    Root(RootRule),
}

impl Statement {
    /// Short keyword used in logs and outlines.
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Rule(rule) => match rule.selector {
                Selector::Path(_) => "directory",
                Selector::File(_) => "file",
            },
            Self::Declaration(_) => "declaration",
            Self::If(_) => "@if",
            Self::Foreach(_) => "@foreach",
            Self::Exec(_) => "@exec",
            Self::Mixin(_) => "@mixin",
            Self::Include(_) => "@include",
            Self::Root(_) => ":root",
        }
    }
}

/// `selector { body }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub selector: Selector,
    pub body: Vec<Statement>,
}

/// `name: value;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub value: Expr,
}

/// `@if cond { ... } @else { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfRule {
    pub condition: Expr,
    pub then_branch: Vec<Statement>,
    pub else_branch: Option<Vec<Statement>>,
}

/// `@foreach $item in seq { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeachRule {
    pub variable: String,
    pub sequence: Expr,
    pub body: Vec<Statement>,
}

/// `@exec cmd [at dir] [timeout secs];`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecRule {
    pub command: Expr,
    pub working_directory: Option<Expr>,
    pub timeout: Option<Expr>,
}

/// `@mixin name(a, b) { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixinDecl {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Vec<Statement>,
}

/// `@include name(x, y);`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixinInclude {
    pub name: String,
    pub arguments: Vec<Expr>,
}

/// `:root { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootRule {
    pub body: Vec<Statement>,
}

// ── Selectors ────────────────────────────────────────────────────────────────

/// What a rule body describes: a directory or a single file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "segments", rename_all = "snake_case")]
pub enum Selector {
    Path(Vec<PathSegment>),
    File(Vec<PathSegment>),
}

impl Selector {
    pub fn segments(&self) -> &[PathSegment] {
        match self {
            Self::Path(segments) | Self::File(segments) => segments,
        }
    }

    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

/// A piece of selector text. Pieces are concatenated before the result is
/// split on `/`, so `${name}.cs` is an interpolation followed by `.cs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    Literal(String),
    Interpolated(Expr),
}

// ── Expressions ──────────────────────────────────────────────────────────────

/// A value expression, resolved by the evaluator at execution time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    String(StringLiteral),
    Number(f64),
    Bool(bool),
    Null,
    Array(Vec<Expr>),
    Object(IndexMap<String, Expr>),
    /// `var(name)`, `$name` or a bare `name`.
    Var(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Convenience constructor for a string without interpolation.
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(StringLiteral::plain(text))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// A double-quoted string literal.
///
/// `text` keeps each `${...}` placeholder verbatim; every [`Interpolation`]
/// records the byte range of its placeholder within `text`. Ranges are
/// ordered and never overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringLiteral {
    pub text: String,
    pub interpolations: Vec<Interpolation>,
}

impl StringLiteral {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            interpolations: Vec::new(),
        }
    }

    pub fn is_plain(&self) -> bool {
        self.interpolations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpolation {
    pub start: usize,
    pub len: usize,
    pub expr: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

// ── Display (outlines and diagnostics) ──────────────────────────────────────

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(lit) => write!(f, "{:?}", lit.text),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Var(name) => write!(f, "var({name})"),
            Self::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "!{operand}"),
            Self::Binary { op, left, right } => write!(f, "({left} {} {right})", op.as_str()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.segments() {
            match segment {
                PathSegment::Literal(text) => f.write_str(text)?,
                PathSegment::Interpolated(expr) => write!(f, "${{{expr}}}")?,
            }
        }
        Ok(())
    }
}
