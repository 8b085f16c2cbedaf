//! Recursive-descent parser for ForgeCSS source text.
//!
//! ```text
//! stylesheet  := statement*
//! statement   := declaration | rule | at_rule | ":root" block
//! declaration := IDENT ":" expr ";"
//! rule        := selector block
//! block       := "{" statement* "}"
//! at_rule     := "@if" expr block ("@else" ("@if" ... | block))?
//!              | "@foreach" "$"? IDENT "in" expr block
//!              | "@exec" expr ("at" expr)? ("timeout" expr)? ";"
//!              | "@mixin" IDENT ("(" params ")")? block
//!              | "@include" IDENT ("(" args ")")? ";"
//! ```
//!
//! Expressions are parsed in `expr.rs`. Parsing is all-or-nothing: any
//! error aborts and no partial tree is returned.

mod error;
mod expr;

pub use error::ParseError;

use crate::domain::ast::{
    Declaration, ExecRule, ForeachRule, IfRule, MixinDecl, MixinInclude, PathSegment, RootRule,
    Rule, Selector, Statement, Stylesheet,
};

type PResult<T> = Result<T, ParseError>;

/// Parse a complete program.
pub fn parse(source: &str) -> Result<Stylesheet, ParseError> {
    let mut parser = Parser::new(source);
    let statements = parser.statements(false)?;
    tracing::trace!(statements = statements.len(), "parsed stylesheet");
    Ok(Stylesheet::new(statements))
}

pub(crate) struct Parser<'src> {
    src: &'src str,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn new(src: &'src str) -> Self {
        Self { src, pos: 0 }
    }

    // ── Cursor primitives ───────────────────────────────────────────────────

    fn rest(&self) -> &'src str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume `kw` only when it is not the prefix of a longer identifier.
    fn eat_keyword(&mut self, kw: &str) -> bool {
        let after = self.rest().get(kw.len()..).and_then(|s| s.chars().next());
        if self.starts_with(kw) && !after.is_some_and(is_ident_continue) {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) -> PResult<()> {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            if self.starts_with("/*") {
                let start = self.pos;
                match self.rest()[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => return Err(self.error_at(start, "unterminated comment")),
                }
            } else {
                return Ok(());
            }
        }
    }

    fn expect(&mut self, token: &str) -> PResult<()> {
        self.skip_trivia()?;
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{token}', found {}", self.describe_current())))
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> PResult<()> {
        self.skip_trivia()?;
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{kw}', found {}", self.describe_current())))
        }
    }

    fn identifier(&mut self) -> PResult<String> {
        self.skip_trivia()?;
        self.identifier_here()
            .ok_or_else(|| self.error(format!("expected identifier, found {}", self.describe_current())))
    }

    /// Read an identifier at the cursor without skipping trivia.
    fn identifier_here(&mut self) -> Option<String> {
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        Some(self.src[start..self.pos].to_owned())
    }

    fn describe_current(&self) -> String {
        match self.peek() {
            None => "end of input".to_owned(),
            Some(c) => format!("'{c}'"),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::at(self.src, offset, message)
    }

    // ── Statements ──────────────────────────────────────────────────────────

    fn statements(&mut self, nested: bool) -> PResult<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None if nested => {
                    return Err(self.error("unexpected end of input, expected '}'"));
                }
                None => return Ok(statements),
                Some('}') if nested => return Ok(statements),
                Some('}') => return Err(self.error("unexpected '}'")),
                Some(_) => statements.push(self.statement()?),
            }
        }
    }

    fn block(&mut self) -> PResult<Vec<Statement>> {
        self.expect("{")?;
        let body = self.statements(true)?;
        self.expect("}")?;
        Ok(body)
    }

    fn statement(&mut self) -> PResult<Statement> {
        let start = self.pos;

        if self.eat("@") {
            let keyword = self
                .identifier_here()
                .ok_or_else(|| self.error_at(start, "expected at-rule keyword after '@'"))?;
            return match keyword.as_str() {
                "if" => self.if_rule().map(Statement::If),
                "foreach" => self.foreach_rule().map(Statement::Foreach),
                "exec" => self.exec_rule().map(Statement::Exec),
                "mixin" => self.mixin_decl().map(Statement::Mixin),
                "include" => self.mixin_include().map(Statement::Include),
                "else" => Err(self.error_at(start, "'@else' without a preceding '@if'")),
                other => Err(self.error_at(start, format!("unknown at-rule '@{other}'"))),
            };
        }

        if self.eat_keyword(":root") {
            let body = self.block()?;
            return Ok(Statement::Root(RootRule { body }));
        }

        if let Some(name) = self.declaration_name()? {
            let value = self.expression()?;
            self.expect(";")?;
            return Ok(Statement::Declaration(Declaration { name, value }));
        }

        let selector = self.selector()?;
        let body = self.block()?;
        Ok(Statement::Rule(Rule { selector, body }))
    }

    /// `IDENT ':'` lookahead. Restores the cursor when it does not match.
    fn declaration_name(&mut self) -> PResult<Option<String>> {
        let start = self.pos;
        let Some(name) = self.identifier_here() else {
            return Ok(None);
        };
        self.skip_trivia()?;
        if self.eat(":") {
            Ok(Some(name))
        } else {
            self.pos = start;
            Ok(None)
        }
    }

    fn selector(&mut self) -> PResult<Selector> {
        let start = self.pos;
        let mut segments = Vec::new();
        let mut literal = String::new();

        loop {
            match self.peek() {
                None => break,
                Some(c) if c.is_whitespace() || c == '{' => break,
                Some('/') if self.starts_with("/*") => break,
                Some('$') if self.starts_with("${") => {
                    if !literal.is_empty() {
                        segments.push(PathSegment::Literal(std::mem::take(&mut literal)));
                    }
                    self.pos += 2;
                    let expr = self.expression()?;
                    self.expect("}")?;
                    segments.push(PathSegment::Interpolated(expr));
                }
                Some(c @ ('}' | ';' | ':' | '"' | '(' | ')' | ',' | '@')) => {
                    return Err(self.error(format!("unexpected '{c}' in selector")));
                }
                Some(c) => {
                    literal.push(c);
                    self.bump();
                }
            }
        }
        if !literal.is_empty() {
            segments.push(PathSegment::Literal(literal));
        }

        let Some(first) = segments.first() else {
            return Err(self.error_at(
                start,
                format!("expected a selector, found {}", self.describe_current()),
            ));
        };
        if matches!(first, PathSegment::Literal(text) if text.starts_with('/')) {
            return Err(self.error_at(start, "absolute paths are not allowed in selectors"));
        }

        let is_directory = match segments.last() {
            Some(PathSegment::Literal(text)) => {
                text.ends_with('/') || (segments.len() == 1 && matches!(text.as_str(), "." | ".."))
            }
            _ => false,
        };

        Ok(if is_directory {
            Selector::Path(segments)
        } else {
            Selector::File(segments)
        })
    }

    // ── At-rules ────────────────────────────────────────────────────────────

    fn if_rule(&mut self) -> PResult<IfRule> {
        let condition = self.expression()?;
        let then_branch = self.block()?;

        self.skip_trivia()?;
        let before_else = self.pos;
        let else_branch = if self.eat("@") && self.eat_keyword("else") {
            self.skip_trivia()?;
            let before_if = self.pos;
            if self.eat("@") && self.eat_keyword("if") {
                Some(vec![Statement::If(self.if_rule()?)])
            } else {
                self.pos = before_if;
                Some(self.block()?)
            }
        } else {
            self.pos = before_else;
            None
        };

        Ok(IfRule {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn foreach_rule(&mut self) -> PResult<ForeachRule> {
        self.skip_trivia()?;
        self.eat("$");
        let variable = self.identifier()?;
        self.expect_keyword("in")?;
        let sequence = self.expression()?;
        let body = self.block()?;
        Ok(ForeachRule {
            variable,
            sequence,
            body,
        })
    }

    fn exec_rule(&mut self) -> PResult<ExecRule> {
        let command = self.expression()?;

        self.skip_trivia()?;
        let working_directory = if self.eat_keyword("at") {
            Some(self.expression()?)
        } else {
            None
        };

        self.skip_trivia()?;
        let timeout = if self.eat_keyword("timeout") {
            Some(self.expression()?)
        } else {
            None
        };

        self.expect(";")?;
        Ok(ExecRule {
            command,
            working_directory,
            timeout,
        })
    }

    fn mixin_decl(&mut self) -> PResult<MixinDecl> {
        let name = self.identifier()?;
        let mut parameters: Vec<String> = Vec::new();

        self.skip_trivia()?;
        if self.eat("(") {
            loop {
                self.skip_trivia()?;
                if self.eat(")") {
                    break;
                }
                let at = self.pos;
                self.eat("$");
                let param = self.identifier()?;
                if parameters.contains(&param) {
                    return Err(self.error_at(at, format!("duplicate parameter '{param}'")));
                }
                parameters.push(param);

                self.skip_trivia()?;
                if !self.eat(",") {
                    self.expect(")")?;
                    break;
                }
            }
        }

        let body = self.block()?;
        Ok(MixinDecl {
            name,
            parameters,
            body,
        })
    }

    fn mixin_include(&mut self) -> PResult<MixinInclude> {
        let name = self.identifier()?;
        let mut arguments = Vec::new();

        self.skip_trivia()?;
        if self.eat("(") {
            loop {
                self.skip_trivia()?;
                if self.eat(")") {
                    break;
                }
                arguments.push(self.expression()?);

                self.skip_trivia()?;
                if !self.eat(",") {
                    self.expect(")")?;
                    break;
                }
            }
        }

        self.expect(";")?;
        Ok(MixinInclude { name, arguments })
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::{BinaryOp, Expr};

    fn parse_ok(src: &str) -> Stylesheet {
        parse(src).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn empty_source_is_empty_stylesheet() {
        assert!(parse_ok("  /* nothing */  ").is_empty());
    }

    #[test]
    fn declaration_with_string() {
        let sheet = parse_ok(r#"name: "svc";"#);
        assert_eq!(
            sheet.statements,
            vec![Statement::Declaration(Declaration {
                name: "name".into(),
                value: Expr::string("svc"),
            })]
        );
    }

    #[test]
    fn directory_and_file_selectors() {
        let sheet = parse_ok(r#"./src/ { ${name}.cs { content: "x"; } }"#);
        let Statement::Rule(dir) = &sheet.statements[0] else {
            panic!("expected rule");
        };
        assert_eq!(
            dir.selector,
            Selector::Path(vec![PathSegment::Literal("./src/".into())])
        );

        let Statement::Rule(file) = &dir.body[0] else {
            panic!("expected nested rule");
        };
        assert_eq!(
            file.selector,
            Selector::File(vec![
                PathSegment::Interpolated(Expr::var("name")),
                PathSegment::Literal(".cs".into()),
            ])
        );
    }

    #[test]
    fn dotted_file_name_is_not_a_declaration() {
        let sheet = parse_ok(r#"Program.cs { content: "x"; }"#);
        assert!(matches!(&sheet.statements[0], Statement::Rule(r) if r.selector.is_file()));
    }

    #[test]
    fn root_rule() {
        let sheet = parse_ok(r#":root { a: 1; b: true; }"#);
        let Statement::Root(root) = &sheet.statements[0] else {
            panic!("expected :root");
        };
        assert_eq!(root.body.len(), 2);
    }

    #[test]
    fn if_else_if_chain() {
        let sheet = parse_ok(
            r#"@if (kind == "api") { a: 1; } @else @if kind == "cli" { a: 2; } @else { a: 3; }"#,
        );
        let Statement::If(outer) = &sheet.statements[0] else {
            panic!("expected @if");
        };
        assert_eq!(
            outer.condition,
            Expr::binary(BinaryOp::Eq, Expr::var("kind"), Expr::string("api"))
        );
        let else_branch = outer.else_branch.as_ref().expect("else branch");
        let Statement::If(inner) = &else_branch[0] else {
            panic!("expected chained @if");
        };
        assert!(inner.else_branch.is_some());
    }

    #[test]
    fn if_without_else_leaves_following_statement() {
        let sheet = parse_ok(r#"@if true { a: 1; } @exec "git init";"#);
        assert_eq!(sheet.len(), 2);
        assert!(matches!(&sheet.statements[0], Statement::If(r) if r.else_branch.is_none()));
    }

    #[test]
    fn foreach_rule() {
        let sheet = parse_ok(r#"@foreach $x in (["a", "b"]) { decl: $x; }"#);
        let Statement::Foreach(rule) = &sheet.statements[0] else {
            panic!("expected @foreach");
        };
        assert_eq!(rule.variable, "x");
        assert_eq!(
            rule.sequence,
            Expr::Array(vec![Expr::string("a"), Expr::string("b")])
        );
        assert_eq!(rule.body.len(), 1);
    }

    #[test]
    fn exec_with_options() {
        let sheet = parse_ok(r#"@exec "dotnet build" at "./src" timeout 30;"#);
        let Statement::Exec(exec) = &sheet.statements[0] else {
            panic!("expected @exec");
        };
        assert_eq!(exec.command, Expr::string("dotnet build"));
        assert_eq!(exec.working_directory, Some(Expr::string("./src")));
        assert_eq!(exec.timeout, Some(Expr::Number(30.0)));
    }

    #[test]
    fn mixin_declaration_and_include() {
        let sheet = parse_ok(
            r#"@mixin project($name, kind) { ./${name}/ { } } @include project("api", "web"); @include bare;"#,
        );
        let Statement::Mixin(decl) = &sheet.statements[0] else {
            panic!("expected @mixin");
        };
        assert_eq!(decl.parameters, vec!["name", "kind"]);

        let Statement::Include(call) = &sheet.statements[1] else {
            panic!("expected @include");
        };
        assert_eq!(call.arguments.len(), 2);
        assert!(matches!(&sheet.statements[2], Statement::Include(c) if c.arguments.is_empty()));
    }

    #[test]
    fn comments_between_tokens() {
        let sheet = parse_ok("/* a */ name /* b */ : /* c */ \"x\" /* d */ ;");
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn missing_semicolon_reports_position() {
        let err = parse("a: 1\nb: 2;").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("expected ';'"), "{}", err.message);
    }

    #[test]
    fn unknown_at_rule() {
        let err = parse("@import \"x\";").unwrap_err();
        assert!(err.message.contains("unknown at-rule '@import'"));
        assert_eq!(err.column, 1);
    }

    #[test]
    fn dangling_else() {
        let err = parse("@else { }").unwrap_err();
        assert!(err.message.contains("without a preceding"));
    }

    #[test]
    fn unclosed_block() {
        let err = parse("./src/ { a: 1;").unwrap_err();
        assert!(err.message.contains("end of input"));
    }

    #[test]
    fn unterminated_comment() {
        let err = parse("a: 1; /* oops").unwrap_err();
        assert_eq!(err.message, "unterminated comment");
    }

    #[test]
    fn absolute_selector_rejected() {
        let err = parse("/etc/ { }").unwrap_err();
        assert!(err.message.contains("absolute"));
    }

    #[test]
    fn duplicate_mixin_parameter() {
        let err = parse("@mixin m(a, $a) { }").unwrap_err();
        assert!(err.message.contains("duplicate parameter 'a'"));
    }

    #[test]
    fn stray_closing_brace() {
        assert!(parse("}").is_err());
    }
}
