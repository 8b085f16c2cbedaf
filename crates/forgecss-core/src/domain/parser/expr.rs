//! Expression grammar.
//!
//! Precedence, lowest first (binary operators are left-associative):
//!
//! | Level | Operators            |
//! |-------|----------------------|
//! | 1     | `\|\|`               |
//! | 2     | `&&`                 |
//! | 3     | `==` `!=`            |
//! | 4     | `<` `<=` `>` `>=`    |
//! | 5     | unary `!`            |
//! | 6     | primary              |

use indexmap::IndexMap;

use super::{PResult, Parser, is_ident_continue, is_ident_start};
use crate::domain::ast::{BinaryOp, Expr, Interpolation, StringLiteral, UnaryOp};

impl Parser<'_> {
    pub(super) fn expression(&mut self) -> PResult<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> PResult<Expr> {
        let mut left = self.and_expr()?;
        loop {
            self.skip_trivia()?;
            if !self.eat("||") {
                return Ok(left);
            }
            let right = self.and_expr()?;
            left = Expr::binary(BinaryOp::Or, left, right);
        }
    }

    fn and_expr(&mut self) -> PResult<Expr> {
        let mut left = self.equality()?;
        loop {
            self.skip_trivia()?;
            if !self.eat("&&") {
                return Ok(left);
            }
            let right = self.equality()?;
            left = Expr::binary(BinaryOp::And, left, right);
        }
    }

    fn equality(&mut self) -> PResult<Expr> {
        let mut left = self.comparison()?;
        loop {
            self.skip_trivia()?;
            let op = if self.eat("==") {
                BinaryOp::Eq
            } else if self.eat("!=") {
                BinaryOp::Ne
            } else {
                return Ok(left);
            };
            let right = self.comparison()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut left = self.unary()?;
        loop {
            self.skip_trivia()?;
            // Two-character operators first.
            let op = if self.eat("<=") {
                BinaryOp::Le
            } else if self.eat(">=") {
                BinaryOp::Ge
            } else if self.eat("<") {
                BinaryOp::Lt
            } else if self.eat(">") {
                BinaryOp::Gt
            } else {
                return Ok(left);
            };
            let right = self.unary()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn unary(&mut self) -> PResult<Expr> {
        self.skip_trivia()?;
        if self.peek() == Some('!') && self.peek_second() != Some('=') {
            self.bump();
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> PResult<Expr> {
        self.skip_trivia()?;
        match self.peek() {
            Some('"') => self.string_literal().map(Expr::String),
            Some('[') => self.array(),
            Some('{') => self.object(),
            Some('(') => {
                self.bump();
                let inner = self.expression()?;
                self.expect(")")?;
                Ok(inner)
            }
            Some('$') => {
                self.bump();
                let name = self
                    .identifier_here()
                    .ok_or_else(|| self.error("expected variable name after '$'"))?;
                Ok(Expr::Var(name))
            }
            Some(c) if c.is_ascii_digit() || c == '-' => self.number(),
            Some(c) if is_ident_start(c) => self.word(),
            None => Err(self.error("unexpected end of input, expected a value")),
            Some(c) => Err(self.error(format!("expected a value, found '{c}'"))),
        }
    }

    /// Keywords, `var(name)` and bare variable references.
    fn word(&mut self) -> PResult<Expr> {
        let word = self
            .identifier_here()
            .ok_or_else(|| self.error("expected identifier"))?;

        match word.as_str() {
            "true" => return Ok(Expr::Bool(true)),
            "false" => return Ok(Expr::Bool(false)),
            "null" => return Ok(Expr::Null),
            _ => {}
        }

        if word == "var" {
            let after_word = self.pos;
            self.skip_trivia()?;
            if self.eat("(") {
                let name = self.identifier()?;
                self.expect(")")?;
                return Ok(Expr::Var(name));
            }
            self.pos = after_word;
        }

        Ok(Expr::Var(word))
    }

    fn number(&mut self) -> PResult<Expr> {
        let start = self.pos;
        self.eat("-");

        let digits_start = self.pos;
        self.skip_digits();
        if self.pos == digits_start {
            return Err(self.error_at(start, "expected digits in number literal"));
        }

        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.skip_digits();
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let before_exponent = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            let exponent_start = self.pos;
            self.skip_digits();
            if self.pos == exponent_start {
                self.pos = before_exponent;
            }
        }

        if let Some(c) = self.peek().filter(|c| is_ident_continue(*c)) {
            return Err(self.error(format!("unexpected '{c}' after number literal")));
        }

        let text = &self.src[start..self.pos];
        text.parse::<f64>()
            .map(Expr::Number)
            .map_err(|e| self.error_at(start, format!("invalid number '{text}': {e}")))
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    pub(super) fn string_literal(&mut self) -> PResult<StringLiteral> {
        let start = self.pos;
        self.bump(); // opening quote

        let mut text = String::new();
        let mut interpolations = Vec::new();

        loop {
            let Some(c) = self.peek() else {
                return Err(self.error_at(start, "unterminated string literal"));
            };
            match c {
                '"' => {
                    self.bump();
                    break;
                }
                '\\' => {
                    let escape_at = self.pos;
                    self.bump();
                    let decoded = match self.bump() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some(other) => {
                            return Err(self.error_at(
                                escape_at,
                                format!("invalid escape sequence '\\{other}'"),
                            ));
                        }
                        None => return Err(self.error_at(start, "unterminated string literal")),
                    };
                    text.push(decoded);
                }
                '$' if self.starts_with("${") => {
                    let open = self.pos;
                    self.pos += 2;
                    let expr = self.expression()?;
                    self.skip_trivia()?;
                    if !self.eat("}") {
                        return Err(self.error(format!(
                            "expected '}}' to close interpolation, found {}",
                            self.describe_current()
                        )));
                    }
                    let placeholder = &self.src[open..self.pos];
                    interpolations.push(Interpolation {
                        start: text.len(),
                        len: placeholder.len(),
                        expr,
                    });
                    text.push_str(placeholder);
                }
                _ => {
                    text.push(c);
                    self.bump();
                }
            }
        }

        Ok(StringLiteral {
            text,
            interpolations,
        })
    }

    fn array(&mut self) -> PResult<Expr> {
        self.bump(); // [
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat("]") {
                break;
            }
            items.push(self.expression()?);
            self.skip_trivia()?;
            if !self.eat(",") {
                self.expect("]")?;
                break;
            }
        }
        Ok(Expr::Array(items))
    }

    fn object(&mut self) -> PResult<Expr> {
        self.bump(); // {
        let mut entries = IndexMap::new();
        loop {
            self.skip_trivia()?;
            if self.eat("}") {
                break;
            }

            let key_at = self.pos;
            let key = if self.peek() == Some('"') {
                let literal = self.string_literal()?;
                if !literal.is_plain() {
                    return Err(self.error_at(key_at, "object keys cannot be interpolated"));
                }
                literal.text
            } else {
                self.identifier()?
            };

            self.expect(":")?;
            let value = self.expression()?;
            if entries.contains_key(&key) {
                return Err(self.error_at(key_at, format!("duplicate key '{key}' in object")));
            }
            entries.insert(key, value);

            self.skip_trivia()?;
            if !self.eat(",") {
                self.expect("}")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }
}
