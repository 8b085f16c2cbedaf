//! Expression evaluation against a scope chain.
//!
//! Pure: no I/O, no side effects beyond reading the scope.

use std::cmp::Ordering;

use crate::domain::{
    ast::{BinaryOp, Expr, StringLiteral, UnaryOp},
    error::DomainError,
    scope::ScopeStack,
    value::Value,
};

/// Evaluate an expression to a [`Value`].
pub fn evaluate(expr: &Expr, scopes: &ScopeStack) -> Result<Value, DomainError> {
    match expr {
        Expr::String(literal) => interpolate(literal, scopes).map(Value::String),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::Array(items) => items
            .iter()
            .map(|item| evaluate(item, scopes))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Object(entries) => entries
            .iter()
            .map(|(key, value)| Ok((key.clone(), evaluate(value, scopes)?)))
            .collect::<Result<_, DomainError>>()
            .map(Value::Object),
        Expr::Var(name) => scopes.lookup(name),
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } => Ok(Value::Bool(!evaluate(operand, scopes)?.is_truthy())),
        Expr::Binary { op, left, right } => binary(*op, left, right, scopes),
    }
}

/// Evaluate and convert to text in one step.
pub fn evaluate_text(expr: &Expr, scopes: &ScopeStack) -> Result<String, DomainError> {
    evaluate(expr, scopes).map(|value| value.to_text())
}

/// Substitute every `${...}` placeholder of a string literal.
pub fn interpolate(literal: &StringLiteral, scopes: &ScopeStack) -> Result<String, DomainError> {
    if literal.is_plain() {
        return Ok(literal.text.clone());
    }

    let mut out = String::with_capacity(literal.text.len());
    let mut cursor = 0;
    for interpolation in &literal.interpolations {
        out.push_str(&literal.text[cursor..interpolation.start]);
        out.push_str(&evaluate(&interpolation.expr, scopes)?.to_text());
        cursor = interpolation.start + interpolation.len;
    }
    out.push_str(&literal.text[cursor..]);
    Ok(out)
}

fn binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    scopes: &ScopeStack,
) -> Result<Value, DomainError> {
    match op {
        BinaryOp::Or => {
            let truthy = evaluate(left, scopes)?.is_truthy() || evaluate(right, scopes)?.is_truthy();
            Ok(Value::Bool(truthy))
        }
        BinaryOp::And => {
            let truthy = evaluate(left, scopes)?.is_truthy() && evaluate(right, scopes)?.is_truthy();
            Ok(Value::Bool(truthy))
        }
        BinaryOp::Eq => Ok(Value::Bool(evaluate(left, scopes)? == evaluate(right, scopes)?)),
        BinaryOp::Ne => Ok(Value::Bool(evaluate(left, scopes)? != evaluate(right, scopes)?)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let lhs = evaluate(left, scopes)?;
            let rhs = evaluate(right, scopes)?;
            let ordering = compare(op, &lhs, &rhs)?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Ordering, DomainError> {
    let context = || format!("'{}' comparison", op.as_str());
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a
            .partial_cmp(b)
            .ok_or_else(|| DomainError::type_mismatch(context(), "comparable numbers", "NaN")),
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Number(_), other) | (Value::String(_), other) => Err(DomainError::type_mismatch(
            context(),
            lhs.type_name(),
            other.type_name(),
        )),
        (other, _) => Err(DomainError::type_mismatch(
            context(),
            "number or string",
            other.type_name(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parser::parse;
    use crate::domain::ast::Statement;

    fn eval_in(src: &str, scopes: &ScopeStack) -> Result<Value, DomainError> {
        let sheet = parse(&format!("v: {src};")).unwrap_or_else(|e| panic!("{src}: {e}"));
        let Some(Statement::Declaration(decl)) = sheet.statements.first() else {
            panic!("expected declaration");
        };
        evaluate(&decl.value, scopes)
    }

    fn eval(src: &str) -> Value {
        eval_in(src, &ScopeStack::new()).unwrap()
    }

    #[test]
    fn interpolation_substitutes_bound_value() {
        let mut scopes = ScopeStack::new();
        scopes.set_variable("name", Value::from("World"));
        assert_eq!(
            eval_in(r#""Hello, ${name}!""#, &scopes).unwrap(),
            Value::from("Hello, World!")
        );
    }

    #[test]
    fn interpolation_converts_to_text() {
        let mut scopes = ScopeStack::new();
        scopes.set_variable("n", Value::from(3.0));
        scopes.set_variable("flag", Value::from(true));
        assert_eq!(
            eval_in(r#""${n}-${flag}-${null}-${[1]}""#, &scopes).unwrap(),
            Value::from("3-true--[1]")
        );
    }

    #[test]
    fn numbers_interpolate_alike_bare_or_in_array() {
        let mut scopes = ScopeStack::new();
        scopes.set_variable("n", Value::from(3.0));
        assert_eq!(
            eval_in(r#""${n} ${[n]}""#, &scopes).unwrap(),
            Value::from("3 [3]")
        );
    }

    #[test]
    fn undefined_variable_in_interpolation() {
        assert_eq!(
            eval_in(r#""${missing}""#, &ScopeStack::new()),
            Err(DomainError::UndefinedVariable {
                name: "missing".into()
            })
        );
    }

    #[test]
    fn logical_operators() {
        assert_eq!(eval("!0"), Value::Bool(true));
        assert_eq!(eval(r#""" || "x""#), Value::Bool(true));
        assert_eq!(eval("1 && []"), Value::Bool(false));
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(eval("false && missing"), Value::Bool(false));
        assert_eq!(eval("true || missing"), Value::Bool(true));
    }

    #[test]
    fn equality_is_structural_without_coercion() {
        assert_eq!(eval(r#"[1, "a"] == [1, "a"]"#), Value::Bool(true));
        assert_eq!(eval(r#"1 == "1""#), Value::Bool(false));
        assert_eq!(eval("null != false"), Value::Bool(true));
    }

    #[test]
    fn relational_on_numbers_and_strings() {
        assert_eq!(eval("2 < 10"), Value::Bool(true));
        assert_eq!(eval("2 >= 2"), Value::Bool(true));
        assert_eq!(eval(r#""b" > "a""#), Value::Bool(true));
        assert_eq!(eval(r#""b" <= "a""#), Value::Bool(false));
    }

    #[test]
    fn relational_type_mismatch() {
        let err = eval_in(r#"1 < "2""#, &ScopeStack::new()).unwrap_err();
        assert!(matches!(
            err,
            DomainError::TypeMismatch {
                expected: "number",
                found: "string",
                ..
            }
        ));
        assert!(eval_in("null < 1", &ScopeStack::new()).is_err());
    }

    #[test]
    fn object_values_evaluate_in_order() {
        let mut scopes = ScopeStack::new();
        scopes.set_variable("x", Value::from("y"));
        let Value::Object(entries) = eval_in(r#"{ first: x, second: 2 }"#, &scopes).unwrap() else {
            panic!("expected object");
        };
        assert_eq!(entries.get_index(0), Some((&"first".to_string(), &Value::from("y"))));
    }
}
