//! Public-API tests for the language layer: parsing a realistic stylesheet
//! and the shape of the resulting tree.

use forgecss_core::domain::{
    BinaryOp, Expr, PathSegment, Selector, Statement, parse,
};

const SAMPLE: &str = r##"
/* Clean-architecture service skeleton */
name: "Orders";
entities: ["Order", "Customer"];

@mixin entity($entity, $ns) {
    ${entity}.cs {
        template: "entity.tpl";
        namespace: ns;
        mode: "skip";
    }
}

:root {
    ./src/ {
        ./${name}.Domain/ {
            @foreach $e in entities {
                @include entity(e, "${name}.Domain");
            }
        }
        README.md { content: "# ${name}"; }
    }
}

@if name != "" && !false {
    @exec "git init" at "src" timeout 30;
} @else {
    @exec "dotnet --info";
}
"##;

#[test]
fn sample_parses_into_top_level_statements() {
    let sheet = parse(SAMPLE).unwrap();
    let kinds: Vec<_> = sheet.statements.iter().map(Statement::keyword).collect();
    assert_eq!(
        kinds,
        vec!["declaration", "declaration", "@mixin", ":root", "@if"]
    );
}

#[test]
fn interpolated_directory_selector() {
    let sheet = parse(SAMPLE).unwrap();
    let Statement::Root(root) = &sheet.statements[3] else {
        panic!("expected :root");
    };
    let Statement::Rule(src) = &root.body[0] else {
        panic!("expected ./src/");
    };
    let Statement::Rule(domain) = &src.body[0] else {
        panic!("expected domain directory");
    };

    let Selector::Path(segments) = &domain.selector else {
        panic!("expected a directory selector");
    };
    assert_eq!(segments[0], PathSegment::Literal("./".into()));
    assert_eq!(segments[1], PathSegment::Interpolated(Expr::var("name")));
    assert_eq!(segments[2], PathSegment::Literal(".Domain/".into()));
}

#[test]
fn condition_respects_precedence() {
    let sheet = parse(SAMPLE).unwrap();
    let Statement::If(rule) = &sheet.statements[4] else {
        panic!("expected @if");
    };
    let Expr::Binary { op, left, .. } = &rule.condition else {
        panic!("expected binary condition");
    };
    assert_eq!(*op, BinaryOp::And);
    assert!(matches!(**left, Expr::Binary { op: BinaryOp::Ne, .. }));
    assert!(rule.else_branch.is_some());
}

#[test]
fn errors_carry_line_and_column() {
    let err = parse("a: 1;\nb: ;").unwrap_err();
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 4);
    assert!(err.to_string().starts_with("syntax error at line 2, column 4"));
}

#[test]
fn tree_serializes_for_tooling() {
    let sheet = parse(r#"a.txt { content: "x"; }"#).unwrap();
    let json = serde_json::to_value(&sheet).unwrap();
    assert_eq!(json["statements"][0]["kind"], "rule");
}
