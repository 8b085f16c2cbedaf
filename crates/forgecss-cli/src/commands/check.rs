//! `forgecss check`: parse a stylesheet and print its outline.
//!
//! Nothing is evaluated, so undefined variables and disallowed commands are
//! only reported by `apply`.

use tracing::instrument;

use forgecss_core::domain::{Statement, Stylesheet};

use crate::{cli::CheckArgs, commands::apply::load_stylesheet, error::CliResult, output::OutputManager};

const INDENT: &str = "  ";

#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn execute(args: CheckArgs, output: OutputManager) -> CliResult<()> {
    let sheet = load_stylesheet(&args.file)?;

    if output.is_json() {
        output.json(&sheet)?;
        return Ok(());
    }

    for line in outline(&sheet) {
        output.print(&line)?;
    }
    output.success(&format!(
        "{}: syntax OK ({} top-level statement(s))",
        args.file.display(),
        sheet.len()
    ))?;
    Ok(())
}

/// One line per statement, indented by nesting depth.
pub(crate) fn outline(sheet: &Stylesheet) -> Vec<String> {
    let mut lines = Vec::new();
    walk(&sheet.statements, 0, &mut lines);
    lines
}

fn walk(statements: &[Statement], depth: usize, lines: &mut Vec<String>) {
    for statement in statements {
        let pad = INDENT.repeat(depth);
        lines.push(format!("{pad}{}", describe(statement)));
        match statement {
            Statement::Rule(rule) => walk(&rule.body, depth + 1, lines),
            Statement::Root(root) => walk(&root.body, depth + 1, lines),
            Statement::Mixin(mixin) => walk(&mixin.body, depth + 1, lines),
            Statement::Foreach(each) => walk(&each.body, depth + 1, lines),
            Statement::If(rule) => {
                walk(&rule.then_branch, depth + 1, lines);
                if let Some(otherwise) = &rule.else_branch {
                    lines.push(format!("{pad}@else"));
                    walk(otherwise, depth + 1, lines);
                }
            }
            Statement::Declaration(_) | Statement::Exec(_) | Statement::Include(_) => {}
        }
    }
}

fn describe(statement: &Statement) -> String {
    let keyword = statement.keyword();
    match statement {
        Statement::Rule(rule) => format!("{keyword} {}", rule.selector),
        Statement::Declaration(decl) => format!("{}: {}", decl.name, decl.value),
        Statement::If(rule) => format!("{keyword} {}", rule.condition),
        Statement::Foreach(each) => format!("{keyword} ${} in {}", each.variable, each.sequence),
        Statement::Exec(exec) => {
            let mut line = format!("{keyword} {}", exec.command);
            if let Some(dir) = &exec.working_directory {
                line.push_str(&format!(" at {dir}"));
            }
            if let Some(timeout) = &exec.timeout {
                line.push_str(&format!(" timeout {timeout}"));
            }
            line
        }
        Statement::Mixin(mixin) => format!("{keyword} {}({})", mixin.name, mixin.parameters.join(", ")),
        Statement::Include(include) => {
            let args: Vec<String> = include.arguments.iter().map(ToString::to_string).collect();
            format!("{keyword} {}({})", include.name, args.join(", "))
        }
        Statement::Root(_) => keyword.to_owned(),
    }
}
