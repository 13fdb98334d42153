//! Prints parsed modules back as Fern source.
//!
//! Output uses four-space indentation, always puts `if` and `case` on multiple lines in
//! body position, and adds parentheses only where the parser would otherwise split an
//! expression differently. Parsing the rendered text gives back the same AST.

use crate::ast::{
    Block, BranchPattern, CaseStatement, Const, Destructure, Expression, Function,
    FunctionArgument, IfStatement, ImportModule, ImportNamespace, ListDestructurePart, Module,
    ObjectLiteral, TypeAlias, UnionType, UnionUntaggedType,
};
use crate::indentation::INDENT_WIDTH;
use crate::parser::Precedence;
use crate::types::Type;

pub fn render_module(module: &Module) -> String {
    let mut output = module
        .body
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n\n");
    output.push('\n');
    output
}

pub fn render_block(block: &Block) -> String {
    match block {
        Block::Import(import) => import
            .modules
            .iter()
            .map(render_import)
            .collect::<Vec<_>>()
            .join("\n"),
        Block::Export(export) => format!("exposing ({})", export.names.join(", ")),
        Block::UnionType(union) => render_union(union),
        Block::UnionUntaggedType(union) => render_untagged_union(union),
        Block::TypeAlias(alias) => render_alias(alias),
        Block::Function(function) => render_function(function),
        Block::Const(constant) => render_const(constant),
        Block::Comment => "--".to_string(),
        Block::MultilineComment => "{- -}".to_string(),
    }
}

fn render_import(module: &ImportModule) -> String {
    let mut line = match module.namespace {
        ImportNamespace::Relative => format!("import \"{}\"", module.name),
        ImportNamespace::Global => format!("import {}", module.name),
    };
    if let Some(alias) = &module.alias {
        line.push_str(&format!(" as {alias}"));
    }
    if !module.exposing.is_empty() {
        line.push_str(&format!(" exposing ({})", module.exposing.join(", ")));
    }
    line
}

fn render_union(union: &UnionType) -> String {
    let tags = union
        .tags
        .iter()
        .map(|tag| {
            if tag.args.is_empty() {
                return tag.name.clone();
            }
            let args = tag
                .args
                .iter()
                .map(|arg| format!("{}: {}", arg.name, arg.type_))
                .collect::<Vec<_>>();
            format!("{} {{ {} }}", tag.name, args.join(", "))
        })
        .collect::<Vec<_>>();
    format!(
        "type {} =\n{}",
        union.type_.to_type(),
        indent(&tags.join("\n| "), 1)
    )
}

fn render_untagged_union(union: &UnionUntaggedType) -> String {
    let values = union
        .values
        .iter()
        .map(|value| format!("\"{}\"", value.body))
        .collect::<Vec<_>>();
    format!(
        "type {} =\n{}",
        union.type_.to_type(),
        indent(&values.join("\n| "), 1)
    )
}

fn render_alias(alias: &TypeAlias) -> String {
    if alias.properties.is_empty() {
        return format!("type alias {} = {{}}", alias.type_.to_type());
    }
    let properties = alias
        .properties
        .iter()
        .map(|property| format!("{}: {}", property.name, property.type_))
        .collect::<Vec<_>>();
    format!(
        "type alias {} = {{\n{}\n}}",
        alias.type_.to_type(),
        indent(&properties.join(",\n"), 1)
    )
}

fn render_function(function: &Function) -> String {
    let mut header = vec![function.name.clone()];
    header.extend(function.args.iter().filter_map(|arg| match arg {
        FunctionArgument::FunctionArg(arg) => Some(arg.name.clone()),
        FunctionArgument::AnonFunctionArg(_) => None,
    }));
    format!(
        "{}: {}\n{} =\n{}",
        function.name,
        function.type_(),
        header.join(" "),
        indent(&render_body(&function.let_body, &function.body), 1)
    )
}

fn render_const(constant: &Const) -> String {
    let type_ = match &constant.type_ {
        Type::Function(_) => format!("({})", constant.type_),
        other => other.to_string(),
    };
    format!(
        "{}: {}\n{} =\n{}",
        constant.name,
        type_,
        constant.name,
        indent(&render_body(&constant.let_body, &constant.value), 1)
    )
}

/// An expression in body position, preceded by its `let` block if there is one.
fn render_body(let_body: &[Block], body: &Expression) -> String {
    if let_body.is_empty() {
        return render_expression(body);
    }
    let blocks = let_body
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "let\n{}\nin\n{}",
        indent(&blocks, 1),
        render_expression(body)
    )
}

/// Indents every non-blank line by `levels` steps.
fn indent(text: &str, levels: usize) -> String {
    let prefix = " ".repeat(INDENT_WIDTH * levels);
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

pub fn render_expression(expression: &Expression) -> String {
    match expression {
        Expression::Value(value) => value.body.clone(),
        Expression::StringValue(value) => format!("\"{}\"", value.body),
        Expression::FormatStringValue(value) => format!("`{}`", value.body),
        Expression::ListValue(list) => {
            let items = list.items.iter().map(render_expression).collect::<Vec<_>>();
            format!("[{}]", items.join(", "))
        }
        Expression::ListRange(range) => format!("[{}..{}]", range.start.body, range.end.body),
        Expression::ObjectLiteral(literal) => render_object_literal(literal),
        Expression::IfStatement(statement) => render_if(statement),
        Expression::CaseStatement(statement) => render_case(statement),
        Expression::Operator(operation) => {
            let precedence = Precedence::of(operation.operator);
            format!(
                "{} {} {}",
                render_operand(&operation.left, precedence, Side::Left),
                operation.operator.symbol(),
                render_operand(&operation.right, precedence, Side::Right)
            )
        }
        Expression::ListPrepend(prepend) => format!(
            "{} :: {}",
            render_operand(&prepend.left, Precedence::Prepend, Side::Left),
            render_operand(&prepend.right, Precedence::Prepend, Side::Right)
        ),
        Expression::LeftPipe(pipe) => {
            let left = match pipe.left.as_ref() {
                nested @ Expression::LeftPipe(_) => render_expression(nested),
                other => render_operand(other, Precedence::Pipe, Side::Right),
            };
            let right = render_operand(&pipe.right, Precedence::Pipe, Side::Right);
            format!("{left} |> {right}")
        }
        Expression::RightPipe(pipe) => {
            let left = render_operand(&pipe.left, Precedence::Pipe, Side::Left);
            let right = match pipe.right.as_ref() {
                nested @ Expression::RightPipe(_) => render_expression(nested),
                other => render_operand(other, Precedence::Pipe, Side::Left),
            };
            format!("{left} <| {right}")
        }
        Expression::ModuleReference(reference) => format!(
            "{}.{}",
            reference.path.join("."),
            render_expression(&reference.value)
        ),
        Expression::FunctionCall(call) => render_application(&call.name, &call.args),
        Expression::Constructor(constructor) => {
            if constructor.pattern.is_empty() {
                constructor.constructor.clone()
            } else {
                format!(
                    "{} {}",
                    constructor.constructor,
                    render_object_literal(&constructor.pattern)
                )
            }
        }
        Expression::Lambda(lambda) => format!(
            "\\{} -> {}",
            lambda.args.join(" "),
            render_expression(&lambda.body)
        ),
        Expression::LambdaCall(call) => {
            let lambda = format!(
                "(\\{} -> {})",
                call.lambda.args.join(" "),
                render_expression(&call.lambda.body)
            );
            render_application(&lambda, &call.args)
        }
    }
}

fn render_application(callee: &str, args: &[Expression]) -> String {
    let mut parts = vec![callee.to_string()];
    parts.extend(args.iter().map(|arg| {
        let rendered = render_expression(arg);
        if is_simple_argument(arg) {
            rendered
        } else {
            format!("({rendered})")
        }
    }));
    parts.join(" ")
}

/// Arguments that lex as a single token or one bracketed group.
fn is_simple_argument(expression: &Expression) -> bool {
    match expression {
        Expression::Value(_)
        | Expression::StringValue(_)
        | Expression::FormatStringValue(_)
        | Expression::ListValue(_)
        | Expression::ListRange(_)
        | Expression::ObjectLiteral(_) => true,
        Expression::Constructor(constructor) => constructor.pattern.is_empty(),
        Expression::ModuleReference(reference) => is_simple_argument(&reference.value),
        _ => false,
    }
}

fn precedence(expression: &Expression) -> Precedence {
    match expression {
        Expression::Operator(operation) => Precedence::of(operation.operator),
        Expression::ListPrepend(_) => Precedence::Prepend,
        Expression::LeftPipe(_) | Expression::RightPipe(_) => Precedence::Pipe,
        Expression::IfStatement(_) | Expression::CaseStatement(_) | Expression::Lambda(_) => {
            Precedence::Lowest
        }
        _ => Precedence::Atom,
    }
}

/// Renders an operand, bracketing it when the parser would not split there.
fn render_operand(child: &Expression, parent: Precedence, side: Side) -> String {
    let rendered = render_expression(child);
    let child_precedence = precedence(child);
    let associative_side = if parent.is_right_associative() {
        Side::Right
    } else {
        Side::Left
    };
    let bracketed = child_precedence == Precedence::Lowest
        || child_precedence < parent
        || (child_precedence == parent && (parent == Precedence::Pipe || side != associative_side));
    if bracketed {
        format!("({rendered})")
    } else {
        rendered
    }
}

fn render_object_literal(literal: &ObjectLiteral) -> String {
    if literal.is_empty() {
        return "{}".to_string();
    }
    let mut entries = Vec::new();
    if let Some(base) = &literal.base {
        entries.push(format!("...{}", render_expression(base)));
    }
    entries.extend(
        literal
            .fields
            .iter()
            .map(|field| format!("{}: {}", field.name, render_expression(&field.value))),
    );
    format!("{{ {} }}", entries.join(", "))
}

fn render_if(statement: &IfStatement) -> String {
    format!(
        "if {} then\n{}\nelse\n{}",
        render_expression(&statement.predicate),
        indent(&render_body(&statement.if_let_body, &statement.if_body), 1),
        indent(&render_body(&statement.else_let_body, &statement.else_body), 1)
    )
}

fn render_case(statement: &CaseStatement) -> String {
    let branches = statement
        .branches
        .iter()
        .map(|branch| {
            format!(
                "{} ->\n{}",
                render_pattern(&branch.pattern),
                indent(&render_body(&branch.let_body, &branch.body), 1)
            )
        })
        .collect::<Vec<_>>();
    format!(
        "case {} of\n{}",
        render_expression(&statement.predicate),
        indent(&branches.join("\n"), 1)
    )
}

fn render_destructure(destructure: &Destructure) -> String {
    if destructure.bindings.is_empty() {
        destructure.constructor.clone()
    } else {
        format!(
            "{} {{ {} }}",
            destructure.constructor,
            destructure.bindings.join(", ")
        )
    }
}

fn render_pattern(pattern: &BranchPattern) -> String {
    match pattern {
        BranchPattern::StringValue(value) => format!("\"{}\"", value.body),
        BranchPattern::FormatStringValue(value) => format!("`{}`", value.body),
        BranchPattern::Destructure(destructure) => render_destructure(destructure),
        BranchPattern::ListDestructure(list) => list
            .parts
            .iter()
            .map(|part| match part {
                ListDestructurePart::EmptyList => "[]".to_string(),
                ListDestructurePart::StringValue(value) => format!("\"{}\"", value.body),
                ListDestructurePart::FormatStringValue(value) => format!("`{}`", value.body),
                ListDestructurePart::Value(value) => value.body.clone(),
                ListDestructurePart::Destructure(destructure) => render_destructure(destructure),
            })
            .collect::<Vec<_>>()
            .join(" :: "),
        BranchPattern::EmptyList => "[]".to_string(),
        BranchPattern::Default => "default".to_string(),
    }
}
