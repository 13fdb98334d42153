use anyhow::{anyhow, bail, Result};

use super::control::{parse_case, parse_if};
use super::slices::{
    contains_newline, find_all_top_level, matching_close, split_top_level,
    strip_outer_brackets, trim,
};
use crate::ast::{
    BinaryOperator, Constructor, Expression, Field, FormatStringValue, FunctionCall, Lambda,
    LambdaCall, ListPrepend, ListRange, ListValue, ModuleReference, ObjectLiteral, Pipe,
    StringValue, Value,
};
use crate::error::{Depth, FrontendError};
use crate::lexer::{is_number, strip_comments, tokenize, tokens_to_text, Token};

/// Binding strength of infix forms, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    Lowest,
    Pipe,
    Or,
    And,
    Equality,
    Comparison,
    Prepend,
    Term,
    Factor,
    Atom,
}

const OPERATOR_GROUPS: [Precedence; 7] = [
    Precedence::Or,
    Precedence::And,
    Precedence::Equality,
    Precedence::Comparison,
    Precedence::Prepend,
    Precedence::Term,
    Precedence::Factor,
];

impl Precedence {
    pub(crate) fn of(operator: BinaryOperator) -> Self {
        match operator {
            BinaryOperator::Or => Precedence::Or,
            BinaryOperator::And => Precedence::And,
            BinaryOperator::Equal | BinaryOperator::NotEqual => Precedence::Equality,
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => Precedence::Comparison,
            BinaryOperator::Add | BinaryOperator::Subtract => Precedence::Term,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Mod => {
                Precedence::Factor
            }
        }
    }

    fn symbols(self) -> &'static [&'static str] {
        match self {
            Precedence::Pipe => &["|>", "<|"],
            Precedence::Or => &["||"],
            Precedence::And => &["&&"],
            Precedence::Equality => &["==", "!="],
            Precedence::Comparison => &["<", "<=", ">", ">="],
            Precedence::Prepend => &["::"],
            Precedence::Term => &["+", "-"],
            Precedence::Factor => &["*", "/", "%"],
            Precedence::Lowest | Precedence::Atom => &[],
        }
    }

    /// Groups split at their first operator associate to the right.
    pub(crate) fn is_right_associative(self) -> bool {
        matches!(self, Precedence::Comparison | Precedence::Prepend)
    }

    fn matches(self, token: &Token) -> bool {
        matches!(token, Token::Operator(symbol) if self.symbols().contains(&symbol.as_str()))
    }
}

pub fn parse_expression(body: &str) -> Result<Expression> {
    parse_expression_with_depth(body, Depth::default())
}

pub(crate) fn parse_expression_with_depth(body: &str, depth: Depth) -> Result<Expression> {
    let tokens = strip_comments(tokenize(body));
    parse_tokens(&tokens, depth)
}

pub(crate) fn parse_tokens(tokens: &[Token], depth: Depth) -> Result<Expression> {
    let depth = depth.deeper()?;
    let tokens = trim(tokens);
    let Some(first) = tokens.first() else {
        bail!("Expected an expression but found nothing");
    };

    if let Some(inner) = strip_outer_brackets(tokens) {
        return parse_tokens(inner, depth);
    }

    if matches!(first, Token::Backslash) {
        return parse_lambda(tokens, depth).map(Expression::Lambda);
    }

    let leads_with_control = first.is_keyword("if") || first.is_keyword("case");
    if !(leads_with_control && contains_newline(tokens)) {
        if let Some(pipe) = parse_pipe(tokens, depth)? {
            return Ok(pipe);
        }
    }

    if first.is_keyword("if") {
        return parse_if(tokens, depth).map(Expression::IfStatement);
    }
    if first.is_keyword("case") {
        return parse_case(tokens, depth).map(Expression::CaseStatement);
    }

    for group in OPERATOR_GROUPS {
        let indexes = find_all_top_level(tokens, |token| group.matches(token));
        if !indexes.is_empty() {
            return parse_chain(
                tokens,
                &indexes,
                group.is_right_associative(),
                depth,
                combine_operator,
            );
        }
    }

    match first {
        Token::OpenCurlyBracket => {
            if matching_close(tokens, 0) != Some(tokens.len() - 1) {
                bail!(
                    "Unexpected tokens after the object literal in `{}`",
                    tokens_to_text(tokens)
                );
            }
            parse_object_literal(tokens, depth).map(Expression::ObjectLiteral)
        }
        _ if tokens.len() == 1 => parse_single_token(first, depth),
        Token::Identifier(name) => parse_application(name, &tokens[1..], depth),
        Token::OpenBracket => parse_lambda_call(tokens, depth),
        _ => bail!("Could not parse the expression `{}`", tokens_to_text(tokens)),
    }
}

/// Parses the operands around the operators at `indexes` and folds them together. The
/// whole chain costs one level of nesting however long it is.
fn parse_chain(
    tokens: &[Token],
    indexes: &[usize],
    right_associative: bool,
    depth: Depth,
    combine: fn(&Token, Expression, Expression) -> Result<Expression>,
) -> Result<Expression> {
    let mut bounds = Vec::with_capacity(indexes.len() + 1);
    let mut start = 0;
    for &index in indexes {
        bounds.push((start, index));
        start = index + 1;
    }
    bounds.push((start, tokens.len()));

    let mut operands = Vec::with_capacity(bounds.len());
    for (position, (start, end)) in bounds.into_iter().enumerate() {
        let operand = trim(&tokens[start..end]);
        if operand.is_empty() {
            let operator = indexes
                .get(position)
                .or_else(|| indexes.last())
                .map_or_else(String::new, |&index| tokens[index].text());
            bail!(
                "Missing an operand for `{operator}` in `{}`",
                tokens_to_text(tokens).trim()
            );
        }
        operands.push(parse_tokens(operand, depth)?);
    }

    if right_associative {
        let Some(mut result) = operands.pop() else {
            bail!("Expected an expression but found nothing");
        };
        for (&index, left) in indexes.iter().zip(operands).rev() {
            result = combine(&tokens[index], left, result)?;
        }
        Ok(result)
    } else {
        let mut operands = operands.into_iter();
        let Some(mut result) = operands.next() else {
            bail!("Expected an expression but found nothing");
        };
        for (&index, right) in indexes.iter().zip(operands) {
            result = combine(&tokens[index], result, right)?;
        }
        Ok(result)
    }
}

fn parse_pipe(tokens: &[Token], depth: Depth) -> Result<Option<Expression>> {
    let forward = find_all_top_level(tokens, |token| token.is_operator("|>"));
    if !forward.is_empty() {
        return parse_chain(tokens, &forward, false, depth, |_, left, right| {
            Ok(Expression::LeftPipe(Pipe {
                left: Box::new(left),
                right: Box::new(right),
            }))
        })
        .map(Some);
    }
    let backward = find_all_top_level(tokens, |token| token.is_operator("<|"));
    if !backward.is_empty() {
        return parse_chain(tokens, &backward, true, depth, |_, left, right| {
            Ok(Expression::RightPipe(Pipe {
                left: Box::new(left),
                right: Box::new(right),
            }))
        })
        .map(Some);
    }
    Ok(None)
}

fn combine_operator(token: &Token, left: Expression, right: Expression) -> Result<Expression> {
    let symbol = token.text();
    if symbol == "::" {
        return Ok(Expression::ListPrepend(ListPrepend {
            left: Box::new(left),
            right: Box::new(right),
        }));
    }
    let operator = BinaryOperator::from_symbol(&symbol)
        .ok_or_else(|| anyhow!("Unknown operator `{symbol}`"))?;
    Ok(Expression::binary(operator, left, right))
}

pub(crate) fn is_constructor_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase) && !is_number(name)
}

fn parse_single_token(token: &Token, depth: Depth) -> Result<Expression> {
    match token {
        Token::Literal(body) if body.starts_with('[') => parse_list(body, depth),
        Token::Literal(body) => Ok(Expression::value(body.clone())),
        Token::StringToken(body) => Ok(Expression::StringValue(StringValue { body: body.clone() })),
        Token::FormatStringToken(body) => {
            Ok(Expression::FormatStringValue(FormatStringValue { body: body.clone() }))
        }
        Token::Identifier(name) if name.contains('.') => parse_module_reference(name, &[], depth),
        Token::Identifier(name) if is_constructor_name(name) => {
            Ok(Expression::Constructor(Constructor {
                constructor: name.clone(),
                pattern: ObjectLiteral::default(),
            }))
        }
        Token::Identifier(name) => Ok(Expression::value(name.clone())),
        other => bail!("Unexpected `{}` in an expression", other.text()),
    }
}

fn parse_module_reference(name: &str, args: &[Token], depth: Depth) -> Result<Expression> {
    let mut path = name.split('.').map(str::to_string).collect::<Vec<_>>();
    let last = path.pop().unwrap_or_default();
    if last.is_empty() || path.iter().any(String::is_empty) {
        bail!("Invalid module reference `{name}`");
    }

    let value = if trim(args).is_empty() {
        parse_single_token(&Token::Identifier(last), depth)?
    } else {
        parse_application(&last, args, depth)?
    };

    Ok(Expression::ModuleReference(ModuleReference {
        path,
        value: Box::new(value),
    }))
}

fn parse_application(name: &str, rest: &[Token], depth: Depth) -> Result<Expression> {
    if name.contains('.') {
        return parse_module_reference(name, rest, depth);
    }

    if is_constructor_name(name) {
        let rest = trim(rest);
        let wraps_object = matches!(rest.first(), Some(Token::OpenCurlyBracket))
            && matching_close(rest, 0) == Some(rest.len() - 1);
        if !wraps_object {
            bail!(
                "The constructor `{name}` must be given exactly one object literal but got `{}`",
                tokens_to_text(rest)
            );
        }
        return Ok(Expression::Constructor(Constructor {
            constructor: name.to_string(),
            pattern: parse_object_literal(rest, depth)?,
        }));
    }

    Ok(Expression::FunctionCall(FunctionCall {
        name: name.to_string(),
        args: parse_arguments(rest, depth)?,
    }))
}

/// Whitespace separated call arguments. Bracket and brace groups are one argument each; a
/// `\` takes the rest of the tokens as a lambda.
fn parse_arguments(tokens: &[Token], depth: Depth) -> Result<Vec<Expression>> {
    let mut args = Vec::new();
    let mut index = 0;
    while let Some(token) = tokens.get(index) {
        match token {
            Token::Whitespace(_) => index += 1,
            Token::OpenBracket | Token::OpenCurlyBracket => {
                let close = matching_close(tokens, index)
                    .ok_or_else(|| FrontendError::UnbalancedBrackets(tokens_to_text(tokens)))?;
                args.push(parse_tokens(&tokens[index..=close], depth)?);
                index = close + 1;
            }
            Token::CloseBracket | Token::CloseCurlyBracket => {
                return Err(FrontendError::UnbalancedBrackets(tokens_to_text(tokens)).into());
            }
            Token::Backslash => {
                args.push(Expression::Lambda(parse_lambda(&tokens[index..], depth)?));
                break;
            }
            _ => {
                args.push(parse_single_token(token, depth)?);
                index += 1;
            }
        }
    }
    Ok(args)
}

pub(crate) fn parse_object_literal(tokens: &[Token], depth: Depth) -> Result<ObjectLiteral> {
    let text = tokens_to_text(tokens);
    let inner = &tokens[1..tokens.len().saturating_sub(1).max(1)];
    let mut literal = ObjectLiteral::default();
    if trim(inner).is_empty() {
        return Ok(literal);
    }

    let entries = split_top_level(inner, |token| matches!(token, Token::Comma));
    for (position, entry) in entries.into_iter().enumerate() {
        let entry = trim(entry);
        match entry.first() {
            Some(Token::Identifier(name)) if name.starts_with("...") => {
                if position != 0 {
                    bail!("The spread `{name}` must come first in `{}`", text.trim());
                }
                let mut base = vec![Token::Identifier(name.trim_start_matches('.').to_string())];
                base.extend_from_slice(&entry[1..]);
                literal.base = Some(Box::new(parse_tokens(&base, depth)?));
            }
            Some(Token::Identifier(name)) => {
                let value = match trim(&entry[1..]).split_first() {
                    Some((Token::Colon, value)) => trim(value),
                    _ => bail!(
                        "Expected `name: value` but found `{}` in `{}`",
                        tokens_to_text(entry).trim(),
                        text.trim()
                    ),
                };
                if value.is_empty() {
                    bail!("Missing a value for the field `{name}` in `{}`", text.trim());
                }
                literal.fields.push(Field {
                    name: name.clone(),
                    value: parse_tokens(value, depth)?,
                });
            }
            _ => bail!(
                "Expected `name: value` but found `{}` in `{}`",
                tokens_to_text(entry).trim(),
                text.trim()
            ),
        }
    }
    Ok(literal)
}

fn parse_list(body: &str, depth: Depth) -> Result<Expression> {
    let Some(inner) = body.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) else {
        return Err(FrontendError::UnbalancedBrackets(body.to_string()).into());
    };

    if let Some((start, end)) = split_range(inner) {
        return Ok(Expression::ListRange(ListRange {
            start: parse_range_bound(start, depth)?,
            end: parse_range_bound(end, depth)?,
        }));
    }

    let tokens = strip_comments(tokenize(inner));
    if trim(&tokens).is_empty() {
        return Ok(Expression::ListValue(ListValue { items: Vec::new() }));
    }

    let items = split_top_level(&tokens, |token| matches!(token, Token::Comma))
        .into_iter()
        .map(|item| parse_tokens(item, depth))
        .collect::<Result<Vec<_>>>()?;
    Ok(Expression::ListValue(ListValue { items }))
}

/// Position of a `..` outside strings and nested brackets.
fn split_range(inner: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    let mut chars = inner.char_indices().peekable();
    while let Some((offset, ch)) = chars.next() {
        if let Some(open) = quote {
            if ch == open && !escaped {
                quote = None;
            }
            escaped = ch == '\\' && !escaped;
            continue;
        }
        match ch {
            '"' | '`' => quote = Some(ch),
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            '.' if depth == 0 && chars.peek().is_some_and(|(_, next)| *next == '.') => {
                return Some((&inner[..offset], &inner[offset + 2..]));
            }
            _ => {}
        }
    }
    None
}

fn parse_range_bound(text: &str, depth: Depth) -> Result<Value> {
    match parse_expression_with_depth(text, depth)? {
        Expression::Value(value) => Ok(value),
        _ => bail!(
            "List ranges must be between two values but found `{}`",
            text.trim()
        ),
    }
}

pub(crate) fn parse_lambda(tokens: &[Token], depth: Depth) -> Result<Lambda> {
    let text = tokens_to_text(tokens);
    let arrow = tokens
        .iter()
        .position(|token| matches!(token, Token::Arrow))
        .ok_or_else(|| anyhow!("Missing `->` in the lambda `{}`", text.trim()))?;

    let args = tokens[1..arrow]
        .iter()
        .filter(|token| !token.is_whitespace())
        .map(|token| match token {
            Token::Identifier(name) => Ok(name.clone()),
            other => bail!(
                "Unexpected `{}` in the arguments of the lambda `{}`",
                other.text(),
                text.trim()
            ),
        })
        .collect::<Result<Vec<_>>>()?;
    if args.is_empty() {
        bail!("The lambda `{}` needs at least one argument", text.trim());
    }

    let body = trim(&tokens[arrow + 1..]);
    if body.is_empty() {
        bail!("Missing a body for the lambda `{}`", text.trim());
    }

    Ok(Lambda {
        args,
        body: Box::new(parse_tokens(body, depth)?),
    })
}

fn parse_lambda_call(tokens: &[Token], depth: Depth) -> Result<Expression> {
    let close = matching_close(tokens, 0)
        .ok_or_else(|| FrontendError::UnbalancedBrackets(tokens_to_text(tokens)))?;
    let Expression::Lambda(lambda) = parse_tokens(&tokens[..=close], depth)? else {
        bail!(
            "Only lambdas can be called with arguments but found `{}`",
            tokens_to_text(&tokens[..=close])
        );
    };
    Ok(Expression::LambdaCall(LambdaCall {
        lambda,
        args: parse_arguments(&tokens[close + 1..], depth)?,
    }))
}
