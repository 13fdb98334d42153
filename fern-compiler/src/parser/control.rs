//! `if`, `case` and `let`: the indentation-sensitive expression forms.

use anyhow::{anyhow, bail, Result};

use super::expression::{is_constructor_name, parse_expression_with_depth, parse_tokens};
use super::parse_block_with_depth;
use super::slices::{
    closes, contains_newline, find_top_level, matching_close, opens, split_top_level, trim,
    Occurrence,
};
use crate::ast::{
    Block, Branch, BranchPattern, CaseStatement, Destructure, Expression, FormatStringValue,
    IfStatement, ListDestructure, ListDestructurePart, StringValue, Value,
};
use crate::error::Depth;
use crate::indentation::{dedent, indent_level, is_blank, split_let, trim_blank_lines};
use crate::lexer::{strip_comments, tokenize, tokens_to_text, Token};
use crate::segment::into_blocks;

pub(crate) fn parse_if(tokens: &[Token], depth: Depth) -> Result<IfStatement> {
    if contains_newline(tokens) {
        parse_multiline_if(tokens, depth)
    } else {
        parse_inline_if(tokens, depth)
    }
}

/// Finds `keyword` belonging to the current `if`, skipping nested `if ... else` pairs.
fn find_branch_keyword(tokens: &[Token], keyword: &str) -> Option<usize> {
    let mut brackets = 0usize;
    let mut nested = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        if opens(token) {
            brackets += 1;
        } else if closes(token) {
            brackets = brackets.saturating_sub(1);
        } else if brackets == 0 {
            if nested == 0 && token.is_keyword(keyword) {
                return Some(index);
            }
            if token.is_keyword("if") {
                nested += 1;
            } else if token.is_keyword("else") {
                nested = nested.saturating_sub(1);
            }
        }
    }
    None
}

fn parse_inline_if(tokens: &[Token], depth: Depth) -> Result<IfStatement> {
    let text = tokens_to_text(tokens);
    let rest = &tokens[1..];
    let then = find_branch_keyword(rest, "then")
        .ok_or_else(|| anyhow!("Missing `then` in `{}`", text.trim()))?;
    let after_then = &rest[then + 1..];
    let otherwise = find_branch_keyword(after_then, "else")
        .ok_or_else(|| anyhow!("Missing `else` in `{}`", text.trim()))?;

    Ok(IfStatement {
        predicate: Box::new(parse_tokens(&rest[..then], depth)?),
        if_body: Box::new(parse_tokens(&after_then[..otherwise], depth)?),
        if_let_body: Vec::new(),
        else_body: Box::new(parse_tokens(&after_then[otherwise + 1..], depth)?),
        else_let_body: Vec::new(),
    })
}

fn is_else_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed == "else" || trimmed.starts_with("else ")
}

/// Tokens of a header line such as `if x then` or `case x of`, checked for the closing keyword.
fn header_tokens(line: &str, closing: &str) -> Result<Vec<Token>> {
    let tokens = strip_comments(tokenize(line));
    let header = trim(&tokens);
    if header.len() < 2 || !header.last().is_some_and(|token| token.is_keyword(closing)) {
        bail!("Expected `{closing}` at the end of `{}`", line.trim());
    }
    let predicate = trim(&header[1..header.len() - 1]);
    if predicate.is_empty() {
        bail!("Missing a predicate in `{}`", line.trim());
    }
    Ok(predicate.to_vec())
}

fn parse_multiline_if(tokens: &[Token], depth: Depth) -> Result<IfStatement> {
    let text = tokens_to_text(tokens);
    let lines = text.lines().collect::<Vec<_>>();
    let header = lines[0];
    let predicate = header_tokens(header, "then")?;

    let rest = &lines[1..];
    let indent = rest
        .iter()
        .filter(|line| !is_blank(line))
        .map(|line| indent_level(line))
        .min()
        .ok_or_else(|| anyhow!("Missing the body of `{}`", header.trim()))?;
    let else_index = rest
        .iter()
        .position(|line| indent_level(line) == indent && is_else_line(line))
        .ok_or_else(|| anyhow!("Missing `else` for `{}`", header.trim()))?;

    let mut else_lines = Vec::new();
    if let Some(inline) = rest[else_index].trim().strip_prefix("else") {
        if !inline.trim().is_empty() {
            else_lines.push(inline.trim().to_string());
        }
    }
    else_lines.extend(rest[else_index + 1..].iter().map(|line| line.to_string()));

    let (if_body, if_let_body) = parse_branch_body(&rest[..else_index], depth, header.trim())?;
    let (else_body, else_let_body) = parse_branch_body(&else_lines, depth, "else")?;

    Ok(IfStatement {
        predicate: Box::new(parse_tokens(&predicate, depth)?),
        if_body: Box::new(if_body),
        if_let_body,
        else_body: Box::new(else_body),
        else_let_body,
    })
}

/// Parses the lines of one branch: an optional `let ... in` followed by an expression.
pub(crate) fn parse_branch_body<S: AsRef<str>>(
    lines: &[S],
    depth: Depth,
    owner: &str,
) -> Result<(Expression, Vec<Block>)> {
    let lines = dedent(trim_blank_lines(lines));
    if lines.is_empty() {
        bail!("Missing the body of `{owner}`");
    }

    match split_let(&lines)? {
        Some(split) => {
            let let_body = parse_let_blocks(&split.let_lines, depth)?;
            let body = trim_blank_lines(&split.body_lines);
            if body.is_empty() {
                bail!("Missing an expression after `in` in `{owner}`");
            }
            Ok((
                parse_expression_with_depth(&body.join("\n"), depth)?,
                let_body,
            ))
        }
        None => Ok((parse_expression_with_depth(&lines.join("\n"), depth)?, Vec::new())),
    }
}

fn parse_let_blocks(lines: &[String], depth: Depth) -> Result<Vec<Block>> {
    into_blocks(&lines.join("\n"))
        .iter()
        .map(|unparsed| {
            let block = parse_block_with_depth(unparsed, depth)?;
            match block {
                Block::Function(_) | Block::Const(_) | Block::Comment | Block::MultilineComment => {
                    Ok(block)
                }
                _ => bail!(
                    "Only functions and constants can be defined in a `let` but found `{}`",
                    unparsed.lines.first().map_or("", |line| line.trim())
                ),
            }
        })
        .collect()
}

pub(crate) fn parse_case(tokens: &[Token], depth: Depth) -> Result<CaseStatement> {
    let text = tokens_to_text(tokens);
    if !contains_newline(tokens) {
        bail!("The branches of `{}` must be on separate lines", text.trim());
    }

    let lines = text.lines().collect::<Vec<_>>();
    let header = lines[0];
    let predicate = header_tokens(header, "of")?;

    let rest = &lines[1..];
    let indent = rest
        .iter()
        .find(|line| !is_blank(line))
        .map(|line| indent_level(line))
        .ok_or_else(|| anyhow!("Missing branches for `{}`", header.trim()))?;

    let mut heads: Vec<(&str, Vec<&str>)> = Vec::new();
    for &line in rest {
        if is_blank(line) {
            if let Some((_, body)) = heads.last_mut() {
                body.push("");
            }
            continue;
        }
        let level = indent_level(line);
        if level == indent {
            heads.push((line.trim(), Vec::new()));
        } else if level > indent {
            if let Some((_, body)) = heads.last_mut() {
                body.push(line);
            }
        } else {
            bail!(
                "Unexpected indentation in the branches of `{}` at `{}`",
                header.trim(),
                line.trim()
            );
        }
    }

    let branches = heads
        .into_iter()
        .map(|(head, body)| parse_branch(head, &body, depth))
        .collect::<Result<Vec<_>>>()?;

    let matches_lists = branches.iter().any(|branch| {
        matches!(
            branch.pattern,
            BranchPattern::ListDestructure(_) | BranchPattern::EmptyList
        )
    });
    let has_default = branches
        .iter()
        .any(|branch| branch.pattern == BranchPattern::Default);
    if matches_lists && !has_default {
        bail!("`{}` matches on a list and needs a `default` branch", header.trim());
    }

    Ok(CaseStatement {
        predicate: Box::new(parse_tokens(&predicate, depth)?),
        branches,
    })
}

fn parse_branch(head: &str, continuation: &[&str], depth: Depth) -> Result<Branch> {
    let tokens = strip_comments(tokenize(head));
    let arrow = find_top_level(&tokens, Occurrence::First, |token| {
        matches!(token, Token::Arrow)
    })
    .ok_or_else(|| anyhow!("Expected `->` in the case branch `{head}`"))?;

    let pattern = parse_branch_pattern(trim(&tokens[..arrow]))?;

    let mut lines = Vec::new();
    let inline = tokens_to_text(&tokens[arrow + 1..]);
    if !inline.trim().is_empty() {
        lines.push(inline.trim().to_string());
    }
    lines.extend(continuation.iter().map(|line| line.to_string()));

    let (body, let_body) = parse_branch_body(&lines, depth, head)?;
    Ok(Branch {
        pattern,
        body,
        let_body,
    })
}

fn is_empty_list(body: &str) -> bool {
    body.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(|inner| inner.trim().is_empty())
}

fn parse_branch_pattern(tokens: &[Token]) -> Result<BranchPattern> {
    let text = tokens_to_text(tokens);
    let text = text.trim();

    if find_top_level(tokens, Occurrence::First, |token| token.is_operator("::")).is_some() {
        let parts = split_top_level(tokens, |token| token.is_operator("::"))
            .into_iter()
            .map(|part| parse_list_part(trim(part), text))
            .collect::<Result<Vec<_>>>()?;
        return Ok(BranchPattern::ListDestructure(ListDestructure { parts }));
    }

    match tokens {
        [Token::Keyword(keyword)] if keyword == "default" => Ok(BranchPattern::Default),
        [Token::StringToken(body)] => Ok(BranchPattern::StringValue(StringValue {
            body: body.clone(),
        })),
        [Token::FormatStringToken(body)] => {
            Ok(BranchPattern::FormatStringValue(FormatStringValue {
                body: body.clone(),
            }))
        }
        [Token::Literal(body)] if is_empty_list(body) => Ok(BranchPattern::EmptyList),
        [Token::Identifier(name), rest @ ..] if is_constructor_name(name) => {
            parse_destructure(name, rest, text).map(BranchPattern::Destructure)
        }
        _ => bail!("Unknown case pattern `{text}`"),
    }
}

fn parse_list_part(tokens: &[Token], pattern: &str) -> Result<ListDestructurePart> {
    match tokens {
        [Token::Literal(body)] if is_empty_list(body) => Ok(ListDestructurePart::EmptyList),
        [Token::StringToken(body)] => Ok(ListDestructurePart::StringValue(StringValue {
            body: body.clone(),
        })),
        [Token::FormatStringToken(body)] => {
            Ok(ListDestructurePart::FormatStringValue(FormatStringValue {
                body: body.clone(),
            }))
        }
        [Token::Identifier(name), rest @ ..] if is_constructor_name(name) => {
            parse_destructure(name, rest, pattern).map(ListDestructurePart::Destructure)
        }
        [Token::Identifier(name)] => Ok(ListDestructurePart::Value(Value { body: name.clone() })),
        _ => bail!(
            "Unknown list pattern `{}` in `{pattern}`",
            tokens_to_text(tokens).trim()
        ),
    }
}

fn parse_destructure(name: &str, rest: &[Token], pattern: &str) -> Result<Destructure> {
    let rest = trim(rest);
    let mut bindings = Vec::new();

    if !rest.is_empty() {
        let wraps_braces = matches!(rest.first(), Some(Token::OpenCurlyBracket))
            && matching_close(rest, 0) == Some(rest.len() - 1);
        if !wraps_braces {
            bail!("Unknown case pattern `{pattern}`");
        }
        let inner = &rest[1..rest.len() - 1];
        if !trim(inner).is_empty() {
            for binding in split_top_level(inner, |token| matches!(token, Token::Comma)) {
                match trim(binding) {
                    [Token::Identifier(binding)] => bindings.push(binding.clone()),
                    other => bail!(
                        "Expected a name to bind but found `{}` in `{pattern}`",
                        tokens_to_text(other).trim()
                    ),
                }
            }
        }
    }

    Ok(Destructure {
        constructor: name.to_string(),
        bindings,
    })
}
