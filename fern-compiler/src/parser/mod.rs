mod control;
mod expression;
mod slices;

use anyhow::{anyhow, bail, Result};

pub use expression::parse_expression;
pub(crate) use expression::{is_constructor_name, Precedence};

use self::control::parse_branch_body;
use self::slices::{matching_close, split_top_level, trim, without_whitespace};
use crate::ast::{
    AnonFunctionArg, Block, Const, Export, Expression, Function, FunctionArg, FunctionArgument,
    Import, ImportModule, ImportNamespace, StringValue, Tag, TagArg, TypeAlias, UnionType,
    UnionUntaggedType,
};
use crate::error::{Depth, FrontendError};
use crate::lexer::{strip_comments, tokenize, tokens_to_text, Token};
use crate::segment::{block_kind, implementation_line_index, BlockKind, UnparsedBlock};
use crate::types::{parse_type_roots, parse_type_tokens, FixedType, Property, Type};

pub fn parse_block(block: &UnparsedBlock) -> Result<Block> {
    parse_block_with_depth(block, Depth::default())
}

pub(crate) fn parse_block_with_depth(block: &UnparsedBlock, depth: Depth) -> Result<Block> {
    let depth = depth.deeper()?;
    match block.kind {
        BlockKind::Import => parse_import(block).map(Block::Import),
        BlockKind::Export => parse_export(block).map(Block::Export),
        BlockKind::UnionType => parse_union_type(block, depth).map(Block::UnionType),
        BlockKind::UnionUntaggedType => {
            parse_union_untagged_type(block).map(Block::UnionUntaggedType)
        }
        BlockKind::TypeAlias => parse_type_alias(block, depth).map(Block::TypeAlias),
        BlockKind::Function => parse_function(block, depth).map(Block::Function),
        BlockKind::Const => parse_const(block, depth).map(Block::Const),
        BlockKind::Comment => Ok(Block::Comment),
        BlockKind::MultilineComment => Ok(Block::MultilineComment),
        BlockKind::Unknown => {
            let text = block.text();
            block_kind(&text)?;
            let first_line = text.lines().next().unwrap_or_default().trim().to_string();
            Err(FrontendError::UnknownBlock(first_line).into())
        }
    }
}

fn block_tokens(block: &UnparsedBlock) -> Vec<Token> {
    strip_comments(tokenize(&block.text()))
}

fn parse_name_list(tokens: &[&Token], context: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        match (index % 2, token) {
            (0, Token::Identifier(name)) => names.push(name.clone()),
            (1, Token::Comma) => {}
            _ => bail!("Unexpected `{}` in `{context}`", token.text()),
        }
    }
    if tokens.len() % 2 == 0 && !tokens.is_empty() {
        bail!("Trailing `,` in `{context}`");
    }
    Ok(names)
}

fn parse_import(block: &UnparsedBlock) -> Result<Import> {
    let tokens = block_tokens(block);
    let tokens = without_whitespace(&tokens);

    let mut groups: Vec<Vec<&Token>> = Vec::new();
    for token in tokens {
        if token.is_keyword("import") {
            groups.push(Vec::new());
        } else if let Some(group) = groups.last_mut() {
            group.push(token);
        } else {
            bail!("Expected `import` but found `{}`", token.text());
        }
    }

    let modules = groups
        .iter()
        .map(|group| parse_import_module(group))
        .collect::<Result<Vec<_>>>()?;
    Ok(Import { modules })
}

fn parse_import_module(tokens: &[&Token]) -> Result<ImportModule> {
    let text = tokens
        .iter()
        .map(|token| token.text())
        .collect::<Vec<_>>()
        .join(" ");
    let context = format!("import {text}");

    let (name, namespace, mut rest) = match tokens {
        [Token::StringToken(name), rest @ ..] => (name.clone(), ImportNamespace::Relative, rest),
        [Token::Identifier(name), rest @ ..] => (name.clone(), ImportNamespace::Global, rest),
        _ => bail!("Expected a module name in `{context}`"),
    };

    let mut alias = None;
    if let [Token::Keyword(keyword), Token::Identifier(name), remaining @ ..] = rest {
        if keyword == "as" {
            alias = Some(name.clone());
            rest = remaining;
        }
    }

    let mut exposing = Vec::new();
    if let [Token::Keyword(keyword), Token::OpenBracket, names @ .., Token::CloseBracket] = rest {
        if keyword == "exposing" {
            exposing = parse_name_list(names, &context)?;
            rest = &[];
        }
    }

    if let Some(token) = rest.first() {
        bail!("Unexpected `{}` in `{context}`", token.text());
    }

    Ok(ImportModule {
        name,
        alias,
        exposing,
        namespace,
    })
}

fn parse_export(block: &UnparsedBlock) -> Result<Export> {
    let tokens = block_tokens(block);
    let context = block.text();
    match without_whitespace(&tokens).as_slice() {
        [Token::Keyword(keyword), Token::OpenBracket, names @ .., Token::CloseBracket]
            if keyword == "exposing" =>
        {
            Ok(Export {
                names: parse_name_list(names, context.trim())?,
            })
        }
        _ => bail!("Expected `exposing (...)` but found `{}`", context.trim()),
    }
}

/// `type Name a b` or `type alias Name a b`, up to the `=`.
fn parse_type_header(tokens: &[Token]) -> Result<FixedType> {
    let context = tokens_to_text(tokens);
    let mut words = without_whitespace(tokens).into_iter().peekable();

    if !words.next().is_some_and(|token| token.is_keyword("type")) {
        bail!("Expected `type` at the start of `{}`", context.trim());
    }
    if words.peek().is_some_and(|token| token.is_keyword("alias")) {
        words.next();
    }

    let name = match words.next() {
        Some(Token::Identifier(name)) if is_constructor_name(name) => name.clone(),
        Some(other) => bail!(
            "Type names must start with an uppercase letter but found `{}`",
            other.text()
        ),
        None => bail!("Missing a type name in `{}`", context.trim()),
    };

    let args = words
        .map(|token| match token {
            Token::Identifier(arg) if arg.starts_with(char::is_lowercase) => {
                Ok(Type::generic(arg.clone()))
            }
            other => bail!(
                "Expected a lowercase type variable but found `{}` in `{}`",
                other.text(),
                context.trim()
            ),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FixedType { name, args })
}

fn split_at_assign<'a>(
    tokens: &'a [Token],
    block: &UnparsedBlock,
) -> Result<(&'a [Token], &'a [Token])> {
    let assign = tokens
        .iter()
        .position(|token| matches!(token, Token::Assign))
        .ok_or_else(|| anyhow!("Expected `=` in `{}`", block.text().trim()))?;
    Ok((&tokens[..assign], &tokens[assign + 1..]))
}

/// `name: Type` entries between braces, as in tag payloads and aliases.
fn parse_properties(tokens: &[Token], depth: Depth) -> Result<Vec<Property>> {
    let context = tokens_to_text(tokens);
    let tokens = trim(tokens);
    let wraps_braces = matches!(tokens.first(), Some(Token::OpenCurlyBracket))
        && matching_close(tokens, 0) == Some(tokens.len() - 1);
    if !wraps_braces {
        bail!("Expected `{{ name: type }}` but found `{}`", context.trim());
    }

    let inner = &tokens[1..tokens.len() - 1];
    if trim(inner).is_empty() {
        return Ok(Vec::new());
    }

    split_top_level(inner, |token| matches!(token, Token::Comma))
        .into_iter()
        .map(|entry| {
            let entry = trim(entry);
            let Some((Token::Identifier(name), rest)) = entry.split_first() else {
                bail!("Expected `name: type` but found `{}`", tokens_to_text(entry).trim());
            };
            let Some((Token::Colon, type_tokens)) = trim(rest).split_first() else {
                bail!("Expected `name: type` but found `{}`", tokens_to_text(entry).trim());
            };
            Ok(Property::new(name.clone(), parse_type_tokens(type_tokens, depth)?))
        })
        .collect()
}

fn parse_union_type(block: &UnparsedBlock, depth: Depth) -> Result<UnionType> {
    let tokens = block_tokens(block);
    let (header, body) = split_at_assign(&tokens, block)?;
    let type_ = parse_type_header(header)?;

    let tags = split_top_level(body, |token| matches!(token, Token::Pipe))
        .into_iter()
        .map(|tag| parse_tag(trim(tag), depth))
        .collect::<Result<Vec<_>>>()?;

    Ok(UnionType { type_, tags })
}

fn parse_tag(tokens: &[Token], depth: Depth) -> Result<Tag> {
    let Some((Token::Identifier(name), rest)) = tokens.split_first() else {
        bail!("Expected a tag name but found `{}`", tokens_to_text(tokens).trim());
    };
    if !is_constructor_name(name) {
        bail!("Tag names must start with an uppercase letter but found `{name}`");
    }

    let args = if trim(rest).is_empty() {
        Vec::new()
    } else {
        parse_properties(rest, depth)?
            .into_iter()
            .map(|property| TagArg {
                name: property.name,
                type_: property.type_,
            })
            .collect()
    };

    Ok(Tag {
        name: name.clone(),
        args,
    })
}

fn parse_union_untagged_type(block: &UnparsedBlock) -> Result<UnionUntaggedType> {
    let tokens = block_tokens(block);
    let (header, body) = split_at_assign(&tokens, block)?;
    let type_ = parse_type_header(header)?;

    let values = split_top_level(body, |token| matches!(token, Token::Pipe))
        .into_iter()
        .map(|value| match trim(value) {
            [Token::StringToken(body)] => Ok(StringValue { body: body.clone() }),
            other => bail!(
                "Untagged union types can only contain strings but found `{}`",
                tokens_to_text(other).trim()
            ),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(UnionUntaggedType { type_, values })
}

fn parse_type_alias(block: &UnparsedBlock, depth: Depth) -> Result<TypeAlias> {
    let tokens = block_tokens(block);
    let (header, body) = split_at_assign(&tokens, block)?;
    let type_ = parse_type_header(header)?;
    let properties = parse_properties(body, depth)?;
    Ok(TypeAlias { type_, properties })
}

/// The parts shared by functions and constants.
struct Definition {
    name: String,
    types: Vec<Type>,
    arg_names: Vec<String>,
    let_body: Vec<Block>,
    body: Expression,
}

fn parse_definition(block: &UnparsedBlock, depth: Depth) -> Result<Definition> {
    let lines = &block.lines;
    let first_line = lines.first().map_or("", |line| line.trim());
    let implementation = implementation_line_index(lines)
        .ok_or_else(|| anyhow!("Missing an implementation for `{first_line}`"))?;

    let signature_tokens = strip_comments(tokenize(&lines[..implementation].join("\n")));
    let (name, type_tokens) = match trim(&signature_tokens).split_first() {
        Some((Token::Identifier(name), rest)) => match trim(rest).split_first() {
            Some((Token::Colon, type_tokens)) => (name.clone(), type_tokens),
            _ => bail!("Expected a type signature but found `{first_line}`"),
        },
        _ => bail!("Expected a type signature but found `{first_line}`"),
    };
    let types = parse_type_roots(type_tokens, depth)?;

    let header_line = &lines[implementation];
    let header_tokens = strip_comments(tokenize(header_line));
    let assign = header_tokens
        .iter()
        .position(|token| matches!(token, Token::Assign))
        .ok_or_else(|| anyhow!("Expected `=` in `{}`", header_line.trim()))?;

    let names = without_whitespace(&header_tokens[..assign])
        .into_iter()
        .map(|token| match token {
            Token::Identifier(name) => Ok(name.clone()),
            other => bail!("Unexpected `{}` in `{}`", other.text(), header_line.trim()),
        })
        .collect::<Result<Vec<_>>>()?;
    let Some((implementation_name, arg_names)) = names.split_first() else {
        bail!("Missing a name before `=` in `{}`", header_line.trim());
    };
    if *implementation_name != name {
        bail!(
            "The implementation of `{implementation_name}` does not match the type signature for `{name}`"
        );
    }

    let mut body_lines = Vec::new();
    let inline = tokens_to_text(&header_tokens[assign + 1..]);
    if !inline.trim().is_empty() {
        body_lines.push(inline.trim().to_string());
    }
    body_lines.extend(lines[implementation + 1..].iter().cloned());

    let (body, let_body) = parse_branch_body(&body_lines, depth, &name)?;

    Ok(Definition {
        name,
        types,
        arg_names: arg_names.to_vec(),
        let_body,
        body,
    })
}

fn parse_function(block: &UnparsedBlock, depth: Depth) -> Result<Function> {
    let definition = parse_definition(block, depth)?;
    let name = definition.name;

    let Some((return_type, parameters)) = definition.types.split_last() else {
        bail!("Missing a type for `{name}`");
    };
    if parameters.is_empty() {
        bail!("Expected a function type for `{name}` but found `{return_type}`");
    }
    if definition.arg_names.len() > parameters.len() {
        bail!(
            "The function `{name}` takes {} arguments but its type only declares {}",
            definition.arg_names.len(),
            parameters.len()
        );
    }

    let args = parameters
        .iter()
        .enumerate()
        .map(|(index, type_)| match definition.arg_names.get(index) {
            Some(arg) => FunctionArgument::FunctionArg(FunctionArg {
                name: arg.clone(),
                type_: type_.clone(),
            }),
            None => FunctionArgument::AnonFunctionArg(AnonFunctionArg {
                index,
                type_: type_.clone(),
            }),
        })
        .collect();

    Ok(Function {
        name,
        return_type: return_type.clone(),
        args,
        let_body: definition.let_body,
        body: definition.body,
    })
}

fn parse_const(block: &UnparsedBlock, depth: Depth) -> Result<Const> {
    let mut definition = parse_definition(block, depth)?;
    let name = definition.name;
    if !definition.arg_names.is_empty() {
        bail!(
            "The constant `{name}` cannot take arguments, but was given `{}`",
            definition.arg_names.join(" ")
        );
    }

    let type_ = if definition.types.len() == 1 {
        definition.types.remove(0)
    } else {
        Type::function(definition.types)
    };

    Ok(Const {
        name,
        type_,
        let_body: definition.let_body,
        value: definition.body,
    })
}
