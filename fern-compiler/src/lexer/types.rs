use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::{tokens_to_text, Token};
use crate::error::{Depth, FrontendError};

/// Tokens of a type signature, regrouped by brackets and arrows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeToken {
    Identifier { name: String },
    /// A named type applied to its arguments: `Maybe string`, `List (Maybe a)`.
    Base { body: Vec<TypeToken> },
    /// A curried arrow chain: `a -> b -> c`.
    Function { body: Vec<TypeToken> },
}

pub fn tokenize_type(tokens: &[Token]) -> Result<Vec<TypeToken>> {
    tokenize_type_with_depth(tokens, Depth::default())
}

pub(crate) fn tokenize_type_with_depth(tokens: &[Token], depth: Depth) -> Result<Vec<TypeToken>> {
    let depth = depth.deeper()?;
    let mut roots = Vec::new();
    let mut current: Vec<TypeToken> = Vec::new();
    let mut group: Vec<Token> = Vec::new();
    let mut indent = 0usize;

    for token in tokens {
        match token {
            Token::OpenBracket => {
                if indent > 0 {
                    group.push(token.clone());
                }
                indent += 1;
            }
            Token::CloseBracket => {
                if indent == 0 {
                    return Err(FrontendError::UnbalancedBrackets(tokens_to_text(tokens)).into());
                }
                indent -= 1;
                if indent > 0 {
                    group.push(token.clone());
                    continue;
                }

                let mut inner = tokenize_type_with_depth(&group, depth)?;
                if has_top_level_arrow(&group) {
                    current.push(TypeToken::Function { body: inner });
                } else if inner.len() == 1 {
                    current.extend(inner.pop());
                } else {
                    bail!("Expected a type inside `({})`", tokens_to_text(&group).trim());
                }
                group.clear();
            }
            _ if indent > 0 => group.push(token.clone()),
            Token::Arrow => {
                roots.push(close_buffer(std::mem::take(&mut current), tokens)?);
            }
            Token::Identifier(name) => current.push(TypeToken::Identifier { name: name.clone() }),
            Token::Whitespace(_) | Token::Comment(_) | Token::MultilineComment(_) => {}
            other => bail!(
                "Unexpected `{}` in type `{}`",
                other.text(),
                tokens_to_text(tokens).trim()
            ),
        }
    }

    if indent != 0 {
        return Err(FrontendError::UnbalancedBrackets(tokens_to_text(tokens)).into());
    }

    if !current.is_empty() || !roots.is_empty() {
        roots.push(close_buffer(current, tokens)?);
    }

    if roots.is_empty() {
        bail!("Expected a type but found nothing");
    }

    Ok(roots)
}

fn close_buffer(mut current: Vec<TypeToken>, tokens: &[Token]) -> Result<TypeToken> {
    if current.is_empty() {
        bail!("Missing type around `->` in `{}`", tokens_to_text(tokens).trim());
    }
    if current.len() == 1 && !matches!(current[0], TypeToken::Identifier { .. }) {
        return Ok(current.remove(0));
    }
    Ok(TypeToken::Base { body: current })
}

pub(crate) fn has_top_level_arrow(tokens: &[Token]) -> bool {
    let mut indent = 0usize;
    for token in tokens {
        match token {
            Token::OpenBracket => indent += 1,
            Token::CloseBracket => indent = indent.saturating_sub(1),
            Token::Arrow if indent == 0 => return true,
            _ => {}
        }
    }
    false
}
