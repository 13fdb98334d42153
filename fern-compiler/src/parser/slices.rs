use crate::lexer::Token;

pub(crate) fn opens(token: &Token) -> bool {
    matches!(token, Token::OpenBracket | Token::OpenCurlyBracket)
}

pub(crate) fn closes(token: &Token) -> bool {
    matches!(token, Token::CloseBracket | Token::CloseCurlyBracket)
}

pub(crate) fn trim(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|token| !token.is_whitespace())
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|token| !token.is_whitespace())
        .map_or(start, |index| index + 1);
    &tokens[start..end]
}

pub(crate) fn without_whitespace(tokens: &[Token]) -> Vec<&Token> {
    tokens.iter().filter(|token| !token.is_whitespace()).collect()
}

/// Index of the bracket closing the one at `open`.
pub(crate) fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        if opens(token) {
            depth += 1;
        } else if closes(token) {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

/// The inside of `( ... )` when the brackets wrap the whole slice.
pub(crate) fn strip_outer_brackets(tokens: &[Token]) -> Option<&[Token]> {
    match tokens.first() {
        Some(Token::OpenBracket) if matching_close(tokens, 0) == Some(tokens.len() - 1) => {
            Some(&tokens[1..tokens.len() - 1])
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Occurrence {
    First,
    Last,
}

/// Indexes of every token outside any `()`/`{}` nesting that matches `predicate`.
/// Scanning stops at a top-level `\` because everything after it belongs to a lambda
/// body.
pub(crate) fn find_all_top_level(
    tokens: &[Token],
    mut predicate: impl FnMut(&Token) -> bool,
) -> Vec<usize> {
    let mut depth = 0usize;
    let mut found = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        if opens(token) {
            depth += 1;
        } else if closes(token) {
            depth = depth.saturating_sub(1);
        } else if depth == 0 {
            if matches!(token, Token::Backslash) {
                break;
            }
            if predicate(token) {
                found.push(index);
            }
        }
    }
    found
}

pub(crate) fn find_top_level(
    tokens: &[Token],
    occurrence: Occurrence,
    predicate: impl FnMut(&Token) -> bool,
) -> Option<usize> {
    let found = find_all_top_level(tokens, predicate);
    match occurrence {
        Occurrence::First => found.first().copied(),
        Occurrence::Last => found.last().copied(),
    }
}

pub(crate) fn split_top_level(
    tokens: &[Token],
    is_separator: impl Fn(&Token) -> bool,
) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, token) in tokens.iter().enumerate() {
        if opens(token) {
            depth += 1;
        } else if closes(token) {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && is_separator(token) {
            parts.push(&tokens[start..index]);
            start = index + 1;
        }
    }
    parts.push(&tokens[start..]);
    parts
}

pub(crate) fn contains_newline(tokens: &[Token]) -> bool {
    tokens.iter().any(Token::contains_newline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn outer_brackets_only_strip_when_they_wrap_everything() {
        let wrapped = tokenize("(a + b)");
        assert_eq!(strip_outer_brackets(&wrapped).map(<[Token]>::len), Some(5));

        let separate = tokenize("(a) + (b)");
        assert!(strip_outer_brackets(&separate).is_none());
    }

    #[test]
    fn top_level_search_ignores_nested_operators() {
        let tokens = tokenize("f (a + b) + c");
        let plus = find_top_level(&tokens, Occurrence::First, |token| token.is_operator("+"));
        assert_eq!(plus, Some(tokens.len() - 3));
    }

    #[test]
    fn top_level_search_stops_at_lambdas() {
        let tokens = tokenize("List.map \\x -> x + 1");
        assert!(find_top_level(&tokens, Occurrence::Last, |token| token.is_operator("+")).is_none());
    }

    #[test]
    fn finds_every_top_level_match() {
        let tokens = tokenize("a + (b + c) + d");
        let plus = find_all_top_level(&tokens, |token| token.is_operator("+"));
        assert_eq!(plus, vec![2, 12]);
    }

    #[test]
    fn splits_on_top_level_commas() {
        let tokens = tokenize("a: 1, b: { c: 2, d: 3 }");
        let parts = split_top_level(&tokens, |token| matches!(token, Token::Comma));
        assert_eq!(parts.len(), 2);
    }
}
