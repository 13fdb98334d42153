//! Line indentation helpers shared by the `if`, `case`, `let` and block parsers.

use anyhow::{bail, Result};

pub const INDENT_WIDTH: usize = 4;

pub fn indent_level(line: &str) -> usize {
    line.chars()
        .take_while(|ch| ch.is_whitespace())
        .map(|ch| if ch == '\t' { INDENT_WIDTH } else { 1 })
        .sum()
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Removes the smallest indentation shared by every non-blank line.
pub fn dedent<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let shared = lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| !is_blank(line))
        .map(indent_level)
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            if is_blank(line) {
                String::new()
            } else {
                strip_indent(line, shared).to_string()
            }
        })
        .collect()
}

fn strip_indent(line: &str, width: usize) -> &str {
    let mut removed = 0;
    for (offset, ch) in line.char_indices() {
        if removed >= width || !ch.is_whitespace() {
            return &line[offset..];
        }
        removed += if ch == '\t' { INDENT_WIDTH } else { 1 };
    }
    ""
}

/// Drops leading and trailing blank lines.
pub fn trim_blank_lines<S: AsRef<str>>(lines: &[S]) -> &[S] {
    let start = lines
        .iter()
        .position(|line| !is_blank(line.as_ref()))
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|line| !is_blank(line.as_ref()))
        .map_or(start, |index| index + 1);
    &lines[start..end]
}

/// Lines of a `let ... in ...` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetSplit {
    pub let_lines: Vec<String>,
    pub body_lines: Vec<String>,
}

/// Splits a body starting with `let` at the `in` sitting at the same indentation.
/// Returns `None` when the body has no `let`.
pub fn split_let<S: AsRef<str>>(lines: &[S]) -> Result<Option<LetSplit>> {
    let lines = trim_blank_lines(lines);
    let Some(first) = lines.first().map(AsRef::as_ref) else {
        return Ok(None);
    };

    let header = first.trim();
    if header != "let" && !header.starts_with("let ") {
        return Ok(None);
    }

    let indent = indent_level(first);
    let Some(in_index) = lines.iter().position(|line| {
        let line = line.as_ref();
        let trimmed = line.trim();
        indent_level(line) == indent && (trimmed == "in" || trimmed.starts_with("in "))
    }) else {
        bail!("Missing `in` for the `let` starting with `{header}`");
    };

    let mut let_lines = Vec::new();
    if let Some(inline) = header.strip_prefix("let ") {
        let_lines.push(inline.trim().to_string());
    }
    let_lines.extend(
        lines[1..in_index]
            .iter()
            .map(|line| line.as_ref().to_string()),
    );

    let mut body_lines = Vec::new();
    let in_line = lines[in_index].as_ref().trim();
    if let Some(inline) = in_line.strip_prefix("in ") {
        body_lines.push(inline.trim().to_string());
    }
    body_lines.extend(
        lines[in_index + 1..]
            .iter()
            .map(|line| line.as_ref().to_string()),
    );

    Ok(Some(LetSplit {
        let_lines: dedent(&let_lines),
        body_lines: dedent(&body_lines),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_spaces_and_tabs() {
        assert_eq!(indent_level("    x"), 4);
        assert_eq!(indent_level("\tx"), 4);
        assert_eq!(indent_level("x"), 0);
    }

    #[test]
    fn dedent_keeps_relative_indentation() {
        let lines = ["    if a then", "        b", "", "    else", "        c"];
        assert_eq!(
            dedent(&lines),
            vec!["if a then", "    b", "", "else", "    c"]
        );
    }

    #[test]
    fn splits_let_at_matching_in() {
        let lines = [
            "let",
            "    x: number",
            "    x =",
            "        1",
            "in",
            "x + 1",
        ];
        let split = split_let(&lines).unwrap().unwrap();
        assert_eq!(split.let_lines, vec!["x: number", "x =", "    1"]);
        assert_eq!(split.body_lines, vec!["x + 1"]);
    }

    #[test]
    fn let_without_in_is_an_error() {
        let lines = ["let", "    x: number", "    x = 1", "x"];
        let error = split_let(&lines).unwrap_err();
        assert!(error.to_string().contains("Missing `in`"));
    }

    #[test]
    fn bodies_without_let_are_left_alone() {
        assert_eq!(split_let(&["a + b"]).unwrap(), None);
        assert_eq!(split_let(&["letter"]).unwrap(), None);
    }
}
