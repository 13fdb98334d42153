//! Splits module text into top-level blocks of lines, one per declaration.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::error::FrontendError;
use crate::indentation::{indent_level, is_blank};
use crate::lexer::{has_top_level_arrow, strip_comments, tokenize, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Import,
    Export,
    UnionType,
    UnionUntaggedType,
    TypeAlias,
    Function,
    Const,
    Comment,
    MultilineComment,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnparsedBlock {
    pub kind: BlockKind,
    /// 1-based line of `lines[0]` in the module.
    pub line_start: usize,
    pub lines: Vec<String>,
}

impl UnparsedBlock {
    pub fn new(kind: BlockKind, line_start: usize, lines: Vec<String>) -> Self {
        Self {
            kind,
            line_start,
            lines,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn line_end(&self) -> usize {
        self.line_start + self.lines.len().saturating_sub(1)
    }
}

const CONTINUATION_PREFIXES: &[&str] = &["}", ")", "]", "|", "->", ","];

#[derive(Default)]
struct Segmenter {
    blocks: Vec<UnparsedBlock>,
    current: Option<(usize, Vec<String>)>,
    signature: Option<String>,
    comment_depth: usize,
}

impl Segmenter {
    fn push_line(&mut self, number: usize, line: &str) {
        if self.comment_depth > 0 {
            self.append(line);
            self.comment_depth = comment_depth_after(self.comment_depth, line);
            if self.comment_depth == 0 {
                self.close();
            }
            return;
        }

        if is_blank(line) {
            if self.current.is_some() {
                self.append(line);
            }
            return;
        }

        if indent_level(line) > 0 {
            if self.current.is_some() {
                self.append(line);
            } else {
                self.open(number, line);
            }
            return;
        }

        if line.starts_with("{-") {
            self.close();
            self.open(number, line);
            self.comment_depth = comment_depth_after(0, line);
            if self.comment_depth == 0 {
                self.close();
            }
            return;
        }

        if line.starts_with("--") {
            if self.signature.is_some() && self.current.is_some() {
                self.append(line);
                return;
            }
            self.close();
            self.open(number, line);
            self.close();
            return;
        }

        if self.continues_current(line) {
            self.append(line);
            return;
        }

        self.close();
        self.open(number, line);
        self.signature = signature_name(line);
    }

    fn continues_current(&mut self, line: &str) -> bool {
        let Some((_, lines)) = &self.current else {
            return false;
        };

        if CONTINUATION_PREFIXES
            .iter()
            .any(|prefix| line.starts_with(prefix))
        {
            return true;
        }

        let in_imports = lines
            .first()
            .is_some_and(|first| first_word(first) == "import");
        if in_imports && first_word(line) == "import" {
            return true;
        }

        let implements_signature = self
            .signature
            .as_deref()
            .is_some_and(|name| first_word(line) == name && signature_name(line).is_none());
        if implements_signature {
            self.signature = None;
            return true;
        }

        false
    }

    fn open(&mut self, number: usize, line: &str) {
        self.current = Some((number, vec![line.to_string()]));
    }

    fn append(&mut self, line: &str) {
        if let Some((_, lines)) = &mut self.current {
            lines.push(line.to_string());
        }
    }

    fn close(&mut self) {
        self.signature = None;
        let Some((line_start, mut lines)) = self.current.take() else {
            return;
        };
        while lines.last().is_some_and(|line| is_blank(line)) {
            lines.pop();
        }
        let kind = block_kind(&lines.join("\n")).unwrap_or(BlockKind::Unknown);
        self.blocks.push(UnparsedBlock::new(kind, line_start, lines));
    }

    fn finish(mut self) -> Vec<UnparsedBlock> {
        self.close();
        self.blocks
    }
}

pub fn into_blocks(source: &str) -> Vec<UnparsedBlock> {
    let mut segmenter = Segmenter::default();
    for (index, line) in source.lines().enumerate() {
        segmenter.push_line(index + 1, line);
    }
    segmenter.finish()
}

fn comment_depth_after(depth: usize, line: &str) -> usize {
    let opened = line.matches("{-").count();
    let closed = line.matches("-}").count();
    (depth + opened).saturating_sub(closed)
}

fn first_word(line: &str) -> &str {
    let trimmed = line.trim_start();
    let end = trimmed
        .find(|ch: char| ch.is_whitespace() || matches!(ch, ':' | '=' | '(' | '{'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

/// `name` for a line of the form `name: ...`.
pub(crate) fn signature_name(line: &str) -> Option<String> {
    let tokens = tokenize(line);
    let mut meaningful = tokens.iter().filter(|token| !token.is_whitespace());
    match (meaningful.next(), meaningful.next()) {
        (Some(Token::Identifier(name)), Some(Token::Colon)) if !name.contains('.') => {
            Some(name.clone())
        }
        _ => None,
    }
}

/// Index of the first line after a signature that starts the implementation.
pub(crate) fn implementation_line_index<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    lines
        .iter()
        .skip(1)
        .position(|line| {
            let line = line.as_ref();
            !is_blank(line)
                && indent_level(line) == 0
                && !line.starts_with("->")
                && !line.starts_with("--")
        })
        .map(|offset| offset + 1)
}

pub fn block_kind(text: &str) -> Result<BlockKind> {
    let Some(first_line) = text.lines().find(|line| !is_blank(line)) else {
        bail!("Expected a block but found only blank lines");
    };
    if indent_level(first_line) > 0 {
        return Err(FrontendError::UnexpectedIndentation.into());
    }

    if first_line.starts_with("--") {
        return Ok(BlockKind::Comment);
    }
    if first_line.starts_with("{-") {
        return Ok(BlockKind::MultilineComment);
    }

    let words = first_line.split_whitespace().collect::<Vec<_>>();
    match words.as_slice() {
        ["import", ..] => return Ok(BlockKind::Import),
        [first, ..] if first.trim_end_matches('(') == "exposing" => {
            return Ok(BlockKind::Export)
        }
        ["type", "alias", ..] => return Ok(BlockKind::TypeAlias),
        ["type", ..] => return Ok(union_kind(text)),
        _ => {}
    }

    if signature_name(first_line).is_some() {
        let lines = text.lines().collect::<Vec<_>>();
        let end = implementation_line_index(&lines).unwrap_or(lines.len());
        let tokens = strip_comments(tokenize(&lines[..end].join("\n")));
        let signature = tokens
            .iter()
            .position(|token| matches!(token, Token::Colon))
            .map_or(&tokens[..], |colon| &tokens[colon + 1..]);
        return Ok(if has_top_level_arrow(signature) {
            BlockKind::Function
        } else {
            BlockKind::Const
        });
    }

    let tokens = tokenize(first_line);
    if let Some(Token::Identifier(name)) = tokens.first() {
        if tokens.iter().any(|token| matches!(token, Token::Assign)) {
            return Err(FrontendError::MissingTypeAnnotation(name.clone()).into());
        }
    }

    Err(FrontendError::UnknownBlock(first_line.trim().to_string()).into())
}

fn union_kind(text: &str) -> BlockKind {
    let tokens = strip_comments(tokenize(text));
    let after_assign = tokens
        .iter()
        .skip_while(|token| !matches!(token, Token::Assign))
        .skip(1)
        .find(|token| !token.is_whitespace());
    match after_assign {
        Some(Token::StringToken(_)) => BlockKind::UnionUntaggedType,
        _ => BlockKind::UnionType,
    }
}
