mod types;

use serde::{Deserialize, Serialize};

pub use types::{tokenize_type, TypeToken};
pub(crate) use types::{has_top_level_arrow, tokenize_type_with_depth};

pub const KEYWORDS: &[&str] = &[
    "import", "exposing", "as", "type", "alias", "if", "then", "else", "case", "of", "let", "in",
    "default",
];

const OPERATORS: &[&str] = &[
    "<", "<=", ">", ">=", "==", "!=", "-", "+", "*", "/", "%", "|>", "<|", "&&", "||", "::",
];

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '!', '+', '-', '*', '/', '%', '&', '|'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body")]
pub enum Token {
    StringToken(String),
    FormatStringToken(String),
    Keyword(String),
    Identifier(String),
    Literal(String),
    Colon,
    Arrow,
    Comma,
    OpenCurlyBracket,
    CloseCurlyBracket,
    OpenBracket,
    CloseBracket,
    Pipe,
    Assign,
    Backslash,
    Comment(String),
    MultilineComment(String),
    Operator(String),
    Whitespace(String),
}

impl Token {
    /// The exact source text this token was read from.
    pub fn text(&self) -> String {
        match self {
            Token::StringToken(body) => format!("\"{body}\""),
            Token::FormatStringToken(body) => format!("`{body}`"),
            Token::Keyword(body)
            | Token::Identifier(body)
            | Token::Literal(body)
            | Token::Operator(body)
            | Token::Whitespace(body) => body.clone(),
            Token::Colon => ":".to_string(),
            Token::Arrow => "->".to_string(),
            Token::Comma => ",".to_string(),
            Token::OpenCurlyBracket => "{".to_string(),
            Token::CloseCurlyBracket => "}".to_string(),
            Token::OpenBracket => "(".to_string(),
            Token::CloseBracket => ")".to_string(),
            Token::Pipe => "|".to_string(),
            Token::Assign => "=".to_string(),
            Token::Backslash => "\\".to_string(),
            Token::Comment(body) => format!("--{body}"),
            Token::MultilineComment(body) => format!("{{-{body}-}}"),
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace(_))
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Keyword(body) if body == keyword)
    }

    pub fn is_operator(&self, operator: &str) -> bool {
        matches!(self, Token::Operator(body) if body == operator)
    }

    pub(crate) fn contains_newline(&self) -> bool {
        matches!(self, Token::Whitespace(body) if body.contains('\n'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Empty,
    InWhitespace,
    InString,
    InFormatString,
    InSquareBracket { depth: usize, quote: Option<char> },
    InComment,
    InMultilineComment { depth: usize },
    Keyword,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    state: LexState,
    buffer: String,
    escaped: bool,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            input: source.chars().collect(),
            position: 0,
            state: LexState::Empty,
            buffer: String::new(),
            escaped: false,
            tokens: Vec::new(),
        }
    }

    /// Folds the whole input into tokens. Never fails: anything unrecognised ends up in an
    /// identifier.
    pub fn tokenize(mut self) -> Vec<Token> {
        while let Some(ch) = self.peek_char() {
            match self.state {
                LexState::InString => self.lex_string_char(ch, '"'),
                LexState::InFormatString => self.lex_string_char(ch, '`'),
                LexState::InSquareBracket { depth, quote } => {
                    self.lex_square_bracket_char(ch, depth, quote)
                }
                LexState::InComment => self.lex_comment_char(ch),
                LexState::InMultilineComment { depth } => self.lex_multiline_comment_char(ch, depth),
                LexState::Empty | LexState::InWhitespace | LexState::Keyword => {
                    self.lex_char(ch)
                }
            }
        }

        self.flush();
        self.tokens
    }

    fn lex_char(&mut self, ch: char) {
        if ch.is_whitespace() {
            if self.state != LexState::InWhitespace {
                self.flush();
                self.state = LexState::InWhitespace;
            }
            self.buffer.push(ch);
            self.advance();
            return;
        }

        if self.state == LexState::InWhitespace {
            self.flush();
        }

        match ch {
            '"' => self.enter(LexState::InString),
            '`' => self.enter(LexState::InFormatString),
            '[' => {
                self.flush();
                self.state = LexState::InSquareBracket {
                    depth: 0,
                    quote: None,
                };
                self.buffer.push('[');
                self.advance();
            }
            '(' => self.simple_token(Token::OpenBracket),
            ')' => self.simple_token(Token::CloseBracket),
            '{' if self.peek_next_char() == Some('-') => {
                self.flush();
                self.advance_by(2);
                self.state = LexState::InMultilineComment { depth: 0 };
            }
            '{' => self.simple_token(Token::OpenCurlyBracket),
            '}' => self.simple_token(Token::CloseCurlyBracket),
            ',' => self.simple_token(Token::Comma),
            '\\' => self.simple_token(Token::Backslash),
            ':' if self.peek_next_char() == Some(':') => {
                self.flush();
                self.advance_by(2);
                self.tokens.push(Token::Operator("::".to_string()));
            }
            ':' => self.simple_token(Token::Colon),
            '-' if self.peek_next_char() == Some('-') => {
                self.flush();
                self.advance_by(2);
                self.state = LexState::InComment;
            }
            '-' if self.peek_next_char() == Some('>') => {
                self.flush();
                self.advance_by(2);
                self.tokens.push(Token::Arrow);
            }
            '-' | '+'
                if self.state == LexState::Keyword
                    && is_exponent_prefix(&self.buffer)
                    && self.peek_next_char().is_some_and(|next| next.is_ascii_digit()) =>
            {
                self.buffer.push(ch);
                self.advance();
            }
            '-' if self.buffer.is_empty()
                && self.peek_next_char().is_some_and(|next| next.is_ascii_digit()) =>
            {
                // a negative number literal
                self.state = LexState::Keyword;
                self.buffer.push(ch);
                self.advance();
            }
            _ if OPERATOR_CHARS.contains(&ch) => self.lex_operator_run(),
            _ => {
                self.state = LexState::Keyword;
                self.buffer.push(ch);
                self.advance();
            }
        }
    }

    fn lex_operator_run(&mut self) {
        self.flush();
        let mut run = String::new();
        while let Some(ch) = self.peek_char() {
            if !OPERATOR_CHARS.contains(&ch) {
                break;
            }
            // `->` and `--` always start a new token
            if ch == '-' && !run.is_empty() && matches!(self.peek_next_char(), Some('>' | '-')) {
                break;
            }
            run.push(ch);
            self.advance();
        }

        match run.as_str() {
            "=" => self.tokens.push(Token::Assign),
            "|" => self.tokens.push(Token::Pipe),
            "->" => self.tokens.push(Token::Arrow),
            other if OPERATORS.contains(&other) => self.tokens.push(Token::Operator(run)),
            _ => {
                self.state = LexState::Keyword;
                self.buffer = run;
            }
        }
    }

    fn lex_string_char(&mut self, ch: char, quote: char) {
        self.advance();
        if ch == quote && !self.escaped {
            let body = std::mem::take(&mut self.buffer);
            self.tokens.push(if quote == '"' {
                Token::StringToken(body)
            } else {
                Token::FormatStringToken(body)
            });
            self.state = LexState::Empty;
            return;
        }
        self.escaped = ch == '\\' && !self.escaped;
        self.buffer.push(ch);
    }

    fn lex_square_bracket_char(&mut self, ch: char, depth: usize, quote: Option<char>) {
        self.advance();
        self.buffer.push(ch);

        if let Some(open) = quote {
            if ch == open && !self.escaped {
                self.state = LexState::InSquareBracket { depth, quote: None };
            }
            self.escaped = ch == '\\' && !self.escaped;
            return;
        }

        match ch {
            '"' | '`' => {
                self.escaped = false;
                self.state = LexState::InSquareBracket {
                    depth,
                    quote: Some(ch),
                };
            }
            '[' => {
                self.state = LexState::InSquareBracket {
                    depth: depth + 1,
                    quote: None,
                };
            }
            ']' if depth == 0 => {
                let body = std::mem::take(&mut self.buffer);
                self.tokens.push(Token::Literal(body));
                self.state = LexState::Empty;
            }
            ']' => {
                self.state = LexState::InSquareBracket {
                    depth: depth - 1,
                    quote: None,
                };
            }
            _ => {}
        }
    }

    fn lex_comment_char(&mut self, ch: char) {
        if ch == '\n' {
            let body = std::mem::take(&mut self.buffer);
            self.tokens.push(Token::Comment(body));
            self.state = LexState::Empty;
            return;
        }
        self.buffer.push(ch);
        self.advance();
    }

    fn lex_multiline_comment_char(&mut self, ch: char, depth: usize) {
        let next = self.peek_next_char();
        if ch == '-' && next == Some('}') {
            self.advance_by(2);
            if depth == 0 {
                let body = std::mem::take(&mut self.buffer);
                self.tokens.push(Token::MultilineComment(body));
                self.state = LexState::Empty;
            } else {
                self.buffer.push_str("-}");
                self.state = LexState::InMultilineComment { depth: depth - 1 };
            }
            return;
        }
        if ch == '{' && next == Some('-') {
            self.advance_by(2);
            self.buffer.push_str("{-");
            self.state = LexState::InMultilineComment { depth: depth + 1 };
            return;
        }
        self.buffer.push(ch);
        self.advance();
    }

    fn enter(&mut self, state: LexState) {
        self.flush();
        self.escaped = false;
        self.state = state;
        self.advance();
    }

    fn simple_token(&mut self, token: Token) {
        self.flush();
        self.tokens.push(token);
        self.advance();
    }

    /// Emits whatever the current state has accumulated.
    fn flush(&mut self) {
        let body = std::mem::take(&mut self.buffer);
        match self.state {
            LexState::Empty => {}
            LexState::InWhitespace => {
                if !body.is_empty() {
                    self.tokens.push(Token::Whitespace(body));
                }
            }
            LexState::Keyword => {
                if !body.is_empty() {
                    self.tokens.push(check_keyword_token(&body));
                }
            }
            // only reached at end of input: unterminated constructs keep their text
            LexState::InString => self.tokens.push(Token::StringToken(body)),
            LexState::InFormatString => self.tokens.push(Token::FormatStringToken(body)),
            LexState::InSquareBracket { .. } => self.tokens.push(Token::Literal(body)),
            LexState::InComment => self.tokens.push(Token::Comment(body)),
            LexState::InMultilineComment { .. } => self.tokens.push(Token::MultilineComment(body)),
        }
        self.state = LexState::Empty;
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_next_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn advance_by(&mut self, count: usize) {
        self.position += count;
    }
}

pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

/// Classifies a finished buffer.
pub fn check_keyword_token(body: &str) -> Token {
    if KEYWORDS.contains(&body) {
        Token::Keyword(body.to_string())
    } else if body == "true" || body == "false" || is_number(body) {
        Token::Literal(body.to_string())
    } else if body == "=" {
        Token::Assign
    } else if body == "|" {
        Token::Pipe
    } else if body == "->" {
        Token::Arrow
    } else if OPERATORS.contains(&body) {
        Token::Operator(body.to_string())
    } else {
        Token::Identifier(body.to_string())
    }
}

pub(crate) fn is_number(body: &str) -> bool {
    body.chars().any(|ch| ch.is_ascii_digit())
        && body
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E'))
        && body.parse::<f64>().is_ok()
}

/// A number buffer waiting for its exponent sign, such as `1e` in `1e-5`.
fn is_exponent_prefix(buffer: &str) -> bool {
    buffer
        .strip_suffix(|ch: char| matches!(ch, 'e' | 'E'))
        .is_some_and(is_number)
}

/// Drops comment tokens. Comments survive tokenization so that this is the only place they
/// disappear.
pub fn strip_comments(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|token| !matches!(token, Token::Comment(_) | Token::MultilineComment(_)))
        .collect()
}

pub fn tokens_to_text(tokens: &[Token]) -> String {
    tokens.iter().map(Token::text).collect()
}
