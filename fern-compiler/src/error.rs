use thiserror::Error;

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;

/// Failures with a fixed shape. Everything else is reported as a plain message through
/// `anyhow`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontendError {
    #[error("max nesting depth exceeded")]
    NestingTooDeep { limit: usize },
    #[error("Unbalanced brackets in `{0}`")]
    UnbalancedBrackets(String),
    #[error("Unexpected indentation")]
    UnexpectedIndentation,
    #[error("Missing type annotation for `{0}`")]
    MissingTypeAnnotation(String),
    #[error("Unknown block type starting with `{0}`")]
    UnknownBlock(String),
}

/// Recursion budget threaded through the type tokenizer and the parsers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Depth {
    level: usize,
    max: usize,
}

impl Depth {
    pub(crate) fn new(max: usize) -> Self {
        Self { level: 0, max }
    }

    pub(crate) fn deeper(self) -> anyhow::Result<Self> {
        if self.level >= self.max {
            return Err(FrontendError::NestingTooDeep { limit: self.max }.into());
        }
        Ok(Self {
            level: self.level + 1,
            max: self.max,
        })
    }
}

impl Default for Depth {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NESTING_DEPTH)
    }
}
