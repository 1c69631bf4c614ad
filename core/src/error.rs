use std::fmt;
use std::fmt::Formatter;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GcError {
    #[error("Stack overflow: all {capacity} stack slots are in use")]
    StackOverflow { capacity: usize },

    #[error("Stack underflow: needed {needed} entries, found {available}")]
    StackUnderflow { needed: usize, available: usize },

    #[error("Type error: expected a pair")]
    NotAPair,

    #[error("Stale handle: object has already been collected")]
    StaleHandle,

    #[error("Lexer error: {0}")]
    LexerError(String),

    #[error("Parser error: {0}")]
    ParserError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub line: usize,
    pub column: usize,
    pub source_line: String,
}

impl GcError {
    pub fn with_context(self, context: ErrorContext) -> GcErrorWithContext {
        GcErrorWithContext {
            error: self,
            context: Some(context),
        }
    }
}

impl From<GcError> for GcErrorWithContext {
    fn from(error: GcError) -> Self {
        GcErrorWithContext {
            error,
            context: None,
        }
    }
}

pub struct GcErrorWithContext {
    pub error: GcError,
    pub context: Option<ErrorContext>,
}

impl fmt::Display for GcErrorWithContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => {
                let ptr = " ".repeat(ctx.column) + "^";
                write!(
                    f,
                    "{}\nLine {}, column {}:\n{}\n{}",
                    self.error, ctx.line, ctx.column, ctx.source_line, ptr
                )
            }
            None => write!(f, "{}", self.error),
        }
    }
}

impl fmt::Debug for GcErrorWithContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for GcErrorWithContext {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub type Result<T> = std::result::Result<T, GcError>;

pub type ContextResult<T> = std::result::Result<T, GcErrorWithContext>;
