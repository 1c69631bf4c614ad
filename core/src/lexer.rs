use std::fmt::Display;

use logos::Logos;

#[derive(Debug, Logos, PartialEq, Clone)]
#[logos(skip r"[ \t\r\f]+")] // Skip whitespace
#[logos(skip r"#[^\n]*")] // Skip comments
pub enum Token {
    // Instructions
    #[token("push")]
    Push,
    #[token("pair")]
    Pair,
    #[token("pop")]
    Pop,
    #[token("dup")]
    Dup,
    #[token("setfirst")]
    SetFirst,
    #[token("setsecond")]
    SetSecond,
    #[token("gc")]
    Gc,
    #[token("print")]
    Print,

    // Separators
    #[token("\n")]
    Newline,
    #[token(";")]
    Semicolon,

    // Literals and Identifiers
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse().ok())]
    IntegerLiteral(i64),
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Push => write!(f, "push"),
            Token::Pair => write!(f, "pair"),
            Token::Pop => write!(f, "pop"),
            Token::Dup => write!(f, "dup"),
            Token::SetFirst => write!(f, "setfirst"),
            Token::SetSecond => write!(f, "setsecond"),
            Token::Gc => write!(f, "gc"),
            Token::Print => write!(f, "print"),
            Token::Newline => write!(f, "newline"),
            Token::Semicolon => write!(f, ";"),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::IntegerLiteral(n) => write!(f, "{}", n),
        }
    }
}

/// A token with its 1-based line and 0-based column
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::SpannedIter<'a, Token>,
    line_starts: Vec<usize>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            inner: Token::lexer(source).spanned(),
            line_starts,
        }
    }

    /// Line (1-based) and column (0-based) of a byte offset
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        (line, offset - self.line_starts[line - 1])
    }

    /// Text of a 1-based line, without its newline
    pub fn source_line(&self, line: usize) -> &'a str {
        self.source.lines().nth(line.saturating_sub(1)).unwrap_or("")
    }

    pub fn collect_tokens(&mut self) -> Result<Vec<SpannedToken>, String> {
        self.collect()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<SpannedToken, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let (result, span) = self.inner.next()?;
        let (line, column) = self.line_column(span.start);
        Some(match result {
            Ok(token) => Ok(SpannedToken {
                token,
                line,
                column,
            }),
            Err(_) => Err(format!(
                "Invalid token `{}` at line {}, column {}",
                &self.source[span], line, column
            )),
        })
    }
}
