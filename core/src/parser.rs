use std::fmt;

use crate::lexer::{SpannedToken, Token};

/// One VM instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Push(i64),
    Pair,
    Pop,
    Dup,
    SetFirst,
    SetSecond,
    Gc,
    Print,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(value) => write!(f, "push {}", value),
            Instruction::Pair => write!(f, "pair"),
            Instruction::Pop => write!(f, "pop"),
            Instruction::Dup => write!(f, "dup"),
            Instruction::SetFirst => write!(f, "setfirst"),
            Instruction::SetSecond => write!(f, "setsecond"),
            Instruction::Gc => write!(f, "gc"),
            Instruction::Print => write!(f, "print"),
        }
    }
}

/// An instruction and where it starts in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub instruction: Instruction,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

pub struct Parser {
    tokens: Vec<SpannedToken>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();

        while let Some(spanned) = self.advance() {
            let instruction = match &spanned.token {
                Token::Newline | Token::Semicolon => continue,
                Token::Push => self.push_operand(&spanned)?,
                Token::Pair => Instruction::Pair,
                Token::Pop => Instruction::Pop,
                Token::Dup => Instruction::Dup,
                Token::SetFirst => Instruction::SetFirst,
                Token::SetSecond => Instruction::SetSecond,
                Token::Gc => Instruction::Gc,
                Token::Print => Instruction::Print,
                Token::Identifier(name) => {
                    return Err(Self::error_at(
                        &spanned,
                        format!("Unknown instruction `{}`", name),
                    ));
                }
                Token::IntegerLiteral(n) => {
                    return Err(Self::error_at(
                        &spanned,
                        format!("Expected an instruction, found `{}`", n),
                    ));
                }
            };

            statements.push(Statement {
                instruction,
                line: spanned.line,
                column: spanned.column,
            });
            self.end_of_statement()?;
        }

        Ok(statements)
    }

    fn push_operand(&mut self, push: &SpannedToken) -> Result<Instruction, ParseError> {
        match self.peek().map(|t| &t.token) {
            Some(Token::IntegerLiteral(value)) => {
                let value = *value;
                self.current += 1;
                Ok(Instruction::Push(value))
            }
            Some(_) => {
                let found = &self.tokens[self.current];
                Err(Self::error_at(
                    found,
                    format!("Expected an integer after `push`, found `{}`", found.token),
                ))
            }
            None => Err(Self::error_at(
                push,
                "Expected an integer after `push`".to_string(),
            )),
        }
    }

    /// Each instruction must be followed by a separator or end of input.
    fn end_of_statement(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(spanned) if matches!(spanned.token, Token::Newline | Token::Semicolon) => {
                self.current += 1;
                Ok(())
            }
            Some(spanned) => Err(Self::error_at(
                spanned,
                format!("Expected end of instruction, found `{}`", spanned.token),
            )),
        }
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.current)
    }

    fn error_at(token: &SpannedToken, message: String) -> ParseError {
        ParseError {
            message,
            line: token.line,
            column: token.column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(input: &str) -> Result<Vec<Statement>, ParseError> {
        let tokens = Lexer::new(input).collect_tokens().unwrap();
        Parser::new(tokens).parse()
    }

    fn instructions(input: &str) -> Vec<Instruction> {
        parse(input)
            .unwrap()
            .into_iter()
            .map(|s| s.instruction)
            .collect()
    }

    #[test]
    fn test_parse_program() {
        let program = r#"
            # build a pair
            push 1
            push 2; pair

            dup; setsecond
            print
            pop
            gc
        "#;

        assert_eq!(
            instructions(program),
            vec![
                Instruction::Push(1),
                Instruction::Push(2),
                Instruction::Pair,
                Instruction::Dup,
                Instruction::SetSecond,
                Instruction::Print,
                Instruction::Pop,
                Instruction::Gc,
            ]
        );
    }

    #[test]
    fn test_statement_positions() {
        let statements = parse("push 1\n  pair").unwrap();
        assert_eq!((statements[1].line, statements[1].column), (2, 2));
    }

    #[test]
    fn test_push_requires_integer() {
        let err = parse("push").unwrap_err();
        assert_eq!(err.message, "Expected an integer after `push`");

        let err = parse("push pop").unwrap_err();
        assert_eq!((err.line, err.column), (1, 5));
    }

    #[test]
    fn test_unknown_instruction() {
        let err = parse("push 1\nswap").unwrap_err();
        assert_eq!(err.message, "Unknown instruction `swap`");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_two_instructions_on_one_line_need_separator() {
        let err = parse("pop pop").unwrap_err();
        assert_eq!(err.message, "Expected end of instruction, found `pop`");
    }

    #[test]
    fn test_empty_program() {
        assert!(instructions("\n# nothing\n;;").is_empty());
    }
}
