use crate::error::{ContextResult, ErrorContext, GcError, Result};
use crate::gc::GcConfig;
use crate::lexer::Lexer;
use crate::parser::{Instruction, Parser};
use crate::vm::Vm;

/// Runs instruction text against a VM that persists between calls.
pub struct Interpreter {
    vm: Vm,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(GcConfig::default())
    }

    pub fn with_config(config: GcConfig) -> Self {
        Self {
            vm: Vm::with_config(config),
        }
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Throw away the VM and start over with the same configuration.
    pub fn reset(&mut self) {
        self.vm = Vm::with_config(self.vm.config().clone());
    }

    /// Lex, parse and run `source`, returning one line per `print` and `gc`.
    ///
    /// Instructions before a failing one stay applied.
    pub fn interpret(&mut self, source: &str) -> ContextResult<Vec<String>> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.collect_tokens().map_err(GcError::LexerError)?;

        let statements = Parser::new(tokens).parse().map_err(|e| {
            GcError::ParserError(e.message).with_context(ErrorContext {
                line: e.line,
                column: e.column,
                source_line: lexer.source_line(e.line).to_string(),
            })
        })?;

        tracing::trace!("parsed {} instructions", statements.len());

        let mut output = Vec::new();
        for statement in statements {
            match self.execute(statement.instruction) {
                Ok(Some(line)) => output.push(line),
                Ok(None) => {}
                Err(e) => {
                    return Err(e.with_context(ErrorContext {
                        line: statement.line,
                        column: statement.column,
                        source_line: lexer.source_line(statement.line).to_string(),
                    }));
                }
            }
        }
        Ok(output)
    }

    /// Run a single instruction.
    pub fn execute(&mut self, instruction: Instruction) -> Result<Option<String>> {
        tracing::trace!("executing `{}`", instruction);

        match instruction {
            Instruction::Push(value) => self.vm.push_scalar(value).map(|_| None),
            Instruction::Pair => self.vm.push_pair().map(|_| None),
            Instruction::Pop => self.vm.pop().map(|_| None),
            Instruction::Dup => self.vm.dup().map(|_| None),
            Instruction::SetFirst => self.vm.set_first().map(|_| None),
            Instruction::SetSecond => self.vm.set_second().map(|_| None),
            Instruction::Gc => {
                let result = self.vm.collect();
                Ok(Some(format!(
                    "gc: collected {}, {} live, next threshold {}",
                    result.objects_collected, result.objects_surviving, result.threshold_after
                )))
            }
            Instruction::Print => {
                let top = self.vm.peek().ok_or(GcError::StackUnderflow {
                    needed: 1,
                    available: 0,
                })?;
                self.vm.render(top).map(Some).ok_or(GcError::StaleHandle)
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
