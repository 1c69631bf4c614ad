pub mod error;
pub mod gc;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod vm;

pub use error::{GcError, Result};
pub use gc::{GcConfig, Object, ObjectKind, ObjectRef};
pub use vm::Vm;
