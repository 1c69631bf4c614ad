use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("Unknown flag: {0}")]
    UnknownFlag(String),

    #[error("Missing value for {0}")]
    MissingValue(String),

    #[error("Invalid value for {flag}: `{value}` is not a non-negative integer")]
    InvalidNumber { flag: String, value: String },

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
