//! Error types for the mutation engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No such mutation rule: {0}")]
    NoSuchRule(String),

    #[error("No such function: {0}")]
    NoSuchFunction(String),

    #[error("No such instruction in function: {function}::{ordinal}")]
    NoSuchInstruction { function: String, ordinal: usize },

    #[error("Rule {rule} cannot mutate the instruction at {function}::{ordinal}")]
    RuleMismatch {
        rule: String,
        function: String,
        ordinal: usize,
    },

    #[error("Mutation options exhausted at {function}::{ordinal} after {attempts} draws")]
    PointsExhausted {
        function: String,
        ordinal: usize,
        attempts: usize,
    },

    #[error("Malformed package: {0}")]
    MalformedPackage(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
