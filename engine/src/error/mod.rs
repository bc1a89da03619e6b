use std::error::Error;
use std::fmt::{Display, Formatter};

/// A list of input features not supported
#[derive(Debug, Clone)]
pub enum Unsupported {
    AnonymousFunction,
    OpaqueType,
    ScalableVector,
}

impl Display for Unsupported {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnonymousFunction => {
                write!(f, "anonymous function")
            }
            Self::OpaqueType => {
                write!(f, "opaque type")
            }
            Self::ScalableVector => {
                write!(f, "scalable vector")
            }
        }
    }
}

/// A custom error message for the analysis engine
#[derive(Debug, Clone)]
pub enum EngineError {
    /// Error during the loading of a serialized module
    LoadingError(String),
    /// Invalid assumption made about the program
    InvalidAssumption(String),
    /// Operation not supported yet
    NotSupportedYet(Unsupported),
    /// Invariant violation
    InvariantViolation(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadingError(msg) => {
                write!(f, "[mayalias::loading] {}", msg)
            }
            Self::InvalidAssumption(msg) => {
                write!(f, "[mayalias::assumption] {}", msg)
            }
            Self::NotSupportedYet(item) => {
                write!(f, "[mayalias::unsupported] {}", item)
            }
            Self::InvariantViolation(msg) => {
                write!(f, "[mayalias::invariant] {}", msg)
            }
        }
    }
}

impl Error for EngineError {}
