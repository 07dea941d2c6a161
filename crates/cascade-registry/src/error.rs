//! Registry errors

use thiserror::Error;

use crate::path::ParamPath;

/// Registry result type
pub type Result<T> = std::result::Result<T, Error>;

/// Registry errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("missing parameter: {path}")]
    MissingParameter { path: ParamPath },

    #[error("parameter {path} is {actual}, expected {expected}")]
    WrongKind {
        path: ParamPath,
        expected: &'static str,
        actual: &'static str,
    },
}

impl Error {
    /// The path the error refers to.
    pub fn path(&self) -> &ParamPath {
        match self {
            Error::MissingParameter { path } => path,
            Error::WrongKind { path, .. } => path,
        }
    }
}
