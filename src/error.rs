//! Error types for envcfg.

use std::fmt;
use std::num::ParseIntError;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("expected a mutable reference to a record")]
    NotARecord,

    #[error("required environment variable {key:?} is not set (field {field})")]
    MissingRequiredValue { field: String, key: &'static str },

    #[error("parse error on field {field:?} of type {type_name:?}: {source}")]
    CoercionFailure {
        field: String,
        type_name: &'static str,
        #[source]
        source: CoerceError,
    },

    #[error("unsupported type {type_name:?} for field {field}")]
    UnsupportedType {
        field: String,
        type_name: &'static str,
    },

    #[error("record {record} has {descriptors} field descriptors but {slots} slots")]
    SlotMismatch {
        record: String,
        descriptors: usize,
        slots: usize,
    },

    #[error("failed to load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("server failed: {0}")]
    Listen(#[source] std::io::Error),

    #[error("shutdown failed: {0}")]
    Shutdown(#[source] std::io::Error),

    #[error("shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("failed to register signal handler: {0}")]
    Signal(#[source] std::io::Error),

    #[error("{0}")]
    Telemetry(String),
}

impl Error {
    /// Dotted path of the field this error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::MissingRequiredValue { field, .. }
            | Error::CoercionFailure { field, .. }
            | Error::UnsupportedType { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Why a raw environment string could not become the field's type.
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error(transparent)]
    Int(#[from] ParseIntError),

    #[error("invalid boolean literal {0:?}")]
    Bool(String),
}

/// Every failure collected during one traversal, in the order they occurred.
///
/// Never empty when returned from the loader.
#[derive(Debug)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub(crate) fn new(errors: Vec<Error>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.0
    }
}

impl From<Error> for Errors {
    fn from(error: Error) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

impl IntoIterator for Errors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
