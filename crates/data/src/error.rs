use std::fmt;
use thiserror::Error;

/// Where an expression came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub file: String,
    pub field: Option<String>,
}

impl SourceLocation {
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            field: None,
        }
    }

    pub fn with_field(&self, field: impl Into<String>) -> Self {
        Self {
            file: self.file.clone(),
            field: Some(field.into()),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{} ({})", self.file, field),
            None => f.write_str(&self.file),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprFamily {
    Effect,
    Activation,
}

impl fmt::Display for ExprFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Effect => f.write_str("effect"),
            Self::Activation => f.write_str("activation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("expected 4 space-separated tokens, found {0}")]
    WrongTokenCount(usize),
    #[error("empty token")]
    EmptyToken,
    #[error("'{0}' is not a valid key")]
    InvalidKey(String),
    #[error("unknown effect time '{0}'")]
    UnknownTime(String),
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("unknown comparator '{0}'")]
    UnknownComparator(String),
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),
    #[error("number '{0}' is out of range")]
    NumberOutOfRange(String),
    #[error("'{0}' is not a key, number or boolean")]
    InvalidOperand(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: invalid {family} '{text}' at column {column}: {reason}")]
pub struct SyntaxError {
    pub family: ExprFamily,
    pub text: String,
    pub location: SourceLocation,
    /// 1-based character column of the offending token.
    pub column: usize,
    pub reason: SyntaxErrorKind,
}
