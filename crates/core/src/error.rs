use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown attribute '{key}'")]
    UnknownAttribute { key: String },
    #[error("division by zero while updating '{key}'")]
    DivisionByZero { key: String },
    #[error("arithmetic overflow while updating '{key}'")]
    Overflow { key: String },
}

impl EvalError {
    pub(crate) fn unknown(key: &str) -> Self {
        Self::UnknownAttribute {
            key: key.to_string(),
        }
    }
}
