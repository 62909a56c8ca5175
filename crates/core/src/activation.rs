use crate::{AttrValue, Attributes, Constants, EvalError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
}

impl Comparator {
    pub fn from_symbol(value: &str) -> Option<Self> {
        match value {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }

    pub fn compare(self, left: AttrValue, right: AttrValue) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Ge => left >= right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Lt => left < right,
        }
    }
}

/// Right-hand side of an activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// Numeric literal, already scaled into the fixed-point domain.
    Number(AttrValue),
    /// Compares as 1 or 0, unscaled.
    Bool(bool),
    Ident(String),
}

/// Gating predicate `KEY cmp operand`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    pub key: String,
    pub cmp: Comparator,
    pub operand: Operand,
}

impl Activation {
    pub fn new(key: impl Into<String>, cmp: Comparator, operand: Operand) -> Self {
        Self {
            key: key.into(),
            cmp,
            operand,
        }
    }

    /// Attributes shadow constants for both the left identifier and an
    /// identifier operand.
    pub fn check(&self, attributes: &Attributes, constants: &Constants) -> Result<bool, EvalError> {
        let left = lookup(&self.key, attributes, constants)?;
        let right = match &self.operand {
            Operand::Number(value) => *value,
            Operand::Bool(value) => AttrValue::from(*value),
            Operand::Ident(key) => lookup(key, attributes, constants)?,
        };
        Ok(self.cmp.compare(left, right))
    }
}

fn lookup(
    key: &str,
    attributes: &Attributes,
    constants: &Constants,
) -> Result<AttrValue, EvalError> {
    attributes
        .get(key)
        .or_else(|| constants.get(key))
        .ok_or_else(|| EvalError::unknown(key))
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.key, self.cmp.symbol())?;
        match &self.operand {
            Operand::Number(value) => f.write_str(&crate::format_hundredths(*value)),
            Operand::Bool(value) => write!(f, "{value}"),
            Operand::Ident(key) => f.write_str(key),
        }
    }
}
