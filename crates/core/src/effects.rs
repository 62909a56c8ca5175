use crate::attributes::floor_div;
use crate::{AttrValue, Attributes, Constants, DivisionPolicy, EvalError, Ratio, SCALE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Intra-phase ordering bucket. Evaluation always visits the variants in
/// declaration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EffectTime {
    Earliest,
    Early,
    Normal,
    Late,
    Latest,
}

impl EffectTime {
    pub const ALL: [EffectTime; 5] = [
        Self::Earliest,
        Self::Early,
        Self::Normal,
        Self::Late,
        Self::Latest,
    ];

    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "earliest" => Some(Self::Earliest),
            "early" => Some(Self::Early),
            "normal" => Some(Self::Normal),
            "late" => Some(Self::Late),
            "latest" => Some(Self::Latest),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Earliest => "earliest",
            Self::Early => "early",
            Self::Normal => "normal",
            Self::Late => "late",
            Self::Latest => "latest",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EffectTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Mult,
    Div,
    Set,
    Max,
    Min,
}

impl OpKind {
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "add" => Some(Self::Add),
            "mult" => Some(Self::Mult),
            "div" => Some(Self::Div),
            "set" => Some(Self::Set),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Mult => "mult",
            Self::Div => "div",
            Self::Set => "set",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    /// Multiplicative operations take an unscaled factor instead of a
    /// fixed-point amount.
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Self::Mult | Self::Div)
    }
}

/// Where an identifier operand is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSource {
    Literal,
    Attribute,
    Constant,
}

impl OperandSource {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Literal => "",
            Self::Attribute => "Other",
            Self::Constant => "Const",
        }
    }
}

/// Operand of additive and clamping operations. Literals are fixed-point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    Literal(AttrValue),
    Attribute(String),
    Constant(String),
}

/// Operand of multiplicative operations. Literals stay unscaled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Factor {
    Ratio(Ratio),
    Attribute(String),
    Constant(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectOp {
    Add(Amount),
    Set(Amount),
    Max(Amount),
    Min(Amount),
    Mult(Factor),
    Div(Factor),
}

impl EffectOp {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Add(_) => OpKind::Add,
            Self::Set(_) => OpKind::Set,
            Self::Max(_) => OpKind::Max,
            Self::Min(_) => OpKind::Min,
            Self::Mult(_) => OpKind::Mult,
            Self::Div(_) => OpKind::Div,
        }
    }

    pub fn source(&self) -> OperandSource {
        match self {
            Self::Add(amount) | Self::Set(amount) | Self::Max(amount) | Self::Min(amount) => {
                match amount {
                    Amount::Literal(_) => OperandSource::Literal,
                    Amount::Attribute(_) => OperandSource::Attribute,
                    Amount::Constant(_) => OperandSource::Constant,
                }
            }
            Self::Mult(factor) | Self::Div(factor) => match factor {
                Factor::Ratio(_) => OperandSource::Literal,
                Factor::Attribute(_) => OperandSource::Attribute,
                Factor::Constant(_) => OperandSource::Constant,
            },
        }
    }
}

/// Old and new value of the attribute an effect wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub before: AttrValue,
    pub after: AttrValue,
}

/// One compiled mutation rule: `KEY time op operand`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub key: String,
    pub time: EffectTime,
    pub op: EffectOp,
}

impl Effect {
    pub fn new(key: impl Into<String>, time: EffectTime, op: EffectOp) -> Self {
        Self {
            key: key.into(),
            time,
            op,
        }
    }

    /// Applies the effect with the default (failing) division policy.
    pub fn apply(
        &self,
        attributes: &mut Attributes,
        constants: &Constants,
    ) -> Result<Change, EvalError> {
        self.apply_with(attributes, constants, DivisionPolicy::Fail)
    }

    pub fn apply_with(
        &self,
        attributes: &mut Attributes,
        constants: &Constants,
        division: DivisionPolicy,
    ) -> Result<Change, EvalError> {
        let before = attributes
            .get(&self.key)
            .ok_or_else(|| EvalError::unknown(&self.key))?;
        let after = match &self.op {
            EffectOp::Add(amount) => {
                let value = resolve_amount(amount, attributes, constants)?;
                before.checked_add(value).ok_or_else(|| self.overflow())?
            }
            EffectOp::Set(amount) => resolve_amount(amount, attributes, constants)?,
            EffectOp::Max(amount) => before.max(resolve_amount(amount, attributes, constants)?),
            EffectOp::Min(amount) => before.min(resolve_amount(amount, attributes, constants)?),
            EffectOp::Mult(factor) => {
                let (numer, denom) = resolve_factor(factor, attributes, constants)?;
                self.narrow(floor_div(before as i128 * numer, denom))?
            }
            EffectOp::Div(factor) => {
                let (numer, denom) = resolve_factor(factor, attributes, constants)?;
                if numer == 0 {
                    self.divide_by_zero(before, division)?
                } else {
                    self.narrow(floor_div(before as i128 * denom, numer))?
                }
            }
        };
        if let Some(slot) = attributes.slot_mut(&self.key) {
            *slot = after;
        }
        Ok(Change { before, after })
    }

    fn divide_by_zero(
        &self,
        before: AttrValue,
        division: DivisionPolicy,
    ) -> Result<AttrValue, EvalError> {
        match division {
            DivisionPolicy::Fail => Err(EvalError::DivisionByZero {
                key: self.key.clone(),
            }),
            DivisionPolicy::Saturate => Ok(match before.signum() {
                0 => 0,
                1 => AttrValue::MAX,
                _ => AttrValue::MIN,
            }),
        }
    }

    fn narrow(&self, value: i128) -> Result<AttrValue, EvalError> {
        AttrValue::try_from(value).map_err(|_| self.overflow())
    }

    fn overflow(&self) -> EvalError {
        EvalError::Overflow {
            key: self.key.clone(),
        }
    }
}

fn resolve_amount(
    amount: &Amount,
    attributes: &Attributes,
    constants: &Constants,
) -> Result<AttrValue, EvalError> {
    match amount {
        Amount::Literal(value) => Ok(*value),
        Amount::Attribute(key) => attributes.get(key).ok_or_else(|| EvalError::unknown(key)),
        Amount::Constant(key) => constants.get(key).ok_or_else(|| EvalError::unknown(key)),
    }
}

/// Returns the factor as `numer / denom`. Identifier operands are fixed-point
/// values, so they carry an implicit denominator of `SCALE`.
fn resolve_factor(
    factor: &Factor,
    attributes: &Attributes,
    constants: &Constants,
) -> Result<(i128, i128), EvalError> {
    match factor {
        Factor::Ratio(ratio) => Ok((ratio.numer() as i128, ratio.denom() as i128)),
        Factor::Attribute(key) => attributes
            .get(key)
            .map(|value| (value as i128, SCALE as i128))
            .ok_or_else(|| EvalError::unknown(key)),
        Factor::Constant(key) => constants
            .get(key)
            .map(|value| (value as i128, SCALE as i128))
            .ok_or_else(|| EvalError::unknown(key)),
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}{} ",
            self.key,
            self.time,
            self.op.kind().keyword(),
            self.op.source().suffix()
        )?;
        match &self.op {
            EffectOp::Add(amount)
            | EffectOp::Set(amount)
            | EffectOp::Max(amount)
            | EffectOp::Min(amount) => match amount {
                Amount::Literal(value) => f.write_str(&crate::format_hundredths(*value)),
                Amount::Attribute(key) | Amount::Constant(key) => f.write_str(key),
            },
            EffectOp::Mult(factor) | EffectOp::Div(factor) => match factor {
                Factor::Ratio(ratio) => write!(f, "{ratio}"),
                Factor::Attribute(key) | Factor::Constant(key) => f.write_str(key),
            },
        }
    }
}
