use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed-point value: the true value multiplied by [`SCALE`].
pub type AttrValue = i64;

/// Two decimal digits of precision.
pub const SCALE: AttrValue = 100;

pub fn scaled(whole: i64) -> AttrValue {
    whole * SCALE
}

/// Key -> fixed-point value map. Ordered so that serialised output is stable
/// across runs with identical inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap {
    values: BTreeMap<String, AttrValue>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<AttrValue> {
        self.values.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AttrValue) -> Option<AttrValue> {
        self.values.insert(key.into(), value)
    }

    /// Mutable slot for an existing key. Effects never create keys.
    pub fn slot_mut(&mut self, key: &str) -> Option<&mut AttrValue> {
        self.values.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AttrValue)> + '_ {
        self.values.iter().map(|(key, value)| (key.as_str(), *value))
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, AttrValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// The mutable working namespace of one evaluation run.
pub type Attributes = AttributeMap;

/// The read-only namespace of one evaluation run.
pub type Constants = AttributeMap;

/// Exact unscaled factor used by multiplicative effects.
///
/// Kept reduced with a positive denominator, so equal factors compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRatio")]
pub struct Ratio {
    numer: i64,
    denom: i64,
}

#[derive(Deserialize)]
struct RawRatio {
    numer: i64,
    denom: i64,
}

impl TryFrom<RawRatio> for Ratio {
    type Error = String;

    fn try_from(raw: RawRatio) -> Result<Self, Self::Error> {
        Self::checked(raw.numer, raw.denom)
            .ok_or_else(|| format!("invalid ratio {}/{}", raw.numer, raw.denom))
    }
}

impl Ratio {
    /// Panics when `denom` is zero or the reduced sign flip overflows.
    pub fn new(numer: i64, denom: i64) -> Self {
        match Self::checked(numer, denom) {
            Some(ratio) => ratio,
            None => panic!("invalid ratio {numer}/{denom}"),
        }
    }

    /// `None` when `denom` is zero or the reduced value cannot be stored
    /// with a positive denominator.
    pub fn checked(numer: i64, denom: i64) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        let divisor = gcd(numer.unsigned_abs(), denom.unsigned_abs());
        let divisor = i64::try_from(divisor).ok()?;
        let (numer, denom) = (numer / divisor, denom / divisor);
        if denom < 0 {
            Some(Self {
                numer: numer.checked_neg()?,
                denom: denom.checked_neg()?,
            })
        } else {
            Some(Self { numer, denom })
        }
    }

    pub fn whole(value: i64) -> Self {
        Self {
            numer: value,
            denom: 1,
        }
    }

    /// Builds the factor from a decimal literal already expressed in hundredths.
    pub fn from_hundredths(hundredths: i64) -> Self {
        Self::new(hundredths, SCALE)
    }

    pub fn numer(&self) -> i64 {
        self.numer
    }

    pub fn denom(&self) -> i64 {
        self.denom
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if SCALE % self.denom == 0 {
            f.write_str(&format_hundredths(self.numer * (SCALE / self.denom)))
        } else {
            write!(f, "{}/{}", self.numer, self.denom)
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let rem = a % b;
        a = b;
        b = rem;
    }
    a
}

/// Renders a fixed-point value as the shortest decimal literal: 200 -> "2",
/// 125 -> "1.25", -450 -> "-4.5".
pub fn format_hundredths(value: AttrValue) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let whole = abs / SCALE as u64;
    let frac = abs % SCALE as u64;
    if frac == 0 {
        format!("{sign}{whole}")
    } else if frac % 10 == 0 {
        format!("{sign}{whole}.{}", frac / 10)
    } else {
        format!("{sign}{whole}.{frac:02}")
    }
}

/// Floor division on 128-bit intermediates, rounding toward negative infinity.
pub(crate) fn floor_div(numer: i128, denom: i128) -> i128 {
    let quot = numer / denom;
    if numer % denom != 0 && ((numer < 0) != (denom < 0)) {
        quot - 1
    } else {
        quot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_reduces_and_normalises_sign() {
        assert_eq!(Ratio::from_hundredths(125), Ratio::new(5, 4));
        assert_eq!(Ratio::new(4, -1), Ratio::whole(-4));
        assert_eq!(Ratio::new(0, 7), Ratio::whole(0));
        assert_eq!(Ratio::checked(3, 0), None);
    }

    #[test]
    fn ratio_deserialises_through_constructor() {
        let ratio: Ratio = serde_json::from_str(r#"{ "numer": 10, "denom": -8 }"#).expect("valid");
        assert_eq!(ratio, Ratio::new(-5, 4));
        let err = serde_json::from_str::<Ratio>(r#"{ "numer": 1, "denom": 0 }"#)
            .expect_err("zero denominator");
        assert!(err.to_string().contains("invalid ratio 1/0"));
    }

    #[test]
    fn ratio_displays_as_decimal_literal() {
        assert_eq!(Ratio::new(5, 4).to_string(), "1.25");
        assert_eq!(Ratio::whole(-4).to_string(), "-4");
        assert_eq!(Ratio::new(1, 3).to_string(), "1/3");
    }

    #[test]
    fn hundredths_formatting() {
        assert_eq!(format_hundredths(200), "2");
        assert_eq!(format_hundredths(125), "1.25");
        assert_eq!(format_hundredths(-450), "-4.5");
        assert_eq!(format_hundredths(-5), "-0.05");
    }

    #[test]
    fn floor_div_rounds_down_for_all_signs() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(floor_div(-7, -2), 3);
        assert_eq!(floor_div(-300, -4), 75);
    }
}
