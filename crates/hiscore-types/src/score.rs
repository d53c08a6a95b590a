use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Number of obstacles dodged in one run. Always a whole number >= 0.
///
/// Raw client input is converted with `TryFrom`; every numeric input type the
/// service accepts has an impl, including `f64` and JSON values so that
/// fractional and negative submissions are rejected rather than truncated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u64);

impl Score {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Score {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Ok(Self(value))
    }
}

impl TryFrom<u32> for Score {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(Self(u64::from(value)))
    }
}

impl TryFrom<i64> for Score {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| ValidationError::NegativeScore(value.to_string()))
    }
}

impl TryFrom<i32> for Score {
    type Error = ValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl TryFrom<f64> for Score {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteScore);
        }
        if value < 0.0 {
            return Err(ValidationError::NegativeScore(value.to_string()));
        }
        if value.fract() != 0.0 {
            return Err(ValidationError::FractionalScore(value.to_string()));
        }
        // 2^64 is the first float past u64::MAX.
        if value >= 18_446_744_073_709_551_616.0 {
            return Err(ValidationError::ScoreOutOfRange(value.to_string()));
        }
        Ok(Self(value as u64))
    }
}

impl TryFrom<&Value> for Score {
    type Error = ValidationError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let Value::Number(number) = value else {
            return Err(ValidationError::NotANumber(json_kind(value).to_owned()));
        };
        if let Some(unsigned) = number.as_u64() {
            return Ok(Self(unsigned));
        }
        if let Some(signed) = number.as_i64() {
            return Self::try_from(signed);
        }
        match number.as_f64() {
            Some(float) => Self::try_from(float),
            None => Err(ValidationError::ScoreOutOfRange(number.to_string())),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score({})", self.0)
    }
}
