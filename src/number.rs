use crate::errors::*;
use std::cmp::Ordering;

/// Numeric values. Exactness follows the literal: a decimal point makes a
/// float, anything else is an integer.
#[derive(Clone, Copy, Debug)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        if !lexeme.contains('.') {
            if let Ok(i) = lexeme.parse() {
                return Some(Number::Integer(i));
            }
        }

        // normalize "1." and ".5" so the float parser need not be lenient
        let (sign, digits) = match lexeme.chars().next() {
            Some('+') | Some('-') => lexeme.split_at(1),
            _ => ("", lexeme),
        };
        let mut normalized = String::from(sign);
        if digits.starts_with('.') {
            normalized.push('0');
        }
        normalized.push_str(digits);
        if digits.ends_with('.') {
            normalized.push('0');
        }
        normalized.parse().ok().map(Number::Float)
    }

    pub fn to_float(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_integer(self) -> bool {
        match self {
            Number::Integer(_) => true,
            Number::Float(_) => false,
        }
    }

    #[allow(clippy::float_cmp)]
    pub fn is_zero(self) -> bool {
        match self {
            Number::Integer(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    pub fn signum(self) -> Ordering {
        self.partial_cmp(&Number::Integer(0))
            .unwrap_or(Ordering::Equal)
    }

    /// Same representation and same value; `2` and `2.0` are different.
    #[allow(clippy::float_cmp)]
    pub fn eqv(self, other: Number) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            _ => false,
        }
    }

    pub fn add(self, other: Number) -> Result<Number> {
        self.combine(other, i64::checked_add, |a, b| a + b)
    }

    pub fn sub(self, other: Number) -> Result<Number> {
        self.combine(other, i64::checked_sub, |a, b| a - b)
    }

    pub fn mul(self, other: Number) -> Result<Number> {
        self.combine(other, i64::checked_mul, |a, b| a * b)
    }

    /// Division always produces a float.
    pub fn div(self, other: Number) -> Result<Number> {
        if other.is_zero() {
            return Err(ErrorKind::DivisionByZero.into());
        }
        Ok(Number::Float(self.to_float() / other.to_float()))
    }

    pub fn remainder(self, other: Number) -> Result<Number> {
        if other.is_zero() {
            return Err(ErrorKind::DivisionByZero.into());
        }
        self.combine(other, i64::checked_rem, |a, b| a % b)
    }

    pub fn quotient(self, other: Number) -> Result<Number> {
        if other.is_zero() {
            return Err(ErrorKind::DivisionByZero.into());
        }
        self.combine(other, i64::checked_div, |a, b| (a / b).trunc())
    }

    pub fn abs(self) -> Result<Number> {
        match self {
            Number::Integer(i) => i
                .checked_abs()
                .map(Number::Integer)
                .ok_or_else(|| ErrorKind::IntegerOverflow.into()),
            Number::Float(f) => Ok(Number::Float(f.abs())),
        }
    }

    fn combine(
        self,
        other: Number,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Number> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => int_op(a, b)
                .map(Number::Integer)
                .ok_or_else(|| ErrorKind::IntegerOverflow.into()),
            (a, b) => Ok(Number::Float(float_op(a.to_float(), b.to_float()))),
        }
    }
}

impl PartialEq for Number {
    /// Numeric equality across representations, as used by `=`.
    #[allow(clippy::float_cmp)]
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (a, b) => a.to_float() == b.to_float(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (*self, *other) {
            (Number::Integer(a), Number::Integer(b)) => a.partial_cmp(&b),
            (a, b) => a.to_float().partial_cmp(&b.to_float()),
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            // Debug formatting keeps the trailing ".0" on integral floats
            Number::Float(x) => write!(f, "{:?}", x),
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Number::Integer(i)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Float(f)
    }
}
