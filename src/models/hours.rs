use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Serialize, Serializer};

/// Volunteer hours with one fractional digit, held exactly as tenths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Hours(i64);

pub const MAX_HOURS_TENTHS: i64 = 9_999;

impl Hours {
    pub const ZERO: Hours = Hours(0);

    pub fn from_tenths(tenths: i64) -> Self {
        Hours(tenths)
    }

    pub fn tenths(self) -> i64 {
        self.0
    }

    /// Parses `"2"`, `"2.5"` or `"2.0"`. At most one fractional digit, no sign.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || whole.len() > 4 || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if frac.len() > 1 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if s.ends_with('.') {
            return None;
        }
        let whole: i64 = whole.parse().ok()?;
        let frac: i64 = if frac.is_empty() { 0 } else { frac.parse().ok()? };
        let tenths = whole * 10 + frac;
        (tenths <= MAX_HOURS_TENTHS).then_some(Hours(tenths))
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl Serialize for Hours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl Add for Hours {
    type Output = Hours;

    fn add(self, rhs: Hours) -> Hours {
        Hours(self.0 + rhs.0)
    }
}

impl Sum for Hours {
    fn sum<I: Iterator<Item = Hours>>(iter: I) -> Hours {
        iter.fold(Hours::ZERO, Add::add)
    }
}
