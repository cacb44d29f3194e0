// pizzeria/src/models/money.rs

//! Prices are stored as integer cents and shown as decimal numbers.

use serde::Serializer;

/// Largest accepted amount, well inside `f64`'s exact integer range.
const MAX_CENTS: i64 = 100_000_000_000;

/// Converts a decimal amount (`39.9`) into cents (`3990`). Negative,
/// non-finite and absurdly large amounts are rejected.
pub fn to_cents(value: f64) -> Option<i64> {
  if !value.is_finite() || value < 0.0 {
    return None;
  }
  let cents = (value * 100.0).round();
  if cents > MAX_CENTS as f64 {
    return None;
  }
  Some(cents as i64)
}

pub fn from_cents(cents: i64) -> f64 {
  cents as f64 / 100.0
}

pub fn serialize_cents<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_f64(from_cents(*cents))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn converts_decimal_prices() {
    assert_eq!(to_cents(39.9), Some(3990));
    assert_eq!(to_cents(0.0), Some(0));
    assert_eq!(to_cents(12.345), Some(1235));
    assert_eq!(from_cents(3990), 39.9);
  }

  #[test]
  fn rejects_negative_and_non_finite() {
    assert_eq!(to_cents(-0.01), None);
    assert_eq!(to_cents(f64::NAN), None);
    assert_eq!(to_cents(f64::INFINITY), None);
    assert_eq!(to_cents(1e15), None);
  }
}
