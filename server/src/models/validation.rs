// pizzeria/src/models/validation.rs

use crate::errors::FieldErrors;
use once_cell::sync::Lazy;
use regex::Regex;

pub static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
pub static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\([0-9]{2}\) [0-9]{5}-[0-9]{4}$").expect("phone regex"));
pub static ZIP_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{5}-?[0-9]{3}$").expect("zip code regex"));

/// Trimmed value of a required text field; records `"<label> is required"`
/// under `field` when it is missing or blank.
pub fn required(errors: &mut FieldErrors, field: &str, label: &str, value: Option<String>) -> String {
  match value.map(|v| v.trim().to_string()) {
    Some(v) if !v.is_empty() => v,
    _ => {
      errors.insert(field.to_string(), format!("{} is required", label));
      String::new()
    }
  }
}

/// `None` for a missing or blank value, the trimmed text otherwise.
pub fn optional_text(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn required_trims_and_flags_blank() {
    let mut errors = FieldErrors::new();
    assert_eq!(required(&mut errors, "name", "Name", Some("  Ana ".into())), "Ana");
    assert!(errors.is_empty());

    required(&mut errors, "city", "City", Some("   ".into()));
    required(&mut errors, "state", "State", None);
    assert_eq!(errors.get("city").map(String::as_str), Some("City is required"));
    assert!(errors.contains_key("state"));
  }

  #[test]
  fn email_format() {
    assert!(is_valid_email("ana@pizzeria.com"));
    assert!(!is_valid_email("ana@pizzeria"));
    assert!(!is_valid_email("ana pizzeria@x.com"));
  }
}
