// pizzeria/src/models/client.rs

use crate::errors::FieldErrors;
use crate::models::validation::{self, optional_text, required, PHONE_RE, ZIP_CODE_RE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  pub street: String,
  pub number: String,
  #[serde(default)]
  pub complement: String,
  pub neighborhood: String,
  pub city: String,
  pub state: String,
  pub zip_code: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
  pub id: Uuid,
  pub name: String,
  pub email: Option<String>,
  pub phone: String,
  #[sqlx(flatten)]
  pub address: Address,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Validated and normalized client fields, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDraft {
  pub name: String,
  pub email: Option<String>,
  pub phone: String,
  pub address: Address,
}

impl ClientDraft {
  pub fn into_client(self) -> Client {
    let now = Utc::now();
    Client {
      id: Uuid::new_v4(),
      name: self.name,
      email: self.email,
      phone: self.phone,
      address: self.address,
      created_at: now,
      updated_at: now,
    }
  }

  /// Overwrites `client` with these fields and bumps `updated_at`.
  pub fn apply_to(self, client: &mut Client) {
    client.name = self.name;
    client.email = self.email;
    client.phone = self.phone;
    client.address = self.address;
    client.updated_at = Utc::now();
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
  pub street: Option<String>,
  pub number: Option<String>,
  pub complement: Option<String>,
  pub neighborhood: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub zip_code: Option<String>,
}

/// Request body of `POST /clients` and `PUT /clients/:id`. Every field is
/// optional here so that missing ones are reported together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
  pub name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub address: Option<AddressInput>,
}

/// Formats a phone as `(DD) DDDDD-DDDD`. Already formatted input is kept;
/// otherwise exactly 11 digits are required.
pub fn normalize_phone(raw: &str) -> Option<String> {
  let raw = raw.trim();
  if PHONE_RE.is_match(raw) {
    return Some(raw.to_string());
  }
  let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
  if digits.len() != 11 {
    return None;
  }
  Some(format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]))
}

/// Formats a zip code as `DDDDD-DDD`; accepts only `DDDDD-DDD` or `DDDDDDDD`.
pub fn normalize_zip_code(raw: &str) -> Option<String> {
  let raw = raw.trim();
  if !ZIP_CODE_RE.is_match(raw) {
    return None;
  }
  let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
  if digits.len() != 8 {
    return None;
  }
  Some(format!("{}-{}", &digits[..5], &digits[5..]))
}

impl ClientInput {
  pub fn into_draft(self) -> Result<ClientDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = required(&mut errors, "name", "Name", self.name);

    let email = optional_text(self.email).map(|e| e.to_lowercase());
    if let Some(e) = &email {
      if !validation::is_valid_email(e) {
        errors.insert("email".into(), format!("{} is not a valid email", e));
      }
    }

    let phone = match optional_text(self.phone) {
      None => {
        errors.insert("phone".into(), "Phone is required".into());
        String::new()
      }
      Some(raw) => normalize_phone(&raw).unwrap_or_else(|| {
        errors.insert(
          "phone".into(),
          format!("{} is not a valid phone, it must have 11 digits: (99) 99999-9999", raw),
        );
        String::new()
      }),
    };

    let address = match self.address {
      None => {
        errors.insert("address".into(), "Address is required".into());
        Address::default()
      }
      Some(a) => {
        let street = required(&mut errors, "address.street", "Street", a.street);
        let number = required(&mut errors, "address.number", "Number", a.number);
        let neighborhood = required(&mut errors, "address.neighborhood", "Neighborhood", a.neighborhood);
        let city = required(&mut errors, "address.city", "City", a.city);
        let state = required(&mut errors, "address.state", "State", a.state);
        let raw_zip = required(&mut errors, "address.zipCode", "Zip code", a.zip_code);
        let zip_code = if raw_zip.is_empty() {
          raw_zip
        } else {
          normalize_zip_code(&raw_zip).unwrap_or_else(|| {
            errors.insert(
              "address.zipCode".into(),
              format!("{} is not a valid zip code, use 12345-678 or 12345678", raw_zip),
            );
            String::new()
          })
        };
        Address {
          street,
          number,
          complement: a.complement.map(|c| c.trim().to_string()).unwrap_or_default(),
          neighborhood,
          city,
          state,
          zip_code,
        }
      }
    };

    if !errors.is_empty() {
      return Err(errors);
    }
    Ok(ClientDraft {
      name,
      email,
      phone,
      address,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn full_input() -> ClientInput {
    ClientInput {
      name: Some("  Maria Souza ".into()),
      email: Some("Maria@Example.COM".into()),
      phone: Some("11987654321".into()),
      address: Some(AddressInput {
        street: Some("Rua das Flores".into()),
        number: Some("42".into()),
        complement: None,
        neighborhood: Some("Centro".into()),
        city: Some("São Paulo".into()),
        state: Some("SP".into()),
        zip_code: Some("01310100".into()),
      }),
    }
  }

  #[test]
  fn phone_normalization() {
    assert_eq!(normalize_phone("(11) 98765-4321").as_deref(), Some("(11) 98765-4321"));
    assert_eq!(normalize_phone("11 98765 4321").as_deref(), Some("(11) 98765-4321"));
    assert_eq!(normalize_phone("1198765432"), None);
    assert_eq!(normalize_phone("abc"), None);
  }

  #[test]
  fn zip_code_normalization() {
    assert_eq!(normalize_zip_code("01310100").as_deref(), Some("01310-100"));
    assert_eq!(normalize_zip_code("01310-100").as_deref(), Some("01310-100"));
    assert_eq!(normalize_zip_code("0131-0100"), None);
    assert_eq!(normalize_zip_code("1234567"), None);
  }

  #[test]
  fn non_ascii_digits_are_rejected() {
    assert_eq!(normalize_phone("(١١) ٩٨٧٦٥-٤٣٢١"), None);
    assert_eq!(normalize_phone("١١٩٨٧٦٥٤٣٢١"), None);
    assert_eq!(normalize_zip_code("٠١٣١٠١٠٠"), None);
    assert_eq!(normalize_zip_code("٠١٣١٠-١٠٠"), None);

    let mut input = full_input();
    if let Some(address) = input.address.as_mut() {
      address.zip_code = Some("٠١٣١٠١٠٠".into());
    }
    let errors = input.into_draft().unwrap_err();
    assert!(errors.contains_key("address.zipCode"));
  }

  #[test]
  fn valid_input_is_normalized() {
    let draft = full_input().into_draft().unwrap();
    assert_eq!(draft.name, "Maria Souza");
    assert_eq!(draft.email.as_deref(), Some("maria@example.com"));
    assert_eq!(draft.phone, "(11) 98765-4321");
    assert_eq!(draft.address.zip_code, "01310-100");
    assert_eq!(draft.address.complement, "");
  }

  #[test]
  fn blank_email_is_dropped() {
    let mut input = full_input();
    input.email = Some("   ".into());
    assert_eq!(input.into_draft().unwrap().email, None);
  }

  #[test]
  fn problems_are_reported_together() {
    let mut input = full_input();
    input.phone = Some("1234".into());
    input.email = Some("not-an-email".into());
    if let Some(address) = input.address.as_mut() {
      address.city = None;
      address.zip_code = Some("12-34".into());
    }

    let errors = input.into_draft().unwrap_err();
    assert!(errors.contains_key("phone"));
    assert!(errors.contains_key("email"));
    assert!(errors.contains_key("address.city"));
    assert!(errors.contains_key("address.zipCode"));
    assert!(!errors.contains_key("name"));
  }

  #[test]
  fn missing_address_is_required() {
    let mut input = full_input();
    input.address = None;
    let errors = input.into_draft().unwrap_err();
    assert_eq!(errors.get("address").map(String::as_str), Some("Address is required"));
  }
}
