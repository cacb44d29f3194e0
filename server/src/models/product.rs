// pizzeria/src/models/product.rs

use crate::errors::FieldErrors;
use crate::models::money;
use crate::models::validation::optional_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: String,
  #[serde(rename = "price", serialize_with = "money::serialize_cents")]
  pub price_cents: i64,
  pub category: String,
  pub ingredients: Vec<String>,
  pub image: Option<String>,
  pub available: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
  pub name: String,
  pub description: String,
  pub price_cents: i64,
  pub category: String,
  pub ingredients: Vec<String>,
  pub image: Option<String>,
  pub available: bool,
}

impl ProductDraft {
  pub fn into_product(self) -> Product {
    let now = Utc::now();
    Product {
      id: Uuid::new_v4(),
      name: self.name,
      description: self.description,
      price_cents: self.price_cents,
      category: self.category,
      ingredients: self.ingredients,
      image: self.image,
      available: self.available,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn apply_to(self, product: &mut Product) {
    product.name = self.name;
    product.description = self.description;
    product.price_cents = self.price_cents;
    product.category = self.category;
    product.ingredients = self.ingredients;
    product.image = self.image;
    product.available = self.available;
    product.updated_at = Utc::now();
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<f64>,
  pub category: Option<String>,
  pub ingredients: Option<Vec<String>>,
  pub image: Option<String>,
  pub available: Option<bool>,
}

impl ProductInput {
  /// Validates the payload. With `existing`, absent fields keep their
  /// stored value (partial update); without it, name, price and category
  /// are mandatory.
  pub fn into_draft(self, existing: Option<&Product>) -> Result<ProductDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = match (optional_text(self.name), existing) {
      (Some(name), _) => name,
      (None, Some(p)) => p.name.clone(),
      (None, None) => {
        errors.insert("name".into(), "Name is required".into());
        String::new()
      }
    };

    let category = match (optional_text(self.category), existing) {
      (Some(category), _) => category,
      (None, Some(p)) => p.category.clone(),
      (None, None) => {
        errors.insert("category".into(), "Category is required".into());
        String::new()
      }
    };

    let price_cents = match (self.price, existing) {
      (Some(price), _) => money::to_cents(price).unwrap_or_else(|| {
        errors.insert("price".into(), "Price must be a number greater than or equal to 0".into());
        0
      }),
      (None, Some(p)) => p.price_cents,
      (None, None) => {
        errors.insert("price".into(), "Price is required".into());
        0
      }
    };

    let description = self
      .description
      .map(|d| d.trim().to_string())
      .or_else(|| existing.map(|p| p.description.clone()))
      .unwrap_or_default();

    let ingredients = match self.ingredients {
      Some(list) => list
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect(),
      None => existing.map(|p| p.ingredients.clone()).unwrap_or_default(),
    };

    let image = match self.image {
      Some(raw) => optional_text(Some(raw)),
      None => existing.and_then(|p| p.image.clone()),
    };

    let available = self.available.or(existing.map(|p| p.available)).unwrap_or(true);

    if !errors.is_empty() {
      return Err(errors);
    }
    Ok(ProductDraft {
      name,
      description,
      price_cents,
      category,
      ingredients,
      image,
      available,
    })
  }
}

/// Query string of `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
  pub category: Option<String>,
  pub available: Option<bool>,
}

impl ProductFilter {
  pub fn matches(&self, product: &Product) -> bool {
    self.category.as_deref().map_or(true, |c| product.category == c)
      && self.available.map_or(true, |a| product.available == a)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn margherita() -> ProductInput {
    ProductInput {
      name: Some("Margherita".into()),
      description: None,
      price: Some(39.9),
      category: Some("pizza".into()),
      ingredients: Some(vec!["tomato".into(), " ".into(), "basil".into()]),
      image: None,
      available: None,
    }
  }

  #[test]
  fn create_applies_defaults() {
    let draft = margherita().into_draft(None).unwrap();
    assert_eq!(draft.price_cents, 3990);
    assert_eq!(draft.description, "");
    assert_eq!(draft.ingredients, vec!["tomato".to_string(), "basil".to_string()]);
    assert!(draft.available);
  }

  #[test]
  fn create_requires_name_price_and_category() {
    let errors = ProductInput::default().into_draft(None).unwrap_err();
    assert!(errors.contains_key("name"));
    assert!(errors.contains_key("price"));
    assert!(errors.contains_key("category"));
  }

  #[test]
  fn negative_price_is_rejected() {
    let mut input = margherita();
    input.price = Some(-1.0);
    let errors = input.into_draft(None).unwrap_err();
    assert!(errors.contains_key("price"));
  }

  #[test]
  fn update_keeps_absent_fields() {
    let existing = margherita().into_draft(None).unwrap().into_product();
    let patch = ProductInput {
      available: Some(false),
      ..Default::default()
    };
    let draft = patch.into_draft(Some(&existing)).unwrap();
    assert_eq!(draft.name, "Margherita");
    assert_eq!(draft.price_cents, 3990);
    assert!(!draft.available);
  }

  #[test]
  fn price_serializes_as_decimal() {
    let product = margherita().into_draft(None).unwrap().into_product();
    let json = serde_json::to_value(&product).unwrap();
    assert_eq!(json["price"], 39.9);
    assert!(json.get("priceCents").is_none());
  }

  #[test]
  fn filter_matches_category_and_availability() {
    let product = margherita().into_draft(None).unwrap().into_product();
    let filter = ProductFilter {
      category: Some("pizza".into()),
      available: Some(true),
    };
    assert!(filter.matches(&product));
    assert!(!ProductFilter {
      category: Some("drink".into()),
      available: None
    }
    .matches(&product));
  }
}
