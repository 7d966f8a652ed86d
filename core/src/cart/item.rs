// cartsync/src/cart/item.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Catalog product identifier. Unique within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
  pub fn new(id: impl Into<String>) -> Self {
    ProductId(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ProductId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ProductId {
  fn from(id: &str) -> Self {
    ProductId::new(id)
  }
}

impl From<String> for ProductId {
  fn from(id: String) -> Self {
    ProductId(id)
  }
}

/// Field names the cart owns. They are stripped from product attributes when
/// a product is added so a stray value cannot shadow the real id or quantity.
const RESERVED_FIELDS: [&str; 3] = ["id", "quantity", "qty"];

/// A product as handed to `add_item`: an id plus whatever catalog fields the
/// caller has (name, price, salePrice, category, image...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  #[serde(flatten)]
  pub attributes: Map<String, Value>,
}

impl Product {
  pub fn new(id: impl Into<ProductId>) -> Self {
    Self {
      id: id.into(),
      attributes: Map::new(),
    }
  }

  /// Builder-style attribute setter, e.g. `Product::new("p1").with("price", 10)`.
  pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.attributes.insert(key.to_string(), value.into());
    self
  }

  pub(crate) fn to_line_item(&self) -> LineItem {
    let mut attributes = self.attributes.clone();
    for reserved in RESERVED_FIELDS {
      attributes.remove(reserved);
    }
    LineItem {
      id: self.id.clone(),
      quantity: 1,
      attributes,
    }
  }
}

/// One product-quantity pair in a cart.
///
/// Product attributes are flattened next to `id` and `quantity`, which is the
/// shape the remote record stores: `{ "id": "p1", "quantity": 2, "price": 10 }`.
/// Records written under the older `qty` field name still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
  pub id: ProductId,
  #[serde(alias = "qty")]
  pub quantity: u32,
  #[serde(flatten)]
  pub attributes: Map<String, Value>,
}

impl LineItem {
  pub fn attribute(&self, key: &str) -> Option<&Value> {
    self.attributes.get(key)
  }

  /// `salePrice` when set and non-zero, otherwise `price`, otherwise 0.
  pub fn unit_price(&self) -> f64 {
    self
      .price_field("salePrice")
      .or_else(|| self.price_field("price"))
      .unwrap_or(0.0)
  }

  pub fn line_total(&self) -> f64 {
    self.unit_price() * f64::from(self.quantity)
  }

  fn price_field(&self, key: &str) -> Option<f64> {
    let price = match self.attributes.get(key)? {
      Value::Number(n) => n.as_f64()?,
      // Catalog entries edited by hand sometimes carry prices as strings.
      Value::String(s) => s.trim().parse::<f64>().ok()?,
      _ => return None,
    };
    (price.is_finite() && price != 0.0).then_some(price)
  }
}
