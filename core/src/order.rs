// cartsync/src/order.rs

//! Orders placed from a cart at checkout.

use crate::cart::LineItem;
use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "paymentMethod", rename_all = "UPPERCASE")]
pub enum PaymentMethod {
  /// Cash on delivery.
  Cod,
  Upi {
    #[serde(rename = "upiId")]
    upi_id: String,
  },
}

/// What the shopper fills in at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
  pub name: String,
  pub address: String,
  pub phone: String,
  pub payment: PaymentMethod,
}

impl ShippingDetails {
  pub fn validate(&self) -> SyncResult<()> {
    let mut missing = Vec::new();
    for (field, value) in [("name", &self.name), ("address", &self.address), ("phone", &self.phone)] {
      if value.trim().is_empty() {
        missing.push(field);
      }
    }
    if let PaymentMethod::Upi { upi_id } = &self.payment {
      if upi_id.trim().is_empty() {
        missing.push("upiId");
      }
    }
    if missing.is_empty() {
      Ok(())
    } else {
      Err(SyncError::Validation(format!("Missing required fields: {}", missing.join(", "))))
    }
  }
}

/// A persisted order: the shipping details, a copy of the cart's line items,
/// and the total at the time of purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub name: String,
  pub address: String,
  pub phone: String,
  #[serde(flatten)]
  pub payment: PaymentMethod,
  pub items: Vec<LineItem>,
  pub total: f64,
  pub created_at: DateTime<Utc>,
}

impl Order {
  pub(crate) fn new(shipping: ShippingDetails, items: Vec<LineItem>, total: f64) -> Self {
    Order {
      id: Uuid::new_v4(),
      name: shipping.name.trim().to_string(),
      address: shipping.address.trim().to_string(),
      phone: shipping.phone.trim().to_string(),
      payment: shipping.payment,
      items,
      total,
      created_at: Utc::now(),
    }
  }
}
