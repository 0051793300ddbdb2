//! Inventory rows stored in the shop database.
//!
//! The database speaks snake_case columns while the front end speaks
//! camelCase, so reads accept both spellings and writes go through explicit
//! row builders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

fn default_quantity() -> u32 {
    1
}

/// A card held in inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i64,

    #[serde(alias = "card_name")]
    pub card_name: String,

    #[serde(default, alias = "set_name")]
    pub set_name: Option<String>,

    #[serde(default, alias = "card_number")]
    pub card_number: Option<String>,

    /// Raw condition, e.g. "Near Mint"
    #[serde(default)]
    pub condition: Option<String>,

    /// Grading label, e.g. "PSA 10"
    #[serde(default)]
    pub grade: Option<String>,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// What the shop paid at trade-in
    #[serde(default, alias = "purchase_price")]
    pub purchase_price: Option<f64>,

    #[serde(default, alias = "market_price")]
    pub market_price: Option<f64>,

    /// Shelf price
    #[serde(default, alias = "list_price")]
    pub list_price: Option<f64>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default, alias = "shopify_product_id")]
    pub shopify_product_id: Option<String>,

    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl InventoryItem {
    /// Text the fuzzy matcher scores against.
    pub fn search_text(&self) -> String {
        let mut text = self.card_name.clone();
        for part in [&self.set_name, &self.card_number].into_iter().flatten() {
            text.push(' ');
            text.push_str(part);
        }
        text
    }
}

/// Payload for adding a card to inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub card_name: String,
    #[serde(default)]
    pub set_name: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub market_price: Option<f64>,
    #[serde(default)]
    pub list_price: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewInventoryItem {
    /// Check the fields the database cannot check for us.
    pub fn validate(&self) -> Result<(), String> {
        validate_card_name(&self.card_name)?;
        validate_quantity(self.quantity)?;
        validate_price("purchasePrice", self.purchase_price)?;
        validate_price("marketPrice", self.market_price)?;
        validate_price("listPrice", self.list_price)?;
        Ok(())
    }

    /// Database row for insertion.
    pub fn to_row(&self, now: DateTime<Utc>) -> Value {
        json!({
            "card_name": self.card_name.trim(),
            "set_name": self.set_name,
            "card_number": self.card_number,
            "condition": self.condition,
            "grade": self.grade,
            "quantity": self.quantity,
            "purchase_price": self.purchase_price,
            "market_price": self.market_price,
            "list_price": self.list_price,
            "notes": self.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        })
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUpdate {
    #[serde(default)]
    pub card_name: Option<String>,
    #[serde(default)]
    pub set_name: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub market_price: Option<f64>,
    #[serde(default)]
    pub list_price: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub shopify_product_id: Option<String>,
}

impl InventoryUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Same rules as [`NewInventoryItem::validate`] for the fields present.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.card_name {
            validate_card_name(name)?;
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        validate_price("purchasePrice", self.purchase_price)?;
        validate_price("marketPrice", self.market_price)?;
        validate_price("listPrice", self.list_price)?;
        Ok(())
    }

    /// Database row containing only the fields being changed.
    pub fn to_row(&self, now: DateTime<Utc>) -> Value {
        let mut row = Map::new();
        let mut put = |column: &str, value: Option<Value>| {
            if let Some(value) = value {
                row.insert(column.to_string(), value);
            }
        };

        put("card_name", self.card_name.as_deref().map(|v| json!(v.trim())));
        put("set_name", self.set_name.as_ref().map(|v| json!(v)));
        put("card_number", self.card_number.as_ref().map(|v| json!(v)));
        put("condition", self.condition.as_ref().map(|v| json!(v)));
        put("grade", self.grade.as_ref().map(|v| json!(v)));
        put("quantity", self.quantity.map(|v| json!(v)));
        put("purchase_price", self.purchase_price.map(|v| json!(v)));
        put("market_price", self.market_price.map(|v| json!(v)));
        put("list_price", self.list_price.map(|v| json!(v)));
        put("notes", self.notes.as_ref().map(|v| json!(v)));
        put(
            "shopify_product_id",
            self.shopify_product_id.as_ref().map(|v| json!(v)),
        );
        put("updated_at", Some(json!(now.to_rfc3339())));

        Value::Object(row)
    }
}

const MAX_CARD_NAME_LEN: usize = 300;

fn validate_card_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Card name cannot be empty".to_string());
    }
    if name.len() > MAX_CARD_NAME_LEN {
        return Err(format!(
            "Card name too long (max {} characters)",
            MAX_CARD_NAME_LEN
        ));
    }
    Ok(())
}

fn validate_quantity(quantity: u32) -> Result<(), String> {
    if quantity == 0 {
        return Err("Quantity must be at least 1".to_string());
    }
    Ok(())
}

fn validate_price(field: &str, price: Option<f64>) -> Result<(), String> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => {
            Err(format!("{} must be a non-negative number", field))
        }
        _ => Ok(()),
    }
}
