//! Catalog records: TCGPlayer products and PSA certificates.

use serde::{Deserialize, Serialize};

/// A product returned by the TCGPlayer catalog search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardProduct {
    pub product_id: u64,
    pub name: String,
    pub set_name: Option<String>,
    pub product_line: Option<String>,
    pub rarity: Option<String>,
    pub number: Option<String>,
    pub market_price: Option<f64>,
    pub image_url: String,
}

impl CardProduct {
    pub fn image_url_for(product_id: u64) -> String {
        format!(
            "https://product-images.tcgplayer.com/fit-in/437x437/{}.jpg",
            product_id
        )
    }
}

/// A PSA certificate as returned by the PSA public API (`PSACert` object).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(
    default,
    rename_all(serialize = "camelCase", deserialize = "PascalCase")
)]
pub struct PsaCert {
    pub cert_number: String,
    pub year: String,
    pub brand: String,
    pub category: String,
    pub card_number: String,
    pub subject: String,
    pub variety: String,
    pub card_grade: String,
    pub grade_description: String,
    pub total_population: u32,
    pub population_higher: u32,
}
