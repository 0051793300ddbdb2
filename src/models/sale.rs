//! Sale records and the aggregated price summary returned by every lookup.

use serde::{Deserialize, Serialize};

/// A single completed sale extracted from an upstream page or API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sale {
    /// Sale price in USD
    pub price: f64,

    /// Listing title as shown by the marketplace
    pub title: String,

    /// Sale date as reported upstream (format varies by source)
    pub date: String,
}

impl Sale {
    pub fn new(price: f64, title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            price,
            title: title.into(),
            date: date.into(),
        }
    }

    /// Whether the price can take part in an average.
    pub fn has_usable_price(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

/// Aggregated result of a price lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    /// Trimmed mean of the sale prices, rounded to cents
    pub average_price: f64,

    /// Number of sales extracted
    pub sales_count: usize,

    /// Number of sales that contributed to `average_price`
    pub filtered_sales_count: usize,

    /// Every extracted sale, in upstream order
    pub sales: Vec<Sale>,

    /// Query string sent upstream
    pub query: String,
}

/// What to look up: a card, optionally narrowed by grade or condition.
///
/// For TCGPlayer lookups `card` holds the numeric product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesQuery {
    pub card: String,
    pub grade: Option<String>,
    pub condition: Option<String>,
}

impl SalesQuery {
    pub fn new(card: impl Into<String>) -> Self {
        Self {
            card: card.into(),
            grade: None,
            condition: None,
        }
    }

    pub fn with_grade(mut self, grade: Option<String>) -> Self {
        self.grade = grade.filter(|g| !g.trim().is_empty());
        self
    }

    pub fn with_condition(mut self, condition: Option<String>) -> Self {
        self.condition = condition.filter(|c| !c.trim().is_empty());
        self
    }

    /// Cache key built from the normalized parameters.
    ///
    /// Case and runs of whitespace are ignored so `"Charizard  Base"` and
    /// `"charizard base"` share an entry.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}",
            normalize(&self.card),
            self.grade.as_deref().map(normalize).unwrap_or_default(),
            self.condition.as_deref().map(normalize).unwrap_or_default()
        )
    }

    /// Card text with the PSA grade appended, as marketplace searches expect.
    pub fn graded_search_text(&self) -> String {
        match self.grade.as_deref().map(str::trim) {
            Some(grade) if !grade.is_empty() => format!("{} PSA {}", self.card.trim(), grade),
            _ => self.card.trim().to_string(),
        }
    }
}

/// Lowercase and collapse whitespace.
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_normalizes() {
        let a = SalesQuery::new("  Charizard   Base Set ").with_grade(Some("10".into()));
        let b = SalesQuery::new("charizard base set").with_grade(Some(" 10".into()));
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "charizard base set|10|");
    }

    #[test]
    fn test_cache_key_distinguishes_grade() {
        let a = SalesQuery::new("pikachu").with_grade(Some("9".into()));
        let b = SalesQuery::new("pikachu").with_grade(Some("10".into()));
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_blank_grade_is_dropped() {
        let query = SalesQuery::new("mew").with_grade(Some("  ".into()));
        assert!(query.grade.is_none());
        assert_eq!(query.graded_search_text(), "mew");
    }

    #[test]
    fn test_graded_search_text() {
        let query = SalesQuery::new("Charizard 1999 Base").with_grade(Some("9".into()));
        assert_eq!(query.graded_search_text(), "Charizard 1999 Base PSA 9");
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = PriceSummary {
            average_price: 12.5,
            sales_count: 2,
            filtered_sales_count: 2,
            sales: vec![Sale::new(10.0, "a", "2024-01-01")],
            query: "q".to_string(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["averagePrice"], 12.5);
        assert_eq!(json["salesCount"], 2);
        assert_eq!(json["filteredSalesCount"], 2);
        assert_eq!(json["sales"][0]["title"], "a");
    }

    #[test]
    fn test_usable_price() {
        assert!(Sale::new(1.0, "", "").has_usable_price());
        assert!(!Sale::new(0.0, "", "").has_usable_price());
        assert!(!Sale::new(f64::NAN, "", "").has_usable_price());
    }
}
