//! Fuzzy matching of inventory items against a free-text query.
//!
//! Scoring works on "name set number" so queries like `charizard base 4`
//! rank the right card first:
//! - Exact (case-insensitive) card name matches score 100
//! - Everything else is scored by `nucleo-matcher` and scaled to 0-99
//!   relative to the query scored against itself

use crate::models::sale::normalize;
use crate::models::InventoryItem;
use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use serde::Serialize;

/// An inventory item with its match score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMatch {
    pub item: InventoryItem,

    /// Confidence score (0-100, where 100 is an exact name match)
    pub score: u8,

    pub match_type: MatchType,
}

/// How a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    ExactName,
    Fuzzy,
}

/// Inventory matcher built on a reusable nucleo matcher.
pub struct CardMatcher {
    matcher: Matcher,
}

impl Default for CardMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CardMatcher {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
        }
    }

    /// Rank `items` against `query`.
    ///
    /// Results are sorted by score (highest first), then by card name, and
    /// truncated to `max_results`. Items scoring below `min_score` are dropped.
    pub fn find_matches(
        &mut self,
        query: &str,
        items: &[InventoryItem],
        max_results: usize,
        min_score: u8,
    ) -> Vec<CardMatch> {
        let query = normalize(query);
        if query.is_empty() {
            return Vec::new();
        }

        let pattern = Pattern::parse(&query, CaseMatching::Ignore, Normalization::Smart);
        let mut buf = Vec::new();
        let best = pattern
            .score(Utf32Str::new(&query, &mut buf), &mut self.matcher)
            .unwrap_or(0);

        let mut results: Vec<CardMatch> = items
            .iter()
            .filter_map(|item| {
                if normalize(&item.card_name) == query {
                    return Some(CardMatch {
                        item: item.clone(),
                        score: 100,
                        match_type: MatchType::ExactName,
                    });
                }

                let text = item.search_text();
                let raw = pattern.score(Utf32Str::new(&text, &mut buf), &mut self.matcher)?;
                let score = scale(raw, best);
                (score >= min_score).then(|| CardMatch {
                    item: item.clone(),
                    score,
                    match_type: MatchType::Fuzzy,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.item.card_name.cmp(&b.item.card_name))
        });
        results.truncate(max_results);

        results
    }
}

/// Scale a raw nucleo score into 0-99 relative to the best achievable score.
fn scale(raw: u32, best: u32) -> u8 {
    if best == 0 {
        return 0;
    }
    let ratio = f64::from(raw) / f64::from(best);
    (ratio * 99.0).round().clamp(0.0, 99.0) as u8
}
