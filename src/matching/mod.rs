//! Fuzzy matching for inventory search.

pub mod card_matcher;

pub use card_matcher::{CardMatch, CardMatcher, MatchType};
