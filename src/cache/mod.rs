//! Caching utilities for the trade-in server.
//!
//! This module provides a generic time-based cache with TTL support and a
//! periodic sweeper.

pub mod timed_cache;

pub use timed_cache::TimedCache;
