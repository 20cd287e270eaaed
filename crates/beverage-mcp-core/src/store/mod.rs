//! Storage abstraction for the beverage catalog.
//!
//! The [`CatalogStore`] trait is the only thing the query tools know about
//! persistence. Implementations answer a [`BeverageFilter`] with the
//! matching records ordered by id, so repeated queries against an unchanged
//! store return identical lists.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Beverage;

/// A predicate over catalog records.
///
/// Text predicates compare case-insensitively. `Category` is an exact
/// match; the other text predicates are substring matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeverageFilter {
    All,
    Id(i64),
    NameContains(String),
    Category(String),
    IngredientContains(String),
    /// Calories set and `<=` the threshold. Records without calories never match.
    MaxCalories(i64),
    OriginContains(String),
}

impl BeverageFilter {
    /// Evaluate the predicate against one record.
    ///
    /// Backends that cannot push the predicate down (the in-memory store)
    /// use this directly; SQL backends must agree with it.
    pub fn matches(&self, b: &Beverage) -> bool {
        match self {
            BeverageFilter::All => true,
            BeverageFilter::Id(id) => b.id == *id,
            BeverageFilter::NameContains(q) => contains_ci(b.name.as_deref(), q),
            BeverageFilter::Category(c) => b
                .category
                .as_deref()
                .is_some_and(|v| v.to_lowercase() == c.to_lowercase()),
            BeverageFilter::IngredientContains(q) => {
                contains_ci(b.primary_ingredient.as_deref(), q)
            }
            BeverageFilter::MaxCalories(max) => {
                b.calories_per_serving.is_some_and(|cal| cal <= *max)
            }
            BeverageFilter::OriginContains(q) => contains_ci(b.origin_region.as_deref(), q),
        }
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// Abstract read-side storage backend for the catalog.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`query`](CatalogStore::query) | Records matching a filter, ordered by id |
/// | [`count`](CatalogStore::count) | Total record count (health reporting) |
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Return every record matching `filter`, ordered by ascending id.
    async fn query(&self, filter: &BeverageFilter) -> Result<Vec<Beverage>>;

    /// Total number of records in the catalog.
    async fn count(&self) -> Result<i64>;
}
