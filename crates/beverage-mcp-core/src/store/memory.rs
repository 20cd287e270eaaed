//! In-memory [`CatalogStore`] implementation for testing.
//!
//! Uses a `Vec` behind `std::sync::RwLock`. Filters are evaluated with
//! [`BeverageFilter::matches`].

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Beverage, BeverageDraft};

use super::{BeverageFilter, CatalogStore};

/// In-memory catalog. Ids are assigned sequentially from 1.
pub struct InMemoryStore {
    records: RwLock<Vec<Beverage>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Build a store pre-loaded with `drafts`, in order.
    pub fn with_drafts(drafts: impl IntoIterator<Item = BeverageDraft>) -> Self {
        let store = Self::new();
        for d in drafts {
            store.insert(d);
        }
        store
    }

    /// Insert a record and return its assigned id.
    pub fn insert(&self, draft: BeverageDraft) -> i64 {
        let mut records = self.records.write().unwrap();
        let id = records.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        records.push(draft.with_id(id));
        id
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn query(&self, filter: &BeverageFilter) -> Result<Vec<Beverage>> {
        let records = self.records.read().unwrap();
        let mut out: Vec<Beverage> = records
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        out.sort_by_key(|b| b.id);
        Ok(out)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.records.read().unwrap().len() as i64)
    }
}
