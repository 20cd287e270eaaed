//! Catalog record types.
//!
//! A [`Beverage`] is the wire and view shape of one catalog entry. Every
//! field except `id` is optional so that "no value" stays distinguishable
//! from an empty string or zero.

use serde::Serialize;

/// One catalog entry, as stored and as sent over the wire.
///
/// Serializes with camelCase keys (`primaryIngredient`, `originRegion`,
/// `caloriesPerServing`). Unset fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Beverage {
    pub id: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub primary_ingredient: Option<String>,
    pub origin_region: Option<String>,
    pub calories_per_serving: Option<i64>,
}

impl Beverage {
    /// Name for display, or `"(unnamed)"`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }
}

/// A record that has not been assigned an id yet.
///
/// Stores assign the id on insert; see
/// [`InMemoryStore::insert`](crate::store::memory::InMemoryStore::insert).
#[derive(Debug, Clone, Default)]
pub struct BeverageDraft {
    pub name: Option<String>,
    pub category: Option<String>,
    pub primary_ingredient: Option<String>,
    pub origin_region: Option<String>,
    pub calories_per_serving: Option<i64>,
}

impl BeverageDraft {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn ingredient(mut self, ingredient: impl Into<String>) -> Self {
        self.primary_ingredient = Some(ingredient.into());
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin_region = Some(origin.into());
        self
    }

    pub fn calories(mut self, calories: i64) -> Self {
        self.calories_per_serving = Some(calories);
        self
    }

    /// Attach a store-assigned id.
    pub fn with_id(self, id: i64) -> Beverage {
        Beverage {
            id,
            name: self.name,
            category: self.category,
            primary_ingredient: self.primary_ingredient,
            origin_region: self.origin_region,
            calories_per_serving: self.calories_per_serving,
        }
    }
}
