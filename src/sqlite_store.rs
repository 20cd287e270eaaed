//! SQLite-backed [`CatalogStore`] implementation.
//!
//! Id and calorie filters run as parameterized `SELECT`s against the
//! `beverages` table created by [`migrate`](crate::migrate). Text filters
//! are evaluated with [`BeverageFilter::matches`] over the id-ordered
//! catalog, because SQLite's `lower()` folds ASCII only and would miss
//! case variants such as `CAFÉ` / `Café`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use beverage_mcp_core::models::Beverage;
use beverage_mcp_core::store::{BeverageFilter, CatalogStore};

const SELECT_COLUMNS: &str = "SELECT id, name, category, primary_ingredient, origin_region, \
     calories_per_serving FROM beverages";

/// SQLite implementation of the [`CatalogStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn all(&self) -> Result<Vec<Beverage>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_beverage).collect())
    }
}

fn row_to_beverage(row: &SqliteRow) -> Beverage {
    Beverage {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        primary_ingredient: row.get("primary_ingredient"),
        origin_region: row.get("origin_region"),
        calories_per_serving: row.get("calories_per_serving"),
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn query(&self, filter: &BeverageFilter) -> Result<Vec<Beverage>> {
        let rows = match filter {
            BeverageFilter::All => return self.all().await,
            BeverageFilter::Id(id) => {
                sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ? ORDER BY id"))
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            BeverageFilter::MaxCalories(max) => {
                sqlx::query(&format!(
                    "{SELECT_COLUMNS} WHERE calories_per_serving IS NOT NULL \
                     AND calories_per_serving <= ? ORDER BY id"
                ))
                .bind(max)
                .fetch_all(&self.pool)
                .await?
            }
            BeverageFilter::NameContains(_)
            | BeverageFilter::Category(_)
            | BeverageFilter::IngredientContains(_)
            | BeverageFilter::OriginContains(_) => {
                let mut records = self.all().await?;
                records.retain(|b| filter.matches(b));
                return Ok(records);
            }
        };

        Ok(rows.iter().map(row_to_beverage).collect())
    }

    async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM beverages")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
