//! Catalog schema migrations and seed data.
//!
//! Migrations are idempotent: every statement is `IF NOT EXISTS`, and the
//! seed catalog is inserted only into an empty `beverages` table. Running
//! `bev init` twice leaves the catalog unchanged.

use anyhow::Result;
use sqlx::SqlitePool;

use beverage_mcp_core::models::BeverageDraft;

use crate::config::Config;
use crate::db;

/// Outcome of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records inserted by the seed step (0 when the catalog already had data).
    pub seeded: usize,
    /// Records in the catalog afterwards.
    pub total: i64,
}

/// Connect to the configured database, migrate it, and seed it if empty.
pub async fn run_migrations(config: &Config) -> Result<MigrationReport> {
    let pool = db::connect(&config.db).await?;
    migrate_schema(&pool).await?;
    let report = seed_if_empty(&pool, &seed_catalog()).await?;
    pool.close().await;
    Ok(report)
}

/// Create the `beverages` table and its indexes.
pub async fn migrate_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS beverages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            category TEXT,
            primary_ingredient TEXT,
            origin_region TEXT,
            calories_per_serving INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_beverages_category ON beverages(category)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_beverages_calories ON beverages(calories_per_serving)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert `drafts` in one transaction if the catalog has no records yet.
pub async fn seed_if_empty(pool: &SqlitePool, drafts: &[BeverageDraft]) -> Result<MigrationReport> {
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM beverages")
        .fetch_one(&mut *tx)
        .await?;

    let mut seeded = 0;
    if existing == 0 {
        for d in drafts {
            sqlx::query(
                "INSERT INTO beverages (name, category, primary_ingredient, origin_region, calories_per_serving)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&d.name)
            .bind(&d.category)
            .bind(&d.primary_ingredient)
            .bind(&d.origin_region)
            .bind(d.calories_per_serving)
            .execute(&mut *tx)
            .await?;
            seeded += 1;
        }
    }

    tx.commit().await?;

    Ok(MigrationReport {
        seeded,
        total: existing + seeded as i64,
    })
}

/// The catalog shipped with a fresh database.
pub fn seed_catalog() -> Vec<BeverageDraft> {
    let rows: [(&str, &str, &str, &str, Option<i64>); 33] = [
        ("Espresso", "Coffee", "Arabica beans", "Italy", Some(3)),
        ("Cappuccino", "Coffee", "Espresso", "Italy", Some(120)),
        ("Cold Brew", "Coffee", "Arabica beans", "United States", Some(5)),
        ("Turkish Coffee", "Coffee", "Arabica beans", "Turkey", Some(45)),
        ("Café de Olla", "Coffee", "Coffee", "Mexico", Some(90)),
        ("Matcha Latte", "Tea", "Matcha", "Japan", Some(190)),
        ("Masala Chai", "Tea", "Black tea", "India", Some(150)),
        ("Earl Grey", "Tea", "Black tea", "United Kingdom", Some(2)),
        ("Yerba Mate", "Tea", "Yerba mate leaves", "Argentina", Some(10)),
        ("Bubble Tea", "Tea", "Black tea", "Taiwan", Some(300)),
        ("Sweet Tea", "Tea", "Black tea", "United States", Some(180)),
        ("Cola", "Soda", "Kola nut", "United States", Some(140)),
        ("Ginger Ale", "Soda", "Ginger", "Canada", Some(120)),
        ("Root Beer", "Soda", "Sassafras", "United States", Some(160)),
        ("Ramune", "Soda", "Carbonated water", "Japan", Some(80)),
        ("Lemonade", "Juice", "Lemon", "United States", Some(120)),
        ("Orange Juice", "Juice", "Orange", "Brazil", Some(110)),
        ("Sugarcane Juice", "Juice", "Sugarcane", "India", Some(180)),
        ("Horchata", "Traditional", "Rice", "Mexico", Some(120)),
        ("Agua de Jamaica", "Traditional", "Hibiscus", "Mexico", Some(80)),
        ("Lassi", "Traditional", "Yogurt", "India", Some(160)),
        ("Ayran", "Traditional", "Yogurt", "Turkey", Some(70)),
        ("Kvass", "Traditional", "Rye bread", "Russia", Some(60)),
        ("Sikhye", "Traditional", "Rice", "South Korea", Some(140)),
        ("Chicha Morada", "Traditional", "Purple corn", "Peru", Some(130)),
        ("Tepache", "Fermented", "Pineapple", "Mexico", Some(90)),
        ("Kombucha", "Fermented", "Black tea", "China", Some(30)),
        ("Kefir", "Fermented", "Milk", "Caucasus", Some(110)),
        ("Hot Chocolate", "Chocolate", "Cocoa", "Mexico", Some(190)),
        ("Champurrado", "Chocolate", "Masa", "Mexico", Some(220)),
        ("Coconut Water", "Natural", "Coconut", "Thailand", Some(45)),
        ("Sparkling Water", "Water", "Carbonated water", "Germany", Some(0)),
        ("Barley Tea", "Tea", "Roasted barley", "South Korea", None),
    ];

    rows.into_iter()
        .map(|(name, category, ingredient, origin, calories)| {
            let draft = BeverageDraft::new(name, category)
                .ingredient(ingredient)
                .origin(origin);
            match calories {
                Some(c) => draft.calories(c),
                None => draft,
            }
        })
        .collect()
}
