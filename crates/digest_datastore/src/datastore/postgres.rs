use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{datastore::DataStore, ProcessedMarker};

static TABLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap());

/// Table names are interpolated into SQL, so only plain identifiers are accepted
pub fn validate_table_name(table: &str) -> anyhow::Result<()> {
    if TABLE_NAME_RE.is_match(table) {
        Ok(())
    } else {
        anyhow::bail!("Invalid table name: {table:?}")
    }
}

#[derive(Debug, Clone)]
pub struct PgDataStore {
    pub pool: PgPool,
    table: String,
}

impl PgDataStore {
    /// Establish connection to database and create the markers table
    /// if not exists
    pub async fn init(database_url: &str, table: &str) -> anyhow::Result<Self> {
        validate_table_name(table)?;

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .inspect_err(
                |e| tracing::error!(error = ?e, "Failed to establish connection to database"),
            )
            .context("Failed to connect to postgres database")?;

        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                item_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                published_date DATE,
                processed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#
        );

        sqlx::query(&create_table)
            .execute(&pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, table, "Failed to create markers table"))
            .context("Failed to create markers table")?;

        Ok(PgDataStore {
            pool,
            table: table.to_string(),
        })
    }
}

impl DataStore for PgDataStore {
    async fn is_processed(&self, item_id: &str) -> anyhow::Result<bool> {
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE item_id = $1)",
            self.table
        );

        sqlx::query_scalar::<_, bool>(&query)
            .bind(item_id)
            .fetch_one(&self.pool)
            .await
            .inspect_err(|e| {
                tracing::error!(error = ?e, item_id, "Failed to look up processed marker");
            })
            .context("Failed to look up processed marker")
    }

    async fn record_processed(&self, marker: &ProcessedMarker) -> anyhow::Result<()> {
        let query = format!(
            r#"
            INSERT INTO {} (item_id, title, published_date, processed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
            self.table
        );

        sqlx::query(&query)
            .bind(&marker.item_id)
            .bind(&marker.title)
            .bind(marker.published_date)
            .bind(marker.processed_at)
            .execute(&self.pool)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    error = ?err,
                    item_id = %marker.item_id,
                    "Failed to insert processed marker"
                )
            })
            .context("Failed to insert processed marker")?;

        Ok(())
    }
}
