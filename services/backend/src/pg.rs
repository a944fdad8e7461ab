//! Postgres-backed analysis store for self-hosted setups.
//!
//! One table for all platforms; the hosted backend's per-platform tables map
//! to the `network` column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use ingest::{Aggregate, Network};

use crate::error::{BackendError, Result};
use crate::store::{AnalysisStore, AnalysisSummary};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS analyses (
    analysis_id uuid PRIMARY KEY,
    user_id     text        NOT NULL,
    network     text        NOT NULL,
    name        text        NOT NULL,
    data        jsonb       NOT NULL,
    created_at  timestamptz NOT NULL DEFAULT now()
)
"#;

pub struct PgStore {
    pool: PgPool,
    /// Owner recorded on every row; there is no auth in front of the pool.
    user_id: String,
}

impl PgStore {
    pub async fn connect(db_url: &str, user_id: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?;
        Ok(Self::with_pool(pool, user_id))
    }

    pub fn with_pool(pool: PgPool, user_id: &str) -> Self {
        Self {
            pool,
            user_id: user_id.to_string(),
        }
    }

    /// Creates the `analyses` table when missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AnalysisStore for PgStore {
    async fn create_analysis(
        &self,
        network: Network,
        name: &str,
        data: &Aggregate,
    ) -> Result<AnalysisSummary> {
        let analysis_id = Uuid::new_v4();
        let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
            r#"
            INSERT INTO analyses (analysis_id, user_id, network, name, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING created_at
            "#,
        )
        .bind(analysis_id)
        .bind(&self.user_id)
        .bind(network.as_str())
        .bind(name)
        .bind(Json(data))
        .fetch_one(&self.pool)
        .await?;

        info!(network = network.as_str(), id = %analysis_id, "analysis saved");
        Ok(AnalysisSummary {
            id: analysis_id,
            name: name.to_string(),
            created_at,
        })
    }

    async fn list_analyses(&self, network: Network) -> Result<Vec<AnalysisSummary>> {
        let rows: Vec<(Uuid, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT analysis_id, name, created_at
            FROM analyses
            WHERE user_id = $1 AND network = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(&self.user_id)
        .bind(network.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, created_at)| AnalysisSummary {
                id,
                name,
                created_at,
            })
            .collect())
    }

    async fn fetch_analysis(&self, network: Network, id: Uuid) -> Result<Aggregate> {
        let row: Option<(Json<serde_json::Value>,)> = sqlx::query_as(
            "SELECT data FROM analyses WHERE analysis_id = $1 AND user_id = $2 AND network = $3",
        )
        .bind(id)
        .bind(&self.user_id)
        .bind(network.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let (Json(data),) = row.ok_or(BackendError::NotFound { id })?;
        Ok(Aggregate::from_value(network, data)?)
    }
}
