use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ingest::{Aggregate, Network};

use crate::error::Result;

/// A saved analysis without its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Per-platform storage of named analyses for the signed-in user.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn create_analysis(
        &self,
        network: Network,
        name: &str,
        data: &Aggregate,
    ) -> Result<AnalysisSummary>;

    /// Newest first.
    async fn list_analyses(&self, network: Network) -> Result<Vec<AnalysisSummary>>;

    async fn fetch_analysis(&self, network: Network, id: Uuid) -> Result<Aggregate>;
}

/// Hosted-backend table holding one platform's analyses.
pub fn table_name(network: Network) -> String {
    format!("{}_analyses", network.as_str())
}
