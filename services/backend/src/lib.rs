//! Persistence for saved analyses: the hosted backend over HTTP, or a
//! Postgres database standing in for it.

pub mod client;
pub mod config;
pub mod error;
pub mod pg;
pub mod store;

use std::sync::Arc;

use tracing::info;

pub use client::{BackendClient, Session, User};
pub use config::Config;
pub use error::{BackendError, Result};
pub use pg::PgStore;
pub use store::{table_name, AnalysisStore, AnalysisSummary};

/// Owner recorded by the Postgres store when no email is configured.
const LOCAL_USER: &str = "local";

/// Builds the store selected by `config`, signed in when credentials are
/// present. `None` when nothing is configured.
pub async fn open_store(config: &Config) -> Result<Option<Arc<dyn AnalysisStore>>> {
    if let Some(db_url) = &config.db_url {
        let owner = config.email.as_deref().unwrap_or(LOCAL_USER);
        let store = PgStore::connect(db_url, owner).await?;
        store.ensure_schema().await?;
        info!(owner, "using Postgres analysis store");
        return Ok(Some(Arc::new(store)));
    }

    if !config.is_configured() {
        return Ok(None);
    }

    let client = BackendClient::from_config(config)?;
    if let Some((email, password)) = config.credentials() {
        client.sign_in(email, password).await?;
    }
    info!("using hosted backend analysis store");
    Ok(Some(Arc::new(client)))
}
