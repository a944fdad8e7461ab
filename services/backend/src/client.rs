//! HTTP client for the hosted backend (auth plus per-platform analysis
//! tables).
//!
//! Speaks the usual BaaS REST conventions: GoTrue-style auth under
//! `/auth/v1/` and PostgREST-style tables under `/rest/v1/`. Every request
//! carries the project's anon key in `apikey`; the bearer token is the
//! signed-in user's access token, or the anon key before sign-in.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use ingest::{Aggregate, Network};

use crate::config::Config;
use crate::error::{BackendError, Result};
use crate::store::{table_name, AnalysisStore, AnalysisSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

#[derive(Serialize)]
struct NewAnalysis<'a> {
    user_id: Uuid,
    name: &'a str,
    data: &'a Aggregate,
}

#[derive(Deserialize)]
struct PayloadRow {
    data: serde_json::Value,
}

pub struct BackendClient {
    client: Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
}

impl BackendClient {
    pub fn new(base_url: &str, anon_key: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("analytics-dashboard/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config
            .backend_url
            .as_deref()
            .ok_or_else(|| BackendError::Config("BACKEND_URL env var missing".to_string()))?;
        let anon_key = config
            .anon_key
            .as_deref()
            .ok_or_else(|| BackendError::Config("BACKEND_ANON_KEY env var missing".to_string()))?;
        Self::new(base_url, anon_key, config.timeout_secs)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn bearer(&self) -> String {
        match &*self.session.read().await {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        }
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
    }

    async fn user_id(&self) -> Result<Uuid> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.user.id)
            .ok_or(BackendError::NotSignedIn)
    }

    /// Passes 2xx responses through; anything else becomes
    /// [`BackendError::UnexpectedStatus`] with the body kept for display.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Creates an account. Returns the session when the backend signs the
    /// user in immediately, `None` when it waits for email confirmation.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let request = self
            .client
            .post(self.url("auth/v1/signup"))
            .json(&json!({ "email": email, "password": password }));
        let response = Self::check(self.authorized(request).await.send().await?).await?;
        let body: serde_json::Value = response.json().await?;

        if body.get("access_token").is_none() {
            info!(email, "sign-up pending confirmation");
            return Ok(None);
        }
        let session: Session = serde_json::from_value(body)?;
        *self.session.write().await = Some(session.clone());
        Ok(Some(session))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let request = self
            .client
            .post(self.url("auth/v1/token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let response = Self::check(self.authorized(request).await.send().await?).await?;
        let session: Session = response.json().await?;

        debug!(user = %session.user.id, "signed in");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Ends the session on the backend and forgets it locally.
    pub async fn sign_out(&self) -> Result<()> {
        if self.session.read().await.is_none() {
            return Ok(());
        }
        let request = self.client.post(self.url("auth/v1/logout"));
        let result = self.authorized(request).await.send().await;
        *self.session.write().await = None;
        Self::check(result?).await?;
        Ok(())
    }

    /// The locally held session, if any.
    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Asks the backend who the current token belongs to.
    pub async fn current_user(&self) -> Result<User> {
        if self.session.read().await.is_none() {
            return Err(BackendError::NotSignedIn);
        }
        let request = self.client.get(self.url("auth/v1/user"));
        let response = Self::check(self.authorized(request).await.send().await?).await?;
        Ok(response.json().await?)
    }
}

// =============================================================================
// Analyses
// =============================================================================

#[async_trait]
impl AnalysisStore for BackendClient {
    async fn create_analysis(
        &self,
        network: Network,
        name: &str,
        data: &Aggregate,
    ) -> Result<AnalysisSummary> {
        let user_id = self.user_id().await?;
        let request = self
            .client
            .post(self.url(&format!("rest/v1/{}", table_name(network))))
            .header("Prefer", "return=representation")
            .query(&[("select", "id,name,created_at")])
            .json(&NewAnalysis {
                user_id,
                name,
                data,
            });
        let response = Self::check(self.authorized(request).await.send().await?).await?;

        let mut rows: Vec<AnalysisSummary> = response.json().await?;
        if rows.is_empty() {
            return Err(BackendError::UnexpectedStatus {
                status: 201,
                body: "insert returned no rows".to_string(),
            });
        }
        let created = rows.swap_remove(0);
        info!(network = network.as_str(), id = %created.id, "analysis saved");
        Ok(created)
    }

    async fn list_analyses(&self, network: Network) -> Result<Vec<AnalysisSummary>> {
        let user_id = self.user_id().await?;
        let request = self
            .client
            .get(self.url(&format!("rest/v1/{}", table_name(network))))
            .query(&[
                ("select", "id,name,created_at".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
            ]);
        let response = Self::check(self.authorized(request).await.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn fetch_analysis(&self, network: Network, id: Uuid) -> Result<Aggregate> {
        self.user_id().await?;
        let request = self
            .client
            .get(self.url(&format!("rest/v1/{}", table_name(network))))
            .query(&[("select", "data".to_string()), ("id", format!("eq.{id}"))]);
        let response = Self::check(self.authorized(request).await.send().await?).await?;

        let rows: Vec<PayloadRow> = response.json().await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or(BackendError::NotFound { id })?;
        Ok(Aggregate::from_value(network, row.data)?)
    }
}
