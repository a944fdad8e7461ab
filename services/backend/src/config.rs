use crate::error::{BackendError, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings, read from the environment (and `.env`).
///
/// `DB_URL` selects the Postgres store; otherwise the hosted backend is used
/// and `BACKEND_URL` plus `BACKEND_ANON_KEY` are required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub db_url: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = match get("BACKEND_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                BackendError::Config(format!("BACKEND_TIMEOUT_SECS is not a number: {raw}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            backend_url: get("BACKEND_URL"),
            anon_key: get("BACKEND_ANON_KEY"),
            email: get("BACKEND_EMAIL"),
            password: get("BACKEND_PASSWORD"),
            db_url: get("DB_URL"),
            timeout_secs,
        })
    }

    /// Whether any store can be built from these settings.
    pub fn is_configured(&self) -> bool {
        self.db_url.is_some() || (self.backend_url.is_some() && self.anon_key.is_some())
    }

    /// Email and password, when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.email.as_deref()?, self.password.as_deref()?))
    }
}
