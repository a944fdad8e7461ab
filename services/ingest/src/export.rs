//! The downloadable JSON document: `{ generated_at, network, data }`.
//!
//! Export is plain serialization of the aggregate; reading it back yields
//! the same value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Aggregate, Network};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub generated_at: DateTime<Utc>,
    pub network: Network,
    pub data: Aggregate,
}

/// Wire shape before `data` is read according to `network`.
#[derive(Deserialize)]
struct RawDocument {
    generated_at: DateTime<Utc>,
    network: Network,
    data: serde_json::Value,
}

impl ExportDocument {
    pub fn new(data: Aggregate) -> Self {
        Self {
            generated_at: Utc::now(),
            network: data.network(),
            data,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawDocument = serde_json::from_str(json)?;
        Ok(Self {
            generated_at: raw.generated_at,
            network: raw.network,
            data: Aggregate::from_value(raw.network, raw.data)?,
        })
    }

    pub fn file_name(&self) -> String {
        export_file_name(self.network, self.generated_at.date_naive())
    }
}

/// `instagram-analytics-2024-01-01.json`
pub fn export_file_name(network: Network, date: NaiveDate) -> String {
    format!("{}-analytics-{}.json", network.as_str(), date.format("%Y-%m-%d"))
}
