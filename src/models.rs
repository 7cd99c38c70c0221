use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::{PluginError, Result};

/// Loosely typed key-value map as handed over by the host framework.
pub type ParamMap = serde_json::Map<String, Value>;

pub const DEFAULT_SCHEMA: &str = "azure_client_secret";

/// Credential strategy used against Azure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSchema {
    AzureClientSecret,
}

impl CredentialSchema {
    pub const SUPPORTED: [CredentialSchema; 1] = [CredentialSchema::AzureClientSecret];

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSchema::AzureClientSecret => DEFAULT_SCHEMA,
        }
    }

    /// Secret keys that must be present for this schema.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            CredentialSchema::AzureClientSecret => &["tenant_id", "client_id", "client_secret"],
        }
    }

    /// Resolves an optional schema name, defaulting to `azure_client_secret`.
    pub fn resolve(schema: Option<&str>) -> Result<Self> {
        match schema {
            None => Ok(CredentialSchema::AzureClientSecret),
            Some(name) if name.trim().is_empty() => Ok(CredentialSchema::AzureClientSecret),
            Some(name) => name.parse(),
        }
    }
}

impl Default for CredentialSchema {
    fn default() -> Self {
        CredentialSchema::AzureClientSecret
    }
}

impl FromStr for CredentialSchema {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            DEFAULT_SCHEMA => Ok(CredentialSchema::AzureClientSecret),
            other => Err(PluginError::UnsupportedSchema(other.to_string())),
        }
    }
}

impl fmt::Display for CredentialSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation statistic. Plugin-facing names are upper case, Azure uses
/// its own aggregation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Average,
    Max,
    Min,
    Sum,
    Count,
}

impl Statistic {
    pub const ALL: [Statistic; 5] = [
        Statistic::Average,
        Statistic::Max,
        Statistic::Min,
        Statistic::Sum,
        Statistic::Count,
    ];

    pub fn plugin_name(&self) -> &'static str {
        match self {
            Statistic::Average => "AVERAGE",
            Statistic::Max => "MAX",
            Statistic::Min => "MIN",
            Statistic::Sum => "SUM",
            Statistic::Count => "COUNT",
        }
    }

    pub fn azure_aggregation(&self) -> &'static str {
        match self {
            Statistic::Average => "Average",
            Statistic::Max => "Maximum",
            Statistic::Min => "Minimum",
            Statistic::Sum => "Total",
            Statistic::Count => "Count",
        }
    }

    pub fn from_azure(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|stat| stat.azure_aggregation().eq_ignore_ascii_case(name))
    }
}

impl FromStr for Statistic {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|stat| stat.plugin_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PluginError::invalid(
                    "stat",
                    format!("unknown statistic {:?}, expected one of AVERAGE, MAX, MIN, SUM, COUNT", s),
                )
            })
    }
}

/// Azure resource targeted by a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub resource_id: String,
}

impl ResourceRef {
    /// Accepts either a bare resource id or a map carrying it under
    /// `resource_id` (or `id`).
    pub fn from_value(value: &Value) -> Result<Self> {
        let id = match value {
            Value::String(id) => Some(id.as_str()),
            Value::Object(map) => map
                .get("resource_id")
                .or_else(|| map.get("id"))
                .and_then(Value::as_str),
            _ => None,
        };

        match id.map(str::trim) {
            Some(id) if !id.is_empty() => Ok(Self {
                resource_id: if id.starts_with('/') {
                    id.to_string()
                } else {
                    format!("/{}", id)
                },
            }),
            _ => Err(PluginError::invalid(
                "resource",
                "expected a resource id or a map with resource_id",
            )),
        }
    }
}

// Requests as they arrive, before required fields are checked.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitRequest {
    pub options: Option<ParamMap>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyRequest {
    pub schema: Option<String>,
    pub options: Option<ParamMap>,
    pub secret_data: Option<ParamMap>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricRequest {
    pub schema: Option<String>,
    pub options: Option<ParamMap>,
    pub secret_data: Option<ParamMap>,
    pub resource: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricDataRequest {
    pub schema: Option<String>,
    pub options: Option<ParamMap>,
    pub secret_data: Option<ParamMap>,
    pub resource: Option<Value>,
    pub metric: Option<String>,
    pub start: Option<Value>,
    pub end: Option<Value>,
    pub period: Option<i64>,
    pub stat: Option<String>,
}

/// Time-series query handed to the Azure access layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuery {
    pub metric: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Bucket width in seconds.
    pub period: Option<u32>,
    pub stat: Option<Statistic>,
}

// Raw shapes returned by the Azure access layer.

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    pub name: String,
    pub display_name: Option<String>,
    pub unit: String,
    pub primary_aggregation: Option<Statistic>,
    pub supported_aggregations: Vec<Statistic>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub metric: String,
    pub points: Vec<DataPoint>,
}

// Plugin response envelopes.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricUnit {
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricInfo {
    pub key: String,
    pub name: String,
    pub unit: MetricUnit,
    pub chart_type: String,
    pub chart_options: ParamMap,
    pub supported_stats: Vec<String>,
    pub default_stat: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub metrics: Vec<MetricInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDataResponse {
    pub metric: String,
    pub labels: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}
