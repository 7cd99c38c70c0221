//! Azure Monitor REST payloads and their conversion into plugin models.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{DataPoint, MetricDescriptor, MetricSeries, Statistic};

pub const API_VERSION: &str = "2018-01-01";

#[derive(Debug, Deserialize)]
pub struct LocalizableString {
    pub value: String,
    #[serde(rename = "localizedValue")]
    pub localized_value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetricDefinitionList {
    #[serde(default)]
    pub value: Vec<MetricDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    pub name: LocalizableString,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub primary_aggregation_type: Option<String>,
    #[serde(default)]
    pub supported_aggregation_types: Vec<String>,
}

impl From<MetricDefinition> for MetricDescriptor {
    fn from(def: MetricDefinition) -> Self {
        let mut supported_aggregations: Vec<Statistic> = def
            .supported_aggregation_types
            .iter()
            .filter_map(|name| Statistic::from_azure(name))
            .collect();
        supported_aggregations.dedup();

        MetricDescriptor {
            name: def.name.value,
            display_name: def.name.localized_value.filter(|v| !v.is_empty()),
            unit: def.unit.unwrap_or_else(|| "Unspecified".to_string()),
            primary_aggregation: def
                .primary_aggregation_type
                .as_deref()
                .and_then(Statistic::from_azure),
            supported_aggregations,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MetricsQueryResult {
    #[serde(default)]
    pub value: Vec<MetricValues>,
}

#[derive(Debug, Deserialize)]
pub struct MetricValues {
    pub name: LocalizableString,
    #[serde(default)]
    pub timeseries: Vec<TimeSeriesElement>,
}

#[derive(Debug, Deserialize)]
pub struct TimeSeriesElement {
    #[serde(default)]
    pub data: Vec<MetricValue>,
}

#[derive(Debug, Deserialize)]
pub struct MetricValue {
    #[serde(rename = "timeStamp")]
    pub time_stamp: DateTime<Utc>,
    pub average: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub total: Option<f64>,
    pub count: Option<f64>,
}

impl MetricValue {
    /// Value for the requested statistic, or the first populated field when
    /// Azure picked the aggregation itself.
    pub fn value(&self, stat: Option<Statistic>) -> Option<f64> {
        match stat {
            Some(Statistic::Average) => self.average,
            Some(Statistic::Max) => self.maximum,
            Some(Statistic::Min) => self.minimum,
            Some(Statistic::Sum) => self.total,
            Some(Statistic::Count) => self.count,
            None => self
                .average
                .or(self.total)
                .or(self.maximum)
                .or(self.minimum)
                .or(self.count),
        }
    }
}

impl MetricsQueryResult {
    /// Flattens the first returned metric's first series. Points with no
    /// value for the statistic are dropped.
    pub fn into_series(self, requested: Option<&str>, stat: Option<Statistic>) -> MetricSeries {
        let Some(metric) = self.value.into_iter().next() else {
            return MetricSeries {
                metric: requested.unwrap_or_default().to_string(),
                points: Vec::new(),
            };
        };

        let points = metric
            .timeseries
            .into_iter()
            .next()
            .map(|series| {
                series
                    .data
                    .into_iter()
                    .filter_map(|point| {
                        point.value(stat).map(|value| DataPoint {
                            timestamp: point.time_stamp,
                            value,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        MetricSeries {
            metric: metric.name.value,
            points,
        }
    }
}

/// Azure Resource Manager error payload. Some endpoints wrap it in `error`.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<ErrorDetail>,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn describe(self) -> Option<String> {
        let (code, message) = match self.error {
            Some(detail) => (detail.code, detail.message),
            None => (self.code, self.message),
        };
        match (code, message) {
            (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        }
    }
}
