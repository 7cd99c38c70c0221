//! Access to Azure Monitor.
//!
//! [`MonitorConnector`] is the seam the metric service talks to;
//! [`AzureManager`] implements it over the Azure Resource Manager REST API.

pub mod credential;
pub mod monitor;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::AzureEndpoints;
use crate::metrics;
use crate::models::{
    CredentialSchema, MetricDescriptor, MetricQuery, MetricSeries, ParamMap, ResourceRef,
};
use crate::utils::timestamp::{period_to_iso8601, to_iso8601};
use crate::{PluginError, Result};

use self::credential::{AccessToken, ClientSecretCredential};
use self::monitor::{ErrorResponse, MetricDefinitionList, MetricsQueryResult, API_VERSION};

#[async_trait]
pub trait MonitorConnector: Send + Sync {
    /// Checks that the credentials are accepted by Azure.
    async fn verify(
        &self,
        schema: CredentialSchema,
        options: &ParamMap,
        secret_data: &ParamMap,
    ) -> Result<()>;

    /// Enumerates the metrics available on a resource.
    async fn list_metrics(
        &self,
        schema: CredentialSchema,
        options: &ParamMap,
        secret_data: &ParamMap,
        resource: &ResourceRef,
    ) -> Result<Vec<MetricDescriptor>>;

    /// Fetches one metric's time series over the query window.
    async fn get_metric_data(
        &self,
        schema: CredentialSchema,
        options: &ParamMap,
        secret_data: &ParamMap,
        resource: &ResourceRef,
        query: &MetricQuery,
    ) -> Result<MetricSeries>;
}

#[derive(Debug, Clone)]
pub struct AzureManager {
    http: reqwest::Client,
    endpoints: AzureEndpoints,
}

impl AzureManager {
    pub fn new(endpoints: AzureEndpoints) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(endpoints.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PluginError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, endpoints })
    }

    async fn authenticate(
        &self,
        schema: CredentialSchema,
        secret_data: &ParamMap,
    ) -> Result<AccessToken> {
        let credential = ClientSecretCredential::from_secret_data(schema, secret_data)?;
        credential.acquire_token(&self.http, &self.endpoints).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        token: &AccessToken,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.endpoints.management_endpoint, path);
        debug!(%url, ?query, "Calling Azure Monitor");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token.access_token)
            .query(&[("api-version", API_VERSION)])
            .query(query)
            .send()
            .await
            .map_err(|e| {
                metrics::record_azure_request(endpoint, None);
                PluginError::from(e)
            })?;

        let status = response.status();
        metrics::record_azure_request(endpoint, Some(status.as_u16()));

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(ErrorResponse::describe)
                .unwrap_or(body);
            return Err(PluginError::Azure(format!("{} returned {}: {}", endpoint, status, reason)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PluginError::Azure(format!("Malformed {} response: {}", endpoint, e)))
    }
}

fn metric_namespace(options: &ParamMap) -> Option<String> {
    options
        .get("metric_namespace")
        .and_then(Value::as_str)
        .filter(|ns| !ns.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl MonitorConnector for AzureManager {
    async fn verify(
        &self,
        schema: CredentialSchema,
        _options: &ParamMap,
        secret_data: &ParamMap,
    ) -> Result<()> {
        self.authenticate(schema, secret_data).await?;
        info!("Azure credentials verified");
        Ok(())
    }

    async fn list_metrics(
        &self,
        schema: CredentialSchema,
        options: &ParamMap,
        secret_data: &ParamMap,
        resource: &ResourceRef,
    ) -> Result<Vec<MetricDescriptor>> {
        let token = self.authenticate(schema, secret_data).await?;

        let mut query = Vec::new();
        if let Some(ns) = metric_namespace(options) {
            query.push(("metricnamespace", ns));
        }

        let path = format!(
            "{}/providers/Microsoft.Insights/metricDefinitions",
            resource.resource_id
        );
        let definitions: MetricDefinitionList = self
            .get_json("metric_definitions", &token, &path, &query)
            .await?;

        info!(resource_id = %resource.resource_id, count = definitions.value.len(), "Listed metric definitions");
        Ok(definitions.value.into_iter().map(MetricDescriptor::from).collect())
    }

    async fn get_metric_data(
        &self,
        schema: CredentialSchema,
        options: &ParamMap,
        secret_data: &ParamMap,
        resource: &ResourceRef,
        query: &MetricQuery,
    ) -> Result<MetricSeries> {
        let token = self.authenticate(schema, secret_data).await?;

        let mut params = vec![(
            "timespan",
            format!("{}/{}", to_iso8601(&query.start), to_iso8601(&query.end)),
        )];
        if let Some(metric) = &query.metric {
            params.push(("metricnames", metric.clone()));
        }
        if let Some(period) = query.period {
            params.push(("interval", period_to_iso8601(period)));
        }
        if let Some(stat) = query.stat {
            params.push(("aggregation", stat.azure_aggregation().to_string()));
        }
        if let Some(ns) = metric_namespace(options) {
            params.push(("metricnamespace", ns));
        }

        let path = format!("{}/providers/Microsoft.Insights/metrics", resource.resource_id);
        let result: MetricsQueryResult = self.get_json("metrics", &token, &path, &params).await?;

        let series = result.into_series(query.metric.as_deref(), query.stat);
        info!(resource_id = %resource.resource_id, metric = %series.metric, points = series.points.len(), "Fetched metric data");
        Ok(series)
    }
}
