use chrono::SubsecRound;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::azure::MonitorConnector;
use crate::metrics::{self, OperationTimer};
use crate::models::{
    CredentialSchema, InitRequest, MetricDataRequest, MetricDataResponse, MetricQuery,
    MetricRequest, MetricsResponse, ResourceRef, Statistic, VerifyRequest,
};
use crate::response::MetricResponseManager;
use crate::utils::timestamp::parse_timestamp;
use crate::{PluginError, Result};

pub const SUPPORTED_RESOURCE_TYPE: &str = "inventory.CloudService";

/// Plugin operations: validates parameters, calls Azure through the
/// connector and shapes the result.
#[derive(Clone)]
pub struct MetricService {
    connector: Arc<dyn MonitorConnector>,
    responses: MetricResponseManager,
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| PluginError::RequiredParameter(key.to_string()))
}

/// Runs one operation inside its own transaction span and records its
/// outcome.
async fn observe<T, F>(operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let span = info_span!("operation", op = operation, transaction_id = %Uuid::new_v4());

    async move {
        let _timer = OperationTimer::new(operation);
        let result = fut.await;
        if let Err(e) = &result {
            metrics::record_failure(operation, e.code());
            warn!(code = e.code(), "Operation failed: {}", e);
        }
        result
    }
    .instrument(span)
    .await
}

impl MetricService {
    pub fn new(connector: Arc<dyn MonitorConnector>) -> Self {
        Self {
            connector,
            responses: MetricResponseManager::new(),
        }
    }

    pub async fn init(&self, request: InitRequest) -> Result<Value> {
        observe("init", async move {
            required(request.options, "options")?;
            let schema = CredentialSchema::default();

            Ok(json!({
                "supported_resource_type": [SUPPORTED_RESOURCE_TYPE],
                "supported_stat": Statistic::ALL.iter().map(Statistic::plugin_name).collect::<Vec<_>>(),
                "supported_schema": CredentialSchema::SUPPORTED.iter().map(CredentialSchema::as_str).collect::<Vec<_>>(),
                "required_keys": schema.required_keys(),
            }))
        })
        .await
    }

    pub async fn verify(&self, request: VerifyRequest) -> Result<()> {
        observe("verify", async move {
            let options = required(request.options, "options")?;
            let secret_data = required(request.secret_data, "secret_data")?;
            let schema = CredentialSchema::resolve(request.schema.as_deref())?;

            self.connector.verify(schema, &options, &secret_data).await
        })
        .await
    }

    pub async fn list(&self, request: MetricRequest) -> Result<MetricsResponse> {
        observe("list", async move {
            let options = required(request.options, "options")?;
            let secret_data = required(request.secret_data, "secret_data")?;
            let resource = required(request.resource, "resource")?;

            let schema = CredentialSchema::resolve(request.schema.as_deref())?;
            let resource = ResourceRef::from_value(&resource)?;

            let descriptors = self
                .connector
                .list_metrics(schema, &options, &secret_data, &resource)
                .await?;

            info!(resource_id = %resource.resource_id, %schema, "Listing {} metrics", descriptors.len());
            Ok(self.responses.make_metrics_response(descriptors))
        })
        .await
    }

    pub async fn get_data(&self, request: MetricDataRequest) -> Result<MetricDataResponse> {
        observe("get_data", async move {
            let options = required(request.options, "options")?;
            let secret_data = required(request.secret_data, "secret_data")?;
            let resource = required(request.resource, "resource")?;
            let start = required(request.start, "start")?;
            let end = required(request.end, "end")?;

            let schema = CredentialSchema::resolve(request.schema.as_deref())?;
            let resource = ResourceRef::from_value(&resource)?;
            // Azure's timespan has whole-second resolution.
            let start = parse_timestamp("start", &start)?.trunc_subsecs(0);
            let end = parse_timestamp("end", &end)?.trunc_subsecs(0);
            if start >= end {
                return Err(PluginError::invalid("start", "must be at least one second before end"));
            }

            let period = request
                .period
                .map(|p| {
                    u32::try_from(p)
                        .ok()
                        .filter(|p| *p > 0)
                        .ok_or_else(|| PluginError::invalid("period", "must be a positive number of seconds"))
                })
                .transpose()?;
            let stat = request.stat.as_deref().map(str::parse::<Statistic>).transpose()?;

            let query = MetricQuery {
                metric: request.metric.filter(|m| !m.is_empty()),
                start,
                end,
                period,
                stat,
            };

            let series = self
                .connector
                .get_metric_data(schema, &options, &secret_data, &resource, &query)
                .await?;

            Ok(self.responses.make_metric_data_response(series))
        })
        .await
    }
}
