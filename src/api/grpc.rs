use serde_json::Value;
use tonic::{Request, Response, Status};
use tracing::info;

use crate::models;
use crate::proto::{self, DataSource, Metric};
use crate::service::MetricService;
use crate::utils::structs::{json_to_proto, map_to_struct, proto_to_json, struct_to_map, to_proto_timestamp};

/// `Metric` gRPC service.
#[derive(Clone)]
pub struct MetricGrpc {
    service: MetricService,
}

impl MetricGrpc {
    pub fn new(service: MetricService) -> Self {
        Self { service }
    }
}

/// `DataSource` gRPC service.
#[derive(Clone)]
pub struct DataSourceGrpc {
    service: MetricService,
}

impl DataSourceGrpc {
    pub fn new(service: MetricService) -> Self {
        Self { service }
    }
}

// A `Value` with no kind or an explicit null is treated as absent.
fn present(value: Option<prost_types::Value>) -> Option<Value> {
    value.map(proto_to_json).filter(|v| !v.is_null())
}

impl From<proto::MetricRequest> for models::MetricRequest {
    fn from(req: proto::MetricRequest) -> Self {
        Self {
            schema: req.schema,
            options: req.options.map(struct_to_map),
            secret_data: req.secret_data.map(struct_to_map),
            resource: present(req.resource),
        }
    }
}

impl From<proto::MetricDataRequest> for models::MetricDataRequest {
    fn from(req: proto::MetricDataRequest) -> Self {
        Self {
            schema: req.schema,
            options: req.options.map(struct_to_map),
            secret_data: req.secret_data.map(struct_to_map),
            resource: present(req.resource),
            metric: req.metric,
            start: req.start.map(Value::String),
            end: req.end.map(Value::String),
            period: req.period,
            stat: req.stat,
        }
    }
}

impl From<proto::VerifyRequest> for models::VerifyRequest {
    fn from(req: proto::VerifyRequest) -> Self {
        Self {
            schema: req.schema,
            options: req.options.map(struct_to_map),
            secret_data: req.secret_data.map(struct_to_map),
        }
    }
}

impl From<models::MetricsResponse> for proto::MetricsResponse {
    fn from(res: models::MetricsResponse) -> Self {
        Self {
            metrics: res
                .metrics
                .into_iter()
                .map(|info| proto::MetricInfo {
                    key: info.key,
                    name: info.name,
                    unit: Some(proto::MetricUnit {
                        x: info.unit.x,
                        y: info.unit.y,
                    }),
                    chart_type: info.chart_type,
                    chart_options: Some(map_to_struct(&info.chart_options)),
                    supported_stats: info.supported_stats,
                    default_stat: info.default_stat,
                })
                .collect(),
        }
    }
}

impl From<models::MetricDataResponse> for proto::MetricDataResponse {
    fn from(res: models::MetricDataResponse) -> Self {
        Self {
            metric: res.metric,
            labels: res.labels.iter().map(to_proto_timestamp).collect(),
            values: res.values,
        }
    }
}

#[tonic::async_trait]
impl Metric for MetricGrpc {
    async fn list(
        &self,
        request: Request<proto::MetricRequest>,
    ) -> Result<Response<proto::MetricsResponse>, Status> {
        info!("gRPC: Metric.List");
        let response = self.service.list(request.into_inner().into()).await?;
        Ok(Response::new(response.into()))
    }

    async fn get_data(
        &self,
        request: Request<proto::MetricDataRequest>,
    ) -> Result<Response<proto::MetricDataResponse>, Status> {
        info!("gRPC: Metric.GetData");
        let response = self.service.get_data(request.into_inner().into()).await?;
        Ok(Response::new(response.into()))
    }
}

#[tonic::async_trait]
impl DataSource for DataSourceGrpc {
    async fn init(
        &self,
        request: Request<proto::InitRequest>,
    ) -> Result<Response<proto::PluginInfo>, Status> {
        info!("gRPC: DataSource.Init");
        let request = models::InitRequest {
            options: request.into_inner().options.map(struct_to_map),
        };

        let metadata = match json_to_proto(&self.service.init(request).await?).kind {
            Some(prost_types::value::Kind::StructValue(s)) => s,
            _ => return Err(Status::internal("plugin metadata is not a map")),
        };

        Ok(Response::new(proto::PluginInfo {
            metadata: Some(metadata),
        }))
    }

    async fn verify(&self, request: Request<proto::VerifyRequest>) -> Result<Response<()>, Status> {
        info!("gRPC: DataSource.Verify");
        self.service.verify(request.into_inner().into()).await?;
        Ok(Response::new(()))
    }
}
