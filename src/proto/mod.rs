// Include the generated protobuf code
pub mod plugin {
    tonic::include_proto!("monitoring.plugin.v1");
}

// Re-export commonly used types from the generated code
pub use self::plugin::{
    InitRequest,
    MetricDataRequest,
    MetricDataResponse,
    MetricInfo,
    MetricRequest,
    MetricUnit,
    MetricsResponse,
    PluginInfo,
    VerifyRequest,
};

// Re-export service types
pub use self::plugin::data_source_server::{DataSource, DataSourceServer};
pub use self::plugin::metric_server::{Metric, MetricServer};
