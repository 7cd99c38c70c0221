use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    pub static ref PLUGIN_UP: IntGauge = register_int_gauge!(
        "plugin_up",
        "Whether the plugin is serving (1) or not (0)"
    ).unwrap();

    // Inbound operations
    pub static ref OPERATION_COUNTER: IntCounterVec = register_int_counter_vec!(
        "plugin_operations_total",
        "Total number of plugin operations received",
        &["operation"]
    ).unwrap();

    pub static ref OPERATION_FAILURES: IntCounterVec = register_int_counter_vec!(
        "plugin_operation_failures_total",
        "Total number of failed plugin operations",
        &["operation", "code"]
    ).unwrap();

    pub static ref OPERATION_DURATION: HistogramVec = register_histogram_vec!(
        "plugin_operation_duration_seconds",
        "Plugin operation duration in seconds",
        &["operation"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]
    ).unwrap();

    // Outbound Azure calls
    pub static ref AZURE_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "azure_requests_total",
        "Total number of requests sent to Azure",
        &["endpoint", "status"]
    ).unwrap();
}

pub fn init_metrics() {
    PLUGIN_UP.set(1);
}

/// Counts an operation on creation and records its duration when dropped.
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &'static str) -> Self {
        OPERATION_COUNTER.with_label_values(&[operation]).inc();
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        OPERATION_DURATION
            .with_label_values(&[self.operation])
            .observe(duration);
    }
}

pub fn record_failure(operation: &str, code: &str) {
    OPERATION_FAILURES.with_label_values(&[operation, code]).inc();
}

pub fn record_azure_request(endpoint: &str, status: Option<u16>) {
    let class = match status {
        Some(code) => format!("{}xx", code / 100),
        None => "transport".to_string(),
    };
    AZURE_REQUESTS.with_label_values(&[endpoint, &class]).inc();
}

/// Renders every registered metric in the Prometheus text format.
pub fn gather_text() -> crate::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| crate::PluginError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| crate::PluginError::Internal(format!("Metrics are not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_timer_counts_and_exposes() {
        {
            let _timer = OperationTimer::new("list");
        }
        record_azure_request("metric_definitions", Some(200));
        record_azure_request("token", None);

        let text = gather_text().unwrap();
        assert!(text.contains("plugin_operations_total"));
        assert!(text.contains("operation=\"list\""));
        assert!(text.contains("status=\"2xx\""));
        assert!(text.contains("status=\"transport\""));
    }
}
