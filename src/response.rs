use crate::models::{
    MetricDataResponse, MetricDescriptor, MetricInfo, MetricSeries, MetricUnit, MetricsResponse,
    ParamMap, Statistic,
};

const X_AXIS_UNIT: &str = "Timestamp";
const CHART_TYPE: &str = "line";

/// Reshapes raw Azure results into the plugin's response envelopes.
#[derive(Debug, Clone, Default)]
pub struct MetricResponseManager;

impl MetricResponseManager {
    pub fn new() -> Self {
        Self
    }

    pub fn make_metrics_response(&self, descriptors: Vec<MetricDescriptor>) -> MetricsResponse {
        MetricsResponse {
            metrics: descriptors.into_iter().map(Self::make_metric_info).collect(),
        }
    }

    pub fn make_metric_data_response(&self, series: MetricSeries) -> MetricDataResponse {
        let (labels, values) = series
            .points
            .into_iter()
            .map(|point| (point.timestamp, point.value))
            .unzip();

        MetricDataResponse {
            metric: series.metric,
            labels,
            values,
        }
    }

    fn make_metric_info(descriptor: MetricDescriptor) -> MetricInfo {
        MetricInfo {
            name: descriptor
                .display_name
                .unwrap_or_else(|| descriptor.name.clone()),
            key: descriptor.name,
            unit: MetricUnit {
                x: X_AXIS_UNIT.to_string(),
                y: descriptor.unit,
            },
            chart_type: CHART_TYPE.to_string(),
            chart_options: ParamMap::new(),
            supported_stats: descriptor
                .supported_aggregations
                .iter()
                .map(Statistic::plugin_name)
                .map(str::to_string)
                .collect(),
            default_stat: descriptor
                .primary_aggregation
                .map(|stat| stat.plugin_name().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataPoint;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_metrics_response_shape() {
        let response = MetricResponseManager::new().make_metrics_response(vec![MetricDescriptor {
            name: "Percentage CPU".to_string(),
            display_name: None,
            unit: "Percent".to_string(),
            primary_aggregation: Some(Statistic::Average),
            supported_aggregations: vec![Statistic::Average, Statistic::Max],
        }]);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "metrics": [{
                    "key": "Percentage CPU",
                    "name": "Percentage CPU",
                    "unit": { "x": "Timestamp", "y": "Percent" },
                    "chart_type": "line",
                    "chart_options": {},
                    "supported_stats": ["AVERAGE", "MAX"],
                    "default_stat": "AVERAGE"
                }]
            })
        );
    }

    #[test]
    fn test_default_stat_is_always_present() {
        let response = MetricResponseManager::new().make_metrics_response(vec![MetricDescriptor {
            name: "Disk Read Bytes".to_string(),
            display_name: None,
            unit: "Bytes".to_string(),
            primary_aggregation: None,
            supported_aggregations: vec![Statistic::Sum],
        }]);

        let value = serde_json::to_value(&response).unwrap();
        let info = value["metrics"][0].as_object().unwrap();
        assert_eq!(info.get("default_stat"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn test_metric_data_response_pairs_labels_and_values() {
        let t0: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().unwrap();
        let t1: DateTime<Utc> = "2024-01-01T00:05:00Z".parse().unwrap();

        let response = MetricResponseManager::new().make_metric_data_response(MetricSeries {
            metric: "CPU".to_string(),
            points: vec![
                DataPoint { timestamp: t0, value: 0.25 },
                DataPoint { timestamp: t1, value: 0.75 },
            ],
        });

        assert_eq!(response.metric, "CPU");
        assert_eq!(response.labels, vec![t0, t1]);
        assert_eq!(response.values, vec![0.25, 0.75]);
    }
}
