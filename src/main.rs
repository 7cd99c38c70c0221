use std::sync::Arc;

use azure_monitor_plugin::{
    api,
    azure::AzureManager,
    config::PluginConfig,
    logging,
    metrics,
    service::MetricService,
};
use tracing::error;

async fn run(config: &PluginConfig) -> azure_monitor_plugin::Result<()> {
    let connector = AzureManager::new(config.azure.clone())?;
    let service = MetricService::new(Arc::new(connector));
    api::serve(config, service).await
}

#[tokio::main]
async fn main() {
    let config = match PluginConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init_logger(config.log_format) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    metrics::init_metrics();

    if let Err(e) = run(&config).await {
        error!("Plugin stopped: {}", e);
        std::process::exit(1);
    }
}
